//! PlanMod 文件处理
//!
//! 支持：
//! - 图层/块命名（[`layout`]）与 DXF 输出（[`writer`]）
//! - DXF 回读摘要与实体导入
//! - 场景图快照：JSON 与 `.pmsg` 二进制格式

pub mod blocks;
pub mod dxf_import;
pub mod error;
pub mod layout;
pub mod palette;
pub mod reader;
pub mod snapshot;
pub mod writer;

pub use error::{FileError, FileResult};
pub use layout::{DxfLayoutAssigner, LayoutStats, NamingContext};
pub use reader::{summarize, CadSummary};
pub use writer::{CadWriter, WriteStats, WriterOptions};
