//! PlanMod 部件替换
//!
//! 按规则把场景图中的部件换成目录件或修改属性，并同步几何：
//! 截面变化按短边缩放部件，相邻翼肋/隔框的槽口跟随调整。

pub mod engine;
pub mod error;
pub mod geometry;
pub mod rules;

pub use engine::{SubstitutionEngine, SubstitutionOutput, SubstitutionReport, SubstitutionState};
pub use error::{SubstitutionError, SubstitutionResult};
pub use geometry::{GeometryModifier, ModifierOptions};
pub use rules::{parse_rules, SubstitutionRule, TargetCriteria};
