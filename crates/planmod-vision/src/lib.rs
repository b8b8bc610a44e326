//! PlanMod 矢量化
//!
//! 把预处理过的栅格图纸转换为几何实体：
//! - `lines`: Canny 边缘 + Hough 变换提取直线，并合并近似共线的片段
//! - `contours`: 二值化后追踪轮廓并做多边形简化
//! - `arcs`: 在轮廓上拟合圆与圆弧
//! - `engine`: 并行运行上述提取器，把结果写入场景图
//!
//! 所有坐标都是像素坐标（原点左上，y 向下）。

pub mod arcs;
pub mod contours;
pub mod engine;
pub mod error;
pub mod lines;
pub mod raster;

pub use arcs::{ArcFitter, ArcOptions, FitMethod, FittedCurve};
pub use contours::{ContourOptions, ContourTracer, TracedContour};
pub use engine::{Extraction, VectorizationEngine, VectorizationOptions, VectorizationStats};
pub use error::{VisionError, VisionResult};
pub use lines::{ExtractedLine, LineExtractor, LineOptions};
