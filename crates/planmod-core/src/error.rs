//! 核心错误定义

use std::path::PathBuf;
use thiserror::Error;

/// 单个图元的几何缺陷，调用方记录后跳过
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("degenerate line (zero length)")]
    DegenerateLine,

    #[error("non-positive radius: {0}")]
    NonPositiveRadius(f64),

    #[error("polyline has too few points: {0}")]
    TooFewPoints(usize),

    #[error("non-finite coordinate")]
    NonFinite,

    #[error("pass-through placeholder ({0}) has no geometry")]
    Placeholder(String),
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid classification input: {0}")]
    InvalidClassification(String),

    #[error("Invalid value for attribute '{key}': {reason}")]
    InvalidAttribute { key: String, reason: String },

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

pub type CoreResult<T> = Result<T, CoreError>;
