//! 矢量化错误定义

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Empty raster ({width}x{height})")]
    EmptyRaster { width: u32, height: u32 },
}

pub type VisionResult<T> = Result<T, VisionError>;
