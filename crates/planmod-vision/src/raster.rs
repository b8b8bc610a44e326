//! 栅格输入
//!
//! 输入图像已由外部预处理（方向校正、去噪），这里只负责解码为灰度图，
//! 以及生成二值图和边缘图。

use crate::error::{VisionError, VisionResult};
use image::{GrayImage, Luma};
use std::path::Path;
use tracing::debug;

/// 从文件读取并转为灰度
pub fn load_gray(path: &Path) -> VisionResult<GrayImage> {
    let img = image::ImageReader::open(path)?
        .with_guessed_format()?
        .decode()?;
    let gray = img.to_luma8();
    debug!(
        "Loaded raster {} ({}x{})",
        path.display(),
        gray.width(),
        gray.height()
    );
    ensure_not_empty(&gray)?;
    Ok(gray)
}

/// 从内存解码并转为灰度
pub fn decode_gray(bytes: &[u8]) -> VisionResult<GrayImage> {
    let gray = image::load_from_memory(bytes)?.to_luma8();
    ensure_not_empty(&gray)?;
    Ok(gray)
}

pub fn ensure_not_empty(image: &GrayImage) -> VisionResult<()> {
    if image.width() == 0 || image.height() == 0 {
        return Err(VisionError::EmptyRaster {
            width: image.width(),
            height: image.height(),
        });
    }
    Ok(())
}

/// 反相二值化：灰度低于阈值视为墨迹（255），其余为背景（0）
pub fn binarize_ink(image: &GrayImage, ink_threshold: u8) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        if image.get_pixel(x, y)[0] < ink_threshold {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Canny 边缘图
pub fn edge_map(image: &GrayImage, low: f32, high: f32) -> GrayImage {
    imageproc::edges::canny(image, low, high)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binarize_ink() {
        let mut img = GrayImage::from_pixel(4, 4, Luma([255]));
        img.put_pixel(1, 1, Luma([10]));
        img.put_pixel(2, 2, Luma([239]));
        img.put_pixel(3, 3, Luma([240]));

        let bin = binarize_ink(&img, 240);
        assert_eq!(bin.get_pixel(1, 1)[0], 255);
        assert_eq!(bin.get_pixel(2, 2)[0], 255);
        assert_eq!(bin.get_pixel(3, 3)[0], 0);
        assert_eq!(bin.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn test_empty_raster_rejected() {
        assert!(ensure_not_empty(&GrayImage::new(0, 10)).is_err());
    }
}
