//! 轮廓追踪
//!
//! 固定阈值二值化后提取全部轮廓（含嵌套），丢弃面积过小的轮廓，
//! 再按周长比例的 epsilon 做 Douglas-Peucker 简化。

use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;
use planmod_core::geometry::Polyline;
use planmod_core::math::{BoundingBox2, Point2};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourOptions {
    /// 灰度低于该值视为墨迹
    pub ink_threshold: u8,
    /// 最小面积（像素²）
    pub min_area: f64,
    /// 简化容差 = epsilon_factor × 周长
    pub epsilon_factor: f64,
    /// 作为多段线输出所需的最少顶点数
    pub min_polyline_vertices: usize,
}

impl Default for ContourOptions {
    fn default() -> Self {
        Self {
            ink_threshold: 240,
            min_area: 50.0,
            epsilon_factor: 0.01,
            min_polyline_vertices: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TracedContour {
    /// 简化后的顶点
    pub points: Vec<Point2>,
    /// 简化前的边界像素
    pub raw_points: Vec<Point2>,
    pub is_closed: bool,
    /// 是否为孔洞边界
    pub is_hole: bool,
    pub area: f64,
    pub perimeter: f64,
    pub bounding_box: BoundingBox2,
}

impl TracedContour {
    pub fn as_polyline(&self) -> Polyline {
        Polyline::new(self.points.clone(), self.is_closed)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContourTracer {
    options: ContourOptions,
}

impl ContourTracer {
    pub fn new(options: ContourOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ContourOptions {
        &self.options
    }

    pub fn trace(&self, gray: &GrayImage) -> Vec<TracedContour> {
        let binary = crate::raster::binarize_ink(gray, self.options.ink_threshold);
        self.trace_binary(&binary)
    }

    /// 对已二值化的图像（非零为前景）提取轮廓
    pub fn trace_binary(&self, binary: &GrayImage) -> Vec<TracedContour> {
        let contours = find_contours::<i32>(binary);
        let total = contours.len();

        let traced: Vec<TracedContour> = contours
            .iter()
            .filter_map(|contour| {
                if contour.points.len() < 3 {
                    return None;
                }
                let raw_points: Vec<Point2> = contour.points.iter().map(to_point2).collect();
                let area = Polyline::new(raw_points.clone(), true).area();
                if area < self.options.min_area {
                    return None;
                }

                let perimeter = arc_length(&contour.points, true);
                let epsilon = self.options.epsilon_factor * perimeter;
                let simplified: Vec<Point<i32>> = if epsilon > 0.0 {
                    approximate_polygon_dp(&contour.points, epsilon, true)
                } else {
                    contour.points.clone()
                };

                Some(TracedContour {
                    points: simplified.iter().map(to_point2).collect(),
                    bounding_box: BoundingBox2::from_points(raw_points.iter().copied()),
                    raw_points,
                    is_closed: true,
                    is_hole: contour.border_type == BorderType::Hole,
                    area,
                    perimeter,
                })
            })
            .collect();

        debug!("Traced {} contours, kept {}", total, traced.len());
        traced
    }
}

fn to_point2(p: &Point<i32>) -> Point2 {
    Point2::new(p.x as f64, p.y as f64)
}
