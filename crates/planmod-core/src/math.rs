//! 数学基础类型
//!
//! 基于 nalgebra 的二维点/向量别名，以及轴对齐包围盒。
//! 场景图坐标约定：原点在左上角，y 轴向下，单位为图纸单位（mm）。

use serde::{Deserialize, Serialize};

/// 浮点比较容差
pub const EPSILON: f64 = 1e-9;

pub type Point2 = nalgebra::Point2<f64>;
pub type Vector2 = nalgebra::Vector2<f64>;

/// 轴对齐包围盒
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox2 {
    pub min: Point2,
    pub max: Point2,
}

impl BoundingBox2 {
    /// 由两个角点创建（自动规范化）
    pub fn new(a: Point2, b: Point2) -> Self {
        Self {
            min: Point2::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point2::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// 由左上角与宽高创建
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(Point2::new(x, y), Point2::new(x + width, y + height))
    }

    /// 空包围盒（min > max），扩展后才有意义
    pub fn empty() -> Self {
        Self {
            min: Point2::new(f64::MAX, f64::MAX),
            max: Point2::new(f64::MIN, f64::MIN),
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = Point2>) -> Self {
        let mut bbox = Self::empty();
        for p in points {
            bbox.expand_to_include(&p);
        }
        bbox
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn expand_to_include(&mut self, p: &Point2) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    /// 向四周扩展 margin
    pub fn inflate(&self, margin: f64) -> Self {
        Self {
            min: Point2::new(self.min.x - margin, self.min.y - margin),
            max: Point2::new(self.max.x + margin, self.max.y + margin),
        }
    }

    pub fn x(&self) -> f64 {
        self.min.x
    }

    pub fn y(&self) -> f64 {
        self.min.y
    }

    pub fn width(&self) -> f64 {
        (self.max.x - self.min.x).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.max.y - self.min.y).max(0.0)
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn center(&self) -> Point2 {
        Point2::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    /// 点是否在包围盒内（含边界）
    pub fn contains(&self, p: &Point2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// other 是否完全落在本包围盒内
    pub fn contains_box(&self, other: &BoundingBox2) -> bool {
        self.contains(&other.min) && self.contains(&other.max)
    }

    pub fn intersects(&self, other: &BoundingBox2) -> bool {
        !(self.max.x < other.min.x
            || self.min.x > other.max.x
            || self.max.y < other.min.y
            || self.min.y > other.max.y)
    }

    pub fn intersection(&self, other: &BoundingBox2) -> Option<BoundingBox2> {
        if !self.intersects(other) {
            return None;
        }
        Some(BoundingBox2 {
            min: Point2::new(self.min.x.max(other.min.x), self.min.y.max(other.min.y)),
            max: Point2::new(self.max.x.min(other.max.x), self.max.y.min(other.max.y)),
        })
    }

    /// 水平方向间隙：两个区间之间的正向距离，重叠或接触时为 0
    pub fn horizontal_gap(&self, other: &BoundingBox2) -> f64 {
        (self.min.x.max(other.min.x) - self.max.x.min(other.max.x)).max(0.0)
    }

    /// 垂直方向间隙
    pub fn vertical_gap(&self, other: &BoundingBox2) -> f64 {
        (self.min.y.max(other.min.y) - self.max.y.min(other.max.y)).max(0.0)
    }

    /// 矩形四个角点，顺序：左上、右上、右下、左下
    pub fn corners(&self) -> [Point2; 4] {
        [
            Point2::new(self.min.x, self.min.y),
            Point2::new(self.max.x, self.min.y),
            Point2::new(self.max.x, self.max.y),
            Point2::new(self.min.x, self.max.y),
        ]
    }

    pub fn is_finite(&self) -> bool {
        self.min.x.is_finite()
            && self.min.y.is_finite()
            && self.max.x.is_finite()
            && self.max.y.is_finite()
    }
}

impl Default for BoundingBox2 {
    fn default() -> Self {
        Self::new(Point2::origin(), Point2::origin())
    }
}

/// 将角度归一化到 [0, 360)
pub fn normalize_degrees(angle: f64) -> f64 {
    let a = angle % 360.0;
    if a < 0.0 {
        a + 360.0
    } else {
        a
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gaps_are_symmetric_and_clamped() {
        let a = BoundingBox2::from_xywh(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox2::from_xywh(30.0, 5.0, 10.0, 10.0);

        assert!((a.horizontal_gap(&b) - 20.0).abs() < EPSILON);
        assert!((b.horizontal_gap(&a) - 20.0).abs() < EPSILON);
        // 垂直方向重叠
        assert_eq!(a.vertical_gap(&b), 0.0);
    }

    #[test]
    fn test_from_points() {
        let bbox = BoundingBox2::from_points([Point2::new(3.0, -1.0), Point2::new(-2.0, 4.0)]);
        assert_eq!(bbox.min, Point2::new(-2.0, -1.0));
        assert_eq!(bbox.max, Point2::new(3.0, 4.0));
        assert!((bbox.area() - 25.0).abs() < EPSILON);
    }

    #[test]
    fn test_normalize_degrees() {
        assert!((normalize_degrees(-90.0) - 270.0).abs() < EPSILON);
        assert!((normalize_degrees(450.0) - 90.0).abs() < EPSILON);
    }
}
