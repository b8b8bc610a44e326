//! 几何图元定义
//!
//! 矢量化与 DXF 导入产生的基本图元：
//! - 线段 (Line)
//! - 多段线 (Polyline)
//! - 圆 (Circle)
//! - 圆弧 (Arc)
//!
//! 圆弧角度以度为单位，与 DXF 一致。

use crate::error::GeometryError;
use crate::math::{normalize_degrees, BoundingBox2, Point2, Vector2, EPSILON};
use crate::transform::Transform2D;
use serde::{Deserialize, Serialize};

/// 线段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub start: Point2,
    pub end: Point2,
}

impl Line {
    pub fn new(start: Point2, end: Point2) -> Self {
        Self { start, end }
    }

    /// 计算线段长度
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    /// 方向角（度），范围 (-180, 180]
    pub fn angle_degrees(&self) -> f64 {
        let d = self.end - self.start;
        d.y.atan2(d.x).to_degrees()
    }

    /// 单位方向向量
    pub fn direction(&self) -> Vector2 {
        (self.end - self.start).normalize()
    }

    pub fn midpoint(&self) -> Point2 {
        Point2::new(
            (self.start.x + self.end.x) / 2.0,
            (self.start.y + self.end.y) / 2.0,
        )
    }

    /// 计算点到线段的距离
    pub fn distance_to_point(&self, point: &Point2) -> f64 {
        let v = self.end - self.start;
        let w = point - self.start;

        let c1 = w.dot(&v);
        if c1 <= 0.0 {
            return (point - self.start).norm();
        }

        let c2 = v.dot(&v);
        if c2 <= c1 {
            return (point - self.end).norm();
        }

        let b = c1 / c2;
        let pb = self.start + v * b;
        (point - pb).norm()
    }

    pub fn bounding_box(&self) -> BoundingBox2 {
        BoundingBox2::from_points([self.start, self.end])
    }
}

/// 圆
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Point2,
    pub radius: f64,
}

impl Circle {
    pub fn new(center: Point2, radius: f64) -> Self {
        Self { center, radius }
    }

    pub fn area(&self) -> f64 {
        std::f64::consts::PI * self.radius * self.radius
    }

    pub fn bounding_box(&self) -> BoundingBox2 {
        BoundingBox2::new(
            Point2::new(self.center.x - self.radius, self.center.y - self.radius),
            Point2::new(self.center.x + self.radius, self.center.y + self.radius),
        )
    }
}

/// 圆弧（逆时针，从 start_angle 到 end_angle）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arc {
    pub center: Point2,
    pub radius: f64,
    /// 起始角度（度）
    pub start_angle: f64,
    /// 终止角度（度）
    pub end_angle: f64,
}

impl Arc {
    pub fn new(center: Point2, radius: f64, start_angle: f64, end_angle: f64) -> Self {
        Self {
            center,
            radius,
            start_angle,
            end_angle,
        }
    }

    /// 扫过的角度（度），范围 [0, 360)
    pub fn sweep_angle(&self) -> f64 {
        normalize_degrees(self.end_angle - self.start_angle)
    }

    pub fn point_at_degrees(&self, angle: f64) -> Point2 {
        let rad = angle.to_radians();
        Point2::new(
            self.center.x + self.radius * rad.cos(),
            self.center.y + self.radius * rad.sin(),
        )
    }

    pub fn start_point(&self) -> Point2 {
        self.point_at_degrees(self.start_angle)
    }

    pub fn end_point(&self) -> Point2 {
        self.point_at_degrees(self.end_angle)
    }

    /// 角度是否落在弧的范围内
    pub fn contains_angle(&self, angle: f64) -> bool {
        let offset = normalize_degrees(angle - self.start_angle);
        offset <= self.sweep_angle() + EPSILON
    }

    pub fn bounding_box(&self) -> BoundingBox2 {
        let mut bbox = BoundingBox2::from_points([self.start_point(), self.end_point()]);

        // 检查象限点
        for angle in [0.0, 90.0, 180.0, 270.0] {
            if self.contains_angle(angle) {
                bbox.expand_to_include(&self.point_at_degrees(angle));
            }
        }

        bbox
    }
}

/// 多段线
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pub points: Vec<Point2>,
    /// 是否闭合
    pub closed: bool,
}

impl Polyline {
    pub fn new(points: Vec<Point2>, closed: bool) -> Self {
        Self { points, closed }
    }

    /// 线段数量
    pub fn segment_count(&self) -> usize {
        if self.points.len() < 2 {
            return 0;
        }
        if self.closed {
            self.points.len()
        } else {
            self.points.len() - 1
        }
    }

    /// 计算总长度
    pub fn length(&self) -> f64 {
        (0..self.segment_count())
            .map(|i| {
                let a = self.points[i];
                let b = self.points[(i + 1) % self.points.len()];
                (b - a).norm()
            })
            .sum()
    }

    /// 闭合多边形面积（鞋带公式，取绝对值）
    pub fn area(&self) -> f64 {
        if self.points.len() < 3 {
            return 0.0;
        }
        let n = self.points.len();
        let twice: f64 = (0..n)
            .map(|i| {
                let a = self.points[i];
                let b = self.points[(i + 1) % n];
                a.x * b.y - b.x * a.y
            })
            .sum();
        twice.abs() / 2.0
    }

    /// 计算点到多段线的距离
    pub fn distance_to_point(&self, point: &Point2) -> f64 {
        match self.points.len() {
            0 => f64::MAX,
            1 => (point - self.points[0]).norm(),
            n => (0..self.segment_count())
                .map(|i| {
                    Line::new(self.points[i], self.points[(i + 1) % n]).distance_to_point(point)
                })
                .fold(f64::MAX, f64::min),
        }
    }

    pub fn bounding_box(&self) -> BoundingBox2 {
        if self.points.is_empty() {
            return BoundingBox2::empty();
        }
        BoundingBox2::from_points(self.points.iter().copied())
    }
}

/// 几何载荷：每种具体图元一个变体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    Line(Line),
    Polyline(Polyline),
    Circle(Circle),
    Arc(Arc),
    /// DXF 导入时无法识别的实体占位，只保留类型名，不参与输出
    PassThrough { dxf_type: String },
}

/// 图元类型标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Line,
    Polyline,
    Circle,
    Arc,
    PassThrough,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Line => "line",
            EntityKind::Polyline => "polyline",
            EntityKind::Circle => "circle",
            EntityKind::Arc => "arc",
            EntityKind::PassThrough => "pass_through",
        }
    }
}

impl Shape {
    pub fn kind(&self) -> EntityKind {
        match self {
            Shape::Line(_) => EntityKind::Line,
            Shape::Polyline(_) => EntityKind::Polyline,
            Shape::Circle(_) => EntityKind::Circle,
            Shape::Arc(_) => EntityKind::Arc,
            Shape::PassThrough { .. } => EntityKind::PassThrough,
        }
    }

    /// 占位实体或空几何
    pub fn is_placeholder(&self) -> bool {
        match self {
            Shape::PassThrough { .. } => true,
            Shape::Polyline(pl) => pl.points.is_empty(),
            _ => false,
        }
    }

    pub fn bounding_box(&self) -> BoundingBox2 {
        match self {
            Shape::Line(l) => l.bounding_box(),
            Shape::Polyline(pl) => pl.bounding_box(),
            Shape::Circle(c) => c.bounding_box(),
            Shape::Arc(a) => a.bounding_box(),
            Shape::PassThrough { .. } => BoundingBox2::empty(),
        }
    }

    /// 关联视图/部件时使用的参考点
    pub fn reference_point(&self) -> Option<Point2> {
        match self {
            Shape::Line(l) => Some(l.midpoint()),
            Shape::Circle(c) => Some(c.center),
            Shape::Arc(_) | Shape::Polyline(_) => {
                let bbox = self.bounding_box();
                (!bbox.is_empty()).then(|| bbox.center())
            }
            Shape::PassThrough { .. } => None,
        }
    }

    /// 检查几何是否可用于输出
    pub fn validate(&self) -> Result<(), GeometryError> {
        let finite = |p: &Point2| p.x.is_finite() && p.y.is_finite();
        match self {
            Shape::Line(l) => {
                if !finite(&l.start) || !finite(&l.end) {
                    return Err(GeometryError::NonFinite);
                }
                if l.length() < EPSILON {
                    return Err(GeometryError::DegenerateLine);
                }
            }
            Shape::Polyline(pl) => {
                if pl.points.len() < 2 {
                    return Err(GeometryError::TooFewPoints(pl.points.len()));
                }
                if !pl.points.iter().all(finite) {
                    return Err(GeometryError::NonFinite);
                }
            }
            Shape::Circle(Circle { center, radius }) | Shape::Arc(Arc { center, radius, .. }) => {
                if !finite(center) || !radius.is_finite() {
                    return Err(GeometryError::NonFinite);
                }
                if *radius <= 0.0 {
                    return Err(GeometryError::NonPositiveRadius(*radius));
                }
            }
            Shape::PassThrough { dxf_type } => {
                return Err(GeometryError::Placeholder(dxf_type.clone()));
            }
        }
        Ok(())
    }

    /// 应用仿射变换。
    ///
    /// 圆/圆弧在非均匀缩放下会变成椭圆，这里用几何平均半径近似；
    /// 圆弧端点角按变换后的端点重新计算，翻转变换会交换起止。
    pub fn transformed(&self, t: &Transform2D) -> Shape {
        match self {
            Shape::Line(l) => Shape::Line(Line::new(t.apply(&l.start), t.apply(&l.end))),
            Shape::Polyline(pl) => Shape::Polyline(Polyline::new(
                pl.points.iter().map(|p| t.apply(p)).collect(),
                pl.closed,
            )),
            Shape::Circle(c) => Shape::Circle(Circle::new(
                t.apply(&c.center),
                c.radius * t.length_scale(),
            )),
            Shape::Arc(a) => {
                let center = t.apply(&a.center);
                let start = t.apply(&a.start_point()) - center;
                let end = t.apply(&a.end_point()) - center;
                let mut start_angle = start.y.atan2(start.x).to_degrees();
                let mut end_angle = end.y.atan2(end.x).to_degrees();
                if t.flips_orientation() {
                    std::mem::swap(&mut start_angle, &mut end_angle);
                }
                Shape::Arc(Arc::new(
                    center,
                    a.radius * t.length_scale(),
                    normalize_degrees(start_angle),
                    normalize_degrees(end_angle),
                ))
            }
            Shape::PassThrough { dxf_type } => Shape::PassThrough {
                dxf_type: dxf_type.clone(),
            },
        }
    }

    /// 只变换满足条件的多段线顶点（用于修改槽口）。返回被修改的顶点数。
    pub fn transform_vertices_where(
        &mut self,
        t: &Transform2D,
        predicate: impl Fn(&Point2) -> bool,
    ) -> usize {
        let Shape::Polyline(pl) = self else {
            return 0;
        };
        let mut changed = 0;
        for p in pl.points.iter_mut() {
            if predicate(p) {
                *p = t.apply(p);
                changed += 1;
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_length() {
        let line = Line::new(Point2::new(0.0, 0.0), Point2::new(3.0, 4.0));
        assert!((line.length() - 5.0).abs() < EPSILON);
    }

    #[test]
    fn test_validate_rejects_malformed() {
        let degenerate = Shape::Line(Line::new(Point2::new(1.0, 1.0), Point2::new(1.0, 1.0)));
        assert!(matches!(degenerate.validate(), Err(GeometryError::DegenerateLine)));

        let bad_radius = Shape::Circle(Circle::new(Point2::origin(), 0.0));
        assert!(matches!(bad_radius.validate(), Err(GeometryError::NonPositiveRadius(_))));

        let empty = Shape::Polyline(Polyline::new(vec![], true));
        assert!(matches!(empty.validate(), Err(GeometryError::TooFewPoints(0))));
    }

    #[test]
    fn test_arc_bounding_box_includes_quadrant() {
        let arc = Arc::new(Point2::origin(), 10.0, 45.0, 135.0);
        let bbox = arc.bounding_box();
        assert!((bbox.max.y - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_polyline_area() {
        let square = Polyline::new(
            vec![
                Point2::new(0.0, 0.0),
                Point2::new(4.0, 0.0),
                Point2::new(4.0, 4.0),
                Point2::new(0.0, 4.0),
            ],
            true,
        );
        assert!((square.area() - 16.0).abs() < EPSILON);
        assert!((square.length() - 16.0).abs() < EPSILON);
    }

    #[test]
    fn test_transform_vertices_where() {
        let mut shape = Shape::Polyline(Polyline::new(
            vec![Point2::new(0.0, 0.0), Point2::new(10.0, 0.0), Point2::new(10.0, 10.0)],
            false,
        ));
        let t = Transform2D::translation(1.0, 0.0);
        let changed = shape.transform_vertices_where(&t, |p| p.x > 5.0);
        assert_eq!(changed, 2);
    }
}
