//! 圆与圆弧拟合
//!
//! 先求最小包围圆；若归一化 RMS 径向偏差超过容差，再用代数最小二乘（Kåsa）
//! 拟合。部分圆弧的包围圆不是弧本身所在的圆，后者才能识别出圆弧。
//!
//! 拟合成功后按相邻点的最大角间隙区分整圆和圆弧。

use crate::contours::TracedContour;
use nalgebra::{Matrix3, Vector3};
use planmod_core::geometry::{Arc, Circle, Shape};
use planmod_core::math::{normalize_degrees, Point2, EPSILON};
use serde::{Deserialize, Serialize};

/// 参与拟合所需的最少点数
pub const MIN_FIT_POINTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArcOptions {
    /// 归一化 RMS 偏差容差
    pub fit_tolerance: f64,
    /// 最小半径（像素）
    pub min_radius: f64,
    /// 最大角间隙小于该值时视为整圆（度）
    pub full_circle_max_gap_deg: f64,
}

impl Default for ArcOptions {
    fn default() -> Self {
        Self {
            fit_tolerance: 0.1,
            min_radius: 5.0,
            full_circle_max_gap_deg: 45.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitMethod {
    EnclosingCircle,
    LeastSquares,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FittedCurve {
    Circle {
        circle: Circle,
        deviation: f64,
        method: FitMethod,
    },
    Arc {
        arc: Arc,
        deviation: f64,
        method: FitMethod,
    },
}

impl FittedCurve {
    pub fn deviation(&self) -> f64 {
        match self {
            FittedCurve::Circle { deviation, .. } | FittedCurve::Arc { deviation, .. } => *deviation,
        }
    }

    pub fn to_shape(&self) -> Shape {
        match self {
            FittedCurve::Circle { circle, .. } => Shape::Circle(circle.clone()),
            FittedCurve::Arc { arc, .. } => Shape::Arc(arc.clone()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ArcFitter {
    options: ArcOptions,
}

impl ArcFitter {
    pub fn new(options: ArcOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ArcOptions {
        &self.options
    }

    /// 拟合轮廓：简化后顶点数决定是否尝试，拟合使用简化前的边界像素
    pub fn fit_contour(&self, contour: &TracedContour) -> Option<FittedCurve> {
        if contour.points.len() < MIN_FIT_POINTS {
            return None;
        }
        self.fit(&contour.raw_points)
    }

    /// 拟合一组点；不够圆时返回 None
    pub fn fit(&self, points: &[Point2]) -> Option<FittedCurve> {
        if points.len() < MIN_FIT_POINTS {
            return None;
        }

        let enclosing = minimum_enclosing_circle(points)?;
        let mut best = (enclosing, FitMethod::EnclosingCircle);
        let mut deviation = normalized_rms_deviation(points, &best.0);

        if deviation > self.options.fit_tolerance {
            if let Some(ls) = least_squares_circle(points) {
                let d = normalized_rms_deviation(points, &ls);
                if d < deviation {
                    best = (ls, FitMethod::LeastSquares);
                    deviation = d;
                }
            }
        }

        let (circle, method) = best;
        if deviation > self.options.fit_tolerance || circle.radius < self.options.min_radius {
            return None;
        }

        let (max_gap, start, end) = largest_angular_gap(points, &circle.center);
        if max_gap < self.options.full_circle_max_gap_deg {
            Some(FittedCurve::Circle {
                circle,
                deviation,
                method,
            })
        } else {
            Some(FittedCurve::Arc {
                arc: Arc::new(circle.center, circle.radius, start, end),
                deviation,
                method,
            })
        }
    }
}

/// 归一化 RMS 径向偏差：sqrt(mean((|p - c| - r)²)) / r
pub fn normalized_rms_deviation(points: &[Point2], circle: &Circle) -> f64 {
    if points.is_empty() || circle.radius <= EPSILON {
        return f64::INFINITY;
    }
    let sum_sq: f64 = points
        .iter()
        .map(|p| {
            let d = (p - circle.center).norm() - circle.radius;
            d * d
        })
        .sum();
    (sum_sq / points.len() as f64).sqrt() / circle.radius
}

/// 最小包围圆（Welzl 的迭代形式，按输入顺序处理，结果确定）
pub fn minimum_enclosing_circle(points: &[Point2]) -> Option<Circle> {
    let first = points.first()?;
    let mut c = Circle::new(*first, 0.0);

    for i in 1..points.len() {
        if encloses(&c, &points[i]) {
            continue;
        }
        c = Circle::new(points[i], 0.0);
        for j in 0..i {
            if encloses(&c, &points[j]) {
                continue;
            }
            c = circle_from_two(&points[i], &points[j]);
            for k in 0..j {
                if !encloses(&c, &points[k]) {
                    c = circle_from_three(&points[i], &points[j], &points[k]);
                }
            }
        }
    }
    Some(c)
}

fn encloses(c: &Circle, p: &Point2) -> bool {
    (p - c.center).norm() <= c.radius + 1e-7
}

fn circle_from_two(a: &Point2, b: &Point2) -> Circle {
    let center = Point2::from((a.coords + b.coords) * 0.5);
    Circle::new(center, (a - b).norm() * 0.5)
}

fn circle_from_three(a: &Point2, b: &Point2, c: &Point2) -> Circle {
    let (bx, by) = (b.x - a.x, b.y - a.y);
    let (cx, cy) = (c.x - a.x, c.y - a.y);
    let d = 2.0 * (bx * cy - by * cx);

    if d.abs() < EPSILON {
        // 共线：取最远两点为直径
        return [
            circle_from_two(a, b),
            circle_from_two(a, c),
            circle_from_two(b, c),
        ]
        .into_iter()
        .fold(Circle::new(*a, 0.0), |best, cand| {
            if cand.radius > best.radius {
                cand
            } else {
                best
            }
        });
    }

    let b2 = bx * bx + by * by;
    let c2 = cx * cx + cy * cy;
    let ux = (cy * b2 - by * c2) / d;
    let uy = (bx * c2 - cx * b2) / d;
    Circle::new(Point2::new(a.x + ux, a.y + uy), (ux * ux + uy * uy).sqrt())
}

/// Kåsa 代数拟合：最小化 Σ(x² + y² + Dx + Ey + F)²
///
/// 先平移到质心以改善条件数。
pub fn least_squares_circle(points: &[Point2]) -> Option<Circle> {
    if points.len() < 3 {
        return None;
    }
    let n = points.len() as f64;
    let (mx, my) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    let (mx, my) = (mx / n, my / n);

    let mut a = Matrix3::<f64>::zeros();
    let mut rhs = Vector3::<f64>::zeros();
    for p in points {
        let (u, v) = (p.x - mx, p.y - my);
        let row = Vector3::new(u, v, 1.0);
        a += row * row.transpose();
        rhs -= row * (u * u + v * v);
    }

    let sol = a.lu().solve(&rhs)?;
    let (cu, cv) = (-sol[0] * 0.5, -sol[1] * 0.5);
    let r2 = cu * cu + cv * cv - sol[2];
    if !r2.is_finite() || r2 <= 0.0 {
        return None;
    }
    Some(Circle::new(Point2::new(cu + mx, cv + my), r2.sqrt()))
}

/// 返回 (最大角间隙, 间隙后的角度, 间隙前的角度)，角度单位为度
///
/// 覆盖范围是最大间隙的补集：从间隙之后的点逆时针到间隙之前的点。
fn largest_angular_gap(points: &[Point2], center: &Point2) -> (f64, f64, f64) {
    let mut angles: Vec<f64> = points
        .iter()
        .map(|p| normalize_degrees((p.y - center.y).atan2(p.x - center.x).to_degrees()))
        .collect();
    angles.sort_by(|a, b| a.total_cmp(b));

    let n = angles.len();
    let mut best = (0.0, 0.0, 0.0);
    for i in 0..n {
        let next = angles[(i + 1) % n];
        let gap = if i + 1 == n {
            next + 360.0 - angles[i]
        } else {
            next - angles[i]
        };
        if gap > best.0 {
            best = (gap, next, angles[i]);
        }
    }
    best
}
