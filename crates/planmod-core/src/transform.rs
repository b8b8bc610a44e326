//! 二维仿射变换
//!
//! 齐次坐标 3x3 矩阵，支持平移、（非均匀）缩放及其组合。

use crate::math::{Point2, Vector2};
use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform2D {
    matrix: Matrix3<f64>,
}

impl Transform2D {
    pub fn identity() -> Self {
        Self {
            matrix: Matrix3::identity(),
        }
    }

    pub fn translation(dx: f64, dy: f64) -> Self {
        Self {
            matrix: Matrix3::new_translation(&Vector2::new(dx, dy)),
        }
    }

    /// 以原点为中心缩放
    pub fn scaling(sx: f64, sy: f64) -> Self {
        Self {
            matrix: Matrix3::new_nonuniform_scaling(&Vector2::new(sx, sy)),
        }
    }

    /// 以 pivot 为中心缩放
    pub fn scaling_about(sx: f64, sy: f64, pivot: Point2) -> Self {
        Self {
            matrix: Matrix3::new_nonuniform_scaling_wrt_point(&Vector2::new(sx, sy), &pivot),
        }
    }

    /// 先应用 self，再应用 next
    pub fn then(&self, next: &Transform2D) -> Self {
        Self {
            matrix: next.matrix * self.matrix,
        }
    }

    pub fn inverse(&self) -> Option<Self> {
        self.matrix.try_inverse().map(|matrix| Self { matrix })
    }

    pub fn apply(&self, p: &Point2) -> Point2 {
        self.matrix.transform_point(p)
    }

    pub fn apply_vector(&self, v: &Vector2) -> Vector2 {
        self.matrix.transform_vector(v)
    }

    /// x/y 轴方向的缩放系数（仅对轴对齐变换有意义）
    pub fn axis_scale(&self) -> (f64, f64) {
        (self.matrix[(0, 0)], self.matrix[(1, 1)])
    }

    /// 是否包含 y 轴翻转
    pub fn flips_orientation(&self) -> bool {
        let det = self.matrix[(0, 0)] * self.matrix[(1, 1)] - self.matrix[(0, 1)] * self.matrix[(1, 0)];
        det < 0.0
    }

    /// 半径等标量长度的近似缩放系数（几何平均）
    pub fn length_scale(&self) -> f64 {
        let det = self.matrix[(0, 0)] * self.matrix[(1, 1)] - self.matrix[(0, 1)] * self.matrix[(1, 0)];
        det.abs().sqrt()
    }

    pub fn is_identity(&self) -> bool {
        (self.matrix - Matrix3::identity()).abs().max() < 1e-12
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaling_about_pivot_keeps_pivot() {
        let pivot = Point2::new(10.0, 20.0);
        let t = Transform2D::scaling_about(2.0, 0.5, pivot);
        assert_eq!(t.apply(&pivot), pivot);

        let p = t.apply(&Point2::new(12.0, 24.0));
        assert!((p.x - 14.0).abs() < 1e-12);
        assert!((p.y - 22.0).abs() < 1e-12);
    }

    #[test]
    fn test_compose_and_inverse() {
        let t = Transform2D::translation(5.0, -3.0).then(&Transform2D::scaling(2.0, 2.0));
        let p = t.apply(&Point2::new(1.0, 1.0));
        assert_eq!(p, Point2::new(12.0, -4.0));

        let back = t.inverse().unwrap().apply(&p);
        assert!((back.x - 1.0).abs() < 1e-12 && (back.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_flip_detection() {
        assert!(Transform2D::scaling(1.0, -1.0).flips_orientation());
        assert!(!Transform2D::scaling(2.0, 3.0).flips_orientation());
    }
}
