//! 部件块定义
//!
//! 每个块名只定义一次，内容是按部件类型生成的示意图形，
//! 尺寸取部件包围盒（已换算为图纸单位），基点在左下角。

use planmod_core::geometry::{Circle, Line, Polyline, Shape};
use planmod_core::math::Point2;
use planmod_core::scene::ComponentType;
use std::collections::BTreeSet;
use std::f64::consts::TAU;
use tracing::{debug, warn};

/// 翼肋上下表面各自的采样点数
const AIRFOIL_SAMPLES: usize = 20;
/// 隔框椭圆的分段数
const ELLIPSE_SEGMENTS: usize = 24;
/// 翼梁上的木纹线条数
const GRAIN_TICKS: usize = 3;

/// 按类型生成块内图形
pub fn block_shapes(component_type: ComponentType, width: f64, height: f64) -> Vec<Shape> {
    match component_type {
        ComponentType::Rib => airfoil(width, height),
        ComponentType::Former => ellipse_with_cross(width, height),
        ComponentType::Spar => spar(width, height),
        ComponentType::Fastener | ComponentType::Hinge => circle_with_cross(width, height),
        // 原材料与其余类型都用矩形
        _ => vec![rectangle(width, height)],
    }
}

fn rectangle(width: f64, height: f64) -> Shape {
    Shape::Polyline(Polyline::new(
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(width, 0.0),
            Point2::new(width, height),
            Point2::new(0.0, height),
        ],
        true,
    ))
}

fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> Shape {
    Shape::Line(Line::new(Point2::new(x1, y1), Point2::new(x2, y2)))
}

/// 近似翼型：上表面为抛物线厚度分布，下表面取一半，外加一条翼梁槽口线
fn airfoil(width: f64, height: f64) -> Vec<Shape> {
    let mid = height / 2.0;
    let t = 0.3 * height;
    let thickness = |x: f64| {
        let u = if width > 0.0 { 2.0 * x / width - 1.0 } else { 0.0 };
        t * (1.0 - u * u)
    };
    let xs = (0..AIRFOIL_SAMPLES).map(|i| width * i as f64 / (AIRFOIL_SAMPLES - 1) as f64);

    let mut points: Vec<Point2> = xs.clone().map(|x| Point2::new(x, mid + thickness(x))).collect();
    points.extend(xs.rev().map(|x| Point2::new(x, mid - 0.5 * thickness(x))));

    let spar_x = width * 0.25;
    let notch = height * 0.1;
    vec![
        Shape::Polyline(Polyline::new(points, true)),
        line(spar_x, mid - notch, spar_x, mid + notch),
    ]
}

fn ellipse_with_cross(width: f64, height: f64) -> Vec<Shape> {
    let (cx, cy) = (width / 2.0, height / 2.0);
    let points = (0..ELLIPSE_SEGMENTS)
        .map(|i| {
            let a = TAU * i as f64 / ELLIPSE_SEGMENTS as f64;
            Point2::new(cx + cx * a.cos(), cy + cy * a.sin())
        })
        .collect();
    vec![
        Shape::Polyline(Polyline::new(points, true)),
        line(cx - width * 0.1, cy, cx + width * 0.1, cy),
        line(cx, cy - height * 0.1, cx, cy + height * 0.1),
    ]
}

fn spar(width: f64, height: f64) -> Vec<Shape> {
    let mut shapes = vec![rectangle(width, height)];
    for i in 1..=GRAIN_TICKS {
        let x = width * i as f64 / (GRAIN_TICKS + 1) as f64;
        shapes.push(line(x, 0.0, x, height));
    }
    shapes
}

fn circle_with_cross(width: f64, height: f64) -> Vec<Shape> {
    let r = width.min(height) / 2.0;
    let (cx, cy) = (width / 2.0, height / 2.0);
    vec![
        Shape::Circle(Circle::new(Point2::new(cx, cy), r)),
        line(cx - r * 0.5, cy, cx + r * 0.5, cy),
        line(cx, cy - r * 0.5, cx, cy + r * 0.5),
    ]
}

/// 块管理：记录已定义的块名，重复的名称不再定义
#[derive(Debug, Default)]
pub struct BlockManager {
    defined: BTreeSet<String>,
}

impl BlockManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.defined.contains(name)
    }

    pub fn defined(&self) -> impl Iterator<Item = &str> {
        self.defined.iter().map(String::as_str)
    }

    /// 定义块；已存在返回 true，创建失败返回 false
    pub fn ensure_block(
        &mut self,
        drawing: &mut dxf::Drawing,
        name: &str,
        component_type: ComponentType,
        width: f64,
        height: f64,
        layer: &str,
    ) -> bool {
        if self.is_defined(name) {
            return true;
        }
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            warn!("Failed to create block {}: empty size {}x{}", name, width, height);
            return false;
        }

        let mut block = dxf::Block::default();
        block.name = name.to_string();
        block.layer = layer.to_string();
        for shape in block_shapes(component_type, width, height) {
            match crate::writer::shape_to_dxf(&shape) {
                Ok(specific) => {
                    let mut entity = dxf::entities::Entity::new(specific);
                    entity.common.layer = crate::palette::LAYER_ZERO.to_string();
                    block.entities.push(entity);
                }
                Err(e) => warn!("Skipping block {} geometry: {}", name, e),
            }
        }

        drawing.add_block(block);
        self.defined.insert(name.to_string());
        debug!("Created block: {}", name);
        true
    }
}
