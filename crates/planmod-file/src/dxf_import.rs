//! DXF 导入
//!
//! 把已有图纸中的实体读成几何实体。直线、圆、圆弧、多段线按原样转换，
//! 其余类型变成只带类型名的占位实体，写出时会被跳过。
//!
//! DXF 的 y 轴向上。建立场景图时以图纸范围的上沿为图像高度把 y 翻转成
//! 场景图的 y 向下约定，按 1 单位/像素写回时坐标不变。

use crate::error::FileResult;
use crate::reader::{dxf_type_name, load_drawing};
use planmod_core::geometry::Shape;
use planmod_core::math::{BoundingBox2, Point2};
use planmod_core::scene::{GeometryEntity, SceneGraph};
use planmod_core::transform::Transform2D;
use std::collections::BTreeMap;
use tracing::{debug, info};

fn point(p: &dxf::Point) -> Point2 {
    Point2::new(p.x, p.y)
}

/// 转换单个 DXF 实体，保留图层名
pub fn convert_entity(entity: &dxf::entities::Entity) -> GeometryEntity {
    use dxf::entities::EntityType as E;
    let converted = match &entity.specific {
        E::Line(line) => GeometryEntity::line(point(&line.p1), point(&line.p2)),
        E::Circle(circle) => GeometryEntity::circle(point(&circle.center), circle.radius),
        E::Arc(arc) => GeometryEntity::arc(
            point(&arc.center),
            arc.radius,
            arc.start_angle,
            arc.end_angle,
        ),
        E::LwPolyline(lwpoly) => GeometryEntity::polyline(
            lwpoly.vertices.iter().map(|v| Point2::new(v.x, v.y)).collect(),
            lwpoly.is_closed(),
        ),
        E::Polyline(poly) => GeometryEntity::polyline(
            poly.vertices().map(|v| point(&v.location)).collect(),
            poly.is_closed(),
        ),
        other => GeometryEntity::pass_through(dxf_type_name(other)),
    };
    if entity.common.layer.is_empty() {
        converted
    } else {
        converted.with_layer(entity.common.layer.clone())
    }
}

/// 读取 DXF 字节流中的全部实体（图纸坐标，y 向上）
pub fn import_entities(bytes: &[u8]) -> FileResult<Vec<GeometryEntity>> {
    let drawing = load_drawing(bytes)?;
    let entities: Vec<GeometryEntity> = drawing.entities().map(convert_entity).collect();
    debug!("Imported {} DXF entities", entities.len());
    Ok(entities)
}

/// 从 DXF 建立只含几何实体的场景图
pub fn import_scene(bytes: &[u8], title: &str) -> FileResult<SceneGraph> {
    let entities = import_entities(bytes)?;
    let (width, height) = image_size(&entities);
    let to_image = Transform2D::scaling(1.0, -1.0)
        .then(&Transform2D::translation(0.0, f64::from(height)));

    let mut graph = SceneGraph::new(title).with_image_size(width, height);
    let mut placeholders: BTreeMap<String, usize> = BTreeMap::new();
    for entity in entities {
        if let Shape::PassThrough { dxf_type } = entity.shape() {
            *placeholders.entry(dxf_type.clone()).or_insert(0) += 1;
        }
        graph.add_entity(entity.transformed(&to_image));
    }

    let total = graph.entities.len();
    graph.add_processing_note(format!("Imported {} entities from DXF", total));
    for (dxf_type, count) in placeholders {
        graph.add_uncertainty(format!(
            "{} {} entities kept as placeholders",
            count, dxf_type
        ));
    }
    info!("Imported DXF scene '{}' with {} entities", title, total);
    Ok(graph)
}

/// 图纸范围右上角向上取整；负坐标方向不计入
fn image_size(entities: &[GeometryEntity]) -> (u32, u32) {
    let mut extents = BoundingBox2::empty();
    for bbox in entities.iter().map(GeometryEntity::bounding_box) {
        if bbox.is_empty() || !bbox.is_finite() {
            continue;
        }
        extents.expand_to_include(&bbox.min);
        extents.expand_to_include(&bbox.max);
    }
    if extents.is_empty() {
        return (0, 0);
    }
    let side = |v: f64| v.ceil().clamp(0.0, f64::from(u32::MAX)) as u32;
    (side(extents.max.x), side(extents.max.y))
}
