//! DXF 输出
//!
//! 场景图坐标是像素（y 向下），写出时统一换算为毫米并翻转 y 轴。
//! 单个实体构造失败只记录日志并跳过，不影响其余内容。

use crate::blocks::BlockManager;
use crate::error::FileResult;
use crate::layout::{component_layer_name, view_layer_name};
use crate::palette::{self, AciColor, ADMIN_LAYERS};
use planmod_core::error::GeometryError;
use planmod_core::geometry::{Polyline, Shape};
use planmod_core::math::{BoundingBox2, Point2};
use planmod_core::scene::{Component, SceneGraph};
use planmod_core::transform::Transform2D;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info, warn};

/// `$PROJECTNAME` 的最大长度
pub const MAX_PROJECT_NAME_LEN: usize = 255;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterOptions {
    /// 每像素对应的毫米数
    pub units_per_pixel: f64,
    /// 图像 y 轴向下，DXF y 轴向上
    pub flip_y: bool,
    pub view_label_height: f64,
    pub component_label_height: f64,
    pub annotation_text_height: f64,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            units_per_pixel: 1.0,
            flip_y: true,
            view_label_height: 5.0,
            component_label_height: 2.0,
            annotation_text_height: 3.0,
        }
    }
}

/// 一次写出的统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteStats {
    pub layers: usize,
    pub blocks: usize,
    pub inserts: usize,
    pub outlines: usize,
    pub entities: usize,
    /// 跳过的占位实体
    pub placeholders: usize,
    /// 构造失败而跳过的实体
    pub failed: usize,
    pub texts: usize,
}

fn point(p: &Point2) -> dxf::Point {
    dxf::Point::new(p.x, p.y, 0.0)
}

/// 把几何形状转换为 DXF 图元
///
/// 先校验形状；占位实体与不合法的形状返回错误。
pub fn shape_to_dxf(shape: &Shape) -> Result<dxf::entities::EntityType, GeometryError> {
    shape.validate()?;
    let specific = match shape {
        Shape::Line(line) => {
            let mut dxf_line = dxf::entities::Line::default();
            dxf_line.p1 = point(&line.start);
            dxf_line.p2 = point(&line.end);
            dxf::entities::EntityType::Line(dxf_line)
        }
        Shape::Polyline(polyline) => {
            let mut lwpoly = dxf::entities::LwPolyline::default();
            lwpoly.set_is_closed(polyline.closed);
            lwpoly.vertices = polyline
                .points
                .iter()
                .map(|p| {
                    let mut vertex = dxf::LwPolylineVertex::default();
                    vertex.x = p.x;
                    vertex.y = p.y;
                    vertex
                })
                .collect();
            dxf::entities::EntityType::LwPolyline(lwpoly)
        }
        Shape::Circle(circle) => {
            let mut dxf_circle = dxf::entities::Circle::default();
            dxf_circle.center = point(&circle.center);
            dxf_circle.radius = circle.radius;
            dxf::entities::EntityType::Circle(dxf_circle)
        }
        Shape::Arc(arc) => {
            let mut dxf_arc = dxf::entities::Arc::default();
            dxf_arc.center = point(&arc.center);
            dxf_arc.radius = arc.radius;
            dxf_arc.start_angle = arc.start_angle;
            dxf_arc.end_angle = arc.end_angle;
            dxf::entities::EntityType::Arc(dxf_arc)
        }
        Shape::PassThrough { dxf_type } => {
            return Err(GeometryError::Placeholder(dxf_type.clone()));
        }
    };
    Ok(specific)
}

fn text(location: Point2, height: f64, value: &str) -> dxf::entities::EntityType {
    let mut dxf_text = dxf::entities::Text::default();
    dxf_text.location = point(&location);
    dxf_text.text_height = height;
    dxf_text.value = value.to_string();
    dxf::entities::EntityType::Text(dxf_text)
}

fn outline(bbox: &BoundingBox2) -> Shape {
    Shape::Polyline(Polyline::new(bbox.corners().to_vec(), true))
}

/// 场景图 → DXF
#[derive(Debug, Clone, Default)]
pub struct CadWriter {
    options: WriterOptions,
}

impl CadWriter {
    pub fn new(options: WriterOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    /// 像素坐标到图纸坐标的变换
    pub fn drawing_transform(&self, graph: &SceneGraph) -> Transform2D {
        let s = self.options.units_per_pixel;
        if self.options.flip_y {
            let h = f64::from(graph.image_height) * s;
            Transform2D::scaling(s, -s).then(&Transform2D::translation(0.0, h))
        } else {
            Transform2D::scaling(s, s)
        }
    }

    /// 构建 DXF 文档
    pub fn build(&self, graph: &SceneGraph) -> (dxf::Drawing, WriteStats) {
        let mut drawing = dxf::Drawing::new();
        drawing.header.version = dxf::enums::AcadVersion::R2010;
        drawing.header.default_drawing_units = dxf::enums::Units::Millimeters;
        drawing.header.project_name = graph.title.chars().take(MAX_PROJECT_NAME_LEN).collect();

        let mut stats = WriteStats::default();
        let t = self.drawing_transform(graph);

        stats.layers = self.write_layers(&mut drawing, graph);

        for view in &graph.views {
            let layer = view
                .dxf_layer
                .clone()
                .unwrap_or_else(|| view_layer_name(view.view_type));
            let bbox = transform_box(&t, &view.bbox);
            if self.push_shape(&mut drawing, &outline(&bbox), &layer) {
                stats.outlines += 1;
            }
            let label = Point2::new(bbox.min.x, bbox.max.y + self.options.view_label_height);
            push(
                &mut drawing,
                text(label, self.options.view_label_height, &view.name),
                &layer,
            );
            stats.texts += 1;
        }

        let mut blocks = BlockManager::new();
        for component in &graph.components {
            self.write_component(&mut drawing, &mut blocks, &mut stats, &t, component);
        }
        stats.blocks = blocks.defined().count();

        for entity in &graph.entities {
            if entity.shape().is_placeholder() {
                stats.placeholders += 1;
                continue;
            }
            let shape = entity.shape().transformed(&t);
            match shape_to_dxf(&shape) {
                Ok(specific) => {
                    push(
                        &mut drawing,
                        specific,
                        entity.layer().unwrap_or(palette::LAYER_ZERO),
                    );
                    stats.entities += 1;
                }
                Err(e) => {
                    warn!("Skipping entity {}: {}", entity.id(), e);
                    stats.failed += 1;
                }
            }
        }

        for annotation in &graph.annotations {
            let bbox = transform_box(&t, &annotation.bbox);
            push(
                &mut drawing,
                text(bbox.min, self.options.annotation_text_height, &annotation.text),
                palette::LAYER_ANNOTATIONS,
            );
            stats.texts += 1;
        }

        info!(
            "Built DXF: {} layers, {} blocks, {} inserts, {} entities ({} skipped)",
            stats.layers,
            stats.blocks,
            stats.inserts,
            stats.entities,
            stats.placeholders + stats.failed
        );
        (drawing, stats)
    }

    /// 写出为字节流
    pub fn write(&self, graph: &SceneGraph) -> FileResult<Vec<u8>> {
        let (drawing, _) = self.build(graph);
        let mut buf = Vec::new();
        drawing.save(&mut buf)?;
        Ok(buf)
    }

    pub fn write_file(&self, graph: &SceneGraph, path: &Path) -> FileResult<WriteStats> {
        let (drawing, stats) = self.build(graph);
        drawing.save_file(path)?;
        info!("Saved DXF: {}", path.display());
        Ok(stats)
    }

    /// 管理图层 + 视图/部件图层；返回新增图层数
    fn write_layers(&self, drawing: &mut dxf::Drawing, graph: &SceneGraph) -> usize {
        let mut names: Vec<(String, AciColor)> = ADMIN_LAYERS
            .iter()
            .map(|(name, color)| (name.to_string(), *color))
            .collect();

        let mut seen = BTreeSet::new();
        for view in &graph.views {
            let name = view
                .dxf_layer
                .clone()
                .unwrap_or_else(|| view_layer_name(view.view_type));
            if seen.insert(name.clone()) {
                names.push((name, palette::view_color(view.view_type)));
            }
        }
        for component in &graph.components {
            let name = component
                .dxf_layer
                .clone()
                .unwrap_or_else(|| component_layer_name(component.component_type));
            if seen.insert(name.clone()) {
                names.push((name, palette::component_color(component.component_type)));
            }
        }
        for entity in &graph.entities {
            if let Some(name) = entity.layer() {
                if seen.insert(name.to_string()) {
                    names.push((name.to_string(), palette::layer_color(name)));
                }
            }
        }

        let mut added = 0;
        for (name, color) in names {
            if drawing.layers().any(|l| l.name == name) {
                continue;
            }
            let mut layer = dxf::tables::Layer::default();
            layer.name = name;
            layer.color = color.to_dxf();
            drawing.add_layer(layer);
            added += 1;
        }
        debug!("Added {} layers", added);
        added
    }

    fn write_component(
        &self,
        drawing: &mut dxf::Drawing,
        blocks: &mut BlockManager,
        stats: &mut WriteStats,
        t: &Transform2D,
        component: &Component,
    ) {
        let layer = component
            .dxf_layer
            .clone()
            .unwrap_or_else(|| component_layer_name(component.component_type));
        let bbox = transform_box(t, &component.bbox);

        if let Some(name) = &component.dxf_block_name {
            let defined = blocks.ensure_block(
                drawing,
                name,
                component.component_type,
                bbox.width(),
                bbox.height(),
                &layer,
            );
            if defined {
                let mut insert = dxf::entities::Insert::default();
                insert.name = name.clone();
                insert.location = point(&bbox.min);
                push(drawing, dxf::entities::EntityType::Insert(insert), &layer);
                stats.inserts += 1;
                return;
            }
        }

        // 没有块：画外框并标注
        if self.push_shape(drawing, &outline(&bbox), &layer) {
            stats.outlines += 1;
        }
        let label = if component.name.trim().is_empty() {
            component.id.as_str()
        } else {
            component.name.as_str()
        };
        push(
            drawing,
            text(bbox.center(), self.options.component_label_height, label),
            &layer,
        );
        stats.texts += 1;
    }

    fn push_shape(&self, drawing: &mut dxf::Drawing, shape: &Shape, layer: &str) -> bool {
        match shape_to_dxf(shape) {
            Ok(specific) => {
                push(drawing, specific, layer);
                true
            }
            Err(e) => {
                warn!("Skipping outline on {}: {}", layer, e);
                false
            }
        }
    }
}

fn push(drawing: &mut dxf::Drawing, specific: dxf::entities::EntityType, layer: &str) {
    let mut entity = dxf::entities::Entity::new(specific);
    entity.common.layer = layer.to_string();
    drawing.add_entity(entity);
}

fn transform_box(t: &Transform2D, bbox: &BoundingBox2) -> BoundingBox2 {
    BoundingBox2::from_points(bbox.corners().iter().map(|p| t.apply(p)))
}
