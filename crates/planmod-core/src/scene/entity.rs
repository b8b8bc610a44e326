//! 几何实体
//!
//! 创建后几何不可变，只有图层可以重新分配。几何变换会生成同 id 的新实体。

use super::types::new_id;
use crate::error::GeometryError;
use crate::geometry::{Arc, Circle, EntityKind, Line, Polyline, Shape};
use crate::math::{BoundingBox2, Point2};
use crate::transform::Transform2D;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryEntity {
    id: String,
    shape: Shape,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    view_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    component_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    layer: Option<String>,
}

impl GeometryEntity {
    pub fn new(shape: Shape) -> Self {
        Self {
            id: new_id(),
            shape,
            view_id: None,
            component_id: None,
            layer: None,
        }
    }

    pub fn line(start: Point2, end: Point2) -> Self {
        Self::new(Shape::Line(Line::new(start, end)))
    }

    pub fn polyline(points: Vec<Point2>, closed: bool) -> Self {
        Self::new(Shape::Polyline(Polyline::new(points, closed)))
    }

    pub fn circle(center: Point2, radius: f64) -> Self {
        Self::new(Shape::Circle(Circle::new(center, radius)))
    }

    pub fn arc(center: Point2, radius: f64, start_angle: f64, end_angle: f64) -> Self {
        Self::new(Shape::Arc(Arc::new(center, radius, start_angle, end_angle)))
    }

    pub fn pass_through(dxf_type: impl Into<String>) -> Self {
        Self::new(Shape::PassThrough {
            dxf_type: dxf_type.into(),
        })
    }

    pub fn with_view(mut self, view_id: impl Into<String>) -> Self {
        self.view_id = Some(view_id.into());
        self
    }

    pub fn with_component(mut self, component_id: impl Into<String>) -> Self {
        self.component_id = Some(component_id.into());
        self
    }

    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = Some(layer.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn kind(&self) -> EntityKind {
        self.shape.kind()
    }

    pub fn view_id(&self) -> Option<&str> {
        self.view_id.as_deref()
    }

    pub fn component_id(&self) -> Option<&str> {
        self.component_id.as_deref()
    }

    pub fn layer(&self) -> Option<&str> {
        self.layer.as_deref()
    }

    pub fn set_layer(&mut self, layer: impl Into<String>) {
        self.layer = Some(layer.into());
    }

    pub fn bounding_box(&self) -> BoundingBox2 {
        self.shape.bounding_box()
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        self.shape.validate()
    }

    /// 返回变换后的同 id 实体
    pub fn transformed(&self, t: &Transform2D) -> GeometryEntity {
        GeometryEntity {
            shape: self.shape.transformed(t),
            ..self.clone()
        }
    }

    /// 只变换满足条件的多段线顶点；没有顶点被修改时返回 None
    pub fn with_vertices_transformed(
        &self,
        t: &Transform2D,
        predicate: impl Fn(&Point2) -> bool,
    ) -> Option<GeometryEntity> {
        let mut shape = self.shape.clone();
        if shape.transform_vertices_where(t, predicate) == 0 {
            return None;
        }
        Some(GeometryEntity {
            shape,
            ..self.clone()
        })
    }
}
