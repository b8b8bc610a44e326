//! 场景图
//!
//! 一张图纸的全部视图、部件、几何实体、标注与关系。
//! 图是所有记录的唯一所有者，交叉引用一律使用 id 查找。
//!
//! 修改操作都需要 `&mut SceneGraph`，同一时刻只有一个写者。

mod annotation;
mod component;
mod entity;
mod relationship;
pub mod types;
mod validate;
mod view;

pub use annotation::Annotation;
pub use component::{Component, ComponentAttributes};
pub use entity::GeometryEntity;
pub use relationship::Relationship;
pub use types::{
    new_id, AnnotationType, ComponentCategory, ComponentType, Dimension, LengthUnit,
    MaterialType, RelationshipType, ViewType,
};
pub use validate::{ValidationIssue, ValidationReport};
pub use view::View;

use crate::geometry::EntityKind;
use crate::math::Point2;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneGraph {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    /// 源栅格尺寸（像素）
    pub image_width: u32,
    pub image_height: u32,

    pub views: Vec<View>,
    pub components: Vec<Component>,
    pub entities: Vec<GeometryEntity>,
    pub annotations: Vec<Annotation>,
    pub relationships: Vec<Relationship>,

    #[serde(default)]
    pub processing_notes: Vec<String>,
    #[serde(default)]
    pub uncertainties: Vec<String>,

    pub created_at: DateTime<Utc>,
}

/// 各集合的数量统计
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub views: usize,
    pub components: usize,
    pub entities: usize,
    pub annotations: usize,
    pub relationships: usize,
    pub entities_by_kind: BTreeMap<String, usize>,
    pub components_by_type: BTreeMap<String, usize>,
}

impl SceneGraph {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            source_file: None,
            image_width: 0,
            image_height: 0,
            views: Vec::new(),
            components: Vec::new(),
            entities: Vec::new(),
            annotations: Vec::new(),
            relationships: Vec::new(),
            processing_notes: Vec::new(),
            uncertainties: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_image_size(mut self, width: u32, height: u32) -> Self {
        self.image_width = width;
        self.image_height = height;
        self
    }

    // ---- 添加 ----

    pub fn add_view(&mut self, view: View) -> String {
        let id = view.id.clone();
        self.views.push(view);
        id
    }

    /// 添加部件；若部件指向的视图存在，同时把 id 追加到视图的部件列表
    pub fn add_component(&mut self, component: Component) -> String {
        let id = component.id.clone();
        if let Some(view_id) = component.view_id.as_deref() {
            if let Some(view) = self.views.iter_mut().find(|v| v.id == view_id) {
                if !view.component_ids.contains(&id) {
                    view.component_ids.push(id.clone());
                }
            }
        }
        self.components.push(component);
        id
    }

    pub fn add_entity(&mut self, entity: GeometryEntity) -> String {
        let id = entity.id().to_string();
        self.entities.push(entity);
        id
    }

    pub fn add_annotation(&mut self, annotation: Annotation) -> String {
        let id = annotation.id.clone();
        self.annotations.push(annotation);
        id
    }

    /// 不去重、不检查端点，见 [`SceneGraph::validate`]
    pub fn add_relationship(&mut self, relationship: Relationship) {
        self.relationships.push(relationship);
    }

    pub fn add_processing_note(&mut self, note: impl Into<String>) {
        self.processing_notes.push(note.into());
    }

    pub fn add_uncertainty(&mut self, note: impl Into<String>) {
        self.uncertainties.push(note.into());
    }

    // ---- 查询 ----

    pub fn view(&self, id: &str) -> Option<&View> {
        self.views.iter().find(|v| v.id == id)
    }

    pub fn view_mut(&mut self, id: &str) -> Option<&mut View> {
        self.views.iter_mut().find(|v| v.id == id)
    }

    pub fn component(&self, id: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.id == id)
    }

    pub fn component_mut(&mut self, id: &str) -> Option<&mut Component> {
        self.components.iter_mut().find(|c| c.id == id)
    }

    pub fn entity(&self, id: &str) -> Option<&GeometryEntity> {
        self.entities.iter().find(|e| e.id() == id)
    }

    pub fn annotation(&self, id: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    /// 任意集合中是否存在该 id
    pub fn contains_id(&self, id: &str) -> bool {
        self.view(id).is_some()
            || self.component(id).is_some()
            || self.entity(id).is_some()
            || self.annotation(id).is_some()
    }

    pub fn components_of_type(&self, component_type: ComponentType) -> impl Iterator<Item = &Component> {
        self.components
            .iter()
            .filter(move |c| c.component_type == component_type)
    }

    pub fn components_in_view(&self, view_id: &str) -> impl Iterator<Item = &Component> {
        let view_id = view_id.to_string();
        self.components
            .iter()
            .filter(move |c| c.view_id.as_deref() == Some(view_id.as_str()))
    }

    pub fn entities_of_component(&self, component_id: &str) -> impl Iterator<Item = &GeometryEntity> {
        let component_id = component_id.to_string();
        self.entities
            .iter()
            .filter(move |e| e.component_id() == Some(component_id.as_str()))
    }

    pub fn relationships_of(&self, id: &str) -> impl Iterator<Item = &Relationship> {
        let id = id.to_string();
        self.relationships
            .iter()
            .filter(move |r| r.source_id == id || r.target_id == id)
    }

    /// 第一个包含该点的视图
    pub fn view_at(&self, point: &Point2) -> Option<&View> {
        self.views.iter().find(|v| v.bbox.contains(point))
    }

    /// 视图内包含该点的最小部件（面积相同时取先插入者）
    pub fn component_at(&self, view_id: &str, point: &Point2) -> Option<&Component> {
        self.components_in_view(view_id)
            .filter(|c| c.bbox.contains(point))
            .fold(None, |best: Option<&Component>, c| match best {
                Some(b) if b.bbox.area() <= c.bbox.area() => Some(b),
                _ => Some(c),
            })
    }

    /// 按 id 替换实体（用于几何变换后写回）
    pub fn replace_entity(&mut self, entity: GeometryEntity) -> bool {
        match self.entities.iter_mut().find(|e| e.id() == entity.id()) {
            Some(slot) => {
                *slot = entity;
                true
            }
            None => false,
        }
    }

    pub fn summary(&self) -> GraphSummary {
        let mut entities_by_kind: BTreeMap<String, usize> = BTreeMap::new();
        for e in &self.entities {
            *entities_by_kind.entry(e.kind().as_str().to_string()).or_default() += 1;
        }
        let mut components_by_type: BTreeMap<String, usize> = BTreeMap::new();
        for c in &self.components {
            *components_by_type
                .entry(c.component_type.as_str().to_string())
                .or_default() += 1;
        }
        GraphSummary {
            views: self.views.len(),
            components: self.components.len(),
            entities: self.entities.len(),
            annotations: self.annotations.len(),
            relationships: self.relationships.len(),
            entities_by_kind,
            components_by_type,
        }
    }

    /// 指定类型实体的数量
    pub fn count_entities(&self, kind: EntityKind) -> usize {
        self.entities.iter().filter(|e| e.kind() == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::BoundingBox2;

    #[test]
    fn test_add_component_appends_to_view() {
        let mut graph = SceneGraph::new("test");
        let view_id = graph.add_view(View::new(
            "Top",
            ViewType::Top,
            BoundingBox2::from_xywh(0.0, 0.0, 500.0, 300.0),
        ));
        let comp_id = graph.add_component(
            Component::new("Rib 1", ComponentType::Rib, BoundingBox2::from_xywh(10.0, 10.0, 5.0, 80.0))
                .with_view(&view_id),
        );

        assert_eq!(graph.view(&view_id).unwrap().component_ids, vec![comp_id.clone()]);
        assert_eq!(graph.components_in_view(&view_id).count(), 1);
        assert!(graph.contains_id(&comp_id));
    }

    #[test]
    fn test_component_at_prefers_smallest() {
        let mut graph = SceneGraph::new("test");
        let view_id = graph.add_view(View::new(
            "Side",
            ViewType::Side,
            BoundingBox2::from_xywh(0.0, 0.0, 100.0, 100.0),
        ));
        graph.add_component(
            Component::new("big", ComponentType::Skin, BoundingBox2::from_xywh(0.0, 0.0, 100.0, 100.0))
                .with_view(&view_id),
        );
        let small = graph.add_component(
            Component::new("small", ComponentType::Former, BoundingBox2::from_xywh(40.0, 40.0, 20.0, 20.0))
                .with_view(&view_id),
        );

        let hit = graph.component_at(&view_id, &Point2::new(50.0, 50.0)).unwrap();
        assert_eq!(hit.id, small);
    }

    #[test]
    fn test_summary_counts() {
        let mut graph = SceneGraph::new("test");
        graph.add_entity(GeometryEntity::line(Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)));
        graph.add_entity(GeometryEntity::circle(Point2::new(0.0, 0.0), 2.0));
        graph.add_entity(GeometryEntity::circle(Point2::new(5.0, 0.0), 2.0));

        let summary = graph.summary();
        assert_eq!(summary.entities, 3);
        assert_eq!(summary.entities_by_kind.get("circle"), Some(&2));
        assert_eq!(graph.count_entities(EntityKind::Line), 1);
    }
}
