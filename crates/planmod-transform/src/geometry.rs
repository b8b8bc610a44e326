//! 替换带来的几何修改
//!
//! 变换作用在部件包围盒和归属该部件的实体上；与之相交的翼肋/隔框，
//! 只有落在原包围盒附近的多段线顶点（即槽口）跟着同一变换移动。

use planmod_core::math::{BoundingBox2, Point2};
use planmod_core::scene::{GeometryEntity, SceneGraph};
use planmod_core::transform::Transform2D;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// 从 `scale` / `offset` 指令解析出的变换参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Directive {
    pub scale: Option<(f64, f64)>,
    pub offset: Option<(f64, f64)>,
}

fn xy(value: &Value) -> Option<(f64, f64)> {
    let x = value.get("x")?.as_f64()?;
    let y = value.get("y")?.as_f64()?;
    Some((x, y))
}

impl Directive {
    /// `scale` 可以是数字或 `{x, y}`，`offset` 必须是 `{x, y}`（像素）
    pub fn parse(
        scale: Option<&Value>,
        offset: Option<&Value>,
    ) -> Result<Self, String> {
        let scale = match scale {
            None => None,
            Some(Value::Number(n)) => {
                let s = n.as_f64().ok_or("scale is not a number")?;
                Some((s, s))
            }
            Some(v) => Some(xy(v).ok_or("scale must be a number or {x, y}")?),
        };
        if let Some((sx, sy)) = scale {
            if !(sx.is_finite() && sy.is_finite()) || sx <= 0.0 || sy <= 0.0 {
                return Err(format!("scale must be positive, got ({}, {})", sx, sy));
            }
        }
        let offset = match offset {
            None => None,
            Some(v) => Some(xy(v).ok_or("offset must be {x, y}")?),
        };
        Ok(Self { scale, offset })
    }

    pub fn is_empty(&self) -> bool {
        self.scale.is_none() && self.offset.is_none()
    }

    /// 先绕包围盒中心缩放，再平移
    pub fn transform(&self, bbox: &BoundingBox2) -> Transform2D {
        let mut t = Transform2D::identity();
        if let Some((sx, sy)) = self.scale {
            t = t.then(&Transform2D::scaling_about(sx, sy, bbox.center()));
        }
        if let Some((dx, dy)) = self.offset {
            t = t.then(&Transform2D::translation(dx, dy));
        }
        t
    }
}

/// 只缩放包围盒短边方向，中心不动
pub fn short_axis_scaling(bbox: &BoundingBox2, factor: f64) -> Transform2D {
    let pivot = bbox.center();
    if bbox.width() <= bbox.height() {
        Transform2D::scaling_about(factor, 1.0, pivot)
    } else {
        Transform2D::scaling_about(1.0, factor, pivot)
    }
}

pub fn transform_box(t: &Transform2D, bbox: &BoundingBox2) -> BoundingBox2 {
    BoundingBox2::from_points(bbox.corners().iter().map(|p| t.apply(p)))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModifierOptions {
    /// 槽口搜索时原包围盒的外扩量（像素）
    pub notch_margin: f64,
}

impl Default for ModifierOptions {
    fn default() -> Self {
        Self { notch_margin: 2.0 }
    }
}

/// 一次修改的计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifyStats {
    pub entities: usize,
    pub notched_entities: usize,
}

#[derive(Debug, Clone, Default)]
pub struct GeometryModifier {
    options: ModifierOptions,
}

impl GeometryModifier {
    pub fn new(options: ModifierOptions) -> Self {
        Self { options }
    }

    /// 变换部件：包围盒、所属实体、相邻翼肋/隔框上的槽口
    pub fn apply(&self, graph: &mut SceneGraph, component_id: &str, t: &Transform2D) -> ModifyStats {
        if t.is_identity() {
            return ModifyStats::default();
        }
        let Some(component) = graph.component_mut(component_id) else {
            return ModifyStats::default();
        };
        let old_bbox = component.bbox;
        component.bbox = transform_box(t, &old_bbox);

        let stats = ModifyStats {
            entities: self.transform_entities(graph, component_id, t),
            notched_entities: self.update_notches(graph, component_id, &old_bbox, t),
        };
        debug!(
            "Transformed component {}: {} entities, {} notched",
            component_id, stats.entities, stats.notched_entities
        );
        stats
    }

    fn transform_entities(&self, graph: &mut SceneGraph, component_id: &str, t: &Transform2D) -> usize {
        let updated: Vec<GeometryEntity> = graph
            .entities_of_component(component_id)
            .map(|e| e.transformed(t))
            .collect();
        let count = updated.len();
        for entity in updated {
            graph.replace_entity(entity);
        }
        count
    }

    /// 对与原包围盒相交的带槽口部件，移动落在外扩包围盒内的多段线顶点
    fn update_notches(
        &self,
        graph: &mut SceneGraph,
        component_id: &str,
        old_bbox: &BoundingBox2,
        t: &Transform2D,
    ) -> usize {
        let region = old_bbox.inflate(self.options.notch_margin);
        let view_id = graph.component(component_id).and_then(|c| c.view_id.clone());

        let mating: Vec<String> = graph
            .components
            .iter()
            .filter(|c| c.id != component_id && c.component_type.has_mating_notches())
            .filter(|c| match (&view_id, &c.view_id) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            })
            .filter(|c| c.bbox.intersects(&region))
            .map(|c| c.id.clone())
            .collect();

        let inside = |p: &Point2| region.contains(p);
        let mut updated = Vec::new();
        for id in &mating {
            updated.extend(
                graph
                    .entities_of_component(id)
                    .filter_map(|e| e.with_vertices_transformed(t, inside)),
            );
        }
        let count = updated.len();
        for entity in updated {
            graph.replace_entity(entity);
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planmod_core::geometry::Shape;
    use planmod_core::scene::{Component, ComponentType};
    use serde_json::json;

    #[test]
    fn test_directive_parsing() {
        let d = Directive::parse(Some(&json!(2.0)), Some(&json!({"x": 1, "y": -3}))).unwrap();
        assert_eq!(d.scale, Some((2.0, 2.0)));
        assert_eq!(d.offset, Some((1.0, -3.0)));
        assert!(Directive::parse(Some(&json!(-1.0)), None).is_err());
        assert!(Directive::parse(None, Some(&json!([1, 2]))).is_err());
        assert!(Directive::parse(None, None).unwrap().is_empty());
    }

    #[test]
    fn test_scale_about_center_then_offset() {
        let bbox = BoundingBox2::from_xywh(0.0, 0.0, 10.0, 10.0);
        let d = Directive::parse(Some(&json!(2.0)), Some(&json!({"x": 5, "y": 0}))).unwrap();
        let moved = transform_box(&d.transform(&bbox), &bbox);
        assert!((moved.min.x - 0.0).abs() < 1e-9 && (moved.max.x - 20.0).abs() < 1e-9);
        assert!((moved.min.y + 5.0).abs() < 1e-9 && (moved.max.y - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_axis_scaling_keeps_length() {
        let spar = BoundingBox2::from_xywh(0.0, 10.0, 100.0, 4.0);
        let wider = transform_box(&short_axis_scaling(&spar, 1.5), &spar);
        assert!((wider.width() - 100.0).abs() < 1e-9);
        assert!((wider.height() - 6.0).abs() < 1e-9);
        assert!((wider.center() - spar.center()).norm() < 1e-9);
    }

    #[test]
    fn test_notch_vertices_follow_spar() {
        let mut graph = SceneGraph::new("t");
        let spar = graph.add_component(Component::new(
            "spar",
            ComponentType::Spar,
            BoundingBox2::from_xywh(0.0, 10.0, 100.0, 4.0),
        ));
        let rib = graph.add_component(Component::new(
            "rib",
            ComponentType::Rib,
            BoundingBox2::from_xywh(40.0, 0.0, 3.0, 30.0),
        ));
        // 翼肋外形，槽口顶点在 y=10..14
        let outline = vec![
            Point2::new(40.0, 0.0),
            Point2::new(43.0, 0.0),
            Point2::new(43.0, 10.0),
            Point2::new(43.0, 14.0),
            Point2::new(43.0, 30.0),
            Point2::new(40.0, 30.0),
        ];
        graph.add_entity(GeometryEntity::polyline(outline, true).with_component(&rib));

        let t = short_axis_scaling(&graph.component(&spar).unwrap().bbox, 2.0);
        let stats = GeometryModifier::default().apply(&mut graph, &spar, &t);

        assert_eq!(stats.notched_entities, 1);
        let spar_box = graph.component(&spar).unwrap().bbox;
        assert!((spar_box.min.y - 8.0).abs() < 1e-9 && (spar_box.max.y - 16.0).abs() < 1e-9);
        match graph.entities[0].shape() {
            Shape::Polyline(pl) => {
                let ys: Vec<f64> = pl.points.iter().map(|p| p.y).collect();
                assert_eq!(ys, vec![0.0, 0.0, 8.0, 16.0, 30.0, 30.0]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
