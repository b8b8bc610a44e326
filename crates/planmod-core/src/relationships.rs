//! 关系构建
//!
//! 在已填充视图与部件的场景图上推导三类关系：
//! - contains：视图 → 其部件
//! - adjacent_to：同一视图内包围盒间隙小于阈值的部件对
//! - labels：标注 → 中心距离最近的部件
//!
//! 不做去重，也不检查端点是否存在。

use crate::math::BoundingBox2;
use crate::scene::{Relationship, SceneGraph};
use crate::spatial::SpatialIndex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipOptions {
    /// 相邻判定的间隙阈值（图纸单位）
    pub adjacency_threshold: f64,
    /// 标注搜索半径（图纸单位）
    pub label_search_radius: f64,
}

impl Default for RelationshipOptions {
    fn default() -> Self {
        Self {
            adjacency_threshold: 50.0,
            label_search_radius: 100.0,
        }
    }
}

/// 本次构建新增的关系数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelationshipStats {
    pub contains: usize,
    pub adjacent: usize,
    pub labels: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RelationshipBuilder {
    options: RelationshipOptions,
}

impl RelationshipBuilder {
    pub fn new(options: RelationshipOptions) -> Self {
        Self { options }
    }

    /// 两个包围盒在任一方向上的间隙小于阈值即视为相邻，关系对称
    pub fn are_adjacent(&self, a: &BoundingBox2, b: &BoundingBox2) -> bool {
        a.horizontal_gap(b) < self.options.adjacency_threshold
            || a.vertical_gap(b) < self.options.adjacency_threshold
    }

    pub fn build(&self, graph: &mut SceneGraph) -> RelationshipStats {
        let mut stats = RelationshipStats::default();
        let mut new_edges = Vec::new();

        // contains
        for view in &graph.views {
            for component_id in &view.component_ids {
                new_edges.push(Relationship::contains(&view.id, component_id));
                stats.contains += 1;
            }
        }

        // adjacent_to：每个无序对只输出一条边
        let components = &graph.components;
        for (i, a) in components.iter().enumerate() {
            let Some(view_a) = a.view_id.as_deref() else {
                continue;
            };
            for b in &components[i + 1..] {
                if b.view_id.as_deref() != Some(view_a) {
                    continue;
                }
                if self.are_adjacent(&a.bbox, &b.bbox) {
                    new_edges.push(Relationship::adjacent(&a.id, &b.id));
                    stats.adjacent += 1;
                }
            }
        }

        // labels
        let index = SpatialIndex::from_boxes(
            self.options.label_search_radius,
            components.iter().map(|c| &c.bbox),
        );
        let mut associations = Vec::new();
        for (ai, annotation) in graph.annotations.iter().enumerate() {
            let center = annotation.bbox.center();
            if let Some((ci, dist)) = index.query_nearest(&center, self.options.label_search_radius) {
                let component_id = components[ci].id.clone();
                debug!(
                    "Annotation '{}' labels component {} (distance {:.1})",
                    annotation.text, component_id, dist
                );
                new_edges.push(Relationship::labels(&annotation.id, &component_id));
                associations.push((ai, component_id));
                stats.labels += 1;
            }
        }

        for (ai, component_id) in associations {
            graph.annotations[ai].associated_component_id = Some(component_id);
        }
        graph.relationships.extend(new_edges);

        info!(
            "Built relationships: {} contains, {} adjacent, {} labels",
            stats.contains, stats.adjacent, stats.labels
        );
        stats
    }
}
