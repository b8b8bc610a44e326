//! 图一致性检查
//!
//! 构建阶段允许悬空引用与重复关系，这里只报告问题，不自动修复。

use super::{RelationshipType, SceneGraph};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationIssue {
    /// 部件引用了不存在的视图
    MissingView { component_id: String, view_id: String },
    /// 视图的部件列表引用了不存在的部件
    MissingComponent { view_id: String, component_id: String },
    /// 关系端点不存在
    DanglingRelationship {
        relationship_type: RelationshipType,
        missing_id: String,
    },
    DuplicateRelationship {
        relationship_type: RelationshipType,
        source_id: String,
        target_id: String,
    },
    /// 标注关联了不存在的部件
    MissingAnnotationTarget { annotation_id: String, component_id: String },
    /// 实体引用了不存在的视图或部件
    MissingEntityOwner { entity_id: String, owner_id: String },
    DuplicateId { id: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::MissingView { component_id, view_id } => {
                write!(f, "component {component_id} references missing view {view_id}")
            }
            ValidationIssue::MissingComponent { view_id, component_id } => {
                write!(f, "view {view_id} lists missing component {component_id}")
            }
            ValidationIssue::DanglingRelationship {
                relationship_type,
                missing_id,
            } => write!(
                f,
                "{} relationship references missing id {missing_id}",
                relationship_type.as_str()
            ),
            ValidationIssue::DuplicateRelationship {
                relationship_type,
                source_id,
                target_id,
            } => write!(
                f,
                "duplicate {} relationship {source_id} -> {target_id}",
                relationship_type.as_str()
            ),
            ValidationIssue::MissingAnnotationTarget {
                annotation_id,
                component_id,
            } => write!(
                f,
                "annotation {annotation_id} is associated with missing component {component_id}"
            ),
            ValidationIssue::MissingEntityOwner { entity_id, owner_id } => {
                write!(f, "entity {entity_id} references missing owner {owner_id}")
            }
            ValidationIssue::DuplicateId { id } => write!(f, "id {id} is used more than once"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }
}

impl SceneGraph {
    /// 报告悬空引用、重复关系与重复 id
    pub fn validate(&self) -> ValidationReport {
        let mut issues = Vec::new();

        let view_ids: HashSet<&str> = self.views.iter().map(|v| v.id.as_str()).collect();
        let component_ids: HashSet<&str> = self.components.iter().map(|c| c.id.as_str()).collect();

        let mut seen = HashSet::new();
        let all_ids = self
            .views
            .iter()
            .map(|v| v.id.as_str())
            .chain(self.components.iter().map(|c| c.id.as_str()))
            .chain(self.entities.iter().map(|e| e.id()))
            .chain(self.annotations.iter().map(|a| a.id.as_str()));
        for id in all_ids {
            if !seen.insert(id) {
                issues.push(ValidationIssue::DuplicateId { id: id.to_string() });
            }
        }

        for c in &self.components {
            if let Some(view_id) = &c.view_id {
                if !view_ids.contains(view_id.as_str()) {
                    issues.push(ValidationIssue::MissingView {
                        component_id: c.id.clone(),
                        view_id: view_id.clone(),
                    });
                }
            }
        }

        for v in &self.views {
            for cid in &v.component_ids {
                if !component_ids.contains(cid.as_str()) {
                    issues.push(ValidationIssue::MissingComponent {
                        view_id: v.id.clone(),
                        component_id: cid.clone(),
                    });
                }
            }
        }

        let mut seen_rel = HashSet::new();
        for r in &self.relationships {
            for endpoint in [&r.source_id, &r.target_id] {
                if !seen.contains(endpoint.as_str()) {
                    issues.push(ValidationIssue::DanglingRelationship {
                        relationship_type: r.relationship_type,
                        missing_id: endpoint.clone(),
                    });
                }
            }
            if !seen_rel.insert(r) {
                issues.push(ValidationIssue::DuplicateRelationship {
                    relationship_type: r.relationship_type,
                    source_id: r.source_id.clone(),
                    target_id: r.target_id.clone(),
                });
            }
        }

        for a in &self.annotations {
            if let Some(cid) = &a.associated_component_id {
                if !component_ids.contains(cid.as_str()) {
                    issues.push(ValidationIssue::MissingAnnotationTarget {
                        annotation_id: a.id.clone(),
                        component_id: cid.clone(),
                    });
                }
            }
        }

        for e in &self.entities {
            let owners = [
                e.view_id().filter(|id| !view_ids.contains(id)),
                e.component_id().filter(|id| !component_ids.contains(id)),
            ];
            for owner in owners.into_iter().flatten() {
                issues.push(ValidationIssue::MissingEntityOwner {
                    entity_id: e.id().to_string(),
                    owner_id: owner.to_string(),
                });
            }
        }

        ValidationReport { issues }
    }

    /// 去除重复关系，保留首次出现的顺序。返回移除数量。
    pub fn dedup_relationships(&mut self) -> usize {
        let before = self.relationships.len();
        let mut seen = HashSet::new();
        self.relationships.retain(|r| seen.insert(r.clone()));
        before - self.relationships.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::BoundingBox2;
    use crate::scene::{Component, ComponentType, Relationship};

    #[test]
    fn test_reports_dangling_and_duplicates() {
        let mut graph = SceneGraph::new("t");
        let a = graph.add_component(Component::new("a", ComponentType::Rib, BoundingBox2::default()));
        let mut orphan = Component::new("b", ComponentType::Rib, BoundingBox2::default());
        orphan.view_id = Some("no-such-view".into());
        graph.add_component(orphan);

        graph.add_relationship(Relationship::adjacent(&a, "ghost"));
        graph.add_relationship(Relationship::adjacent(&a, "ghost"));

        let report = graph.validate();
        assert!(!report.is_ok());
        assert!(report
            .issues
            .iter()
            .any(|i| matches!(i, ValidationIssue::MissingView { .. })));
        assert_eq!(
            report
                .issues
                .iter()
                .filter(|i| matches!(i, ValidationIssue::DanglingRelationship { .. }))
                .count(),
            2
        );
        assert!(report
            .issues
            .iter()
            .any(|i| matches!(i, ValidationIssue::DuplicateRelationship { .. })));
    }

    #[test]
    fn test_dedup_is_opt_in() {
        let mut graph = SceneGraph::new("t");
        graph.add_relationship(Relationship::contains("v", "c"));
        graph.add_relationship(Relationship::contains("v", "c"));
        assert_eq!(graph.relationships.len(), 2);

        assert_eq!(graph.dedup_relationships(), 1);
        assert_eq!(graph.relationships.len(), 1);
    }
}
