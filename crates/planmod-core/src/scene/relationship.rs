//! 实体间关系边

use super::types::RelationshipType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Relationship {
    pub relationship_type: RelationshipType,
    pub source_id: String,
    pub target_id: String,
}

impl Relationship {
    pub fn new(
        relationship_type: RelationshipType,
        source_id: impl Into<String>,
        target_id: impl Into<String>,
    ) -> Self {
        Self {
            relationship_type,
            source_id: source_id.into(),
            target_id: target_id.into(),
        }
    }

    pub fn contains(view_id: &str, component_id: &str) -> Self {
        Self::new(RelationshipType::Contains, view_id, component_id)
    }

    pub fn adjacent(a: &str, b: &str) -> Self {
        Self::new(RelationshipType::AdjacentTo, a, b)
    }

    pub fn labels(annotation_id: &str, component_id: &str) -> Self {
        Self::new(RelationshipType::Labels, annotation_id, component_id)
    }

    /// 是否连接 a 与 b（不区分方向）
    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.source_id == a && self.target_id == b) || (self.source_id == b && self.target_id == a)
    }
}
