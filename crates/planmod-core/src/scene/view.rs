//! 视图

use super::types::{new_id, ViewType};
use crate::math::BoundingBox2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub id: String,
    pub name: String,
    pub view_type: ViewType,
    /// 图纸坐标下的包围盒
    pub bbox: BoundingBox2,
    pub classification_confidence: f64,
    /// 视图内部件 id，保持插入顺序
    #[serde(default)]
    pub component_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dxf_layer: Option<String>,
}

impl View {
    pub fn new(name: impl Into<String>, view_type: ViewType, bbox: BoundingBox2) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            view_type,
            bbox,
            classification_confidence: 1.0,
            component_ids: Vec::new(),
            dxf_layer: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.classification_confidence = confidence.clamp(0.0, 1.0);
        self
    }
}
