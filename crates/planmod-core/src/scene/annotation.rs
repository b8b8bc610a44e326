//! 文字标注

use super::types::{new_id, AnnotationType, Dimension};
use crate::math::BoundingBox2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: String,
    pub text: String,
    pub bbox: BoundingBox2,
    #[serde(default)]
    pub annotation_type: AnnotationType,
    /// 解析出的尺寸值
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<Dimension>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub associated_component_id: Option<String>,
}

impl Annotation {
    pub fn new(text: impl Into<String>, annotation_type: AnnotationType, bbox: BoundingBox2) -> Self {
        let text = text.into();
        let dimension = match annotation_type {
            AnnotationType::Dimension => Dimension::parse(&text),
            _ => None,
        };
        Self {
            id: new_id(),
            text,
            bbox,
            annotation_type,
            dimension,
            associated_component_id: None,
        }
    }
}
