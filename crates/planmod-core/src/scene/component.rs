//! 部件及其属性

use super::types::{new_id, ComponentType, Dimension, MaterialType};
use crate::catalog::CrossSection;
use crate::error::{CoreError, CoreResult};
use crate::math::BoundingBox2;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// 部件属性
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<MaterialType>,
    /// 材料等级，如 `balsa_hard`，查密度表时优先于 `material`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_grade: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<Dimension>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<Dimension>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thickness: Option<Dimension>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_section: Option<CrossSection>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// 自由键值
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom: BTreeMap<String, Value>,
}

fn default_quantity() -> u32 {
    1
}

impl Default for ComponentAttributes {
    fn default() -> Self {
        Self {
            material: None,
            material_grade: None,
            length: None,
            width: None,
            thickness: None,
            cross_section: None,
            quantity: default_quantity(),
            notes: None,
            custom: BTreeMap::new(),
        }
    }
}

impl ComponentAttributes {
    /// 按键名设置属性：已知字段直接赋值，其余写入 `custom`
    pub fn apply(&mut self, key: &str, value: &Value) -> CoreResult<()> {
        let invalid = |reason: &str| CoreError::InvalidAttribute {
            key: key.to_string(),
            reason: reason.to_string(),
        };

        match key {
            "material" => {
                let s = value.as_str().ok_or_else(|| invalid("expected a string"))?;
                self.material =
                    Some(MaterialType::parse(s).ok_or_else(|| invalid("unknown material"))?);
            }
            "material_grade" => {
                let s = value.as_str().ok_or_else(|| invalid("expected a string"))?;
                self.material_grade = Some(s.to_string());
            }
            "length" => self.length = Some(dimension_from_value(value).ok_or_else(|| invalid("expected a dimension"))?),
            "width" => self.width = Some(dimension_from_value(value).ok_or_else(|| invalid("expected a dimension"))?),
            "thickness" => {
                self.thickness =
                    Some(dimension_from_value(value).ok_or_else(|| invalid("expected a dimension"))?)
            }
            "cross_section" => {
                let cs: CrossSection = serde_json::from_value(value.clone())
                    .map_err(|e| invalid(&e.to_string()))?;
                self.cross_section = Some(cs);
            }
            "quantity" => {
                let q = value
                    .as_u64()
                    .and_then(|q| u32::try_from(q).ok())
                    .ok_or_else(|| invalid("expected a non-negative integer"))?;
                self.quantity = q;
            }
            "notes" => {
                let s = value.as_str().ok_or_else(|| invalid("expected a string"))?;
                self.notes = Some(s.to_string());
            }
            _ => {
                self.custom.insert(key.to_string(), value.clone());
            }
        }
        Ok(())
    }

    /// 显式厚度（mm）
    pub fn thickness_mm(&self) -> Option<f64> {
        self.thickness.as_ref().map(Dimension::to_mm)
    }

    pub fn length_mm(&self) -> Option<f64> {
        self.length.as_ref().map(Dimension::to_mm)
    }
}

/// 数字按 mm 解析，字符串按尺寸文本解析，对象按 `{value, unit}` 解析
fn dimension_from_value(value: &Value) -> Option<Dimension> {
    match value {
        Value::Number(n) => n.as_f64().map(Dimension::mm),
        Value::String(s) => Dimension::parse(s),
        Value::Object(_) => serde_json::from_value(value.clone()).ok(),
        _ => None,
    }
}

/// 部件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: String,
    pub name: String,
    pub component_type: ComponentType,
    pub bbox: BoundingBox2,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_id: Option<String>,
    /// 分类置信度 [0, 1]
    pub classification_confidence: f64,
    #[serde(default)]
    pub attributes: ComponentAttributes,
    /// 外部目录关联
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dxf_layer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dxf_block_name: Option<String>,
}

impl Component {
    pub fn new(name: impl Into<String>, component_type: ComponentType, bbox: BoundingBox2) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            component_type,
            bbox,
            view_id: None,
            classification_confidence: 1.0,
            attributes: ComponentAttributes::default(),
            catalog_id: None,
            dxf_layer: None,
            dxf_block_name: None,
        }
    }

    pub fn with_view(mut self, view_id: impl Into<String>) -> Self {
        self.view_id = Some(view_id.into());
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.classification_confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_material(mut self, material: MaterialType) -> Self {
        self.attributes.material = Some(material);
        self
    }
}
