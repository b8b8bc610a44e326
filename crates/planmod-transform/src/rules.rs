//! 替换规则
//!
//! 目标选择的优先级：
//! 1. 给了 `target_component_id` 时只按 id 精确匹配
//! 2. 否则按 `target_component_type`，同时满足 `target_criteria`
//! 3. 都没有时只按 `target_criteria`
//!
//! 三者全空的规则不合法。

use planmod_core::scene::types::new_id;
use planmod_core::scene::{Component, ComponentType, MaterialType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// 几何指令键，不写入部件属性
pub const SCALE_KEY: &str = "scale";
pub const OFFSET_KEY: &str = "offset";
pub const CROSS_SECTION_KEY: &str = "cross_section";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetCriteria {
    /// 部件有材料时必须相同；未标注材料的部件不因此被排除
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<MaterialType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_confidence: Option<f64>,
    /// 名称子串，不区分大小写
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_contains: Option<String>,
}

impl TargetCriteria {
    pub fn is_empty(&self) -> bool {
        self.material.is_none() && self.min_confidence.is_none() && self.name_contains.is_none()
    }

    pub fn matches(&self, component: &Component) -> bool {
        if let (Some(wanted), Some(actual)) = (self.material, component.attributes.material) {
            if wanted != actual {
                return false;
            }
        }
        if let Some(min) = self.min_confidence {
            if component.classification_confidence < min {
                return false;
            }
        }
        if let Some(needle) = &self.name_contains {
            if !component
                .name
                .to_lowercase()
                .contains(&needle.to_lowercase())
            {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstitutionRule {
    #[serde(default = "new_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_component_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_component_type: Option<ComponentType>,
    #[serde(default)]
    pub target_criteria: TargetCriteria,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement_catalog_id: Option<String>,
    /// 属性替换；`scale`、`offset` 为几何指令
    #[serde(default)]
    pub replacement_attributes: BTreeMap<String, Value>,
    #[serde(default)]
    pub description: String,
}

impl SubstitutionRule {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            target_component_id: None,
            target_component_type: None,
            target_criteria: TargetCriteria::default(),
            replacement_catalog_id: None,
            replacement_attributes: BTreeMap::new(),
            description: description.into(),
        }
    }

    pub fn for_component(mut self, id: impl Into<String>) -> Self {
        self.target_component_id = Some(id.into());
        self
    }

    pub fn for_type(mut self, component_type: ComponentType) -> Self {
        self.target_component_type = Some(component_type);
        self
    }

    pub fn with_criteria(mut self, criteria: TargetCriteria) -> Self {
        self.target_criteria = criteria;
        self
    }

    pub fn with_catalog(mut self, catalog_id: impl Into<String>) -> Self {
        self.replacement_catalog_id = Some(catalog_id.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.replacement_attributes.insert(key.into(), value);
        self
    }

    /// 日志与处理记录里使用的名称
    pub fn label(&self) -> &str {
        if self.description.is_empty() {
            &self.id
        } else {
            &self.description
        }
    }

    pub fn has_target(&self) -> bool {
        self.target_component_id.is_some()
            || self.target_component_type.is_some()
            || !self.target_criteria.is_empty()
    }

    pub fn matches(&self, component: &Component) -> bool {
        if let Some(id) = &self.target_component_id {
            return component.id == *id;
        }
        if let Some(t) = self.target_component_type {
            if component.component_type != t {
                return false;
            }
        }
        self.target_criteria.matches(component)
    }
}

/// 解析规则列表：JSON 数组或 `{"rules": [...]}`
pub fn parse_rules(json: &str) -> serde_json::Result<Vec<SubstitutionRule>> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RuleFile {
        List(Vec<SubstitutionRule>),
        Wrapped { rules: Vec<SubstitutionRule> },
    }

    Ok(match serde_json::from_str(json)? {
        RuleFile::List(rules) | RuleFile::Wrapped { rules } => rules,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use planmod_core::math::BoundingBox2;
    use serde_json::json;

    fn spar(name: &str, confidence: f64) -> Component {
        Component::new(name, ComponentType::Spar, BoundingBox2::from_xywh(0.0, 0.0, 100.0, 4.0))
            .with_confidence(confidence)
            .with_material(MaterialType::Balsa)
    }

    #[test]
    fn test_id_target_ignores_other_filters() {
        let c = spar("Main spar", 0.2);
        let rule = SubstitutionRule::new("x")
            .for_component(c.id.clone())
            .for_type(ComponentType::Rib);
        assert!(rule.matches(&c));
        assert!(!SubstitutionRule::new("y").for_component("other").matches(&c));
    }

    #[test]
    fn test_type_and_criteria() {
        let rule = SubstitutionRule::new("spars").for_type(ComponentType::Spar).with_criteria(
            TargetCriteria {
                min_confidence: Some(0.5),
                name_contains: Some("MAIN".into()),
                ..Default::default()
            },
        );
        assert!(rule.matches(&spar("main spar", 0.9)));
        assert!(!rule.matches(&spar("main spar", 0.3)));
        assert!(!rule.matches(&spar("rear spar", 0.9)));
    }

    #[test]
    fn test_material_only_excludes_different_material() {
        let criteria = TargetCriteria {
            material: Some(MaterialType::Plywood),
            ..Default::default()
        };
        assert!(!criteria.matches(&spar("s", 1.0)));
        let mut unmarked = spar("s", 1.0);
        unmarked.attributes.material = None;
        assert!(criteria.matches(&unmarked));
    }

    #[test]
    fn test_parse_rules_both_shapes() {
        let list = parse_rules(
            r#"[{"target_component_type": "spar", "replacement_attributes": {"scale": 1.5}}]"#,
        )
        .unwrap();
        assert_eq!(list.len(), 1);
        assert!(list[0].has_target());
        assert_eq!(list[0].replacement_attributes.get("scale"), Some(&json!(1.5)));

        let wrapped = parse_rules(
            r#"{"rules": [{"description": "ply ribs", "target_criteria": {"material": "plywood"}}]}"#,
        )
        .unwrap();
        assert_eq!(wrapped[0].label(), "ply ribs");
        assert_eq!(wrapped[0].target_criteria.material, Some(MaterialType::Plywood));
        assert!(!SubstitutionRule::new("none").has_target());
    }
}
