//! 场景图中的枚举类型
//!
//! 所有类型以 snake_case 序列化；`parse` 对未知字符串宽松处理。

use serde::{Deserialize, Serialize};

/// 生成图内唯一的 id
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// 视图类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ViewType {
    Top,
    Side,
    Front,
    Rear,
    Section,
    Detail,
    Isometric,
    #[default]
    Unknown,
}

impl ViewType {
    pub const ALL: [ViewType; 8] = [
        ViewType::Top,
        ViewType::Side,
        ViewType::Front,
        ViewType::Rear,
        ViewType::Section,
        ViewType::Detail,
        ViewType::Isometric,
        ViewType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewType::Top => "top",
            ViewType::Side => "side",
            ViewType::Front => "front",
            ViewType::Rear => "rear",
            ViewType::Section => "section",
            ViewType::Detail => "detail",
            ViewType::Isometric => "isometric",
            ViewType::Unknown => "unknown",
        }
    }

    /// 解析类型字符串（接受 `top_view` 形式），未知值返回 `Unknown`
    pub fn parse(s: &str) -> Self {
        let s = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        let s = s.strip_suffix("_view").unwrap_or(&s);
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .unwrap_or(ViewType::Unknown)
    }
}

/// 部件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    // 结构件
    Rib,
    Former,
    Bulkhead,
    Spar,
    Stringer,
    Longeron,
    Skin,
    Covering,

    // 舵面
    Aileron,
    Elevator,
    Rudder,
    Flap,

    // 五金
    Fastener,
    Hinge,
    Bracket,
    Mount,

    // 动力
    Motor,
    Propeller,
    Engine,

    // 起落架
    Wheel,
    Strut,
    Skid,

    // 原材料
    BalsaSheet,
    BalsaStick,
    Plywood,
    CarbonFiber,

    Custom,
    #[default]
    Unknown,
}

/// 部件大类，用于配色与默认厚度等按组决策
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentCategory {
    Structural,
    ControlSurface,
    Hardware,
    Propulsion,
    LandingGear,
    Stock,
    Other,
}

impl ComponentType {
    pub const ALL: [ComponentType; 28] = [
        ComponentType::Rib,
        ComponentType::Former,
        ComponentType::Bulkhead,
        ComponentType::Spar,
        ComponentType::Stringer,
        ComponentType::Longeron,
        ComponentType::Skin,
        ComponentType::Covering,
        ComponentType::Aileron,
        ComponentType::Elevator,
        ComponentType::Rudder,
        ComponentType::Flap,
        ComponentType::Fastener,
        ComponentType::Hinge,
        ComponentType::Bracket,
        ComponentType::Mount,
        ComponentType::Motor,
        ComponentType::Propeller,
        ComponentType::Engine,
        ComponentType::Wheel,
        ComponentType::Strut,
        ComponentType::Skid,
        ComponentType::BalsaSheet,
        ComponentType::BalsaStick,
        ComponentType::Plywood,
        ComponentType::CarbonFiber,
        ComponentType::Custom,
        ComponentType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentType::Rib => "rib",
            ComponentType::Former => "former",
            ComponentType::Bulkhead => "bulkhead",
            ComponentType::Spar => "spar",
            ComponentType::Stringer => "stringer",
            ComponentType::Longeron => "longeron",
            ComponentType::Skin => "skin",
            ComponentType::Covering => "covering",
            ComponentType::Aileron => "aileron",
            ComponentType::Elevator => "elevator",
            ComponentType::Rudder => "rudder",
            ComponentType::Flap => "flap",
            ComponentType::Fastener => "fastener",
            ComponentType::Hinge => "hinge",
            ComponentType::Bracket => "bracket",
            ComponentType::Mount => "mount",
            ComponentType::Motor => "motor",
            ComponentType::Propeller => "propeller",
            ComponentType::Engine => "engine",
            ComponentType::Wheel => "wheel",
            ComponentType::Strut => "strut",
            ComponentType::Skid => "skid",
            ComponentType::BalsaSheet => "balsa_sheet",
            ComponentType::BalsaStick => "balsa_stick",
            ComponentType::Plywood => "plywood",
            ComponentType::CarbonFiber => "carbon_fiber",
            ComponentType::Custom => "custom",
            ComponentType::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Self {
        let s = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .unwrap_or(ComponentType::Unknown)
    }

    pub fn category(&self) -> ComponentCategory {
        use ComponentType::*;
        match self {
            Rib | Former | Bulkhead | Spar | Stringer | Longeron | Skin | Covering => {
                ComponentCategory::Structural
            }
            Aileron | Elevator | Rudder | Flap => ComponentCategory::ControlSurface,
            Fastener | Hinge | Bracket | Mount => ComponentCategory::Hardware,
            Motor | Propeller | Engine => ComponentCategory::Propulsion,
            Wheel | Strut | Skid => ComponentCategory::LandingGear,
            BalsaSheet | BalsaStick | Plywood | CarbonFiber => ComponentCategory::Stock,
            Custom | Unknown => ComponentCategory::Other,
        }
    }

    /// 与翼梁/纵梁配合、带槽口的部件
    pub fn has_mating_notches(&self) -> bool {
        matches!(self, ComponentType::Rib | ComponentType::Former | ComponentType::Bulkhead)
    }
}

/// 材料类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialType {
    Balsa,
    Plywood,
    Hardwood,
    CarbonFiber,
    Fiberglass,
    Foam,
    Aluminum,
    Steel,
    Plastic,
    Unknown,
}

impl MaterialType {
    pub const ALL: [MaterialType; 10] = [
        MaterialType::Balsa,
        MaterialType::Plywood,
        MaterialType::Hardwood,
        MaterialType::CarbonFiber,
        MaterialType::Fiberglass,
        MaterialType::Foam,
        MaterialType::Aluminum,
        MaterialType::Steel,
        MaterialType::Plastic,
        MaterialType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialType::Balsa => "balsa",
            MaterialType::Plywood => "plywood",
            MaterialType::Hardwood => "hardwood",
            MaterialType::CarbonFiber => "carbon_fiber",
            MaterialType::Fiberglass => "fiberglass",
            MaterialType::Foam => "foam",
            MaterialType::Aluminum => "aluminum",
            MaterialType::Steel => "steel",
            MaterialType::Plastic => "plastic",
            MaterialType::Unknown => "unknown",
        }
    }

    /// 解析材料字符串，无法识别时返回 None
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        Self::ALL.into_iter().find(|m| m.as_str() == s)
    }
}

/// 标注类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationType {
    Dimension,
    Label,
    MaterialNote,
    Scale,
    #[default]
    Text,
}

/// 关系类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    Contains,
    AdjacentTo,
    Labels,
}

impl RelationshipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::Contains => "contains",
            RelationshipType::AdjacentTo => "adjacent_to",
            RelationshipType::Labels => "labels",
        }
    }
}

/// 长度单位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LengthUnit {
    #[default]
    Mm,
    Cm,
    M,
    In,
    Ft,
}

impl LengthUnit {
    pub fn to_mm_factor(&self) -> f64 {
        match self {
            LengthUnit::Mm => 1.0,
            LengthUnit::Cm => 10.0,
            LengthUnit::M => 1000.0,
            LengthUnit::In => 25.4,
            LengthUnit::Ft => 304.8,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mm" => Some(LengthUnit::Mm),
            "cm" => Some(LengthUnit::Cm),
            "m" => Some(LengthUnit::M),
            "in" | "inch" | "\"" => Some(LengthUnit::In),
            "ft" | "'" => Some(LengthUnit::Ft),
            _ => None,
        }
    }
}

/// 带单位的尺寸
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub value: f64,
    #[serde(default)]
    pub unit: LengthUnit,
    /// 原始文本（如 `1/4"`）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Dimension {
    pub fn mm(value: f64) -> Self {
        Self {
            value,
            unit: LengthUnit::Mm,
            text: None,
        }
    }

    pub fn new(value: f64, unit: LengthUnit) -> Self {
        Self {
            value,
            unit,
            text: None,
        }
    }

    pub fn to_mm(&self) -> f64 {
        self.value * self.unit.to_mm_factor()
    }

    /// 解析 `6.35mm`、`1/4"`、`1 1/2 in`、`3` 这类文本，缺省单位为 mm
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        let split = trimmed
            .find(|c: char| c.is_ascii_alphabetic() || c == '"' || c == '\'')
            .unwrap_or(trimmed.len());
        let (number, unit) = trimmed.split_at(split);

        let unit = if unit.trim().is_empty() {
            LengthUnit::Mm
        } else {
            LengthUnit::parse(unit)?
        };

        let mut value = 0.0;
        let mut any = false;
        for token in number.split_whitespace() {
            let part = match token.split_once('/') {
                Some((n, d)) => {
                    let d: f64 = d.parse().ok()?;
                    if d == 0.0 {
                        return None;
                    }
                    n.parse::<f64>().ok()? / d
                }
                None => token.parse::<f64>().ok()?,
            };
            value += part;
            any = true;
        }
        if !any {
            return None;
        }

        Some(Self {
            value,
            unit,
            text: Some(trimmed.to_string()),
        })
    }
}
