//! 图层配色
//!
//! 只使用 AutoCAD 颜色索引（ACI）中的 9 个标准色。

use planmod_core::scene::{ComponentType, ViewType};

/// 标准 ACI 颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AciColor {
    Red,
    Yellow,
    Green,
    Cyan,
    Blue,
    Magenta,
    White,
    Gray,
    LightGray,
}

impl AciColor {
    pub fn index(self) -> u8 {
        match self {
            AciColor::Red => 1,
            AciColor::Yellow => 2,
            AciColor::Green => 3,
            AciColor::Cyan => 4,
            AciColor::Blue => 5,
            AciColor::Magenta => 6,
            AciColor::White => 7,
            AciColor::Gray => 8,
            AciColor::LightGray => 9,
        }
    }

    /// 非标准索引回落为白色
    pub fn from_index(index: u8) -> Self {
        match index {
            1 => AciColor::Red,
            2 => AciColor::Yellow,
            3 => AciColor::Green,
            4 => AciColor::Cyan,
            5 => AciColor::Blue,
            6 => AciColor::Magenta,
            8 => AciColor::Gray,
            9 => AciColor::LightGray,
            _ => AciColor::White,
        }
    }

    pub fn to_dxf(self) -> dxf::Color {
        dxf::Color::from_index(self.index())
    }
}

pub const LAYER_ZERO: &str = "0";
pub const LAYER_DEFPOINTS: &str = "DEFPOINTS";
pub const LAYER_ANNOTATIONS: &str = "ANNOTATIONS";
pub const LAYER_DIMENSIONS: &str = "DIMENSIONS";
pub const LAYER_CONSTRUCTION: &str = "CONSTRUCTION";
pub const LAYER_CENTERLINES: &str = "CENTERLINES";

/// 固定的管理图层
pub const ADMIN_LAYERS: [(&str, AciColor); 6] = [
    (LAYER_ZERO, AciColor::White),
    (LAYER_DEFPOINTS, AciColor::White),
    (LAYER_ANNOTATIONS, AciColor::Cyan),
    (LAYER_DIMENSIONS, AciColor::Green),
    (LAYER_CONSTRUCTION, AciColor::Gray),
    (LAYER_CENTERLINES, AciColor::Magenta),
];

pub fn view_color(view_type: ViewType) -> AciColor {
    match view_type {
        ViewType::Top => AciColor::Red,
        ViewType::Side => AciColor::Green,
        ViewType::Front => AciColor::Blue,
        ViewType::Rear => AciColor::Cyan,
        ViewType::Section => AciColor::Yellow,
        ViewType::Detail => AciColor::Magenta,
        ViewType::Isometric => AciColor::White,
        ViewType::Unknown => AciColor::Gray,
    }
}

pub fn component_color(component_type: ComponentType) -> AciColor {
    use ComponentType::*;
    match component_type {
        Rib | Motor | Engine => AciColor::Red,
        Former | Plywood => AciColor::Blue,
        Bulkhead | Bracket | Mount | CarbonFiber => AciColor::Cyan,
        Spar | Propeller => AciColor::Green,
        Stringer | Longeron | BalsaSheet | BalsaStick => AciColor::Yellow,
        Skin | Covering => AciColor::LightGray,
        Aileron | Elevator | Rudder | Flap => AciColor::Magenta,
        Wheel | Strut | Skid | Unknown => AciColor::Gray,
        Fastener | Hinge | Custom => AciColor::White,
    }
}

/// 按图层名推断颜色：`VIEW_<TYPE>` / `COMP_<TYPE>` / 管理图层，其余为白色
pub fn layer_color(layer: &str) -> AciColor {
    if let Some(t) = layer.strip_prefix(crate::layout::VIEW_LAYER_PREFIX) {
        return view_color(ViewType::parse(t));
    }
    if let Some(t) = layer.strip_prefix(crate::layout::COMPONENT_LAYER_PREFIX) {
        return component_color(ComponentType::parse(t));
    }
    ADMIN_LAYERS
        .iter()
        .find(|(name, _)| *name == layer)
        .map(|(_, c)| *c)
        .unwrap_or(AciColor::White)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_color_lookup() {
        assert_eq!(layer_color("VIEW_TOP"), AciColor::Red);
        assert_eq!(layer_color("COMP_BALSA_STICK"), AciColor::Yellow);
        assert_eq!(layer_color("ANNOTATIONS"), AciColor::Cyan);
        assert_eq!(layer_color("SOMETHING_ELSE"), AciColor::White);
    }

    #[test]
    fn test_index_roundtrip() {
        for i in 1..=9u8 {
            assert_eq!(AciColor::from_index(i).index(), i);
        }
        assert_eq!(AciColor::from_index(42), AciColor::White);
    }
}
