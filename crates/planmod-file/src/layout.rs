//! 图层与块命名
//!
//! - 视图图层 `VIEW_<TYPE>`
//! - 部件图层 `COMP_<TYPE>`
//! - 块名默认 `<TYPE>_<NNN>`（按类型计数，三位补零）；部件有名称时改用
//!   大写、空白换成下划线、截断到 20 个字符的名称
//! - 带 `view_id` 的几何实体归入所属视图的图层
//!
//! 计数器保存在显式传入的 [`NamingContext`] 中，因此结果只取决于部件顺序。

use planmod_core::scene::{ComponentType, SceneGraph, ViewType};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

pub const VIEW_LAYER_PREFIX: &str = "VIEW_";
pub const COMPONENT_LAYER_PREFIX: &str = "COMP_";

/// 块名最大长度
pub const MAX_BLOCK_NAME_LEN: usize = 20;

pub fn view_layer_name(view_type: ViewType) -> String {
    format!("{}{}", VIEW_LAYER_PREFIX, view_type.as_str().to_uppercase())
}

pub fn component_layer_name(component_type: ComponentType) -> String {
    format!("{}{}", COMPONENT_LAYER_PREFIX, component_type.as_str().to_uppercase())
}

/// 把部件名整理为合法块名；整理后为空时返回 None
pub fn sanitize_block_name(name: &str) -> Option<String> {
    let cleaned: String = name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_uppercase()
        .chars()
        .map(|c| match c {
            '<' | '>' | '/' | '\\' | '"' | ':' | ';' | '?' | '*' | '|' | '=' | '`' => '_',
            c => c,
        })
        .take(MAX_BLOCK_NAME_LEN)
        .collect();
    (!cleaned.is_empty()).then_some(cleaned)
}

/// 块名计数器
#[derive(Debug, Clone, Default)]
pub struct NamingContext {
    counters: HashMap<ComponentType, u32>,
}

impl NamingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// 该类型计数加一，返回 `<TYPE>_<NNN>`
    pub fn next_block_name(&mut self, component_type: ComponentType) -> String {
        let n = self.counters.entry(component_type).or_insert(0);
        *n += 1;
        format!("{}_{:03}", component_type.as_str().to_uppercase(), n)
    }

    pub fn count(&self, component_type: ComponentType) -> u32 {
        self.counters.get(&component_type).copied().unwrap_or(0)
    }

    pub fn reset(&mut self) {
        self.counters.clear();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutStats {
    pub view_layers: BTreeSet<String>,
    pub component_layers: BTreeSet<String>,
    pub blocks_named: usize,
    pub entities_layered: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DxfLayoutAssigner;

impl DxfLayoutAssigner {
    pub fn new() -> Self {
        Self
    }

    /// 为视图、部件、实体分配图层与块名
    pub fn assign(&self, graph: &mut SceneGraph, naming: &mut NamingContext) -> LayoutStats {
        let mut stats = LayoutStats::default();

        for view in &mut graph.views {
            let layer = view_layer_name(view.view_type);
            stats.view_layers.insert(layer.clone());
            view.dxf_layer = Some(layer);
        }

        for component in &mut graph.components {
            let layer = component_layer_name(component.component_type);
            stats.component_layers.insert(layer.clone());
            component.dxf_layer = Some(layer);

            // 有名称时计数器照样递增
            let counted = naming.next_block_name(component.component_type);
            let block = sanitize_block_name(&component.name).unwrap_or(counted);
            debug!("Component {} -> block {}", component.id, block);
            component.dxf_block_name = Some(block);
            stats.blocks_named += 1;
        }

        let view_layers: HashMap<String, String> = graph
            .views
            .iter()
            .map(|v| (v.id.clone(), view_layer_name(v.view_type)))
            .collect();
        for entity in &mut graph.entities {
            if let Some(layer) = entity.view_id().and_then(|id| view_layers.get(id)) {
                entity.set_layer(layer.clone());
                stats.entities_layered += 1;
            }
        }

        info!(
            "Assigned {} view layers, {} component layers, {} blocks",
            stats.view_layers.len(),
            stats.component_layers.len(),
            stats.blocks_named
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planmod_core::math::{BoundingBox2, Point2};
    use planmod_core::scene::{Component, GeometryEntity, View};

    fn rib(name: &str) -> Component {
        Component::new(name, ComponentType::Rib, BoundingBox2::from_xywh(0.0, 0.0, 5.0, 50.0))
    }

    #[test]
    fn test_unnamed_ribs_get_sequential_blocks() {
        let mut graph = SceneGraph::new("t");
        for _ in 0..3 {
            graph.add_component(rib(""));
        }
        DxfLayoutAssigner::new().assign(&mut graph, &mut NamingContext::new());

        let names: Vec<_> = graph
            .components
            .iter()
            .map(|c| c.dxf_block_name.clone().unwrap_or_default())
            .collect();
        assert_eq!(names, ["RIB_001", "RIB_002", "RIB_003"]);
        assert!(graph
            .components
            .iter()
            .all(|c| c.dxf_layer.as_deref() == Some("COMP_RIB")));
    }

    #[test]
    fn test_named_component_uses_sanitized_name() {
        let mut graph = SceneGraph::new("t");
        graph.add_component(rib("  wing rib  w1 root section long "));
        graph.add_component(rib(""));
        let mut naming = NamingContext::new();
        DxfLayoutAssigner::new().assign(&mut graph, &mut naming);

        assert_eq!(
            graph.components[0].dxf_block_name.as_deref(),
            Some("WING_RIB_W1_ROOT_SEC")
        );
        assert_eq!(graph.components[1].dxf_block_name.as_deref(), Some("RIB_002"));
        assert_eq!(naming.count(ComponentType::Rib), 2);
    }

    #[test]
    fn test_entities_take_view_layer() {
        let mut graph = SceneGraph::new("t");
        let view = graph.add_view(View::new(
            "Plan",
            ViewType::Top,
            BoundingBox2::from_xywh(0.0, 0.0, 100.0, 100.0),
        ));
        graph.add_entity(
            GeometryEntity::line(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)).with_view(&view),
        );
        graph.add_entity(GeometryEntity::circle(Point2::new(500.0, 500.0), 3.0));

        let stats = DxfLayoutAssigner::new().assign(&mut graph, &mut NamingContext::new());
        assert_eq!(stats.entities_layered, 1);
        assert_eq!(graph.entities[0].layer(), Some("VIEW_TOP"));
        assert_eq!(graph.entities[1].layer(), None);
        assert_eq!(graph.views[0].dxf_layer.as_deref(), Some("VIEW_TOP"));
    }

    #[test]
    fn test_sanitize_rejects_blank_names() {
        assert_eq!(sanitize_block_name("   "), None);
        assert_eq!(sanitize_block_name("a/b"), Some("A_B".into()));
    }
}
