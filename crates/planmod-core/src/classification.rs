//! 分类结果导入
//!
//! 外部视觉服务给出区域（包围盒为图像尺寸的比例）与每个区域内的部件分类，
//! 这里把它们转换为视图与部件写入场景图。
//!
//! 只检查结构（置信度范围、包围盒有效），不验证语义。

use crate::error::{CoreError, CoreResult};
use crate::math::BoundingBox2;
use crate::scene::{Component, ComponentType, MaterialType, SceneGraph, View, ViewType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// 相对图像尺寸的比例包围盒
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FractionalBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// 像素包围盒（相对所在视图的左上角）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelativeBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentClassification {
    #[serde(rename = "type")]
    pub component_type: String,
    pub confidence: f64,
    #[serde(default)]
    pub suggested_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<RelativeBox>,
    /// 如 `{"length": "300mm", "thickness": "1/8\""}`
    #[serde(default)]
    pub dimensions: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionClassification {
    pub label: String,
    #[serde(rename = "type", default)]
    pub view_type: String,
    pub bbox: FractionalBox,
    pub confidence: f64,
    #[serde(default)]
    pub components: Vec<ComponentClassification>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drawing_type: Option<String>,
    #[serde(default)]
    pub regions: Vec<RegionClassification>,
}

impl ClassificationInput {
    pub fn from_json(json: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    fn check(&self) -> CoreResult<()> {
        let bad = |msg: String| Err(CoreError::InvalidClassification(msg));
        for region in &self.regions {
            if !(0.0..=1.0).contains(&region.confidence) {
                return bad(format!("region '{}' confidence {} out of range", region.label, region.confidence));
            }
            let b = region.bbox;
            let finite = [b.x, b.y, b.width, b.height].iter().all(|v| v.is_finite());
            if !finite || b.width <= 0.0 || b.height <= 0.0 {
                return bad(format!("region '{}' has an empty bounding box", region.label));
            }
            for comp in &region.components {
                if !(0.0..=1.0).contains(&comp.confidence) {
                    return bad(format!(
                        "component '{}' confidence {} out of range",
                        comp.suggested_name, comp.confidence
                    ));
                }
                if let Some(cb) = comp.bbox {
                    if cb.width <= 0.0 || cb.height <= 0.0 {
                        return bad(format!(
                            "component '{}' has an empty bounding box",
                            comp.suggested_name
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub views: usize,
    pub components: usize,
}

/// 把分类结果写入场景图。输入整体校验通过后才开始修改。
pub fn ingest(graph: &mut SceneGraph, input: &ClassificationInput) -> CoreResult<IngestStats> {
    if graph.image_width == 0 || graph.image_height == 0 {
        return Err(CoreError::InvalidClassification(
            "scene graph has no image size".into(),
        ));
    }
    input.check()?;

    let (w, h) = (graph.image_width as f64, graph.image_height as f64);
    let mut stats = IngestStats::default();

    if let Some(title) = &input.title {
        graph.title = title.clone();
    }
    graph.add_processing_note(format!(
        "Drawing type: {}",
        input.drawing_type.as_deref().unwrap_or("unknown")
    ));

    for region in &input.regions {
        let view_bbox = BoundingBox2::from_xywh(
            region.bbox.x * w,
            region.bbox.y * h,
            region.bbox.width * w,
            region.bbox.height * h,
        );
        let view = View::new(&region.label, ViewType::parse(&region.view_type), view_bbox)
            .with_confidence(region.confidence);
        let view_id = graph.add_view(view);
        stats.views += 1;

        for comp in &region.components {
            let bbox = match comp.bbox {
                Some(rb) => BoundingBox2::from_xywh(
                    view_bbox.x() + rb.x,
                    view_bbox.y() + rb.y,
                    rb.width,
                    rb.height,
                ),
                None => view_bbox,
            };

            let component_type = ComponentType::parse(&comp.component_type);
            if component_type == ComponentType::Unknown {
                graph.add_uncertainty(format!(
                    "Unrecognized component type '{}' for '{}'",
                    comp.component_type, comp.suggested_name
                ));
            }

            let mut component = Component::new(&comp.suggested_name, component_type, bbox)
                .with_view(&view_id)
                .with_confidence(comp.confidence);
            component.attributes.material = comp.material.as_deref().and_then(MaterialType::parse);

            for (key, value) in &comp.dimensions {
                if let Err(e) = component.attributes.apply(key, value) {
                    warn!("Ignoring dimension for '{}': {}", comp.suggested_name, e);
                }
            }

            graph.add_component(component);
            stats.components += 1;
        }
    }

    info!(
        "Ingested classification: {} views, {} components",
        stats.views, stats.components
    );
    Ok(stats)
}
