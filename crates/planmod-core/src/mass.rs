//! 质量与重心估算
//!
//! 一阶近似：优先使用目录质量数据，否则按 材料密度 × 包围盒体积估算。
//!
//! 体积估算：`宽 × 高 × 厚度 × 0.5`，0.5 为非矩形截面的形状系数。
//!
//! 部件包围盒是像素坐标，先按 `units_per_pixel` 换算成毫米；
//! 报告中的位置与重心也是毫米（仍是图像方向，y 向下）。

use crate::catalog::{Catalog, CatalogMass};
use crate::material::{mass_grams, MaterialTable};
use crate::math::Point2;
use crate::scene::{Component, ComponentType, SceneGraph};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// 形状系数
pub const SHAPE_FACTOR: f64 = 0.5;

/// 未在厚度表中的部件类型使用的默认厚度（mm）
pub const DEFAULT_THICKNESS_MM: f64 = 3.0;

/// 按部件类型的典型厚度（mm）
pub fn typical_thickness_mm(component_type: ComponentType) -> f64 {
    match component_type {
        ComponentType::Rib | ComponentType::Former | ComponentType::Stringer => 3.0,
        ComponentType::Bulkhead | ComponentType::Spar | ComponentType::Longeron => 6.0,
        ComponentType::Skin => 1.5,
        ComponentType::Covering => 0.5,
        _ => DEFAULT_THICKNESS_MM,
    }
}

/// 单个部件质量的来源
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MassSource {
    CatalogUnit { catalog_id: String },
    CatalogLength { catalog_id: String, length_mm: f64 },
    CatalogArea { catalog_id: String, area_mm2: f64 },
    MaterialDensity {
        grade: String,
        density_kg_m3: f64,
        thickness_mm: f64,
        /// 密度是否为默认值
        fallback: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentMass {
    pub id: String,
    pub name: String,
    pub component_type: ComponentType,
    pub mass_g: f64,
    /// 包围盒中心
    pub position: Point2,
    pub source: MassSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MassReport {
    pub total_mass_g: f64,
    pub total_mass_kg: f64,
    /// 质量加权重心，总质量为 0 时为原点
    pub center_of_gravity: Point2,
    /// 每个部件一项，包括未计入总量的部件
    pub component_masses: Vec<ComponentMass>,
    /// 质量无效（非有限值）而未计入总量的部件说明
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uncertainties: Vec<String>,
}

pub struct MassPropertiesCalculator<'a> {
    catalog: &'a Catalog,
    materials: &'a MaterialTable,
    /// 每像素对应的毫米数
    units_per_pixel: f64,
}

impl<'a> MassPropertiesCalculator<'a> {
    pub fn new(catalog: &'a Catalog, materials: &'a MaterialTable) -> Self {
        Self {
            catalog,
            materials,
            units_per_pixel: 1.0,
        }
    }

    pub fn with_units_per_pixel(mut self, units_per_pixel: f64) -> Self {
        self.units_per_pixel = units_per_pixel;
        self
    }

    /// 部件包围盒的毫米尺寸（宽, 高）
    fn size_mm(&self, component: &Component) -> (f64, f64) {
        (
            component.bbox.width() * self.units_per_pixel,
            component.bbox.height() * self.units_per_pixel,
        )
    }

    pub fn calculate(&self, graph: &SceneGraph) -> MassReport {
        let mut total = 0.0;
        let mut weighted_x = 0.0;
        let mut weighted_y = 0.0;
        let mut component_masses = Vec::new();
        let mut uncertainties = Vec::new();

        for component in &graph.components {
            let (mass_g, source) = self.estimate(component);
            let position = component.bbox.center() * self.units_per_pixel;

            if !mass_g.is_finite() || !position.x.is_finite() || !position.y.is_finite() {
                warn!("Component {} has invalid mass {}, excluded from totals", component.id, mass_g);
                uncertainties.push(format!(
                    "Component '{}' ({}) has no valid mass estimate",
                    component.name, component.id
                ));
            } else if mass_g > 0.0 {
                total += mass_g;
                weighted_x += mass_g * position.x;
                weighted_y += mass_g * position.y;
            }

            component_masses.push(ComponentMass {
                id: component.id.clone(),
                name: component.name.clone(),
                component_type: component.component_type,
                mass_g,
                position,
                source,
            });
        }

        let center_of_gravity = if total > 0.0 {
            Point2::new(weighted_x / total, weighted_y / total)
        } else {
            Point2::origin()
        };

        info!(
            "Calculated mass: {:.1}g, CG: ({:.1}, {:.1})",
            total, center_of_gravity.x, center_of_gravity.y
        );

        MassReport {
            total_mass_g: total,
            total_mass_kg: total / 1000.0,
            center_of_gravity,
            component_masses,
            uncertainties,
        }
    }

    /// 估算单个部件质量（g）
    pub fn estimate(&self, component: &Component) -> (f64, MassSource) {
        if let Some(result) = self.estimate_from_catalog(component) {
            return result;
        }

        let attrs = &component.attributes;
        let lookup = self
            .materials
            .density(attrs.material_grade.as_deref(), attrs.material);
        if lookup.fallback {
            debug!(
                "No density for component {}, using {} kg/m³",
                component.id, lookup.density_kg_m3
            );
        }

        let thickness_mm = attrs
            .thickness_mm()
            .unwrap_or_else(|| typical_thickness_mm(component.component_type));
        let (width_mm, height_mm) = self.size_mm(component);
        let volume_mm3 = width_mm * height_mm * thickness_mm * SHAPE_FACTOR;

        (
            mass_grams(volume_mm3, lookup.density_kg_m3),
            MassSource::MaterialDensity {
                grade: lookup.grade,
                density_kg_m3: lookup.density_kg_m3,
                thickness_mm,
                fallback: lookup.fallback,
            },
        )
    }

    fn estimate_from_catalog(&self, component: &Component) -> Option<(f64, MassSource)> {
        let catalog_id = component.catalog_id.as_deref()?;
        let Some(entry) = self.catalog.get(catalog_id) else {
            debug!("Catalog id {} not found, falling back to density", catalog_id);
            return None;
        };

        match entry.mass? {
            CatalogMass::PerUnit { grams } => Some((
                grams,
                MassSource::CatalogUnit {
                    catalog_id: catalog_id.to_string(),
                },
            )),
            CatalogMass::PerLength { grams_per_mm } => {
                let length_mm = component.attributes.length_mm()?;
                Some((
                    grams_per_mm * length_mm,
                    MassSource::CatalogLength {
                        catalog_id: catalog_id.to_string(),
                        length_mm,
                    },
                ))
            }
            CatalogMass::PerArea { grams_per_mm2 } => {
                let (width_mm, height_mm) = self.size_mm(component);
                let area_mm2 = width_mm * height_mm;
                Some((
                    grams_per_mm2 * area_mm2,
                    MassSource::CatalogArea {
                        catalog_id: catalog_id.to_string(),
                        area_mm2,
                    },
                ))
            }
        }
    }
}
