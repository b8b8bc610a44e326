//! 材料密度表
//!
//! 只读共享数据，显式传入质量计算与替换流程。

use crate::scene::MaterialType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 查表失败时使用的默认密度（中等巴沙木，kg/m³）
pub const DEFAULT_DENSITY_KG_M3: f64 = 160.0;

/// 默认材料等级
pub const DEFAULT_GRADE: &str = "balsa_medium";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialGrade {
    pub id: String,
    pub name: String,
    pub density_kg_m3: f64,
    pub material_type: MaterialType,
}

/// 密度查询结果
#[derive(Debug, Clone, PartialEq)]
pub struct DensityLookup {
    pub grade: String,
    pub density_kg_m3: f64,
    /// 是否落到了默认值
    pub fallback: bool,
}

#[derive(Debug, Clone)]
pub struct MaterialTable {
    grades: BTreeMap<String, MaterialGrade>,
}

impl MaterialTable {
    pub fn builtin() -> Self {
        use MaterialType::*;
        let rows: [(&str, &str, f64, MaterialType); 16] = [
            ("balsa_soft", "Balsa (Soft/Light)", 100.0, Balsa),
            ("balsa_medium", "Balsa (Medium)", 160.0, Balsa),
            ("balsa_hard", "Balsa (Hard/Dense)", 220.0, Balsa),
            ("basswood", "Basswood", 420.0, Hardwood),
            ("spruce", "Spruce", 450.0, Hardwood),
            ("birch_plywood", "Birch Plywood", 680.0, Plywood),
            ("lite_ply", "Lite-Ply", 400.0, Plywood),
            ("carbon_fiber", "Carbon Fiber", 1600.0, CarbonFiber),
            ("fiberglass", "Fiberglass", 1800.0, Fiberglass),
            ("epp", "EPP Foam", 30.0, Foam),
            ("eps", "EPS Foam", 20.0, Foam),
            ("depron", "Depron", 40.0, Foam),
            ("aluminum", "Aluminum", 2700.0, Aluminum),
            ("steel", "Steel", 7850.0, Steel),
            ("nylon", "Nylon", 1150.0, Plastic),
            ("abs", "ABS Plastic", 1050.0, Plastic),
        ];

        let grades = rows
            .into_iter()
            .map(|(id, name, density, material_type)| {
                (
                    id.to_string(),
                    MaterialGrade {
                        id: id.to_string(),
                        name: name.to_string(),
                        density_kg_m3: density,
                        material_type,
                    },
                )
            })
            .collect();

        Self { grades }
    }

    pub fn get(&self, grade: &str) -> Option<&MaterialGrade> {
        let key = grade.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        self.grades.get(&key)
    }

    pub fn insert(&mut self, grade: MaterialGrade) {
        self.grades.insert(grade.id.clone(), grade);
    }

    pub fn iter(&self) -> impl Iterator<Item = &MaterialGrade> {
        self.grades.values()
    }

    /// 材料大类的代表等级
    pub fn representative_grade(material: MaterialType) -> Option<&'static str> {
        match material {
            MaterialType::Balsa => Some("balsa_medium"),
            MaterialType::Plywood => Some("birch_plywood"),
            MaterialType::Hardwood => Some("basswood"),
            MaterialType::CarbonFiber => Some("carbon_fiber"),
            MaterialType::Fiberglass => Some("fiberglass"),
            MaterialType::Foam => Some("depron"),
            MaterialType::Aluminum => Some("aluminum"),
            MaterialType::Steel => Some("steel"),
            MaterialType::Plastic => Some("nylon"),
            MaterialType::Unknown => None,
        }
    }

    /// 按 等级 → 材料大类 → 默认 的顺序查密度
    pub fn density(&self, grade: Option<&str>, material: Option<MaterialType>) -> DensityLookup {
        let hit = grade
            .and_then(|g| self.get(g))
            .or_else(|| {
                material
                    .and_then(Self::representative_grade)
                    .and_then(|g| self.get(g))
            });

        match hit {
            Some(g) => DensityLookup {
                grade: g.id.clone(),
                density_kg_m3: g.density_kg_m3,
                fallback: false,
            },
            None => DensityLookup {
                grade: DEFAULT_GRADE.to_string(),
                density_kg_m3: DEFAULT_DENSITY_KG_M3,
                fallback: true,
            },
        }
    }
}

impl Default for MaterialTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// mm³ 体积按 kg/m³ 密度换算为克
pub fn mass_grams(volume_mm3: f64, density_kg_m3: f64) -> f64 {
    // 1 kg/m³ = 1e-6 g/mm³
    volume_mm3 * density_kg_m3 * 1e-6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_density_lookup_order() {
        let table = MaterialTable::builtin();

        let hard = table.density(Some("Balsa Hard"), Some(MaterialType::Plywood));
        assert_eq!(hard.density_kg_m3, 220.0);
        assert!(!hard.fallback);

        let ply = table.density(None, Some(MaterialType::Plywood));
        assert_eq!(ply.density_kg_m3, 680.0);

        let miss = table.density(Some("unobtainium"), Some(MaterialType::Unknown));
        assert_eq!(miss.density_kg_m3, DEFAULT_DENSITY_KG_M3);
        assert!(miss.fallback);
    }

    #[test]
    fn test_mass_grams() {
        // 1000 cm³ 的水约 1000 g
        assert!((mass_grams(1.0e6, 1000.0) - 1000.0).abs() < 1e-9);
    }
}
