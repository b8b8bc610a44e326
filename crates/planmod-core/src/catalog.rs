//! 标准件目录
//!
//! 内置巴沙木板材/木条、航空层板、铰链与舵角，可从目录下的 JSON 文件追加条目。
//! 目录在一次运行中只读，可被多个流水线并发读取。

use crate::error::{CoreError, CoreResult};
use crate::scene::{ComponentType, MaterialType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

const INCH_MM: f64 = 25.4;
const BALSA_DENSITY: f64 = 160.0;
const PLYWOOD_DENSITY: f64 = 680.0;

/// 截面形状
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CrossSection {
    Rectangle { width_mm: f64, height_mm: f64 },
    Sheet { thickness_mm: f64 },
    Round { diameter_mm: f64 },
}

impl CrossSection {
    /// 截面短边（板材为厚度）
    pub fn short_side_mm(&self) -> f64 {
        match *self {
            CrossSection::Rectangle { width_mm, height_mm } => width_mm.min(height_mm),
            CrossSection::Sheet { thickness_mm } => thickness_mm,
            CrossSection::Round { diameter_mm } => diameter_mm,
        }
    }

    /// 截面长边；板材没有固定宽度
    pub fn long_side_mm(&self) -> Option<f64> {
        match *self {
            CrossSection::Rectangle { width_mm, height_mm } => Some(width_mm.max(height_mm)),
            CrossSection::Sheet { .. } => None,
            CrossSection::Round { diameter_mm } => Some(diameter_mm),
        }
    }

    pub fn area_mm2(&self) -> Option<f64> {
        match *self {
            CrossSection::Rectangle { width_mm, height_mm } => Some(width_mm * height_mm),
            CrossSection::Sheet { .. } => None,
            CrossSection::Round { diameter_mm } => {
                Some(std::f64::consts::PI * diameter_mm * diameter_mm / 4.0)
            }
        }
    }
}

/// 目录条目的质量数据
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "basis", rename_all = "snake_case")]
pub enum CatalogMass {
    /// 单件质量（g）
    PerUnit { grams: f64 },
    /// 线密度（g/mm）
    PerLength { grams_per_mm: f64 },
    /// 面密度（g/mm²）
    PerArea { grams_per_mm2: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    pub component_type: ComponentType,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_section: Option<CrossSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_length_mm: Option<f64>,
    /// 材料等级 id（见材料表），如 `balsa_medium`、`nylon`
    pub material: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass: Option<CatalogMass>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dxf_block_name: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub substitutes: Vec<String>,
}

impl CatalogEntry {
    /// 材料大类（材料字段可能是等级名）
    pub fn material_type(&self) -> Option<MaterialType> {
        MaterialType::parse(&self.material).or_else(|| {
            crate::material::MaterialTable::builtin()
                .get(&self.material)
                .map(|g| g.material_type)
        })
    }
}

/// 搜索条件，全部为空时返回全部条目
#[derive(Debug, Clone, Default)]
pub struct CatalogQuery {
    /// 名称或描述中的子串（不区分大小写）
    pub text: Option<String>,
    pub component_type: Option<ComponentType>,
    pub category: Option<String>,
    pub material: Option<String>,
    /// 任意一个标签命中即可
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    components: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl Catalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// 内置标准件
    pub fn builtin() -> Self {
        let mut catalog = Self::empty();
        catalog.load_balsa_stock();
        catalog.load_plywood();
        catalog.load_hardware();
        catalog
    }

    fn load_balsa_stock(&mut self) {
        let sheets = [
            (1.0 / 32.0, "1/32"),
            (1.0 / 16.0, "1/16"),
            (3.0 / 32.0, "3/32"),
            (1.0 / 8.0, "1/8"),
            (3.0 / 16.0, "3/16"),
            (1.0 / 4.0, "1/4"),
        ];
        for (thickness_in, label) in sheets {
            let thickness_mm = thickness_in * INCH_MM;
            self.insert(CatalogEntry {
                id: format!("BALSA_SHEET_{}", label.replace('/', "_")),
                name: format!("{label}\" Balsa Sheet"),
                component_type: ComponentType::BalsaSheet,
                category: "balsa_stock".into(),
                cross_section: Some(CrossSection::Sheet { thickness_mm }),
                default_length_mm: None,
                material: "balsa_medium".into(),
                mass: Some(CatalogMass::PerArea {
                    grams_per_mm2: thickness_mm * BALSA_DENSITY * 1e-6,
                }),
                dxf_block_name: None,
                description: format!("Standard {label}\" balsa sheet"),
                tags: vec!["balsa".into(), "sheet".into(), "wood".into()],
                substitutes: Vec::new(),
            });
        }

        let sticks = [
            (1.0 / 16.0, 1.0 / 16.0, "1/16 SQ"),
            (1.0 / 8.0, 1.0 / 8.0, "1/8 SQ"),
            (3.0 / 16.0, 3.0 / 16.0, "3/16 SQ"),
            (1.0 / 4.0, 1.0 / 4.0, "1/4 SQ"),
            (1.0 / 8.0, 1.0 / 4.0, "1/8 x 1/4"),
            (1.0 / 4.0, 1.0 / 2.0, "1/4 x 1/2"),
            (1.0 / 4.0, 1.0, "1/4 x 1"),
        ];
        for (w_in, h_in, label) in sticks {
            let width_mm = w_in * INCH_MM;
            let height_mm = h_in * INCH_MM;
            self.insert(CatalogEntry {
                id: format!("BALSA_STICK_{}", label.replace(' ', "_").replace('/', "_")),
                name: format!("{label} Balsa Stick"),
                component_type: ComponentType::BalsaStick,
                category: "balsa_stock".into(),
                cross_section: Some(CrossSection::Rectangle {
                    width_mm,
                    height_mm,
                }),
                default_length_mm: Some(36.0 * INCH_MM),
                material: "balsa_medium".into(),
                mass: Some(CatalogMass::PerLength {
                    grams_per_mm: width_mm * height_mm * BALSA_DENSITY * 1e-6,
                }),
                dxf_block_name: None,
                description: format!("Standard {label} balsa stick"),
                tags: vec!["balsa".into(), "stick".into(), "wood".into()],
                substitutes: Vec::new(),
            });
        }
    }

    fn load_plywood(&mut self) {
        for (thickness_mm, label) in [
            (1.5, "1.5mm"),
            (2.0, "2mm"),
            (3.0, "3mm"),
            (4.0, "4mm"),
            (6.0, "6mm"),
        ] {
            self.insert(CatalogEntry {
                id: format!("PLY_{}", label.replace('.', "_")),
                name: format!("{label} Plywood"),
                component_type: ComponentType::Plywood,
                category: "plywood".into(),
                cross_section: Some(CrossSection::Sheet { thickness_mm }),
                default_length_mm: None,
                material: "birch_plywood".into(),
                mass: Some(CatalogMass::PerArea {
                    grams_per_mm2: thickness_mm * PLYWOOD_DENSITY * 1e-6,
                }),
                dxf_block_name: None,
                description: format!("Aircraft grade {label} birch plywood"),
                tags: vec!["plywood".into(), "sheet".into(), "wood".into()],
                substitutes: Vec::new(),
            });
        }
    }

    fn load_hardware(&mut self) {
        let hinges = [
            ("HINGE_NYLON_SM", "Small Nylon Hinge", 0.3),
            ("HINGE_NYLON_MED", "Medium Nylon Hinge", 0.5),
            ("HINGE_NYLON_LG", "Large Nylon Hinge", 0.8),
            ("HINGE_CA", "CA Hinge", 0.1),
        ];
        for (id, name, grams) in hinges {
            self.insert(hardware_entry(
                id,
                name,
                ComponentType::Hinge,
                grams,
                &["hinge", "hardware", "control_surface"],
            ));
        }

        let horns = [
            ("HORN_NYLON_SM", "Small Nylon Control Horn", 1.0),
            ("HORN_NYLON_MED", "Medium Nylon Control Horn", 2.0),
            ("HORN_NYLON_LG", "Large Nylon Control Horn", 3.5),
        ];
        for (id, name, grams) in horns {
            self.insert(hardware_entry(
                id,
                name,
                ComponentType::Bracket,
                grams,
                &["control_horn", "hardware", "control"],
            ));
        }
    }

    pub fn insert(&mut self, entry: CatalogEntry) {
        self.entries.insert(entry.id.clone(), entry);
    }

    /// 解析 `{"components": [...]}` 格式的 JSON，返回新增条目数
    pub fn load_json_str(&mut self, json: &str) -> CoreResult<usize> {
        let file: CatalogFile = serde_json::from_str(json)?;
        let count = file.components.len();
        for entry in file.components {
            self.insert(entry);
        }
        Ok(count)
    }

    /// 加载目录下所有 `*.json` 文件，单个文件失败只记录警告
    pub fn load_dir(&mut self, dir: &Path) -> CoreResult<usize> {
        let read_dir = std::fs::read_dir(dir).map_err(|source| CoreError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths: Vec<_> = read_dir
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut total = 0;
        for path in paths {
            let loaded = std::fs::read_to_string(&path)
                .map_err(|source| CoreError::Io {
                    path: path.clone(),
                    source,
                })
                .and_then(|s| self.load_json_str(&s));
            match loaded {
                Ok(n) => total += n,
                Err(e) => warn!("Failed to load catalog file {}: {}", path.display(), e),
            }
        }

        info!("Loaded {} catalog entries from {}", total, dir.display());
        Ok(total)
    }

    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按 id 排序遍历
    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }

    pub fn search(&self, query: &CatalogQuery) -> Vec<&CatalogEntry> {
        let text = query.text.as_ref().map(|t| t.to_lowercase());
        self.entries
            .values()
            .filter(|e| {
                text.as_ref().is_none_or(|t| {
                    e.name.to_lowercase().contains(t) || e.description.to_lowercase().contains(t)
                })
            })
            .filter(|e| query.component_type.is_none_or(|t| e.component_type == t))
            .filter(|e| query.category.as_ref().is_none_or(|c| &e.category == c))
            .filter(|e| query.material.as_ref().is_none_or(|m| &e.material == m))
            .filter(|e| query.tags.is_empty() || query.tags.iter().any(|t| e.tags.contains(t)))
            .collect()
    }

    /// 可替换件：先列出显式指定的，再补充同类型同材料的条目
    pub fn find_substitutes(&self, id: &str) -> Vec<&CatalogEntry> {
        let Some(entry) = self.get(id) else {
            return Vec::new();
        };

        let mut result: Vec<&CatalogEntry> = entry
            .substitutes
            .iter()
            .filter_map(|sid| self.get(sid))
            .collect();

        let similar = self.search(&CatalogQuery {
            component_type: Some(entry.component_type),
            material: Some(entry.material.clone()),
            ..Default::default()
        });
        for s in similar {
            if s.id != id && !result.iter().any(|r| r.id == s.id) {
                result.push(s);
            }
        }
        result
    }

    /// 按类别分组的文本摘要
    pub fn summary(&self) -> String {
        let mut by_category: BTreeMap<&str, Vec<&CatalogEntry>> = BTreeMap::new();
        for e in self.entries.values() {
            by_category.entry(e.category.as_str()).or_default().push(e);
        }

        let mut out = String::from("Component Catalog Summary:\n");
        for (category, entries) in by_category {
            out.push_str(&format!("\n## {}\n", category.replace('_', " ")));
            for e in &entries {
                out.push_str(&format!("- {}: {}\n", e.id, e.name));
            }
        }
        out
    }
}

fn hardware_entry(
    id: &str,
    name: &str,
    component_type: ComponentType,
    grams: f64,
    tags: &[&str],
) -> CatalogEntry {
    CatalogEntry {
        id: id.to_string(),
        name: name.to_string(),
        component_type,
        category: "hardware".into(),
        cross_section: None,
        default_length_mm: None,
        material: "nylon".into(),
        mass: Some(CatalogMass::PerUnit { grams }),
        dxf_block_name: None,
        description: format!("Standard {}", name.to_lowercase()),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        substitutes: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_contents() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.len(), 6 + 7 + 5 + 4 + 3);

        let stick = catalog.get("BALSA_STICK_1_4_SQ").unwrap();
        match stick.mass {
            Some(CatalogMass::PerLength { grams_per_mm }) => {
                let expected = 6.35 * 6.35 * 160.0 * 1e-6;
                assert!((grams_per_mm - expected).abs() < 1e-12);
            }
            other => panic!("unexpected mass basis: {other:?}"),
        }

        assert!(catalog.get("PLY_1_5mm").is_some());
        assert!(catalog.get("BALSA_SHEET_1_16").is_some());
        assert!(catalog.get("BALSA_STICK_1_8_x_1_4").is_some());
    }

    #[test]
    fn test_search_and_substitutes() {
        let catalog = Catalog::builtin();

        let hinges = catalog.search(&CatalogQuery {
            tags: vec!["hinge".into()],
            ..Default::default()
        });
        assert_eq!(hinges.len(), 4);

        let ply = catalog.search(&CatalogQuery {
            text: Some("birch".into()),
            ..Default::default()
        });
        assert_eq!(ply.len(), 5);

        let subs = catalog.find_substitutes("HINGE_CA");
        assert_eq!(subs.len(), 3);
        assert!(subs.iter().all(|s| s.id != "HINGE_CA"));

        assert!(catalog.find_substitutes("NOPE").is_empty());
    }

    #[test]
    fn test_load_json_str() {
        let mut catalog = Catalog::empty();
        let n = catalog
            .load_json_str(
                r#"{"components": [{
                    "id": "CF_TUBE_8",
                    "name": "8mm Carbon Tube",
                    "component_type": "spar",
                    "category": "carbon",
                    "material": "carbon_fiber",
                    "cross_section": {"type": "round", "diameter_mm": 8.0},
                    "mass": {"basis": "per_length", "grams_per_mm": 0.05}
                }]}"#,
            )
            .unwrap();
        assert_eq!(n, 1);
        let tube = catalog.get("CF_TUBE_8").unwrap();
        assert_eq!(tube.material_type(), Some(MaterialType::CarbonFiber));
        assert_eq!(tube.cross_section.unwrap().short_side_mm(), 8.0);
    }
}
