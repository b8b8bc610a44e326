//! DXF 回读摘要
//!
//! 只统计实体类型、图层与块名，用于校验写出结果和替换前的底图。

use crate::error::{FileError, FileResult};
use planmod_core::geometry::EntityKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Cursor;
use tracing::debug;

/// 从字节流解析 DXF；空输入视为缺少底图
pub fn load_drawing(bytes: &[u8]) -> FileResult<dxf::Drawing> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(FileError::EmptyDrawing);
    }
    let mut cursor = Cursor::new(bytes);
    Ok(dxf::Drawing::load(&mut cursor)?)
}

/// DXF 实体类型名（组码 0 的取值）
pub fn dxf_type_name(specific: &dxf::entities::EntityType) -> String {
    use dxf::entities::EntityType as E;
    let name = match specific {
        E::Line(_) => "LINE",
        E::LwPolyline(_) => "LWPOLYLINE",
        E::Polyline(_) => "POLYLINE",
        E::Circle(_) => "CIRCLE",
        E::Arc(_) => "ARC",
        E::Text(_) => "TEXT",
        E::MText(_) => "MTEXT",
        E::Insert(_) => "INSERT",
        E::Ellipse(_) => "ELLIPSE",
        E::Spline(_) => "SPLINE",
        E::ModelPoint(_) => "POINT",
        E::Solid(_) => "SOLID",
        E::Leader(_) => "LEADER",
        E::RotatedDimension(_)
        | E::RadialDimension(_)
        | E::DiameterDimension(_)
        | E::AngularThreePointDimension(_)
        | E::OrdinateDimension(_) => "DIMENSION",
        other => {
            // 其余类型取变体名
            let debug = format!("{:?}", other);
            return debug
                .split(|c: char| !c.is_alphanumeric())
                .next()
                .unwrap_or_default()
                .to_uppercase();
        }
    };
    name.to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CadSummary {
    /// 模型空间实体按类型计数
    pub entity_counts: BTreeMap<String, usize>,
    pub layers: BTreeSet<String>,
    pub blocks: BTreeSet<String>,
    pub total_entities: usize,
}

impl CadSummary {
    pub fn from_drawing(drawing: &dxf::Drawing) -> Self {
        let mut summary = CadSummary::default();
        for entity in drawing.entities() {
            *summary
                .entity_counts
                .entry(dxf_type_name(&entity.specific))
                .or_insert(0) += 1;
            summary.total_entities += 1;
        }
        summary.layers = drawing.layers().map(|l| l.name.clone()).collect();
        summary.blocks = drawing.blocks().map(|b| b.name.clone()).collect();
        summary
    }

    pub fn count(&self, dxf_type: &str) -> usize {
        self.entity_counts.get(dxf_type).copied().unwrap_or(0)
    }

    /// 与场景图实体类型对应的数量；多段线包含 LWPOLYLINE 与 POLYLINE
    pub fn count_kind(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Line => self.count("LINE"),
            EntityKind::Polyline => self.count("LWPOLYLINE") + self.count("POLYLINE"),
            EntityKind::Circle => self.count("CIRCLE"),
            EntityKind::Arc => self.count("ARC"),
            EntityKind::PassThrough => 0,
        }
    }
}

/// 解析并统计
pub fn summarize(bytes: &[u8]) -> FileResult<CadSummary> {
    let drawing = load_drawing(bytes)?;
    let summary = CadSummary::from_drawing(&drawing);
    debug!(
        "DXF summary: {} entities, {} layers, {} blocks",
        summary.total_entities,
        summary.layers.len(),
        summary.blocks.len()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_bytes_is_missing_drawing() {
        assert!(matches!(summarize(b""), Err(FileError::EmptyDrawing)));
        assert!(matches!(summarize(b" \n"), Err(FileError::EmptyDrawing)));
    }

    #[test]
    fn test_summary_counts_types() {
        let mut drawing = dxf::Drawing::new();
        for _ in 0..2 {
            let mut line = dxf::entities::Line::default();
            line.p2 = dxf::Point::new(1.0, 0.0, 0.0);
            drawing.add_entity(dxf::entities::Entity::new(dxf::entities::EntityType::Line(
                line,
            )));
        }
        let mut circle = dxf::entities::Circle::default();
        circle.radius = 2.0;
        drawing.add_entity(dxf::entities::Entity::new(dxf::entities::EntityType::Circle(
            circle,
        )));

        let mut buf = Vec::new();
        drawing.save(&mut buf).unwrap();
        let summary = summarize(&buf).unwrap();
        assert_eq!(summary.count_kind(EntityKind::Line), 2);
        assert_eq!(summary.count("CIRCLE"), 1);
        assert_eq!(summary.total_entities, 3);
    }
}
