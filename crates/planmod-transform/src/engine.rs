//! 替换引擎
//!
//! 每条规则依次经过 匹配 → 应用 → 记录 三个阶段，规则之间不回滚：
//! 某条规则出错时，前面规则的修改保留在场景图中。
//!
//! 新图纸由修改后的场景图重新生成；底图中不属于生成图层的实体原样保留。

use crate::error::{SubstitutionError, SubstitutionResult};
use crate::geometry::{short_axis_scaling, Directive, GeometryModifier, ModifierOptions};
use crate::rules::{SubstitutionRule, CROSS_SECTION_KEY, OFFSET_KEY, SCALE_KEY};
use planmod_core::catalog::{Catalog, CrossSection};
use planmod_core::math::BoundingBox2;
use planmod_core::scene::SceneGraph;
use planmod_core::transform::Transform2D;
use planmod_file::layout::{COMPONENT_LAYER_PREFIX, VIEW_LAYER_PREFIX};
use planmod_file::palette::ADMIN_LAYERS;
use planmod_file::reader::load_drawing;
use planmod_file::{CadWriter, FileError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubstitutionState {
    Idle,
    Matching,
    Applying,
    Recorded,
}

/// 单条规则的结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub rule_id: String,
    pub matched: usize,
    pub entities_transformed: usize,
    pub notched_entities: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubstitutionReport {
    pub rules: Vec<RuleOutcome>,
    /// 从底图保留下来的实体数
    pub carried_entities: usize,
}

impl SubstitutionReport {
    pub fn components_modified(&self) -> usize {
        self.rules.iter().map(|r| r.matched).sum()
    }
}

/// 替换后的图纸与报告；场景图通过 `&mut` 原地修改
#[derive(Debug, Clone)]
pub struct SubstitutionOutput {
    pub drawing: Vec<u8>,
    pub report: SubstitutionReport,
}

pub struct SubstitutionEngine<'a> {
    catalog: &'a Catalog,
    writer: CadWriter,
    modifier: GeometryModifier,
    state: SubstitutionState,
}

impl<'a> SubstitutionEngine<'a> {
    pub fn new(catalog: &'a Catalog, writer: CadWriter, options: ModifierOptions) -> Self {
        Self {
            catalog,
            writer,
            modifier: GeometryModifier::new(options),
            state: SubstitutionState::Idle,
        }
    }

    pub fn state(&self) -> SubstitutionState {
        self.state
    }

    fn enter(&mut self, state: SubstitutionState) {
        debug!("Substitution state {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    /// 依次应用规则，返回重新生成的图纸
    pub fn apply(
        &mut self,
        drawing: &[u8],
        graph: &mut SceneGraph,
        rules: &[SubstitutionRule],
    ) -> SubstitutionResult<SubstitutionOutput> {
        self.enter(SubstitutionState::Idle);
        let base = load_drawing(drawing).map_err(|e| match e {
            FileError::EmptyDrawing => SubstitutionError::MissingDrawing,
            other => SubstitutionError::Drawing(other),
        })?;

        let mut report = SubstitutionReport::default();
        for (applied, rule) in rules.iter().enumerate() {
            info!("Applying rule: {}", rule.label());
            let outcome = self.apply_rule(graph, rule, applied)?;
            report.rules.push(outcome);
        }
        self.enter(SubstitutionState::Idle);

        let (mut out, _) = self.writer.build(graph);
        report.carried_entities = carry_foreign_entities(&base, &mut out);

        let mut bytes = Vec::new();
        out.save(&mut bytes)
            .map_err(|e| SubstitutionError::Serialize {
                source: FileError::from(e),
                applied: rules.len(),
            })?;

        info!(
            "Applied {} rules, {} components modified",
            report.rules.len(),
            report.components_modified()
        );
        Ok(SubstitutionOutput {
            drawing: bytes,
            report,
        })
    }

    /// 单条规则：匹配、应用、记录
    pub fn apply_rule(
        &mut self,
        graph: &mut SceneGraph,
        rule: &SubstitutionRule,
        applied: usize,
    ) -> SubstitutionResult<RuleOutcome> {
        let invalid = |reason: String| SubstitutionError::InvalidRule {
            rule: rule.label().to_string(),
            reason,
            applied,
        };

        self.enter(SubstitutionState::Matching);
        if !rule.has_target() {
            return Err(invalid("rule has no target".to_string()));
        }
        let catalog = self.catalog;
        let catalog_entry = match &rule.replacement_catalog_id {
            Some(id) => Some(
                catalog
                    .get(id)
                    .ok_or_else(|| invalid(format!("unknown catalog id '{}'", id)))?,
            ),
            None => None,
        };
        let directive = Directive::parse(
            rule.replacement_attributes.get(SCALE_KEY),
            rule.replacement_attributes.get(OFFSET_KEY),
        )
        .map_err(invalid)?;

        let targets: Vec<String> = graph
            .components
            .iter()
            .filter(|c| rule.matches(c))
            .map(|c| c.id.clone())
            .collect();

        let mut outcome = RuleOutcome {
            rule_id: rule.id.clone(),
            matched: targets.len(),
            entities_transformed: 0,
            notched_entities: 0,
        };

        if targets.is_empty() {
            info!("Rule '{}' matched no components", rule.label());
            self.enter(SubstitutionState::Recorded);
            graph.add_processing_note(format!(
                "Substitution '{}': no matching components",
                rule.label()
            ));
            return Ok(outcome);
        }

        self.enter(SubstitutionState::Applying);
        let mut attributes = rule.replacement_attributes.clone();
        attributes.remove(SCALE_KEY);
        attributes.remove(OFFSET_KEY);
        if let Some(cs) = catalog_entry.and_then(|e| e.cross_section) {
            let value = serde_json::to_value(cs).map_err(|e| invalid(e.to_string()))?;
            attributes.insert(CROSS_SECTION_KEY.to_string(), value);
        }

        for id in &targets {
            let Some(component) = graph.component_mut(id) else {
                continue;
            };
            let old_bbox = component.bbox;
            let old_section = component.attributes.cross_section;

            // 先在副本上应用，出错时部件保持原样
            let mut updated = component.attributes.clone();
            for (key, value) in &attributes {
                updated
                    .apply(key, value)
                    .map_err(|e| invalid(e.to_string()))?;
            }
            component.attributes = updated;

            if let Some(entry) = catalog_entry {
                component.catalog_id = Some(entry.id.clone());
                component.name = if component.name.trim().is_empty() {
                    entry.name.clone()
                } else {
                    format!("{} ({})", entry.name, component.name)
                };
                if let Some(block) = &entry.dxf_block_name {
                    component.dxf_block_name = Some(block.clone());
                }
            }

            let mut t = Transform2D::identity();
            if attributes.contains_key(CROSS_SECTION_KEY) {
                if let Some(new_section) = component.attributes.cross_section {
                    let factor = self.section_factor(old_section, new_section, &old_bbox);
                    if let Some(f) = factor {
                        t = t.then(&short_axis_scaling(&old_bbox, f));
                    }
                }
            }
            if !directive.is_empty() {
                t = t.then(&directive.transform(&old_bbox));
            }

            let stats = self.modifier.apply(graph, id, &t);
            outcome.entities_transformed += stats.entities;
            outcome.notched_entities += stats.notched_entities;
        }

        self.enter(SubstitutionState::Recorded);
        graph.add_processing_note(format!(
            "Substitution '{}': {} components modified",
            rule.label(),
            targets.len()
        ));
        Ok(outcome)
    }

    /// 新旧截面短边之比；原截面未知时按包围盒短边换算成毫米
    fn section_factor(
        &self,
        old: Option<CrossSection>,
        new: CrossSection,
        bbox: &BoundingBox2,
    ) -> Option<f64> {
        let old_short = match old {
            Some(cs) => cs.short_side_mm(),
            None => bbox.width().min(bbox.height()) * self.writer.options().units_per_pixel,
        };
        let factor = new.short_side_mm() / old_short;
        if !factor.is_finite() || factor <= 0.0 {
            warn!("Ignoring cross-section change with factor {}", factor);
            return None;
        }
        ((factor - 1.0).abs() > 1e-9).then_some(factor)
    }
}

fn is_generated_layer(name: &str) -> bool {
    name.starts_with(VIEW_LAYER_PREFIX)
        || name.starts_with(COMPONENT_LAYER_PREFIX)
        || ADMIN_LAYERS.iter().any(|(admin, _)| *admin == name)
}

/// 把底图中不属于生成图层的实体复制到新图纸，返回复制数
fn carry_foreign_entities(base: &dxf::Drawing, out: &mut dxf::Drawing) -> usize {
    let owned: BTreeSet<String> = out.entities().map(|e| e.common.layer.clone()).collect();
    let blocks: BTreeSet<String> = out.blocks().map(|b| b.name.clone()).collect();

    let mut carried = 0;
    for entity in base.entities() {
        let layer = &entity.common.layer;
        if owned.contains(layer) || is_generated_layer(layer) {
            continue;
        }
        if let dxf::entities::EntityType::Insert(insert) = &entity.specific {
            if !blocks.contains(&insert.name) {
                warn!("Dropping insert of undefined block {}", insert.name);
                continue;
            }
        }
        if !out.layers().any(|l| l.name == *layer) {
            if let Some(source) = base.layers().find(|l| l.name == *layer) {
                let mut copy = source.clone();
                copy.handle = dxf::Handle(0);
                out.add_layer(copy);
            }
        }
        let mut copy = entity.clone();
        copy.common.handle = dxf::Handle(0);
        out.add_entity(copy);
        carried += 1;
    }
    if carried > 0 {
        debug!("Carried {} entities from base drawing", carried);
    }
    carried
}
