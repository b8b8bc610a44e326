//! 流水线
//!
//! 把各 crate 的阶段按配置串起来，命令行只负责读写文件和打印结果。

use std::path::Path;

use anyhow::{Context, Result};
use image::GrayImage;
use planmod_config::AppConfig;
use planmod_core::prelude::*;
use planmod_file::{CadWriter, DxfLayoutAssigner, NamingContext, WriteStats};
use planmod_transform::{SubstitutionEngine, SubstitutionOutput, SubstitutionRule};
use planmod_vision::VectorizationEngine;
use tracing::info;

pub struct Pipeline<'a> {
    config: &'a AppConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a AppConfig) -> Self {
        Self { config }
    }

    pub fn writer(&self) -> CadWriter {
        CadWriter::new(self.config.writer.clone())
    }

    /// 内置目录，加上配置目录中的 JSON 条目
    pub fn catalog(&self) -> Result<Catalog> {
        let mut catalog = Catalog::builtin();
        if let Some(dir) = &self.config.catalog.data_dir {
            catalog
                .load_dir(dir)
                .with_context(|| format!("Failed to load catalog from {}", dir.display()))?;
        }
        Ok(catalog)
    }

    /// 分类导入 → 矢量化 → 关系 → 图层与块名
    pub fn vectorize(
        &self,
        gray: &GrayImage,
        title: &str,
        classification: Option<&ClassificationInput>,
    ) -> Result<SceneGraph> {
        let mut graph = SceneGraph::new(title).with_image_size(gray.width(), gray.height());

        // 视图和部件要先于实体存在，实体才能关联上
        if let Some(input) = classification {
            ingest(&mut graph, input).context("Failed to ingest classification")?;
        }

        VectorizationEngine::new(self.config.vectorization.clone()).vectorize(gray, &mut graph);
        let stats = RelationshipBuilder::new(self.config.relationships.clone()).build(&mut graph);
        info!(
            "Relationships: {} contains, {} adjacent, {} labels",
            stats.contains, stats.adjacent, stats.labels
        );
        DxfLayoutAssigner::new().assign(&mut graph, &mut NamingContext::new());
        Ok(graph)
    }

    /// 写出 DXF；尚未分配图层或块名的图先做一次分配
    pub fn write_dxf(&self, graph: &mut SceneGraph, path: &Path) -> Result<WriteStats> {
        let unassigned = graph
            .components
            .iter()
            .any(|c| c.dxf_layer.is_none() || c.dxf_block_name.is_none())
            || graph.views.iter().any(|v| v.dxf_layer.is_none());
        if unassigned {
            DxfLayoutAssigner::new().assign(graph, &mut NamingContext::new());
        }
        let stats = self
            .writer()
            .write_file(graph, path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(stats)
    }

    pub fn substitute(
        &self,
        graph: &mut SceneGraph,
        drawing: &[u8],
        rules: &[SubstitutionRule],
    ) -> Result<SubstitutionOutput> {
        let catalog = self.catalog()?;
        let mut engine = SubstitutionEngine::new(&catalog, self.writer(), self.config.substitution);
        Ok(engine.apply(drawing, graph, rules)?)
    }

    /// 包围盒按 `writer.units_per_pixel` 换算成毫米
    pub fn mass(&self, graph: &SceneGraph) -> Result<MassReport> {
        let catalog = self.catalog()?;
        let materials = MaterialTable::builtin();
        Ok(MassPropertiesCalculator::new(&catalog, &materials)
            .with_units_per_pixel(self.config.writer.units_per_pixel)
            .calculate(graph))
    }
}
