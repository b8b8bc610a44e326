//! PlanMod 命令行入口
//!
//! 配置来自 `--config`，否则按 `PLANMOD_CONFIG` → `config/default.toml` 查找。

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use planmod_app::Pipeline;
use planmod_config::AppConfig;
use planmod_core::prelude::*;
use planmod_file::{dxf_import, snapshot, summarize};
use planmod_transform::parse_rules;
use planmod_vision::raster;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "planmod", version, about = "Model aircraft plan digitization and modification")]
struct Cli {
    /// 配置文件路径
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Vectorize a raster plan into a scene graph and DXF
    Vectorize(VectorizeArgs),
    /// Write a DXF drawing from a scene graph
    WriteDxf(WriteDxfArgs),
    /// Import a DXF drawing as a scene graph
    Import(ImportArgs),
    /// Apply substitution rules to a scene graph and its drawing
    Substitute(SubstituteArgs),
    /// Estimate mass and center of gravity
    Mass(MassArgs),
    /// Check a scene graph for dangling references and duplicates
    Validate(GraphArg),
    /// List or search the component catalog
    Catalog(CatalogArgs),
}

#[derive(Args, Debug)]
struct VectorizeArgs {
    /// 预处理过的栅格图纸
    raster: PathBuf,
    /// 分类结果 JSON
    #[arg(long)]
    classification: Option<PathBuf>,
    /// 场景图输出（.json 或 .pmsg）
    #[arg(long, short)]
    output: PathBuf,
    #[arg(long)]
    dxf: Option<PathBuf>,
    #[arg(long, default_value = "Untitled plan")]
    title: String,
}

#[derive(Args, Debug)]
struct WriteDxfArgs {
    graph: PathBuf,
    #[arg(long, short)]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct ImportArgs {
    dxf: PathBuf,
    #[arg(long, short)]
    output: PathBuf,
    /// 默认使用文件名
    #[arg(long)]
    title: Option<String>,
}

#[derive(Args, Debug)]
struct SubstituteArgs {
    graph: PathBuf,
    dxf: PathBuf,
    rules: PathBuf,
    #[arg(long)]
    output_graph: PathBuf,
    #[arg(long)]
    output_dxf: PathBuf,
}

#[derive(Args, Debug)]
struct MassArgs {
    graph: PathBuf,
    /// 输出完整 JSON 报告
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct GraphArg {
    graph: PathBuf,
}

#[derive(Args, Debug)]
struct CatalogArgs {
    /// 名称或描述中的文本
    #[arg(long)]
    search: Option<String>,
    #[arg(long = "type")]
    component_type: Option<String>,
    #[arg(long)]
    material: Option<String>,
    /// 列出该条目的替代件
    #[arg(long)]
    substitutes: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::discover()?,
    };
    init_logging(&config.logging.level)?;

    let pipeline = Pipeline::new(&config);
    match cli.command {
        Command::Vectorize(args) => vectorize(&pipeline, args),
        Command::WriteDxf(args) => write_dxf(&pipeline, args),
        Command::Import(args) => import(args),
        Command::Substitute(args) => substitute(&pipeline, args),
        Command::Mass(args) => mass(&pipeline, args),
        Command::Validate(args) => validate(args),
        Command::Catalog(args) => catalog(&pipeline, args),
    }
}

fn init_logging(level: &str) -> Result<()> {
    let level: Level = level
        .parse()
        .with_context(|| format!("Invalid log level '{}'", level))?;
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn read(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn load_graph(path: &Path) -> Result<SceneGraph> {
    snapshot::load(path).with_context(|| format!("Failed to load scene graph {}", path.display()))
}

fn save_graph(graph: &SceneGraph, path: &Path) -> Result<()> {
    snapshot::save(graph, path)
        .with_context(|| format!("Failed to save scene graph {}", path.display()))
}

fn vectorize(pipeline: &Pipeline, args: VectorizeArgs) -> Result<()> {
    let classification = match &args.classification {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Some(ClassificationInput::from_json(&text)?)
        }
        None => None,
    };

    let gray = raster::load_gray(&args.raster)?;
    let mut graph = pipeline.vectorize(&gray, &args.title, classification.as_ref())?;
    graph.source_file = Some(args.raster.display().to_string());
    save_graph(&graph, &args.output)?;

    if let Some(dxf) = &args.dxf {
        let stats = pipeline.write_dxf(&mut graph, dxf)?;
        info!("Wrote {} entities to {}", stats.entities, dxf.display());
    }
    print_summary(&graph);
    Ok(())
}

fn write_dxf(pipeline: &Pipeline, args: WriteDxfArgs) -> Result<()> {
    let mut graph = load_graph(&args.graph)?;
    let stats = pipeline.write_dxf(&mut graph, &args.output)?;
    println!(
        "{}: {} layers, {} blocks, {} inserts, {} entities ({} placeholders skipped, {} failed)",
        args.output.display(),
        stats.layers,
        stats.blocks,
        stats.inserts,
        stats.entities,
        stats.placeholders,
        stats.failed
    );
    Ok(())
}

fn import(args: ImportArgs) -> Result<()> {
    let bytes = read(&args.dxf)?;
    let title = args.title.unwrap_or_else(|| {
        args.dxf
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    let mut graph = dxf_import::import_scene(&bytes, &title)?;
    graph.source_file = Some(args.dxf.display().to_string());
    save_graph(&graph, &args.output)?;
    print_summary(&graph);
    Ok(())
}

fn substitute(pipeline: &Pipeline, args: SubstituteArgs) -> Result<()> {
    let mut graph = load_graph(&args.graph)?;
    let drawing = read(&args.dxf)?;
    let rules_text = fs::read_to_string(&args.rules)
        .with_context(|| format!("Failed to read {}", args.rules.display()))?;
    let rules = parse_rules(&rules_text).context("Failed to parse substitution rules")?;

    let output = pipeline.substitute(&mut graph, &drawing, &rules)?;
    fs::write(&args.output_dxf, &output.drawing)
        .with_context(|| format!("Failed to write {}", args.output_dxf.display()))?;
    save_graph(&graph, &args.output_graph)?;

    for outcome in &output.report.rules {
        println!(
            "{}: {} matched, {} entities transformed, {} notched",
            outcome.rule_id, outcome.matched, outcome.entities_transformed, outcome.notched_entities
        );
    }
    let summary = summarize(&output.drawing)?;
    println!(
        "{} components modified, {} entities carried over, {} entities in output",
        output.report.components_modified(),
        output.report.carried_entities,
        summary.total_entities
    );
    Ok(())
}

fn mass(pipeline: &Pipeline, args: MassArgs) -> Result<()> {
    let graph = load_graph(&args.graph)?;
    let report = pipeline.mass(&graph)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    for c in &report.component_masses {
        println!("{:<32} {:>10.2} g", c.name, c.mass_g);
    }
    println!(
        "Total: {:.2} g ({:.3} kg), CG at ({:.1}, {:.1})",
        report.total_mass_g,
        report.total_mass_kg,
        report.center_of_gravity.x,
        report.center_of_gravity.y
    );
    for note in &report.uncertainties {
        println!("  uncertain: {}", note);
    }
    Ok(())
}

fn validate(args: GraphArg) -> Result<()> {
    let graph = load_graph(&args.graph)?;
    let report = graph.validate();
    for issue in &report.issues {
        println!("{}", issue);
    }
    if !report.is_ok() {
        bail!("{} issues found in {}", report.issues.len(), args.graph.display());
    }
    println!("{}: ok", args.graph.display());
    Ok(())
}

fn catalog(pipeline: &Pipeline, args: CatalogArgs) -> Result<()> {
    let catalog = pipeline.catalog()?;

    if let Some(id) = &args.substitutes {
        if catalog.get(id).is_none() {
            bail!("Unknown catalog id '{}'", id);
        }
        for entry in catalog.find_substitutes(id) {
            println!("{}: {}", entry.id, entry.name);
        }
        return Ok(());
    }

    if args.search.is_none() && args.component_type.is_none() && args.material.is_none() {
        print!("{}", catalog.summary());
        return Ok(());
    }

    let query = CatalogQuery {
        text: args.search,
        component_type: args.component_type.as_deref().map(ComponentType::parse),
        material: args.material,
        ..Default::default()
    };
    for entry in catalog.search(&query) {
        println!("{}: {} [{}]", entry.id, entry.name, entry.material);
    }
    Ok(())
}

fn print_summary(graph: &SceneGraph) {
    let summary = graph.summary();
    println!(
        "{}: {} views, {} components, {} entities, {} annotations, {} relationships",
        graph.title,
        summary.views,
        summary.components,
        summary.entities,
        summary.annotations,
        summary.relationships
    );
    for note in &graph.uncertainties {
        println!("  uncertain: {}", note);
    }
}
