//! 从栅格到替换与质量的整条流水线

use image::{GrayImage, Luma};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use planmod_app::Pipeline;
use planmod_config::AppConfig;
use planmod_core::prelude::*;
use planmod_file::{snapshot, summarize};
use planmod_transform::parse_rules;

const CLASSIFICATION: &str = r#"{
    "title": "Trainer wing",
    "drawing_type": "construction_plan",
    "regions": [{
        "label": "Wing plan",
        "type": "top_view",
        "bbox": {"x": 0.0, "y": 0.0, "width": 1.0, "height": 1.0},
        "confidence": 0.95,
        "components": [
            {"type": "spar", "confidence": 0.9, "suggested_name": "main spar",
             "material": "balsa", "bbox": {"x": 20, "y": 96, "width": 260, "height": 8}},
            {"type": "rib", "confidence": 0.8, "suggested_name": "R1",
             "bbox": {"x": 140, "y": 40, "width": 6, "height": 120}}
        ]
    }]
}"#;

fn wing_sheet() -> GrayImage {
    let mut img = GrayImage::from_pixel(300, 200, Luma([255]));
    draw_filled_rect_mut(&mut img, Rect::at(20, 96).of_size(260, 8), Luma([0]));
    draw_filled_rect_mut(&mut img, Rect::at(140, 40).of_size(6, 120), Luma([0]));
    img
}

#[test]
fn test_vectorize_write_substitute_and_weigh() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig::default();
    let pipeline = Pipeline::new(&config);
    let input = ClassificationInput::from_json(CLASSIFICATION).unwrap();

    let mut graph = pipeline
        .vectorize(&wing_sheet(), "untitled", Some(&input))
        .unwrap();
    assert_eq!(graph.title, "Trainer wing");
    assert_eq!(graph.components.len(), 2);
    assert!(!graph.entities.is_empty());
    assert!(graph
        .relationships
        .iter()
        .any(|r| r.relationship_type == RelationshipType::Contains));
    assert!(graph.validate().is_ok());

    let graph_path = dir.path().join("wing.pmsg");
    snapshot::save(&graph, &graph_path).unwrap();
    assert_eq!(snapshot::load(&graph_path).unwrap().components.len(), 2);

    let dxf_path = dir.path().join("wing.dxf");
    let stats = pipeline.write_dxf(&mut graph, &dxf_path).unwrap();
    assert_eq!(stats.inserts, 2);
    let drawing = std::fs::read(&dxf_path).unwrap();
    let summary = summarize(&drawing).unwrap();
    assert_eq!(summary.count("INSERT"), 2);
    assert!(summary.layers.contains("VIEW_TOP"));
    assert!(summary.layers.contains("COMP_SPAR"));
    assert!(summary.blocks.contains("MAIN_SPAR"));

    let before = pipeline.mass(&graph).unwrap();
    assert!(before.total_mass_g > 0.0);

    let rules = parse_rules(
        r#"[{"description": "heavier spar", "target_component_type": "spar",
             "replacement_catalog_id": "BALSA_STICK_1_4_SQ"}]"#,
    )
    .unwrap();
    let output = pipeline.substitute(&mut graph, &drawing, &rules).unwrap();
    assert_eq!(output.report.components_modified(), 1);
    assert_eq!(summarize(&output.drawing).unwrap().count("INSERT"), 2);

    let spar = graph
        .components_of_type(ComponentType::Spar)
        .next()
        .unwrap();
    assert_eq!(spar.catalog_id.as_deref(), Some("BALSA_STICK_1_4_SQ"));

    let after = pipeline.mass(&graph).unwrap();
    assert_eq!(after.component_masses.len(), before.component_masses.len());
}

#[test]
fn test_write_dxf_assigns_layout_for_imported_graph() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig::default();
    let pipeline = Pipeline::new(&config);

    let mut graph = SceneGraph::new("bare").with_image_size(100, 100);
    graph.add_component(Component::new(
        "",
        ComponentType::Former,
        BoundingBox2::from_xywh(10.0, 10.0, 30.0, 40.0),
    ));
    let path = dir.path().join("bare.dxf");
    pipeline.write_dxf(&mut graph, &path).unwrap();

    assert_eq!(graph.components[0].dxf_block_name.as_deref(), Some("FORMER_001"));
    let summary = summarize(&std::fs::read(&path).unwrap()).unwrap();
    assert!(summary.blocks.contains("FORMER_001"));
}
