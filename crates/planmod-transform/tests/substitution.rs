use planmod_core::prelude::*;
use planmod_file::{summarize, CadWriter, DxfLayoutAssigner, NamingContext};
use planmod_transform::{
    SubstitutionEngine, SubstitutionError, SubstitutionRule, SubstitutionState, TargetCriteria,
};
use serde_json::json;

struct Plan {
    graph: SceneGraph,
    spar: String,
    rib: String,
}

/// 一根水平翼梁穿过一片翼肋，翼肋外形在翼梁处有槽口
fn plan() -> Plan {
    let mut graph = SceneGraph::new("Wing").with_image_size(300, 120);
    let view = graph.add_view(View::new(
        "Wing",
        ViewType::Top,
        BoundingBox2::from_xywh(0.0, 0.0, 300.0, 120.0),
    ));
    let spar = graph.add_component(
        Component::new(
            "main spar",
            ComponentType::Spar,
            BoundingBox2::from_xywh(20.0, 50.0, 260.0, 4.0),
        )
        .with_view(&view)
        .with_material(MaterialType::Balsa),
    );
    let rib = graph.add_component(
        Component::new("R3", ComponentType::Rib, BoundingBox2::from_xywh(100.0, 20.0, 3.0, 70.0))
            .with_view(&view),
    );
    graph.add_entity(
        GeometryEntity::polyline(
            vec![
                Point2::new(20.0, 50.0),
                Point2::new(280.0, 50.0),
                Point2::new(280.0, 54.0),
                Point2::new(20.0, 54.0),
            ],
            true,
        )
        .with_view(&view)
        .with_component(&spar),
    );
    graph.add_entity(
        GeometryEntity::polyline(
            vec![
                Point2::new(100.0, 20.0),
                Point2::new(103.0, 20.0),
                Point2::new(103.0, 50.0),
                Point2::new(103.0, 54.0),
                Point2::new(103.0, 90.0),
                Point2::new(100.0, 90.0),
            ],
            true,
        )
        .with_view(&view)
        .with_component(&rib),
    );
    DxfLayoutAssigner::new().assign(&mut graph, &mut NamingContext::new());
    Plan { graph, spar, rib }
}

fn base_drawing(graph: &SceneGraph) -> Vec<u8> {
    CadWriter::default().write(graph).unwrap()
}

fn without_notes(graph: &SceneGraph) -> serde_json::Value {
    let mut value = serde_json::to_value(graph).unwrap();
    value.as_object_mut().unwrap().remove("processing_notes");
    value
}

#[test]
fn test_unmatched_rule_only_adds_a_note() {
    let Plan { mut graph, .. } = plan();
    let before = without_notes(&graph);
    let notes = graph.processing_notes.len();
    let drawing = base_drawing(&graph);

    let catalog = Catalog::builtin();
    let mut engine = SubstitutionEngine::new(&catalog, CadWriter::default(), Default::default());
    let rule = SubstitutionRule::new("ply ribs")
        .for_type(ComponentType::Rib)
        .with_criteria(TargetCriteria {
            name_contains: Some("W1".into()),
            ..Default::default()
        })
        .with_attribute("material", json!("plywood"));
    let out = engine.apply(&drawing, &mut graph, &[rule]).unwrap();

    assert_eq!(without_notes(&graph), before);
    assert_eq!(graph.processing_notes.len(), notes + 1);
    assert_eq!(
        graph.processing_notes.last().map(String::as_str),
        Some("Substitution 'ply ribs': no matching components")
    );
    assert_eq!(out.report.components_modified(), 0);
    assert_eq!(engine.state(), SubstitutionState::Idle);
}

#[test]
fn test_missing_drawing_is_fatal() {
    let Plan { mut graph, .. } = plan();
    let before = graph.clone();
    let catalog = Catalog::builtin();
    let mut engine = SubstitutionEngine::new(&catalog, CadWriter::default(), Default::default());
    let rule = SubstitutionRule::new("scale").for_type(ComponentType::Spar);

    let err = engine.apply(b"", &mut graph, &[rule]).unwrap_err();
    assert!(matches!(err, SubstitutionError::MissingDrawing));
    assert_eq!(graph, before);
}

#[test]
fn test_catalog_spar_resizes_section_and_notches() {
    let Plan {
        mut graph,
        spar,
        rib,
    } = plan();
    let drawing = base_drawing(&graph);

    let catalog = Catalog::builtin();
    let mut engine = SubstitutionEngine::new(&catalog, CadWriter::default(), Default::default());
    let rule = SubstitutionRule::new("heavier spar")
        .for_type(ComponentType::Spar)
        .with_catalog("BALSA_STICK_1_4_SQ");
    let out = engine.apply(&drawing, &mut graph, &[rule]).unwrap();

    let spar_c = graph.component(&spar).unwrap();
    assert_eq!(spar_c.catalog_id.as_deref(), Some("BALSA_STICK_1_4_SQ"));
    assert_eq!(spar_c.name, "1/4 SQ Balsa Stick (main spar)");
    assert!(spar_c.attributes.cross_section.is_some());
    // 4 px（1 mm/px）→ 6.35 mm，只改短边
    assert!((spar_c.bbox.height() - 6.35).abs() < 1e-9);
    assert!((spar_c.bbox.width() - 260.0).abs() < 1e-9);
    assert!((spar_c.bbox.center().y - 52.0).abs() < 1e-9);

    let rib_outline = graph.entities_of_component(&rib).next().unwrap();
    match rib_outline.shape() {
        Shape::Polyline(pl) => {
            assert!((pl.points[2].y - (52.0 - 6.35 / 2.0)).abs() < 1e-9);
            assert!((pl.points[3].y - (52.0 + 6.35 / 2.0)).abs() < 1e-9);
            assert_eq!(pl.points[0].y, 20.0);
            assert_eq!(pl.points[4].y, 90.0);
        }
        other => panic!("unexpected {:?}", other),
    }

    let outcome = &out.report.rules[0];
    assert_eq!(outcome.matched, 1);
    assert_eq!(outcome.entities_transformed, 1);
    assert_eq!(outcome.notched_entities, 1);
    assert_eq!(
        graph.processing_notes.last().map(String::as_str),
        Some("Substitution 'heavier spar': 1 components modified")
    );

    let summary = summarize(&out.drawing).unwrap();
    assert!(summary.layers.contains("COMP_SPAR"));
    assert_eq!(summary.count("INSERT"), 2);
}

#[test]
fn test_foreign_entities_are_kept() {
    let Plan { mut graph, .. } = plan();
    let mut drawing = planmod_file::reader::load_drawing(&base_drawing(&graph)).unwrap();
    let mut line = dxf::entities::Line::default();
    line.p2 = dxf::Point::new(10.0, 10.0, 0.0);
    let mut entity = dxf::entities::Entity::new(dxf::entities::EntityType::Line(line));
    entity.common.layer = "PILOT".to_string();
    drawing.add_entity(entity);
    let mut bytes = Vec::new();
    drawing.save(&mut bytes).unwrap();

    let catalog = Catalog::builtin();
    let mut engine = SubstitutionEngine::new(&catalog, CadWriter::default(), Default::default());
    let rule = SubstitutionRule::new("offset rib")
        .for_type(ComponentType::Rib)
        .with_attribute("offset", json!({"x": 10, "y": 0}));
    let out = engine.apply(&bytes, &mut graph, &[rule]).unwrap();

    assert_eq!(out.report.carried_entities, 1);
    let summary = summarize(&out.drawing).unwrap();
    assert_eq!(summary.count("LINE"), 1);
    assert!(summary.layers.contains("PILOT"));
}

#[test]
fn test_failure_keeps_earlier_rules() {
    let Plan {
        mut graph, spar, ..
    } = plan();
    let drawing = base_drawing(&graph);
    let width_before = graph.component(&spar).unwrap().bbox.width();

    let catalog = Catalog::builtin();
    let mut engine = SubstitutionEngine::new(&catalog, CadWriter::default(), Default::default());
    let rules = [
        SubstitutionRule::new("longer spar")
            .for_component(spar.clone())
            .with_attribute("scale", json!({"x": 1.1, "y": 1.0})),
        SubstitutionRule::new("broken"),
    ];
    let err = engine.apply(&drawing, &mut graph, &rules).unwrap_err();

    assert_eq!(err.applied(), 1);
    let width_after = graph.component(&spar).unwrap().bbox.width();
    assert!((width_after - width_before * 1.1).abs() < 1e-9);
    assert_eq!(
        graph.processing_notes.last().map(String::as_str),
        Some("Substitution 'longer spar': 1 components modified")
    );
}
