use planmod_core::prelude::*;
use planmod_file::{summarize, CadWriter, DxfLayoutAssigner, NamingContext};

fn wing_plan() -> SceneGraph {
    let mut graph = SceneGraph::new("Wing Plan").with_image_size(800, 400);
    let top = graph.add_view(View::new(
        "Wing top view",
        ViewType::Top,
        BoundingBox2::from_xywh(0.0, 0.0, 800.0, 400.0),
    ));
    let rib = graph.add_component(
        Component::new("", ComponentType::Rib, BoundingBox2::from_xywh(100.0, 50.0, 6.0, 200.0))
            .with_view(&top),
    );
    graph.add_component(
        Component::new(
            "main spar",
            ComponentType::Spar,
            BoundingBox2::from_xywh(50.0, 120.0, 600.0, 8.0),
        )
        .with_view(&top),
    );

    graph.add_entity(
        GeometryEntity::line(Point2::new(50.0, 120.0), Point2::new(650.0, 120.0)).with_view(&top),
    );
    graph.add_entity(
        GeometryEntity::polyline(
            vec![
                Point2::new(100.0, 50.0),
                Point2::new(106.0, 50.0),
                Point2::new(106.0, 250.0),
                Point2::new(100.0, 250.0),
            ],
            true,
        )
        .with_view(&top)
        .with_component(&rib),
    );
    graph.add_entity(GeometryEntity::circle(Point2::new(400.0, 300.0), 12.0).with_view(&top));
    graph.add_entity(GeometryEntity::arc(Point2::new(700.0, 300.0), 30.0, 90.0, 180.0));
    graph.add_entity(GeometryEntity::pass_through("SPLINE"));
    graph.add_annotation(Annotation::new(
        "1/4 SQ BALSA",
        AnnotationType::MaterialNote,
        BoundingBox2::from_xywh(300.0, 140.0, 80.0, 10.0),
    ));
    graph
}

#[test]
fn test_written_drawing_reparses_with_same_counts() {
    let mut graph = wing_plan();
    let layout = DxfLayoutAssigner::new().assign(&mut graph, &mut NamingContext::new());

    let writer = CadWriter::default();
    let (_, stats) = writer.build(&graph);
    let bytes = writer.write(&graph).unwrap();
    let summary = summarize(&bytes).unwrap();

    assert_eq!(summary.count_kind(EntityKind::Line), graph.count_entities(EntityKind::Line));
    assert_eq!(summary.count_kind(EntityKind::Circle), 1);
    assert_eq!(summary.count_kind(EntityKind::Arc), 1);
    // 实体多段线 + 视图外框
    assert_eq!(
        summary.count_kind(EntityKind::Polyline),
        graph.count_entities(EntityKind::Polyline) + stats.outlines
    );
    assert_eq!(summary.count("INSERT"), 2);
    assert_eq!(summary.count("TEXT"), 2);
    assert_eq!(stats.placeholders, 1);

    for layer in layout.view_layers.iter().chain(&layout.component_layers) {
        assert!(summary.layers.contains(layer), "missing layer {}", layer);
    }
    for name in ["0", "ANNOTATIONS", "DIMENSIONS", "CONSTRUCTION", "CENTERLINES"] {
        assert!(summary.layers.contains(name), "missing layer {}", name);
    }
    for component in &graph.components {
        let block = component.dxf_block_name.as_deref().unwrap();
        assert!(summary.blocks.contains(block), "missing block {}", block);
    }
    assert!(summary.blocks.contains("RIB_001"));
    assert!(summary.blocks.contains("MAIN_SPAR"));
}

#[test]
fn test_unassigned_graph_still_writes() {
    let graph = wing_plan();
    let bytes = CadWriter::default().write(&graph).unwrap();
    let summary = summarize(&bytes).unwrap();

    // 未分配块名时部件画成外框
    assert_eq!(summary.count("INSERT"), 0);
    assert_eq!(summary.count_kind(EntityKind::Polyline), 1 + 1 + 2);
    assert!(summary.layers.contains("COMP_SPAR"));
}

fn drawing_with(entities: Vec<dxf::entities::EntityType>) -> Vec<u8> {
    let mut drawing = dxf::Drawing::new();
    for specific in entities {
        let mut entity = dxf::entities::Entity::new(specific);
        entity.common.layer = "OUTLINE".to_string();
        drawing.add_entity(entity);
    }
    let mut bytes = Vec::new();
    drawing.save(&mut bytes).unwrap();
    bytes
}

fn angle_close(a: f64, b: f64) -> bool {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d) < 1e-6
}

#[test]
fn test_imported_coordinates_survive_rewrite() {
    let mut line = dxf::entities::Line::default();
    line.p1 = dxf::Point::new(0.0, 10.0, 0.0);
    line.p2 = dxf::Point::new(20.0, 10.0, 0.0);
    let mut circle = dxf::entities::Circle::default();
    circle.center = dxf::Point::new(30.0, -5.0, 0.0);
    circle.radius = 2.0;
    let mut arc = dxf::entities::Arc::default();
    arc.center = dxf::Point::new(5.0, 5.0, 0.0);
    arc.radius = 3.0;
    arc.start_angle = 0.0;
    arc.end_angle = 90.0;
    let bytes = drawing_with(vec![
        dxf::entities::EntityType::Line(line),
        dxf::entities::EntityType::Circle(circle),
        dxf::entities::EntityType::Arc(arc),
    ]);

    let graph = planmod_file::dxf_import::import_scene(&bytes, "imported").unwrap();
    let rewritten = CadWriter::default().write(&graph).unwrap();
    let drawing = planmod_file::reader::load_drawing(&rewritten).unwrap();

    let mut seen = 0;
    for entity in drawing.entities() {
        match &entity.specific {
            dxf::entities::EntityType::Line(l) => {
                assert!((l.p1.x - 0.0).abs() < 1e-9 && (l.p1.y - 10.0).abs() < 1e-9);
                assert!((l.p2.x - 20.0).abs() < 1e-9 && (l.p2.y - 10.0).abs() < 1e-9);
                seen += 1;
            }
            dxf::entities::EntityType::Circle(c) => {
                assert!((c.center.x - 30.0).abs() < 1e-9 && (c.center.y + 5.0).abs() < 1e-9);
                assert!((c.radius - 2.0).abs() < 1e-9);
                seen += 1;
            }
            dxf::entities::EntityType::Arc(a) => {
                assert!((a.center.y - 5.0).abs() < 1e-9);
                assert!(angle_close(a.start_angle, 0.0));
                assert!(angle_close(a.end_angle, 90.0));
                seen += 1;
            }
            _ => {}
        }
    }
    assert_eq!(seen, 3);
}
