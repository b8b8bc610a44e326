use planmod_core::prelude::*;
use std::fs;

#[test]
fn test_load_dir_skips_broken_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("motors.json"),
        r#"{"components": [{
            "id": "MOTOR_2212",
            "name": "2212 Outrunner",
            "component_type": "motor",
            "category": "motors",
            "material": "steel",
            "mass": {"basis": "per_unit", "grams": 52.0}
        }]}"#,
    )
    .unwrap();
    fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
    fs::write(dir.path().join("readme.txt"), "ignored").unwrap();

    let mut catalog = Catalog::builtin();
    let before = catalog.len();
    let loaded = catalog.load_dir(dir.path()).unwrap();

    assert_eq!(loaded, 1);
    assert_eq!(catalog.len(), before + 1);
    assert_eq!(
        catalog.get("MOTOR_2212").unwrap().mass,
        Some(CatalogMass::PerUnit { grams: 52.0 })
    );
}

#[test]
fn test_load_missing_dir_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = Catalog::empty();
    assert!(catalog.load_dir(&dir.path().join("nope")).is_err());
}

#[test]
fn test_catalog_unit_mass_in_graph() {
    let catalog = Catalog::builtin();
    let materials = MaterialTable::builtin();

    let mut graph = SceneGraph::new("hinges");
    for x in [0.0, 200.0] {
        let mut hinge = Component::new(
            "hinge",
            ComponentType::Hinge,
            BoundingBox2::from_xywh(x, 0.0, 10.0, 10.0),
        );
        hinge.catalog_id = Some("HINGE_NYLON_MED".into());
        graph.add_component(hinge);
    }

    let report = MassPropertiesCalculator::new(&catalog, &materials).calculate(&graph);
    assert!((report.total_mass_g - 1.0).abs() < 1e-12);
    assert!((report.center_of_gravity.x - 105.0).abs() < 1e-9);
    assert!(report
        .component_masses
        .iter()
        .all(|c| matches!(c.source, MassSource::CatalogUnit { .. })));
}
