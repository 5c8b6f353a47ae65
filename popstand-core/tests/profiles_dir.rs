//! Profile registry and config loading from disk.

use std::fs;

use popstand_core::{
    normalize, EngineConfig, NormalizeError, NormalizerDefaults, Product, ProfileRegistry, RawForm,
    StandPipeline, ValueSource,
};

#[test]
fn registry_loads_profiles_from_dir() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("energy-bar.json"),
        r#"{"id": "energy-bar", "name": "Energy Bar", "width": 4.5, "height": 15, "depth": 2}"#,
    )
    .unwrap();
    fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
    fs::write(
        dir.path().join("flat.json"),
        r#"{"id": "flat", "name": "Flat", "width": 4.5, "height": 0, "depth": 2}"#,
    )
    .unwrap();
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let registry = ProfileRegistry::load_from_dir(dir.path()).unwrap();
    let ids: Vec<_> = registry.list().iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["energy-bar", "wafer-cookie"]);

    let form = RawForm {
        product_category: Some("energy-bar".to_string()),
        ..RawForm::default()
    };
    let n = normalize(&form, &NormalizerDefaults::default(), &registry).unwrap();
    assert_eq!(n.spec.product, Product { width: 4.5, height: 15.0, depth: 2.0 });
    assert_eq!(n.provenance.source_of("product.height"), Some(ValueSource::Profile));
    assert_eq!(n.brand.product, "Energy Bar");
}

#[test]
fn unknown_category_is_rejected() {
    let registry = ProfileRegistry::new();
    let form = RawForm {
        product_category: Some("energy-bar".to_string()),
        ..RawForm::default()
    };
    let err = normalize(&form, &NormalizerDefaults::default(), &registry).unwrap_err();
    assert_eq!(err, NormalizeError::UnknownProductCategory("energy-bar".to_string()));
}

#[test]
fn config_file_drives_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("popstand.json");
    fs::write(&path, r#"{"thresholds": {"thinShelfCm": 2.5}}"#).unwrap();

    let config = EngineConfig::load(&path).unwrap();
    let pipeline = StandPipeline::new(ProfileRegistry::new(), config);

    // Tabletop shelves are 2cm, now below the configured limit.
    let form = RawForm {
        depth_count: Some(12.0.into()),
        ..RawForm::default()
    };
    let checked = pipeline.check(&form).unwrap();
    assert!(checked.validation.is_valid);
    assert_eq!(checked.validation.warnings.len(), 1);
    assert!(checked.validation.warnings[0].starts_with("THIN SHELF"));
}
