//! Loading documents written by older schema versions.

use geolabel::model::io_geolabel::{from_project_str, read_project, to_project_string};
use geolabel::model::LabelId;
use geolabel::GeolabelError;
use std::path::Path;

#[test]
fn label_centric_fixture_synthesizes_images() {
    let project = read_project(Path::new("tests/fixtures/legacy_v1.geolabel")).unwrap();

    assert_eq!(project.image_count(), 3);
    let a = project.image("/data/old/a.tif").unwrap();
    assert_eq!(a.name(), "A");
    assert_eq!(a.group(), "old");
    assert_eq!(a.labels().len(), 2);
    assert_eq!(project.image("/data/old/b.tif").unwrap().name(), "b");
    assert!(project.image("/data/old/empty.tif").unwrap().labels().is_empty());

    // Legacy files carry no identifiers: every label is its own object.
    for id in [1, 2, 5] {
        assert!(project.linked_labels(LabelId(id)).is_empty());
    }
    let (_, first) = project.label_by_id(LabelId(1)).unwrap();
    assert_eq!(first.pixel_x(), 50.0);
    assert_eq!(first.pixel_y(), 25.0);
    assert_eq!(project.next_id(), LabelId(6));
}

#[test]
fn label_centric_identity_is_minted_per_load() {
    let json = std::fs::read_to_string("tests/fixtures/legacy_v1.geolabel").unwrap();
    let first = from_project_str(&json).unwrap();
    let second = from_project_str(&json).unwrap();
    let a = first.label_by_id(LabelId(1)).unwrap().1.unique_id();
    let b = second.label_by_id(LabelId(1)).unwrap().1.unique_id();
    assert_ne!(a, b);
}

#[test]
fn version_2_0_stores_absolute_pixels() {
    let json = r#"{
        "version": "2.0",
        "classes": ["car"],
        "images": [{
            "path": "/d/a.tif", "name": "a", "group": "",
            "original_width": 100, "original_height": 50,
            "labels": [{"id": 1, "class_name": "car", "pixel_x": 40, "pixel_y": 20,
                        "lon": 1.0, "lat": 2.0}]
        }],
        "_next_id": 2
    }"#;
    let project = from_project_str(json).unwrap();
    let (_, label) = project.label_by_id(LabelId(1)).unwrap();
    assert_eq!(label.pixel_x(), 40.0);
    assert_eq!(label.pixel_y(), 20.0);
}

#[test]
fn version_2_1_stores_fractions() {
    let json = r#"{
        "version": "2.1",
        "classes": ["car"],
        "images": [{
            "path": "/d/a.tif", "name": "a",
            "original_width": 100, "original_height": 50,
            "labels": [{"id": 1, "class_name": "car", "pixel_x": 0.4, "pixel_y": 0.4,
                        "lon": 1.0, "lat": 2.0}]
        }, {
            "path": "/d/b.tif", "name": "b",
            "labels": [{"id": 2, "class_name": "car", "pixel_x": 7, "pixel_y": 8,
                        "lon": 1.0, "lat": 2.0}]
        }],
        "_next_id": 3
    }"#;
    let project = from_project_str(json).unwrap();
    let (_, a) = project.label_by_id(LabelId(1)).unwrap();
    assert!((a.pixel_x() - 40.0).abs() < 1e-9);
    assert!((a.pixel_y() - 20.0).abs() < 1e-9);
    // Without dimensions the stored value is already absolute.
    let (_, b) = project.label_by_id(LabelId(2)).unwrap();
    assert_eq!(b.pixel_x(), 7.0);
}

#[test]
fn version_3_0_custom_readers_and_reader_ext() {
    let json = r#"{
        "version": "3.0",
        "classes": [],
        "custom_readers": {"h5": "./readers/h5.py", "nc": "netcdf_reader"},
        "images": [{
            "path": "/d/a.h5", "name": "a",
            "reader": {"h5": "h5_gcps"}
        }, {
            "path": "/d/b.gim", "name": "b",
            "reader_ext": "gim"
        }]
    }"#;
    let project = from_project_str(json).unwrap();
    // Per-image entries win over the project-wide table.
    assert_eq!(project.custom_reader("h5"), Some("h5_gcps"));
    assert_eq!(project.custom_reader("nc"), Some("netcdf_reader"));
    assert_eq!(project.custom_reader("gim"), Some("custom"));

    let written = to_project_string(&project).unwrap();
    assert!(!written.contains("custom_readers"));
    assert!(!written.contains("reader_ext"));
}

#[test]
fn stale_next_id_is_raised() {
    let json = r#"{
        "version": "3.2",
        "images": [{"path": "a", "name": "a", "labels": [
            {"id": 7, "class_name": "c", "pixel_x": 0, "pixel_y": 0, "lon": 0, "lat": 0}
        ]}],
        "_next_id": 2
    }"#;
    let project = from_project_str(json).unwrap();
    assert_eq!(project.next_id(), LabelId(8));
}

#[test]
fn duplicate_classes_are_collapsed() {
    let json = r#"{"version": "3.2", "classes": ["car", "car", "", "tree"], "images": []}"#;
    let project = from_project_str(json).unwrap();
    assert_eq!(project.classes(), ["car".to_string(), "tree".to_string()]);
}

#[test]
fn half_set_transform_is_dropped() {
    let json = r#"{
        "version": "3.2",
        "images": [
            {"path": "a", "name": "a", "affine_coeffs": [1, 0, 0, 0, -1, 0]},
            {"path": "b", "name": "b", "affine_coeffs": [1, 0, 0], "crs_epsg": 3857},
            {"path": "c", "name": "c", "affine_coeffs": [1, 0, 0, 0, -1, 0], "crs_epsg": 3857}
        ]
    }"#;
    let project = from_project_str(json).unwrap();
    assert!(!project.image("a").unwrap().is_georeferenced());
    assert!(!project.image("b").unwrap().is_georeferenced());
    assert!(project.image("c").unwrap().is_georeferenced());
}

#[test]
fn missing_required_label_fields_are_invalid() {
    let json = r#"{
        "version": "3.2",
        "images": [{"path": "a", "name": "a", "labels": [{"id": 1, "class_name": "c"}]}]
    }"#;
    assert!(matches!(
        from_project_str(json),
        Err(GeolabelError::ProjectInvalid { .. })
    ));
}

#[test]
fn future_versions_are_rejected() {
    for version in ["4.0", "10.1"] {
        let json = format!(r#"{{"version": "{version}", "images": []}}"#);
        match from_project_str(&json) {
            Err(GeolabelError::UnsupportedVersion { version: found, .. }) => {
                assert_eq!(found, version)
            }
            other => panic!("expected UnsupportedVersion, got {other:?}"),
        }
    }
}

#[test]
fn later_minor_versions_still_load() {
    let json = r#"{"version": "3.10", "classes": ["car"], "images": []}"#;
    assert!(from_project_str(json).is_ok());
}

#[test]
fn label_without_image_path_is_skipped() {
    let json = r#"{
        "labels": [{"id": 1, "class_name": "c", "pixel_x": 1, "pixel_y": 1, "lon": 0, "lat": 0}],
        "image_paths": [""],
        "_next_id": 2
    }"#;
    let project = from_project_str(json).unwrap();
    assert_eq!(project.image_count(), 0);
    assert_eq!(project.label_count(), 0);
    assert_eq!(project.next_id(), LabelId(2));

    let written = to_project_string(&project).unwrap();
    let value: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert!(value["images"].as_array().unwrap().is_empty());
}

#[test]
fn pixel_keys_win_over_xy_when_both_are_present() {
    let image_centric = r#"{
        "version": "2.0",
        "images": [{"path": "a", "name": "a", "labels": [
            {"id": 1, "class_name": "c", "pixel_x": 0.5, "x": 3, "pixel_y": 2, "y": 9,
             "lon": 0, "lat": 0}
        ]}]
    }"#;
    let project = from_project_str(image_centric).unwrap();
    let (_, label) = project.label_by_id(LabelId(1)).unwrap();
    assert_eq!(label.pixel_x(), 0.5);
    assert_eq!(label.pixel_y(), 2.0);

    let label_centric = r#"{
        "labels": [{"id": 1, "class_name": "c", "pixel_x": 0.5, "x": 3, "y": 4,
                    "lon": 0, "lat": 0, "image_path": "/d/a.tif"}]
    }"#;
    let project = from_project_str(label_centric).unwrap();
    let (_, label) = project.label_by_id(LabelId(1)).unwrap();
    assert_eq!(label.pixel_x(), 0.5);
    assert_eq!(label.pixel_y(), 4.0);
}

#[test]
fn numeric_version_loads_like_its_string_form() {
    let json = r#"{
        "version": 2.1,
        "images": [{
            "path": "/d/a.tif", "name": "a",
            "original_width": 100, "original_height": 50,
            "labels": [{"id": 1, "class_name": "car", "pixel_x": 0.5, "pixel_y": 0.5,
                        "lon": 1.0, "lat": 2.0}]
        }]
    }"#;
    let project = from_project_str(json).unwrap();
    let (_, label) = project.label_by_id(LabelId(1)).unwrap();
    assert!((label.pixel_x() - 50.0).abs() < 1e-9);
    assert!((label.pixel_y() - 25.0).abs() < 1e-9);
}
