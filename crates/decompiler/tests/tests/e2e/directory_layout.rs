//! End-to-end test: directories, features, components and files.
//!
//! Verifies that:
//! - Directory rows nest by parent and split their compound names
//! - A directory naming itself as parent becomes a second root
//! - Components land under their directory and files under components
//! - Key paths and source paths are filled in after decoding
//! - A self-nested feature is placed at the root with a warning

use msi_decompiler::DiagnosticCode;
use msi_decompiler_tests::*;
use msi_schema::FieldValue;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn feature(id: &str, parent: Option<&str>) -> Vec<FieldValue> {
    vec![
        id.into(),
        parent.into(),
        "Title".into(),
        null(),
        int(1),
        int(1),
        null(),
        int(0),
    ]
}

fn component(id: &str, directory: &str, key_path: Option<&str>) -> Vec<FieldValue> {
    vec![
        id.into(),
        "{00000000-0000-0000-0000-000000000001}".into(),
        directory.into(),
        int(0),
        null(),
        key_path.into(),
    ]
}

fn file(id: &str, component: &str, name: &str) -> Vec<FieldValue> {
    vec![
        id.into(),
        component.into(),
        name.into(),
        int(1024),
        "1.0.0.0".into(),
        null(),
        null(),
        int(1),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn nested_directories_split_names() {
    let tables = dump(vec![table(
        "Directory",
        vec![
            directory("ROOT", None, "Top"),
            directory("SUB", Some("ROOT"), "S|Sub"),
        ],
    )]);
    let output = decompile(&tables);
    assert!(output.is_success());

    let view = output.view().unwrap();
    assert_eq!(view.children.len(), 1);
    let root = view.child("Directory", "ROOT").unwrap();
    assert_eq!(root.attribute("Name"), Some("Top"));
    assert_eq!(root.children.len(), 1);
    let sub = root.child("Directory", "SUB").unwrap();
    assert_eq!(sub.attribute("ShortName"), Some("S"));
    assert_eq!(sub.attribute("Name"), Some("Sub"));
}

#[test]
fn self_parent_directory_is_a_second_root() {
    let tables = dump(vec![table(
        "Directory",
        vec![
            directory("TARGETDIR", None, "SourceDir"),
            directory("OTHERROOT", Some("OTHERROOT"), "Other"),
        ],
    )]);
    let output = decompile(&tables);
    assert!(output.is_success());

    let view = output.view().unwrap();
    assert!(view.child("Directory", "TARGETDIR").is_some());
    let other = view.child("Directory", "OTHERROOT").unwrap();
    assert!(other.children.is_empty());
    assert!(output
        .warnings()
        .all(|d| d.code != DiagnosticCode::OrphanedNode));
}

#[test]
fn components_files_and_features_link_up() {
    let tables = dump(vec![
        table(
            "Directory",
            vec![
                directory("TARGETDIR", None, "SourceDir"),
                directory("APPDIR", Some("TARGETDIR"), "APP|Application"),
            ],
        ),
        table(
            "Component",
            vec![
                component("Main", "APPDIR", Some("app.exe")),
                component("Folder", "APPDIR", None),
            ],
        ),
        table("File", vec![file("app.exe", "Main", "app.exe")]),
        table("Feature", vec![feature("Complete", None)]),
        table(
            "FeatureComponents",
            vec![
                vec!["Complete".into(), "Main".into()],
                vec!["Complete".into(), "Folder".into()],
            ],
        ),
    ]);
    let output = decompile(&tables);
    assert!(output.is_success());
    assert_eq!(output.warnings().count(), 0);

    let view = output.view().unwrap();
    let appdir = view
        .child("Directory", "TARGETDIR")
        .and_then(|t| t.child("Directory", "APPDIR"))
        .unwrap();
    let main = appdir.child("Component", "Main").unwrap();
    let exe = main.child("File", "app.exe").unwrap();
    assert_eq!(exe.attribute("KeyPath"), Some("yes"));
    assert_eq!(exe.attribute("Source"), Some("SourceDir\\Application\\app.exe"));
    assert_eq!(exe.attribute("DefaultVersion"), Some("1.0.0.0"));

    let folder = appdir.child("Component", "Folder").unwrap();
    assert_eq!(folder.attribute("KeyPath"), Some("yes"));

    let complete = view.child("Feature", "Complete").unwrap();
    let refs: Vec<_> = complete
        .children_of_kind("ComponentRef")
        .filter_map(|r| r.attribute("Id"))
        .collect();
    assert_eq!(refs, vec!["Main", "Folder"]);
}

#[test]
fn self_nested_feature_goes_to_root() {
    let tables = dump(vec![table(
        "Feature",
        vec![feature("Loop", Some("Loop")), feature("Child", Some("Loop"))],
    )]);
    let output = decompile(&tables);
    assert!(output.is_success());

    let view = output.view().unwrap();
    let looped = view.child("Feature", "Loop").unwrap();
    assert!(looped.child("Feature", "Child").is_some());

    let warning = output
        .warnings()
        .find(|d| d.code == DiagnosticCode::SelfNestedFeature)
        .unwrap();
    assert_eq!(warning.key.as_deref(), Some("Loop"));
}

#[test]
fn missing_component_directory_is_reported_and_orphaned() {
    let tables = dump(vec![table(
        "Component",
        vec![component("Stray", "NOWHERE", None)],
    )]);
    let output = decompile(&tables);
    assert!(output.is_success());

    let codes: Vec<_> = output.warnings().map(|d| d.code).collect();
    assert!(codes.contains(&DiagnosticCode::ExpectedForeignRow));
    assert!(codes.contains(&DiagnosticCode::OrphanedNode));
    let missing = output
        .warnings()
        .find(|d| d.code == DiagnosticCode::ExpectedForeignRow)
        .unwrap();
    assert_eq!(missing.referenced_table.as_deref(), Some("Directory"));
    assert_eq!(missing.referenced_key.as_deref(), Some("NOWHERE"));
}
