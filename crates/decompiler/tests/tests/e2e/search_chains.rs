//! End-to-end test: search signatures shared between consumers.
//!
//! Verifies that:
//! - The first consumer of a signature owns the search element
//! - A second consumer gets a reference carrying only the signature
//! - Directory searches nest inside their parent search
//! - Searches nobody consumes are reported

use msi_decompiler::DiagnosticCode;
use msi_decompiler_tests::*;
use msi_document::NodeView;

fn count_kind(view: &NodeView, kind: &str) -> usize {
    let own = usize::from(view.kind == kind);
    own + view.children.iter().map(|c| count_kind(c, kind)).sum::<usize>()
}

#[test]
fn property_owns_search_compliance_check_references_it() {
    let tables = dump(vec![
        table("Property", vec![vec!["INSTALLDIR".into(), "C:\\App".into()]]),
        table("RegLocator", vec![reg_locator("InstallPath", "Software\\Vendor\\App")]),
        table("AppSearch", vec![vec!["INSTALLDIR".into(), "InstallPath".into()]]),
        table("CCPSearch", vec![vec!["InstallPath".into()]]),
    ]);
    let output = decompile(&tables);
    assert!(output.is_success());
    assert_eq!(output.warnings().count(), 0);

    let view = output.view().unwrap();
    let property = view.child("Property", "INSTALLDIR").unwrap();
    assert_eq!(property.attribute("Value"), Some("C:\\App"));
    let search = property.child("RegistrySearch", "InstallPath").unwrap();
    assert_eq!(search.attribute("Root"), Some("HKLM"));

    let check = view.children_of_kind("ComplianceCheck").next().unwrap();
    let reference = check.child("RegistrySearchRef", "InstallPath").unwrap();
    assert_eq!(reference.attributes, vec![("Id".to_string(), "InstallPath".to_string())]);

    assert_eq!(count_kind(&view, "RegistrySearch"), 1);
    assert_eq!(count_kind(&view, "RegistrySearchRef"), 1);
}

#[test]
fn secure_property_keeps_its_search() {
    let tables = dump(vec![
        table(
            "Property",
            vec![vec!["SecureCustomProperties".into(), "TOOLSDIR".into()]],
        ),
        table(
            "DrLocator",
            vec![
                dr_locator("ToolsRoot", None, "C:\\Tools"),
                dr_locator("ToolsBin", Some("ToolsRoot"), "bin"),
            ],
        ),
        table("AppSearch", vec![vec!["TOOLSDIR".into(), "ToolsBin".into()]]),
    ]);
    let output = decompile(&tables);
    assert!(output.is_success());

    let view = output.view().unwrap();
    assert!(view.child("Property", "SecureCustomProperties").is_none());
    let property = view.child("Property", "TOOLSDIR").unwrap();
    assert_eq!(property.attribute("Secure"), Some("yes"));
    let root = property.child("DirectorySearch", "ToolsRoot").unwrap();
    let bin = root.child("DirectorySearch", "ToolsBin").unwrap();
    assert_eq!(bin.attribute("Path"), Some("bin"));
    assert!(output
        .warnings()
        .all(|d| d.code != DiagnosticCode::UnreachableSearch));
}

#[test]
fn drive_rooted_search_under_compliance_drive() {
    let tables = dump(vec![
        table("DrLocator", vec![dr_locator("SystemDrive", Some("CCP_DRIVE"), "\\")]),
        table("CCPSearch", vec![vec!["SystemDrive".into()]]),
    ]);
    let output = decompile(&tables);
    let view = output.view().unwrap();
    let check = view.children_of_kind("ComplianceCheck").next().unwrap();
    let drive = check.children_of_kind("ComplianceDrive").next().unwrap();
    assert!(drive.child("DirectorySearch", "SystemDrive").is_some());
}

#[test]
fn unconsumed_search_is_unreachable_and_orphaned() {
    let tables = dump(vec![table(
        "RegLocator",
        vec![reg_locator("Forgotten", "Software\\Old")],
    )]);
    let output = decompile(&tables);
    assert!(output.is_success());

    let codes: Vec<_> = output.warnings().map(|d| d.code).collect();
    assert_eq!(
        codes,
        vec![DiagnosticCode::UnreachableSearch, DiagnosticCode::OrphanedNode]
    );
    assert!(output
        .warnings()
        .all(|d| d.key.as_deref() == Some("Forgotten")));
}

#[test]
fn chained_search_with_several_consumers() {
    let tables = dump(vec![
        table(
            "DrLocator",
            vec![
                dr_locator("ParentDir", None, "C:\\Tools"),
                dr_locator("ChildDir", Some("ParentDir"), "bin"),
            ],
        ),
        table(
            "AppSearch",
            vec![
                vec!["FIRST".into(), "ChildDir".into()],
                vec!["SECOND".into(), "ChildDir".into()],
            ],
        ),
        table("CCPSearch", vec![vec!["ChildDir".into()]]),
    ]);
    let output = decompile(&tables);
    assert!(output.is_success());
    assert_eq!(output.warnings().count(), 0);

    let view = output.view().unwrap();
    let owner = view.child("Property", "FIRST").unwrap();
    let parent = owner.child("DirectorySearch", "ParentDir").unwrap();
    assert!(parent.child("DirectorySearch", "ChildDir").is_some());

    let second = view.child("Property", "SECOND").unwrap();
    let reference = second.child("DirectorySearchRef", "ChildDir").unwrap();
    assert_eq!(reference.attributes, vec![("Id".to_string(), "ChildDir".to_string())]);
    let check = view.children_of_kind("ComplianceCheck").next().unwrap();
    assert!(check.child("DirectorySearchRef", "ChildDir").is_some());

    assert_eq!(count_kind(&view, "DirectorySearch"), 2);
    assert_eq!(count_kind(&view, "DirectorySearchRef"), 2);
}
