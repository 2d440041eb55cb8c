//! End-to-end test: identical input gives identical output.
//!
//! Verifies that:
//! - Two runs over the same dump produce the same document
//! - The diagnostics come out in the same order
//! - The serialized document is byte-identical

use msi_decompiler_tests::*;
use msi_schema::TableSet;

fn package() -> TableSet {
    dump(vec![
        table(
            "Directory",
            vec![
                directory("TARGETDIR", None, "SourceDir"),
                directory("ProgramFilesFolder", Some("TARGETDIR"), "PFiles"),
                directory("APPDIR", Some("ProgramFilesFolder"), "APP|Application"),
                directory("DANGLING", Some("GONE"), "Dangling"),
            ],
        ),
        table(
            "Component",
            vec![vec![
                "Main".into(),
                "{00000000-0000-0000-0000-0000000000AA}".into(),
                "APPDIR".into(),
                int(0x4),
                null(),
                "RegMain".into(),
            ]],
        ),
        table(
            "Registry",
            vec![vec![
                "RegMain".into(),
                int(1),
                "Software\\Vendor".into(),
                "Installed".into(),
                "#1".into(),
                "Main".into(),
            ]],
        ),
        table(
            "Property",
            vec![
                vec!["ProductName".into(), "Demo".into()],
                vec!["SecureCustomProperties".into(), "OLDVERSION;INSTALLDIR".into()],
            ],
        ),
        table("RegLocator", vec![reg_locator("InstallPath", "Software\\Vendor")]),
        table(
            "DrLocator",
            vec![
                dr_locator("Cfg", Some("InstallPath"), "config"),
                dr_locator("Stray", None, "C:\\Stray"),
            ],
        ),
        table(
            "AppSearch",
            vec![
                vec!["INSTALLDIR".into(), "InstallPath".into()],
                vec!["CFGDIR".into(), "Cfg".into()],
            ],
        ),
        table("CCPSearch", vec![vec!["InstallPath".into()]]),
        table("CustomAction", vec![set_property_action("SetDefaults")]),
        table(
            "InstallExecuteSequence",
            vec![
                sequence("LaunchConditions", None, 100),
                sequence("SetDefaults", None, 101),
                sequence("CostInitialize", None, 800),
                sequence("CostFinalize", None, 1000),
            ],
        ),
    ])
}

#[test]
fn repeated_runs_are_identical() {
    let tables = package();
    let first = decompile(&tables);
    let second = decompile(&tables);

    assert!(first.is_success());
    assert_eq!(first.view(), second.view());
    assert_eq!(first.diagnostics, second.diagnostics);
    assert!(!first.diagnostics.is_empty());

    let a = serde_json::to_string(&first.view()).unwrap();
    let b = serde_json::to_string(&second.view()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn reports_describe_every_unit() {
    let output = decompile(&package());
    let units: Vec<_> = output.reports.iter().map(|r| r.unit.to_string()).collect();
    assert_eq!(
        units,
        vec![
            "component-key-path",
            "file-source",
            "remove-file-directory",
            "secure-properties",
            "locator-chain",
            "upgrade-groups",
            "action-sequences",
        ]
    );
}
