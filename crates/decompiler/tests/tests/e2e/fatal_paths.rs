//! End-to-end test: runs that end on a fatal error.
//!
//! Verifies that:
//! - A fatal error yields no tree and exactly one fatal diagnostic, last
//! - Warnings produced before the fatal error are kept
//! - Each fatal condition maps to its diagnostic code

use msi_decompiler::{
    CollectingSink, DecompileError, DecompileResult, Decompiler, DecompilerConfig,
    DiagnosticCode, ExtensionRegistry, LinkContext, LinkingUnit, Severity, UnitId, UnitReport,
};
use msi_decompiler_tests::*;
use msi_schema::{ColumnCategory, ColumnDefinition, Table, TableDefinition};

struct NeedsMissing;

impl LinkingUnit for NeedsMissing {
    fn unit_id(&self) -> UnitId {
        UnitId::Extension("needs-missing".into())
    }

    fn prerequisites(&self) -> Vec<UnitId> {
        vec![UnitId::Extension("missing".into())]
    }

    fn link(&self, _cx: &mut LinkContext<'_, '_>) -> DecompileResult<UnitReport> {
        Ok(UnitReport::new(self.unit_id(), 0, "unreachable"))
    }
}

fn assert_fatal(output: &msi_decompiler::DecompileOutput, code: DiagnosticCode) {
    assert!(output.tree.is_none());
    assert!(output.view().is_none());
    let fatal: Vec<_> = output
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Fatal)
        .collect();
    assert_eq!(fatal.len(), 1);
    assert_eq!(fatal[0].code, code);
    assert_eq!(output.diagnostics.last(), Some(fatal[0]));
}

#[test]
fn unknown_root_kind() {
    let config = DecompilerConfig::from_toml_str("root_kind = \"Bundle\"").unwrap();
    let output = decompile_with(config, &dump(Vec::new()));
    assert_fatal(&output, DiagnosticCode::UnknownRootKind);
}

#[test]
fn foreign_key_to_undefined_table() {
    let definition = TableDefinition::new(
        "Widget",
        vec![
            ColumnDefinition::new("Widget", ColumnCategory::Identifier).primary(),
            ColumnDefinition::new("Gadget_", ColumnCategory::Identifier).references(&["Gadget"]),
        ],
    );
    let output = decompile(&dump_with(Table::new(definition)));
    assert_fatal(&output, DiagnosticCode::MissingTableDefinition);
}

#[test]
fn duplicate_primary_key_keeps_earlier_warnings() {
    let tables = dump(vec![
        table("Directory", vec![directory("LOST", Some("NOWHERE"), "Lost")]),
        table(
            "Property",
            vec![
                vec!["DUP".into(), "1".into()],
                vec!["DUP".into(), "2".into()],
            ],
        ),
    ]);
    let mut sink = CollectingSink::new();
    let output = Decompiler::new(DecompilerConfig::default()).decompile_with_sink(&tables, &mut sink);
    assert_fatal(&output, DiagnosticCode::InvariantViolation);
    assert!(output
        .warnings()
        .any(|d| d.code == DiagnosticCode::ExpectedForeignRow));
    assert_eq!(sink.diagnostics, output.diagnostics);
}

#[test]
fn extension_unit_with_unscheduled_prerequisite() {
    let mut extensions = ExtensionRegistry::new();
    extensions.register_unit(NeedsMissing);
    let decompiler = Decompiler::with_extensions(DecompilerConfig::default(), extensions);
    let output = decompiler.decompile(&dump(Vec::new()));
    assert_fatal(&output, DiagnosticCode::InvariantViolation);
    assert!(output.fatal().unwrap().message.contains("extension:needs-missing"));
}

#[test]
fn malformed_configuration_is_rejected() {
    let err = DecompilerConfig::from_toml_str("suppress_ui_sequences = \"maybe\"").unwrap_err();
    assert!(matches!(err, DecompileError::Config(_)));
    assert_eq!(err.code(), DiagnosticCode::InvalidConfiguration);
}

fn dump_with(table: Table) -> msi_schema::TableSet {
    let mut set = msi_schema::TableSet::new();
    set.insert(table).unwrap();
    set
}
