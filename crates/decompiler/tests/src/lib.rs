//! Shared fixtures for the decompiler end-to-end and property suites.
//!
//! Besides table builders this crate carries a reference forward
//! scheduler: it turns reconstructed placements back into sequence
//! numbers the way an installer compiler would, so tests can check that
//! reconstruction loses nothing.

use std::collections::{BTreeMap, HashSet};

use msi_decompiler::{
    CollectingSink, DecompileOutput, Decompiler, DecompilerConfig, PlacedAction, Placement,
    SequencePhase, StandardActions,
};
use msi_schema::{catalog, FieldValue, Row, Table, TableSet};

// ---------------------------------------------------------------------------
// Table builders
// ---------------------------------------------------------------------------

/// A built-in table filled with `rows`. Panics on a width mismatch.
pub fn table(name: &str, rows: Vec<Vec<FieldValue>>) -> Table {
    let definition = catalog::definition(name)
        .unwrap_or_else(|| panic!("{} is not a built-in table", name));
    let mut table = Table::new(definition);
    for fields in rows {
        table
            .push_row(Row::new(fields))
            .unwrap_or_else(|e| panic!("bad fixture row: {}", e));
    }
    table
}

/// A table dump made of `tables`.
pub fn dump(tables: Vec<Table>) -> TableSet {
    let mut set = TableSet::new();
    for t in tables {
        set.insert(t)
            .unwrap_or_else(|e| panic!("bad fixture table: {}", e));
    }
    set
}

pub fn null() -> FieldValue {
    FieldValue::Null
}

pub fn int(n: i64) -> FieldValue {
    FieldValue::Integer(n)
}

/// `Directory` row.
pub fn directory(id: &str, parent: Option<&str>, default_dir: &str) -> Vec<FieldValue> {
    vec![id.into(), parent.into(), default_dir.into()]
}

/// Sequence table row.
pub fn sequence(action: &str, condition: Option<&str>, position: i64) -> Vec<FieldValue> {
    vec![action.into(), condition.into(), int(position)]
}

/// `CustomAction` row setting a property.
pub fn set_property_action(id: &str) -> Vec<FieldValue> {
    vec![id.into(), int(51), "PROP".into(), "1".into()]
}

/// `RegLocator` row reading an HKLM value.
pub fn reg_locator(signature: &str, key: &str) -> Vec<FieldValue> {
    vec![signature.into(), int(2), key.into(), "InstallDir".into(), int(0)]
}

/// `DrLocator` row.
pub fn dr_locator(signature: &str, parent: Option<&str>, path: &str) -> Vec<FieldValue> {
    vec![signature.into(), parent.into(), path.into(), null()]
}

// ---------------------------------------------------------------------------
// Running
// ---------------------------------------------------------------------------

/// Install a test subscriber honoring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Decompile with the default configuration, collecting diagnostics.
pub fn decompile(tables: &TableSet) -> DecompileOutput {
    decompile_with(DecompilerConfig::default(), tables)
}

pub fn decompile_with(config: DecompilerConfig, tables: &TableSet) -> DecompileOutput {
    init_tracing();
    let mut sink = CollectingSink::new();
    Decompiler::new(config).decompile_with_sink(tables, &mut sink)
}

// ---------------------------------------------------------------------------
// Reference forward scheduler
// ---------------------------------------------------------------------------

/// Sequence number every placed action receives when its placement is
/// compiled back. Actions whose placement cannot be resolved, e.g. a
/// before/after chain that loops, are missing from the result.
pub fn forward_schedule(
    phase: SequencePhase,
    standard: &StandardActions,
    placed: &[PlacedAction],
) -> BTreeMap<String, i64> {
    let by_action: BTreeMap<&str, &PlacedAction> =
        placed.iter().map(|p| (p.action.as_str(), p)).collect();
    let mut resolved = BTreeMap::new();
    for action in by_action.keys() {
        let mut visiting = HashSet::new();
        if let Some(n) = resolve(phase, standard, &by_action, action, &mut visiting) {
            resolved.insert(action.to_string(), n);
        }
    }
    resolved
}

fn resolve(
    phase: SequencePhase,
    standard: &StandardActions,
    placed: &BTreeMap<&str, &PlacedAction>,
    action: &str,
    visiting: &mut HashSet<String>,
) -> Option<i64> {
    if !visiting.insert(action.to_string()) {
        return None;
    }
    let default = || standard.get(phase, action).map(|s| s.sequence);
    let Some(entry) = placed.get(action) else {
        // Anchors not in the table sit at their default position.
        return default();
    };
    match &entry.placement {
        Placement::Absolute(n) => Some(*n),
        Placement::Suppressed | Placement::ConditionOnly => default(),
        Placement::Before(anchor) => resolve(phase, standard, placed, anchor, visiting).map(|n| n - 1),
        Placement::After(anchor) => resolve(phase, standard, placed, anchor, visiting).map(|n| n + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use msi_decompiler::{SequenceReconstructor, SequenceRow};

    #[test]
    fn scheduler_follows_anchor_chains() {
        let standard = StandardActions::builtin();
        let placed = SequenceReconstructor::new(SequencePhase::InstallExecute, &standard).reconstruct(&[
            SequenceRow::new("CostInitialize", None, 800),
            SequenceRow::new("MyAction", None, 801),
            SequenceRow::new("CostFinalize", None, 802),
        ]);
        let numbers = forward_schedule(SequencePhase::InstallExecute, &standard, &placed);
        assert_eq!(numbers["CostInitialize"], 800);
        assert_eq!(numbers["MyAction"], 801);
        assert_eq!(numbers["CostFinalize"], 802);
    }
}
