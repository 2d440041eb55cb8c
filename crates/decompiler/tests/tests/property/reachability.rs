//! Property tests: every decoded element is either placed in the document
//! or reported as an orphan.

use std::collections::BTreeSet;

use msi_decompiler::DiagnosticCode;
use msi_decompiler_tests::*;
use msi_schema::TableSet;
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Helpers / Strategies
// ---------------------------------------------------------------------------

/// Where a directory row points its parent column.
#[derive(Clone, Debug)]
enum ParentChoice {
    Root,
    Itself,
    Row(usize),
    Missing,
}

fn arb_parent(n: usize) -> impl Strategy<Value = ParentChoice> {
    prop_oneof![
        1 => Just(ParentChoice::Root),
        1 => Just(ParentChoice::Itself),
        4 => (0..n).prop_map(ParentChoice::Row),
        1 => Just(ParentChoice::Missing),
    ]
}

fn arb_directories() -> impl Strategy<Value = Vec<ParentChoice>> {
    (1usize..12).prop_flat_map(|n| prop::collection::vec(arb_parent(n), n))
}

fn key(i: usize) -> String {
    format!("D{}", i)
}

fn directories(parents: &[ParentChoice]) -> TableSet {
    let rows = parents
        .iter()
        .enumerate()
        .map(|(i, parent)| {
            let parent = match parent {
                ParentChoice::Root => None,
                ParentChoice::Itself => Some(key(i)),
                ParentChoice::Row(k) => Some(key(*k)),
                ParentChoice::Missing => Some("MISSING".to_string()),
            };
            directory(&key(i), parent.as_deref(), &format!("Dir{}", i))
        })
        .collect();
    dump(vec![table("Directory", rows)])
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    /// Unreachable directories carry an orphan diagnostic naming their row.
    #[test]
    fn unplaced_directories_are_reported(parents in arb_directories()) {
        let output = decompile(&directories(&parents));
        prop_assert!(output.is_success());
        let tree = output.tree.as_ref().unwrap();

        let orphaned: BTreeSet<String> = output
            .warnings()
            .filter(|d| d.code == DiagnosticCode::OrphanedNode)
            .filter_map(|d| d.key.clone())
            .collect();

        for id in tree.ids() {
            if id == tree.root() {
                continue;
            }
            let node = tree.get(id).unwrap();
            let name = node.id().unwrap_or_default().to_string();
            prop_assert!(
                tree.is_reachable(id) != orphaned.contains(&name),
                "{} reachable={} orphaned={}",
                name,
                tree.is_reachable(id),
                orphaned.contains(&name)
            );
        }
    }

    /// Each row yields exactly one directory element.
    #[test]
    fn one_element_per_row(parents in arb_directories()) {
        let output = decompile(&directories(&parents));
        let tree = output.tree.as_ref().unwrap();

        let mut seen = BTreeSet::new();
        for id in tree.ids() {
            let node = tree.get(id).unwrap();
            if node.kind.name() == "Directory" {
                let name = node.id().unwrap_or_default().to_string();
                prop_assert!(seen.insert(name.clone()), "{} decoded twice", name);
            }
        }
        prop_assert_eq!(seen.len(), parents.len());
    }

    /// A row naming itself as parent is never an orphan.
    #[test]
    fn self_parent_rows_are_placed(parents in arb_directories()) {
        let output = decompile(&directories(&parents));
        let orphaned: BTreeSet<String> = output
            .warnings()
            .filter(|d| d.code == DiagnosticCode::OrphanedNode)
            .filter_map(|d| d.key.clone())
            .collect();
        for (i, parent) in parents.iter().enumerate() {
            if matches!(parent, ParentChoice::Root | ParentChoice::Itself) {
                prop_assert!(!orphaned.contains(&key(i)));
            }
        }
    }
}
