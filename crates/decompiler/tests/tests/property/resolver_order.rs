//! Property tests: table ordering over arbitrary foreign-key graphs.
//!
//! Every table appears exactly once, and a table is ordered after every
//! table it references unless that reference closes a cycle.

use std::collections::{BTreeMap, BTreeSet};

use msi_decompiler::resolve_order;
use msi_schema::{ColumnCategory, ColumnDefinition, SchemaSet, TableDefinition};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Helpers / Strategies
// ---------------------------------------------------------------------------

fn name(i: usize) -> String {
    format!("T{:02}", i)
}

/// Adjacency lists: table `i` references the tables in `edges[i]`.
fn arb_graph() -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1usize..16).prop_flat_map(|n| {
        prop::collection::vec(prop::collection::vec(0..n, 0..4), n)
    })
}

fn schema(edges: &[Vec<usize>]) -> SchemaSet {
    let definitions = edges
        .iter()
        .enumerate()
        .map(|(i, targets)| {
            let mut columns =
                vec![ColumnDefinition::new("Id", ColumnCategory::Identifier).primary()];
            for (c, target) in targets.iter().enumerate() {
                columns.push(
                    ColumnDefinition::new(&format!("Ref{}", c), ColumnCategory::Identifier)
                        .nullable()
                        .references(&[name(*target).as_str()]),
                );
            }
            TableDefinition::new(&name(i), columns)
        })
        .collect();
    SchemaSet::from_definitions(definitions).unwrap()
}

/// Tables reachable from `start` by following references.
fn reachable(edges: &[Vec<usize>], start: usize) -> BTreeSet<usize> {
    let mut seen = BTreeSet::new();
    let mut stack = vec![start];
    while let Some(t) = stack.pop() {
        for &next in &edges[t] {
            if seen.insert(next) {
                stack.push(next);
            }
        }
    }
    seen
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    /// Each table is placed exactly once, cycles included.
    #[test]
    fn every_table_exactly_once(edges in arb_graph()) {
        let order = resolve_order(&schema(&edges)).unwrap();
        prop_assert_eq!(order.len(), edges.len());
        let unique: BTreeSet<_> = order.iter().collect();
        prop_assert_eq!(unique.len(), edges.len());
    }

    /// A reference that does not lead back to its table is honored.
    #[test]
    fn acyclic_references_come_first(edges in arb_graph()) {
        let order = resolve_order(&schema(&edges)).unwrap();
        let position: BTreeMap<String, usize> =
            order.iter().enumerate().map(|(i, t)| (t.clone(), i)).collect();

        for (from, targets) in edges.iter().enumerate() {
            for &to in targets {
                if to == from || reachable(&edges, to).contains(&from) {
                    continue;
                }
                prop_assert!(
                    position[&name(to)] < position[&name(from)],
                    "{} must precede {}",
                    name(to),
                    name(from)
                );
            }
        }
    }

    /// The same schema always yields the same order.
    #[test]
    fn order_is_deterministic(edges in arb_graph()) {
        let set = schema(&edges);
        prop_assert_eq!(resolve_order(&set).unwrap(), resolve_order(&set).unwrap());
    }
}
