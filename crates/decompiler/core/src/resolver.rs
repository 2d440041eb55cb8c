//! Table processing order.
//!
//! Orders tables so that every table referenced by a foreign key is
//! decoded before the tables referring to it. A reference back into a
//! table that is still being resolved closes a cycle; that edge is dropped
//! for ordering only and the relationship is linked during finalization.

use std::collections::{BTreeSet, HashSet};

use tracing::debug;

use msi_schema::SchemaSet;

use crate::error::{DecompileError, DecompileResult};

/// Compute the processing order of every table in `schema`.
///
/// Each table appears exactly once. Resolution starts from the
/// alphabetically first unvisited table, so the order is deterministic.
pub fn resolve_order(schema: &SchemaSet) -> DecompileResult<Vec<String>> {
    let mut resolver = Resolver {
        schema,
        unvisited: schema.names().collect(),
        sorted: Vec::with_capacity(schema.len()),
        placed: HashSet::with_capacity(schema.len()),
    };

    while let Some(first) = resolver.unvisited.iter().next().copied() {
        resolver.visit(first)?;
    }

    debug!(tables = resolver.sorted.len(), "resolved table order");
    Ok(resolver.sorted)
}

struct Resolver<'a> {
    schema: &'a SchemaSet,
    unvisited: BTreeSet<&'a str>,
    sorted: Vec<String>,
    placed: HashSet<&'a str>,
}

impl<'a> Resolver<'a> {
    fn visit(&mut self, name: &'a str) -> DecompileResult<()> {
        let schema = self.schema;
        self.unvisited.remove(name);

        if let Some(definition) = schema.get(name) {
            for column in &definition.columns {
                for target in &column.key_tables {
                    let target = target.as_str();
                    if target == name || self.placed.contains(target) {
                        continue;
                    }
                    if !schema.contains(target) {
                        return Err(DecompileError::MissingTableDefinition {
                            table: name.to_string(),
                            referenced: target.to_string(),
                        });
                    }
                    // Neither placed nor unvisited: the target is on the
                    // current path, so this edge closes a cycle.
                    if self.unvisited.contains(target) {
                        self.visit(target)?;
                    }
                }
            }
        }

        self.placed.insert(name);
        self.sorted.push(name.to_string());
        Ok(())
    }
}
