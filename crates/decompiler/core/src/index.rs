//! Composite-key registry of decoded nodes.
//!
//! Two maps are kept. The full-key map is register-once and holds one
//! node per (table, primary key). The partial-key map holds every node
//! sharing a leading part of the key, in registration order, for tables
//! whose rows are looked up by less than their whole key (a directory
//! search is keyed by signature, parent and path but referenced by
//! signature alone).

use std::collections::{BTreeMap, HashMap};

use msi_document::NodeId;
use msi_schema::KEY_DELIMITER;

use crate::error::{DecompileError, DecompileResult};

type Key = (String, Vec<String>);

#[derive(Debug, Default)]
pub struct ElementIndex {
    full: BTreeMap<Key, NodeId>,
    partial: BTreeMap<Key, Vec<NodeId>>,
    origin: HashMap<NodeId, Key>,
}

fn joined(values: &[String]) -> String {
    values.join(&KEY_DELIMITER.to_string())
}

impl ElementIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node under its full key. A second registration under the
    /// same key is an invariant violation.
    pub fn register(&mut self, table: &str, key: Vec<String>, node: NodeId) -> DecompileResult<()> {
        let entry = (table.to_string(), key);
        if self.full.contains_key(&entry) {
            return Err(DecompileError::DuplicateIndexKey {
                table: entry.0,
                key: joined(&entry.1),
            });
        }
        self.origin.insert(node, entry.clone());
        self.full.insert(entry, node);
        Ok(())
    }

    /// Register a node under a partial key. Any number of nodes may share one.
    pub fn register_partial(&mut self, table: &str, key: Vec<String>, node: NodeId) {
        self.partial
            .entry((table.to_string(), key))
            .or_default()
            .push(node);
    }

    /// Node registered under a full key.
    pub fn get(&self, table: &str, key: &[&str]) -> Option<NodeId> {
        let key = (table.to_string(), key.iter().map(|k| k.to_string()).collect());
        self.full.get(&key).copied()
    }

    /// Node registered under a single-column key.
    pub fn get_one(&self, table: &str, key: &str) -> Option<NodeId> {
        self.get(table, &[key])
    }

    /// First of `tables` holding a node under a single-column key.
    pub fn find_in(&self, tables: &[&str], key: &str) -> Option<(String, NodeId)> {
        tables
            .iter()
            .find_map(|t| self.get_one(t, key).map(|n| (t.to_string(), n)))
    }

    /// Nodes sharing a partial key, in registration order.
    pub fn get_partial(&self, table: &str, key: &[&str]) -> &[NodeId] {
        let key = (table.to_string(), key.iter().map(|k| k.to_string()).collect());
        self.partial.get(&key).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Table and joined key a node was registered under.
    pub fn origin(&self, node: NodeId) -> Option<(&str, String)> {
        self.origin
            .get(&node)
            .map(|(table, key)| (table.as_str(), joined(key)))
    }

    /// Drop a node from both maps, e.g. after it was pruned.
    pub fn remove(&mut self, node: NodeId) {
        if let Some(key) = self.origin.remove(&node) {
            self.full.remove(&key);
        }
        self.partial.retain(|_, nodes| {
            nodes.retain(|n| *n != node);
            !nodes.is_empty()
        });
    }

    pub fn contains(&self, table: &str, key: &[&str]) -> bool {
        self.get(table, key).is_some()
    }

    /// Number of full-key registrations.
    pub fn len(&self) -> usize {
        self.full.len()
    }

    pub fn is_empty(&self) -> bool {
        self.full.is_empty()
    }
}
