//! Table definitions and the schema set of a run.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::column::ColumnDefinition;
use crate::error::{SchemaError, SchemaResult};

/// Definition of one table: a name and its ordered columns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
}

impl TableDefinition {
    pub fn new(name: &str, columns: Vec<ColumnDefinition>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Positions of the primary-key columns, in column order.
    pub fn primary_key_positions(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.primary_key)
            .map(|(i, _)| i)
            .collect()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> SchemaResult<usize> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| SchemaError::UnknownColumn {
                table: self.name.clone(),
                column: name.into(),
            })
    }

    /// Every distinct table referenced by a foreign key of this table,
    /// in column order. Self-references are included.
    pub fn referenced_tables(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for column in &self.columns {
            for target in &column.key_tables {
                if !out.contains(&target.as_str()) {
                    out.push(target);
                }
            }
        }
        out
    }
}

/// All table definitions known for one run, ordered by table name.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SchemaSet {
    tables: BTreeMap<String, TableDefinition>,
}

impl SchemaSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a schema set, rejecting duplicate names.
    pub fn from_definitions(definitions: Vec<TableDefinition>) -> SchemaResult<Self> {
        let mut set = Self::new();
        for definition in definitions {
            set.insert(definition)?;
        }
        Ok(set)
    }

    /// Add a definition. Fails when the name is already present.
    pub fn insert(&mut self, definition: TableDefinition) -> SchemaResult<()> {
        if self.tables.contains_key(&definition.name) {
            return Err(SchemaError::DuplicateTable(definition.name));
        }
        self.tables.insert(definition.name.clone(), definition);
        Ok(())
    }

    /// Add a definition unless one with the same name is present. Returns
    /// whether it was added.
    pub fn insert_if_absent(&mut self, definition: TableDefinition) -> bool {
        match self.tables.entry(definition.name.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(definition);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Table names in ascending order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TableDefinition> {
        self.tables.values()
    }
}
