//! Rows, tables, and the table dump of one package.
//!
//! Rows are supplied once per run by the extraction step and are never
//! mutated by the decompiler.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{SchemaError, SchemaResult};
use crate::table::{SchemaSet, TableDefinition};

/// Delimiter joining primary-key values into a composite key.
pub const KEY_DELIMITER: char = '/';

// ── Field Value ─────────────────────────────────────────────────────

/// A single field of a row.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Text(String),
    Binary(Vec<u8>),
}

impl FieldValue {
    pub fn text(value: &str) -> Self {
        Self::Text(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The textual value, if this is a text field.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view of the field.
    ///
    /// `Ok(None)` for null, `Ok(Some(n))` for integers and numeric text,
    /// `Err(raw)` when the value cannot be read as an integer.
    pub fn as_integer(&self) -> Result<Option<i64>, String> {
        match self {
            Self::Null => Ok(None),
            Self::Integer(n) => Ok(Some(*n)),
            Self::Text(s) => s.trim().parse::<i64>().map(Some).map_err(|_| s.clone()),
            Self::Binary(_) => Err("[binary]".into()),
        }
    }

    /// String form used for composite keys and attribute values.
    /// Null renders as the empty string.
    pub fn to_key_string(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Integer(n) => n.to_string(),
            Self::Text(s) => s.clone(),
            Self::Binary(_) => "[binary]".into(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.into())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

// ── Row ─────────────────────────────────────────────────────────────

/// One tuple of a table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub fields: Vec<FieldValue>,
}

static NULL_FIELD: FieldValue = FieldValue::Null;

impl Row {
    pub fn new(fields: Vec<FieldValue>) -> Self {
        Self { fields }
    }

    /// Field at a position; positions past the end read as null.
    pub fn field(&self, index: usize) -> &FieldValue {
        self.fields.get(index).unwrap_or(&NULL_FIELD)
    }

    /// Text at a position, `None` for null or non-text values.
    pub fn text(&self, index: usize) -> Option<&str> {
        self.field(index).as_str()
    }

    /// Non-null field rendered as a string.
    pub fn string(&self, index: usize) -> Option<String> {
        let field = self.field(index);
        if field.is_null() {
            None
        } else {
            Some(field.to_key_string())
        }
    }

    /// Primary-key values of this row, in column order.
    pub fn key_values(&self, definition: &TableDefinition) -> Vec<String> {
        definition
            .primary_key_positions()
            .into_iter()
            .map(|i| self.field(i).to_key_string())
            .collect()
    }

    /// Composite primary key joined by [`KEY_DELIMITER`].
    pub fn primary_key(&self, definition: &TableDefinition) -> String {
        let delimiter = KEY_DELIMITER.to_string();
        self.key_values(definition).join(&delimiter)
    }
}

// ── Table ───────────────────────────────────────────────────────────

/// A table definition with its rows.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Table {
    pub definition: TableDefinition,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(definition: TableDefinition) -> Self {
        Self {
            definition,
            rows: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Append a row, checking it has one field per column.
    pub fn push_row(&mut self, row: Row) -> SchemaResult<()> {
        if row.fields.len() != self.definition.columns.len() {
            return Err(SchemaError::RowWidth {
                table: self.definition.name.clone(),
                expected: self.definition.columns.len(),
                actual: row.fields.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Convenience for fixtures: append a row built from field values.
    pub fn with_row(mut self, fields: Vec<FieldValue>) -> SchemaResult<Self> {
        self.push_row(Row::new(fields))?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ── Table Set ───────────────────────────────────────────────────────

/// The table dump of one package, ordered by table name.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TableSet {
    tables: BTreeMap<String, Table>,
}

impl TableSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, table: Table) -> SchemaResult<()> {
        if self.tables.contains_key(table.name()) {
            return Err(SchemaError::DuplicateTable(table.name().to_string()));
        }
        self.tables.insert(table.name().to_string(), table);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Rows of a table, empty when the table is absent.
    pub fn rows(&self, name: &str) -> &[Row] {
        self.tables
            .get(name)
            .map(|t| t.rows.as_slice())
            .unwrap_or(&[])
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

    pub fn iter(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    /// Schema set made of the definitions carried by the tables.
    pub fn schema(&self) -> SchemaSet {
        let mut set = SchemaSet::new();
        for table in self.tables.values() {
            // Names are unique in the map, so insertion cannot collide.
            let _ = set.insert(table.definition.clone());
        }
        set
    }
}
