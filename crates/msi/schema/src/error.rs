//! Schema error types.

use thiserror::Error;

/// Errors raised while assembling schemas or table dumps.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Two definitions were supplied for the same table name.
    #[error("duplicate table definition: {0}")]
    DuplicateTable(String),

    /// A row does not have one field per column.
    #[error("row width mismatch in table '{table}': expected {expected} fields, found {actual}")]
    RowWidth {
        table: String,
        expected: usize,
        actual: usize,
    },

    /// A column name was requested that the table does not define.
    #[error("unknown column '{column}' in table '{table}'")]
    UnknownColumn { table: String, column: String },
}

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;
