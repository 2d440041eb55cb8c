//! Decompiler error types.
//!
//! Every variant is fatal: it aborts the run and no document is returned.
//! Recoverable problems are reported as warning [`Diagnostic`]s instead.
//!
//! [`Diagnostic`]: crate::diagnostics::Diagnostic

use thiserror::Error;

use msi_document::TreeError;

use crate::diagnostics::DiagnosticCode;

/// Errors that abort a decompile run.
#[derive(Debug, Error)]
pub enum DecompileError {
    /// A foreign key targets a table with no known definition.
    #[error("table {table} references {referenced}, which has no definition")]
    MissingTableDefinition { table: String, referenced: String },

    /// The configured document root kind is not recognized.
    #[error("unknown document root kind: {0}")]
    UnknownRootKind(String),

    /// A composite key was registered twice in the element index.
    #[error("duplicate element key {table}/{key}")]
    DuplicateIndexKey { table: String, key: String },

    /// A finalization unit is scheduled before one of its prerequisites.
    #[error("finalize unit {unit} must run after {prerequisite}")]
    PipelineOrder { unit: String, prerequisite: String },

    /// Two extension recipes claim the same table.
    #[error("an extension recipe for table {0} is already registered")]
    DuplicateExtension(String),

    /// A structural tree operation failed.
    #[error("document tree error: {0}")]
    Tree(#[from] TreeError),

    /// Configuration could not be loaded or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DecompileError {
    /// Diagnostic code reported when this error aborts a run.
    pub fn code(&self) -> DiagnosticCode {
        match self {
            Self::MissingTableDefinition { .. } => DiagnosticCode::MissingTableDefinition,
            Self::UnknownRootKind(_) => DiagnosticCode::UnknownRootKind,
            Self::Config(_) | Self::Io(_) => DiagnosticCode::InvalidConfiguration,
            Self::DuplicateIndexKey { .. }
            | Self::PipelineOrder { .. }
            | Self::DuplicateExtension(_)
            | Self::Tree(_) => DiagnosticCode::InvariantViolation,
        }
    }
}

/// Result type for decompiler operations.
pub type DecompileResult<T> = Result<T, DecompileError>;
