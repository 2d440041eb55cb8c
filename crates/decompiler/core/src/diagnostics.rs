//! Diagnostics: the only output channel besides the document tree.
//!
//! Each diagnostic is handed to a [`DiagnosticSink`] as soon as it is
//! produced, in row-processing order, and is also kept in the run's own
//! ordered list returned with the output.

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Fatal,
    Warning,
}

/// Message code of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    // ── Warnings ──
    ExpectedForeignRow,
    UnknownEnumerant,
    UnparsableNumber,
    DeprecatedTable,
    UnknownBits,
    AmbiguousBits,
    SelfNestedFeature,
    ParentCycle,
    UnreachableSearch,
    OrphanedNode,
    UnimplementedTable,
    // ── Fatal ──
    MissingTableDefinition,
    UnknownRootKind,
    InvariantViolation,
    InvalidConfiguration,
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ExpectedForeignRow => "expected-foreign-row",
            Self::UnknownEnumerant => "unknown-enumerant",
            Self::UnparsableNumber => "unparsable-number",
            Self::DeprecatedTable => "deprecated-table",
            Self::UnknownBits => "unknown-bits",
            Self::AmbiguousBits => "ambiguous-bits",
            Self::SelfNestedFeature => "self-nested-feature",
            Self::ParentCycle => "parent-cycle",
            Self::UnreachableSearch => "unreachable-search",
            Self::OrphanedNode => "orphaned-node",
            Self::UnimplementedTable => "unimplemented-table",
            Self::MissingTableDefinition => "missing-table-definition",
            Self::UnknownRootKind => "unknown-root-kind",
            Self::InvariantViolation => "invariant-violation",
            Self::InvalidConfiguration => "invalid-configuration",
        };
        write!(f, "{}", s)
    }
}

/// One reported problem with its context.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub message: String,
    pub table: Option<String>,
    pub key: Option<String>,
    pub referenced_table: Option<String>,
    pub referenced_key: Option<String>,
}

impl Diagnostic {
    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    pub fn fatal(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Fatal, code, message)
    }

    fn new(severity: Severity, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            table: None,
            key: None,
            referenced_table: None,
            referenced_key: None,
        }
    }

    pub fn at(mut self, table: &str, key: &str) -> Self {
        self.table = Some(table.to_string());
        self.key = Some(key.to_string());
        self
    }

    pub fn in_table(mut self, table: &str) -> Self {
        self.table = Some(table.to_string());
        self
    }

    pub fn referencing(mut self, table: &str, key: &str) -> Self {
        self.referenced_table = Some(table.to_string());
        self.referenced_key = Some(key.to_string());
        self
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Fatal => "fatal",
            Severity::Warning => "warning",
        };
        write!(f, "{} [{}]", severity, self.code)?;
        if let Some(table) = &self.table {
            write!(f, " {}", table)?;
            if let Some(key) = &self.key {
                write!(f, "/{}", key)?;
            }
        }
        write!(f, ": {}", self.message)
    }
}

// ── Sinks ───────────────────────────────────────────────────────────

/// Receiver for diagnostics as they are produced.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: &Diagnostic);
}

/// Sink that keeps every diagnostic.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub diagnostics: Vec<Diagnostic>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&mut self, diagnostic: &Diagnostic) {
        self.diagnostics.push(diagnostic.clone());
    }
}

/// Sink that forwards diagnostics to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&mut self, diagnostic: &Diagnostic) {
        let table = diagnostic.table.as_deref().unwrap_or("-");
        let key = diagnostic.key.as_deref().unwrap_or("-");
        match diagnostic.severity {
            Severity::Fatal => error!(
                code = %diagnostic.code,
                table,
                key,
                "{}",
                diagnostic.message
            ),
            Severity::Warning => warn!(
                code = %diagnostic.code,
                table,
                key,
                "{}",
                diagnostic.message
            ),
        }
    }
}

// ── Log ─────────────────────────────────────────────────────────────

/// Ordered diagnostics of one run, forwarding each entry to a sink.
pub struct DiagnosticLog<'s> {
    entries: Vec<Diagnostic>,
    sink: &'s mut dyn DiagnosticSink,
}

impl<'s> DiagnosticLog<'s> {
    pub fn new(sink: &'s mut dyn DiagnosticSink) -> Self {
        Self {
            entries: Vec::new(),
            sink,
        }
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.sink.report(&diagnostic);
        self.entries.push(diagnostic);
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            self.push(diagnostic);
        }
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn warning_count(&self) -> usize {
        self.entries.iter().filter(|d| !d.is_fatal()).count()
    }

    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }
}
