//! Finalization linking.
//!
//! Relationships that cannot be resolved while a single table is being
//! decoded are linked here, once every table is in the index. Units run
//! in a fixed order; a unit that depends on the output of another
//! declares it as a prerequisite and the pipeline refuses any order that
//! schedules it first.
//!
//! Each unit runs exactly once per decompile. Running a unit a second time
//! over the same tree is not supported.

mod keypath;
mod locator;
mod properties;
mod sequences;
mod source;
mod upgrade;

pub use keypath::ComponentKeyPathUnit;
pub use locator::LocatorChainUnit;
pub use properties::SecurePropertiesUnit;
pub use sequences::ActionSequencesUnit;
pub use source::{FileSourceUnit, RemoveFileDirectoryUnit};
pub use upgrade::UpgradeGroupsUnit;

use serde::{Deserialize, Serialize};
use tracing::debug;

use msi_document::{DocumentTree, NodeId, NodeKind};
use msi_schema::{Row, TableDefinition, TableSet};

use crate::config::DecompilerConfig;
use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticLog};
use crate::error::{DecompileError, DecompileResult};
use crate::index::ElementIndex;

// ── Unit Identifier ─────────────────────────────────────────────────

/// Identifier for a linking unit.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitId {
    ComponentKeyPath,
    FileSource,
    RemoveFileDirectory,
    SecureProperties,
    LocatorChain,
    UpgradeGroups,
    ActionSequences,
    /// A unit supplied through the extension registry.
    Extension(String),
}

impl UnitId {
    /// Units that must have run before this one.
    pub fn prerequisites(&self) -> Vec<UnitId> {
        match self {
            Self::FileSource => vec![Self::ComponentKeyPath],
            Self::LocatorChain => vec![Self::SecureProperties],
            _ => Vec::new(),
        }
    }

    /// The built-in units, in the order they run.
    pub fn standard_order() -> Vec<UnitId> {
        vec![
            Self::ComponentKeyPath,
            Self::FileSource,
            Self::RemoveFileDirectory,
            Self::SecureProperties,
            Self::LocatorChain,
            Self::UpgradeGroups,
            Self::ActionSequences,
        ]
    }
}

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ComponentKeyPath => write!(f, "component-key-path"),
            Self::FileSource => write!(f, "file-source"),
            Self::RemoveFileDirectory => write!(f, "remove-file-directory"),
            Self::SecureProperties => write!(f, "secure-properties"),
            Self::LocatorChain => write!(f, "locator-chain"),
            Self::UpgradeGroups => write!(f, "upgrade-groups"),
            Self::ActionSequences => write!(f, "action-sequences"),
            Self::Extension(name) => write!(f, "extension:{}", name),
        }
    }
}

// ── Unit Report ─────────────────────────────────────────────────────

/// Outcome of one linking unit.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnitReport {
    pub unit: UnitId,
    pub changes: u32,
    pub description: String,
}

impl UnitReport {
    pub fn new(unit: UnitId, changes: u32, description: impl Into<String>) -> Self {
        Self {
            unit,
            changes,
            description: description.into(),
        }
    }
}

impl std::fmt::Display for UnitReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} changes, {}",
            self.unit, self.changes, self.description
        )
    }
}

// ── Link Context ────────────────────────────────────────────────────

/// A row read through its table definition.
#[derive(Clone, Copy)]
pub struct RowView<'a> {
    pub table: &'a str,
    pub definition: &'a TableDefinition,
    pub row: &'a Row,
}

impl<'a> RowView<'a> {
    /// Non-null value of a named column.
    pub fn get(&self, column: &str) -> Option<String> {
        let position = self.definition.column_index(column).ok()?;
        self.row.string(position)
    }

    /// Integer value of a named column; `Err` carries the raw text.
    pub fn integer(&self, column: &str) -> Result<Option<i64>, String> {
        match self.definition.column_index(column) {
            Ok(position) => self.row.field(position).as_integer(),
            Err(_) => Ok(None),
        }
    }

    pub fn key(&self) -> String {
        self.row.primary_key(self.definition)
    }
}

/// Everything a unit may read or change.
pub struct LinkContext<'a, 's> {
    pub tables: &'a TableSet,
    pub tree: &'a mut DocumentTree,
    pub index: &'a mut ElementIndex,
    pub config: &'a DecompilerConfig,
    pub diagnostics: &'a mut DiagnosticLog<'s>,
}

impl<'a, 's> LinkContext<'a, 's> {
    /// Rows of a table in row order. Absent tables yield nothing.
    pub fn rows(&self, table: &str) -> Vec<RowView<'a>> {
        let tables: &'a TableSet = self.tables;
        match tables.get(table) {
            Some(t) => t
                .rows
                .iter()
                .map(|row| RowView {
                    table: t.name(),
                    definition: &t.definition,
                    row,
                })
                .collect(),
            None => Vec::new(),
        }
    }

    /// Report a value that names a row which does not exist.
    pub fn missing_row(&mut self, from: &RowView<'_>, table: &str, key: &str) {
        self.diagnostics.push(
            Diagnostic::warning(
                DiagnosticCode::ExpectedForeignRow,
                format!("{} refers to missing {} row {}", from.key(), table, key),
            )
            .at(from.table, &from.key())
            .referencing(table, key),
        );
    }

    /// Integer column of a row; unparsable values are reported and read as absent.
    pub fn integer(&mut self, from: &RowView<'_>, column: &str) -> Option<i64> {
        match from.integer(column) {
            Ok(value) => value,
            Err(raw) => {
                self.diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticCode::UnparsableNumber,
                        format!("column {} value '{}' is not a number", column, raw),
                    )
                    .at(from.table, &from.key()),
                );
                None
            }
        }
    }

    /// The `Property` node named `id`, created under the root when absent.
    pub fn ensure_property(&mut self, id: &str) -> DecompileResult<NodeId> {
        if let Some(node) = self.index.get_one("Property", id) {
            return Ok(node);
        }
        let root = self.tree.root();
        let node = self
            .tree
            .create_child(root, NodeKind::Property, [("Id", id)].into())?;
        self.index.register("Property", vec![id.to_string()], node)?;
        Ok(node)
    }
}

// ── Linking Unit Trait ──────────────────────────────────────────────

/// A deferred linking step over the completed index and tree.
pub trait LinkingUnit: Send + Sync {
    fn unit_id(&self) -> UnitId;

    /// Units that must run earlier in the pipeline.
    fn prerequisites(&self) -> Vec<UnitId> {
        self.unit_id().prerequisites()
    }

    fn link(&self, cx: &mut LinkContext<'_, '_>) -> DecompileResult<UnitReport>;
}

// ── Pipeline ────────────────────────────────────────────────────────

/// Ordered linking units.
pub struct FinalizePipeline {
    units: Vec<Box<dyn LinkingUnit>>,
}

impl FinalizePipeline {
    /// An empty pipeline.
    pub fn new() -> Self {
        Self { units: Vec::new() }
    }

    /// The built-in units in their documented order.
    pub fn standard() -> Self {
        let mut pipeline = Self::new();
        for id in UnitId::standard_order() {
            let unit: Box<dyn LinkingUnit> = match id {
                UnitId::ComponentKeyPath => Box::new(ComponentKeyPathUnit),
                UnitId::FileSource => Box::new(FileSourceUnit),
                UnitId::RemoveFileDirectory => Box::new(RemoveFileDirectoryUnit),
                UnitId::SecureProperties => Box::new(SecurePropertiesUnit),
                UnitId::LocatorChain => Box::new(LocatorChainUnit),
                UnitId::UpgradeGroups => Box::new(UpgradeGroupsUnit),
                UnitId::ActionSequences => Box::new(ActionSequencesUnit),
                UnitId::Extension(_) => continue,
            };
            pipeline.push(unit);
        }
        pipeline
    }

    /// Append a unit after every unit already scheduled.
    pub fn push(&mut self, unit: Box<dyn LinkingUnit>) {
        self.units.push(unit);
    }

    /// Unit identifiers in run order.
    pub fn order(&self) -> Vec<UnitId> {
        self.units.iter().map(|u| u.unit_id()).collect()
    }

    /// Check that every unit runs after all of its prerequisites.
    pub fn validate(&self) -> DecompileResult<()> {
        let order = self.order();
        for (position, unit) in self.units.iter().enumerate() {
            for prerequisite in unit.prerequisites() {
                if !order[..position].contains(&prerequisite) {
                    return Err(DecompileError::PipelineOrder {
                        unit: unit.unit_id().to_string(),
                        prerequisite: prerequisite.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Run every unit in order.
    pub fn run(&self, cx: &mut LinkContext<'_, '_>) -> DecompileResult<Vec<UnitReport>> {
        let mut reports = Vec::with_capacity(self.units.len());
        for unit in &self.units {
            let report = unit.link(cx)?;
            debug!(unit = %report.unit, changes = report.changes, "{}", report.description);
            reports.push(report);
        }
        Ok(reports)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl Default for FinalizePipeline {
    fn default() -> Self {
        Self::standard()
    }
}
