//! Action sequence reconstruction.
//!
//! A sequence table is a total order of actions by integer position. The
//! document expresses the same order symbolically: an action is scheduled
//! before or after a neighbour, keeps the implicit position of a standard
//! action, or falls back to an explicit number. Reconstruction picks the
//! symbolic form whenever re-deriving positions from it reproduces the
//! original numbers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use msi_document::NodeKind;

use crate::config::DecompilerConfig;
use crate::error::{DecompileError, DecompileResult};

/// Standard action regenerated automatically when its row carries default
/// values.
pub const APP_SEARCH: &str = "AppSearch";

// ── Phases ──────────────────────────────────────────────────────────

/// One execution phase, backed by one sequence table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SequencePhase {
    InstallExecute,
    InstallUi,
    AdminExecute,
    AdminUi,
    AdvertiseExecute,
}

impl SequencePhase {
    pub const ALL: [SequencePhase; 5] = [
        Self::InstallUi,
        Self::InstallExecute,
        Self::AdminUi,
        Self::AdminExecute,
        Self::AdvertiseExecute,
    ];

    pub fn from_table(table: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.table() == table)
    }

    pub fn table(&self) -> &'static str {
        match self {
            Self::InstallExecute => "InstallExecuteSequence",
            Self::InstallUi => "InstallUISequence",
            Self::AdminExecute => "AdminExecuteSequence",
            Self::AdminUi => "AdminUISequence",
            Self::AdvertiseExecute => "AdvtExecuteSequence",
        }
    }

    /// Document element holding the phase's scheduled actions.
    pub fn container_kind(&self) -> NodeKind {
        match self {
            Self::InstallExecute => NodeKind::InstallExecuteSequence,
            Self::InstallUi => NodeKind::InstallUISequence,
            Self::AdminExecute => NodeKind::AdminExecuteSequence,
            Self::AdminUi => NodeKind::AdminUISequence,
            Self::AdvertiseExecute => NodeKind::AdvertiseExecuteSequence,
        }
    }

    pub fn is_ui(&self) -> bool {
        matches!(self, Self::InstallUi | Self::AdminUi)
    }
}

impl std::fmt::Display for SequencePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.table())
    }
}

// ── Standard Actions ────────────────────────────────────────────────

/// Default scheduling of a standard action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StandardAction {
    pub sequence: i64,
    pub condition: Option<String>,
}

const INSTALL_EXECUTE: &[(&str, i64)] = &[
    ("FindRelatedProducts", 25),
    ("AppSearch", 50),
    ("LaunchConditions", 100),
    ("ValidateProductID", 700),
    ("CostInitialize", 800),
    ("FileCost", 900),
    ("CostFinalize", 1000),
    ("MigrateFeatureStates", 1200),
    ("InstallValidate", 1400),
    ("InstallInitialize", 1500),
    ("ProcessComponents", 1600),
    ("UnpublishFeatures", 1800),
    ("SelfUnregModules", 2200),
    ("RemoveODBC", 2400),
    ("RemoveRegistryValues", 2600),
    ("RemoveShortcuts", 3200),
    ("RemoveEnvironmentStrings", 3300),
    ("RemoveFiles", 3500),
    ("RemoveFolders", 3600),
    ("CreateFolders", 3700),
    ("MoveFiles", 3800),
    ("InstallFiles", 4000),
    ("DuplicateFiles", 4210),
    ("CreateShortcuts", 4500),
    ("WriteRegistryValues", 5000),
    ("WriteEnvironmentStrings", 5200),
    ("InstallODBC", 5400),
    ("SelfRegModules", 5600),
    ("RegisterUser", 6000),
    ("RegisterProduct", 6100),
    ("PublishFeatures", 6300),
    ("PublishProduct", 6400),
    ("InstallFinalize", 6600),
];

const INSTALL_UI: &[(&str, i64)] = &[
    ("FindRelatedProducts", 25),
    ("AppSearch", 50),
    ("LaunchConditions", 100),
    ("ValidateProductID", 700),
    ("CostInitialize", 800),
    ("FileCost", 900),
    ("CostFinalize", 1000),
    ("MigrateFeatureStates", 1200),
    ("ExecuteAction", 1300),
];

const ADMIN_EXECUTE: &[(&str, i64)] = &[
    ("CostInitialize", 800),
    ("FileCost", 900),
    ("CostFinalize", 1000),
    ("InstallValidate", 1400),
    ("InstallInitialize", 1500),
    ("InstallAdminPackage", 3900),
    ("InstallFiles", 4000),
    ("InstallFinalize", 6600),
];

const ADMIN_UI: &[(&str, i64)] = &[
    ("CostInitialize", 800),
    ("FileCost", 900),
    ("CostFinalize", 1000),
    ("ExecuteAction", 1300),
];

const ADVERTISE_EXECUTE: &[(&str, i64)] = &[
    ("CostInitialize", 800),
    ("CostFinalize", 1000),
    ("InstallValidate", 1400),
    ("InstallInitialize", 1500),
    ("CreateShortcuts", 4500),
    ("RegisterClassInfo", 4600),
    ("RegisterExtensionInfo", 4700),
    ("RegisterProgIdInfo", 4800),
    ("RegisterMIMEInfo", 4900),
    ("PublishComponents", 6200),
    ("PublishFeatures", 6300),
    ("PublishProduct", 6400),
    ("InstallFinalize", 6600),
];

/// Registry of standard actions per phase.
#[derive(Clone, Debug, Default)]
pub struct StandardActions {
    actions: BTreeMap<(SequencePhase, String), StandardAction>,
}

impl StandardActions {
    pub fn new() -> Self {
        Self::default()
    }

    /// The installer's standard actions at their documented positions.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for (phase, actions) in [
            (SequencePhase::InstallExecute, INSTALL_EXECUTE),
            (SequencePhase::InstallUi, INSTALL_UI),
            (SequencePhase::AdminExecute, ADMIN_EXECUTE),
            (SequencePhase::AdminUi, ADMIN_UI),
            (SequencePhase::AdvertiseExecute, ADVERTISE_EXECUTE),
        ] {
            for (action, sequence) in actions {
                registry.insert(
                    phase,
                    action,
                    StandardAction {
                        sequence: *sequence,
                        condition: None,
                    },
                );
            }
        }
        registry
    }

    /// Built-in actions with the configured additions applied on top.
    pub fn from_config(config: &DecompilerConfig) -> DecompileResult<Self> {
        let mut registry = Self::builtin();
        for entry in &config.standard_actions {
            let phase = SequencePhase::from_table(&entry.table).ok_or_else(|| {
                DecompileError::Config(format!(
                    "standard action {} names unknown sequence table {}",
                    entry.action, entry.table
                ))
            })?;
            registry.insert(
                phase,
                &entry.action,
                StandardAction {
                    sequence: entry.sequence,
                    condition: entry.condition.clone(),
                },
            );
        }
        Ok(registry)
    }

    /// Add or replace a standard action.
    pub fn insert(&mut self, phase: SequencePhase, action: &str, standard: StandardAction) {
        self.actions.insert((phase, action.to_string()), standard);
    }

    pub fn get(&self, phase: SequencePhase, action: &str) -> Option<&StandardAction> {
        self.actions.get(&(phase, action.to_string()))
    }

    pub fn is_standard(&self, phase: SequencePhase, action: &str) -> bool {
        self.get(phase, action).is_some()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

// ── Placement ───────────────────────────────────────────────────────

/// How one action is scheduled in the document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placement {
    /// Explicit sequence number.
    Absolute(i64),
    /// Immediately before the named action.
    Before(String),
    /// Immediately after the named action.
    After(String),
    /// Standard action at its default position; only the condition is authored.
    ConditionOnly,
    /// Standard action with default scheduling; nothing is authored.
    Suppressed,
}

/// Action scheduled on exit from the installation instead of at a position.
pub fn exit_dialog_kind(sequence: i64) -> Option<&'static str> {
    match sequence {
        -1 => Some("success"),
        -2 => Some("cancel"),
        -3 => Some("error"),
        -4 => Some("suspend"),
        _ => None,
    }
}

/// One row of a sequence table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequenceRow {
    pub action: String,
    pub condition: Option<String>,
    pub sequence: i64,
}

impl SequenceRow {
    pub fn new(action: &str, condition: Option<&str>, sequence: i64) -> Self {
        Self {
            action: action.to_string(),
            condition: condition.map(str::to_string),
            sequence,
        }
    }
}

/// A row together with its reconstructed placement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacedAction {
    pub action: String,
    pub condition: Option<String>,
    pub sequence: i64,
    pub placement: Placement,
}

// ── Reconstructor ───────────────────────────────────────────────────

/// Turns the rows of one sequence table into placements.
pub struct SequenceReconstructor<'a> {
    phase: SequencePhase,
    standard: &'a StandardActions,
    force_absolute: bool,
}

impl<'a> SequenceReconstructor<'a> {
    pub fn new(phase: SequencePhase, standard: &'a StandardActions) -> Self {
        Self {
            phase,
            standard,
            force_absolute: false,
        }
    }

    pub fn force_absolute(mut self, force: bool) -> Self {
        self.force_absolute = force;
        self
    }

    /// Place every row. The result is in ascending sequence order; rows
    /// sharing a number keep their input order.
    pub fn reconstruct(&self, rows: &[SequenceRow]) -> Vec<PlacedAction> {
        let mut sorted: Vec<&SequenceRow> = rows.iter().collect();
        sorted.sort_by_key(|r| r.sequence);

        // Exit actions are not part of the positional order.
        let (exits, ordered): (Vec<&SequenceRow>, Vec<&SequenceRow>) =
            sorted.into_iter().partition(|r| r.sequence < 0);

        let placements = if self.force_absolute {
            None
        } else if ordered.windows(2).any(|w| w[0].sequence == w[1].sequence) {
            debug!(phase = %self.phase, "tied sequence numbers, using absolute placement");
            None
        } else {
            self.relative(&ordered)
        };
        let placements = placements.unwrap_or_else(|| {
            ordered
                .iter()
                .map(|r| Placement::Absolute(r.sequence))
                .collect()
        });

        exits
            .into_iter()
            .map(|r| (r, Placement::Absolute(r.sequence)))
            .chain(ordered.into_iter().zip(placements))
            .map(|(row, placement)| PlacedAction {
                action: row.action.clone(),
                condition: row.condition.clone(),
                sequence: row.sequence,
                placement,
            })
            .collect()
    }

    fn default_of(&self, row: &SequenceRow) -> Option<&StandardAction> {
        self.standard.get(self.phase, &row.action)
    }

    /// Standard action left exactly as the installer would schedule it.
    fn is_default(&self, row: &SequenceRow) -> bool {
        self.default_of(row)
            .is_some_and(|d| d.sequence == row.sequence && d.condition == row.condition)
    }

    /// Rows whose scheduling carries information of their own.
    fn is_authored(&self, row: &SequenceRow) -> bool {
        match self.default_of(row) {
            None => true,
            Some(d) => row.action == APP_SEARCH || d.condition != row.condition,
        }
    }

    /// Placements for tie-free rows, or `None` when some row needs an
    /// explicit number.
    fn relative(&self, rows: &[&SequenceRow]) -> Option<Vec<Placement>> {
        let mut placements: Vec<Placement> = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            let prev = i.checked_sub(1).map(|p| rows[p]);
            let next = rows.get(i + 1).copied();

            if !self.is_authored(row) {
                placements.push(if self.is_default(row) {
                    Placement::Suppressed
                } else {
                    Placement::Absolute(row.sequence)
                });
                continue;
            }

            let standard = self.default_of(row).is_some();
            let adjacent_prev = prev.filter(|p| p.sequence.checked_add(1) == Some(row.sequence));
            let adjacent_next = next.filter(|n| row.sequence.checked_add(1) == Some(n.sequence));
            let prev_before_this = i > 0
                && matches!(&placements[i - 1], Placement::Before(target) if *target == row.action);

            let placement = if let Some(next) =
                adjacent_next.filter(|n| self.standard.is_standard(self.phase, &n.action))
            {
                Placement::Before(next.action.clone())
            } else if let Some(prev) = adjacent_prev
                .filter(|p| self.standard.is_standard(self.phase, &p.action))
                .filter(|_| !prev_before_this)
            {
                Placement::After(prev.action.clone())
            } else if let Some(prev) = adjacent_prev.filter(|_| !standard && !prev_before_this) {
                Placement::After(prev.action.clone())
            } else if let Some(next) = adjacent_next.filter(|_| {
                !standard && prev.map_or(true, |p| p.sequence != row.sequence)
            }) {
                Placement::Before(next.action.clone())
            } else if row.action == APP_SEARCH && self.is_default(row) {
                Placement::Suppressed
            } else if standard
                && self
                    .default_of(row)
                    .is_some_and(|d| d.sequence == row.sequence && d.condition != row.condition)
            {
                Placement::ConditionOnly
            } else {
                debug!(
                    phase = %self.phase,
                    action = %row.action,
                    sequence = row.sequence,
                    "no relative placement, using absolute placement"
                );
                return None;
            };
            placements.push(placement);
        }
        Some(placements)
    }
}
