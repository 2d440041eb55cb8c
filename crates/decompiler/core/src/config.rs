//! Decompiler configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use msi_document::NodeKind;

use crate::error::{DecompileError, DecompileResult};

/// Parent value of a directory search rooted at a drive.
pub const DEFAULT_ROOT_DRIVE_MARKER: &str = "CCP_DRIVE";

/// An addition to, or override of, the built-in standard-action registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardActionEntry {
    /// Sequence table the entry applies to, e.g. `InstallExecuteSequence`.
    pub table: String,
    pub action: String,
    pub sequence: i64,
    #[serde(default)]
    pub condition: Option<String>,
}

/// Decompiler configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecompilerConfig {
    /// Document root kind: `Product`, `Module`, `Patch` or `Fragment`.
    pub root_kind: String,

    /// Parent value marking a directory search rooted at a drive.
    pub root_drive_marker: String,

    /// Skip reconstruction of the two UI sequence tables.
    pub suppress_ui_sequences: bool,

    /// Emit absolute positions for every sequence row.
    pub force_absolute_sequencing: bool,

    /// Tables reported as deprecated when present.
    pub deprecated_tables: Vec<String>,

    /// Additions to the standard-action registry.
    pub standard_actions: Vec<StandardActionEntry>,

    /// Report nodes left unreachable after finalization.
    pub report_orphans: bool,
}

impl Default for DecompilerConfig {
    fn default() -> Self {
        Self {
            root_kind: "Product".into(),
            root_drive_marker: DEFAULT_ROOT_DRIVE_MARKER.into(),
            suppress_ui_sequences: false,
            force_absolute_sequencing: false,
            deprecated_tables: vec!["BBControl".into(), "Billboard".into()],
            standard_actions: Vec::new(),
            report_orphans: true,
        }
    }
}

impl DecompilerConfig {
    /// Parse configuration from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(contents: &str) -> DecompileResult<Self> {
        toml::from_str(contents).map_err(|e| DecompileError::Config(e.to_string()))
    }

    /// Load configuration from a file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> DecompileResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Self::from_toml_str(&contents)
        } else {
            Ok(Self::default())
        }
    }

    /// Document root kind named by `root_kind`.
    pub fn root_node_kind(&self) -> DecompileResult<NodeKind> {
        NodeKind::root_from_name(&self.root_kind)
            .ok_or_else(|| DecompileError::UnknownRootKind(self.root_kind.clone()))
    }

    pub fn is_deprecated(&self, table: &str) -> bool {
        self.deprecated_tables.iter().any(|t| t == table)
    }
}
