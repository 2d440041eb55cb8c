//! Row decoding.
//!
//! Each row of a table is handed to the recipe for its table. A recipe is
//! a pure function of the row and read access to the index and tree; it
//! returns at most one node description plus any warnings. The decoder
//! then creates the node, registers it under its composite key, and
//! attaches it to its parent.
//!
//! Decoding is two-phase per table: all rows are created and registered
//! first, then parent references are resolved. Tables that reference
//! themselves (directories, features) can therefore name parents that
//! appear later in the same table. Warnings are still reported in row
//! order: a row's decode warnings are held back until its link is
//! resolved.

pub mod flags;
pub mod names;

mod layout;
mod product;
mod registry;
mod search;

use std::collections::BTreeMap;

use tracing::debug;

use msi_document::{Attributes, DocumentTree, NodeId, NodeKind, TreeError};
use msi_schema::{catalog, Row, Table, TableDefinition};

use crate::config::DecompilerConfig;
use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticLog};
use crate::error::DecompileResult;
use crate::index::ElementIndex;

use self::flags::BitFlag;

pub(crate) use self::layout::{COMPONENT_ODBC_KEY_PATH, COMPONENT_REGISTRY_KEY_PATH};

// ── Table Kind ──────────────────────────────────────────────────────

/// Tables with a built-in recipe, and the catch-all for everything else.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TableKind {
    Directory,
    Feature,
    Condition,
    LaunchCondition,
    Component,
    FeatureComponents,
    File,
    CreateFolder,
    RemoveFile,
    Registry,
    OdbcDataSource,
    Environment,
    Shortcut,
    Property,
    Binary,
    Icon,
    CustomAction,
    Dialog,
    Media,
    Upgrade,
    CompLocator,
    RegLocator,
    IniLocator,
    DrLocator,
    Signature,
    AppSearch,
    CcpSearch,
    Sequence,
    /// Database system tables (`_Validation`, `_Streams`, ...).
    System,
    Extension(String),
}

impl TableKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "Directory" => Self::Directory,
            "Feature" => Self::Feature,
            "Condition" => Self::Condition,
            "LaunchCondition" => Self::LaunchCondition,
            "Component" => Self::Component,
            "FeatureComponents" => Self::FeatureComponents,
            "File" => Self::File,
            "CreateFolder" => Self::CreateFolder,
            "RemoveFile" => Self::RemoveFile,
            "Registry" => Self::Registry,
            "ODBCDataSource" => Self::OdbcDataSource,
            "Environment" => Self::Environment,
            "Shortcut" => Self::Shortcut,
            "Property" => Self::Property,
            "Binary" => Self::Binary,
            "Icon" => Self::Icon,
            "CustomAction" => Self::CustomAction,
            "Dialog" => Self::Dialog,
            "Media" => Self::Media,
            "Upgrade" => Self::Upgrade,
            "CompLocator" => Self::CompLocator,
            "RegLocator" => Self::RegLocator,
            "IniLocator" => Self::IniLocator,
            "DrLocator" => Self::DrLocator,
            "Signature" => Self::Signature,
            "AppSearch" => Self::AppSearch,
            "CCPSearch" => Self::CcpSearch,
            _ if catalog::SEQUENCE_TABLES.contains(&name) => Self::Sequence,
            _ if name.starts_with('_') => Self::System,
            _ => Self::Extension(name.to_string()),
        }
    }

    /// Decode a row with the built-in recipe. `None` when there is none.
    fn decode(&self, cx: &RowContext<'_>) -> Option<Decoded> {
        let decoded = match self {
            Self::Directory => layout::directory(cx),
            Self::Feature => layout::feature(cx),
            Self::Condition => layout::condition(cx),
            Self::LaunchCondition => layout::launch_condition(cx),
            Self::Component => layout::component(cx),
            Self::FeatureComponents => layout::feature_components(cx),
            Self::File => layout::file(cx),
            Self::CreateFolder => layout::create_folder(cx),
            Self::RemoveFile => layout::remove_file(cx),
            Self::Registry => registry::registry(cx),
            Self::OdbcDataSource => registry::odbc_data_source(cx),
            Self::Environment => registry::environment(cx),
            Self::Shortcut => registry::shortcut(cx),
            Self::Property => product::property(cx),
            Self::Binary => product::binary(cx, NodeKind::Binary),
            Self::Icon => product::binary(cx, NodeKind::Icon),
            Self::CustomAction => product::custom_action(cx),
            Self::Dialog => product::dialog(cx),
            Self::Media => product::media(cx),
            Self::Upgrade => product::upgrade(cx),
            Self::CompLocator => search::comp_locator(cx),
            Self::RegLocator => search::reg_locator(cx),
            Self::IniLocator => search::ini_locator(cx),
            Self::DrLocator => search::dr_locator(cx),
            Self::Signature => search::signature(cx),
            // Consumed by finalization units.
            Self::AppSearch | Self::CcpSearch | Self::Sequence => Decoded::default(),
            Self::System | Self::Extension(_) => return None,
        };
        Some(decoded)
    }
}

// ── Recipe Output ───────────────────────────────────────────────────

/// Where a decoded node goes once its table is loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParentRef {
    /// Directly under the document root.
    Root,
    /// Under the node registered for `key` in `table`. A key naming the
    /// node itself places it under the root; `warn_on_self` additionally
    /// reports it.
    Row {
        table: String,
        key: Vec<String>,
        warn_on_self: bool,
    },
    /// Attached by a finalization unit.
    Deferred,
}

impl ParentRef {
    /// Parent named by a single-column key.
    pub fn row(table: &str, key: &str) -> Self {
        Self::Row {
            table: table.to_string(),
            key: vec![key.to_string()],
            warn_on_self: false,
        }
    }

    /// Parent named by an optional key; null means the root.
    pub fn row_or_root(table: &str, key: Option<String>) -> Self {
        match key {
            Some(key) => Self::row(table, &key),
            None => Self::Root,
        }
    }
}

/// Node produced for one row.
#[derive(Clone, Debug)]
pub struct NodeSpec {
    pub kind: NodeKind,
    pub attributes: Attributes,
    pub parent: ParentRef,
    /// Extra registration under a leading part of the key.
    pub partial_key: Option<Vec<String>>,
    /// Leaf children created together with the node.
    pub children: Vec<(NodeKind, Attributes)>,
}

impl NodeSpec {
    pub fn new(kind: NodeKind, attributes: Attributes, parent: ParentRef) -> Self {
        Self {
            kind,
            attributes,
            parent,
            partial_key: None,
            children: Vec::new(),
        }
    }

    pub fn with_partial_key(mut self, key: Vec<String>) -> Self {
        self.partial_key = Some(key);
        self
    }

    pub fn with_child(mut self, kind: NodeKind, attributes: Attributes) -> Self {
        self.children.push((kind, attributes));
        self
    }
}

/// Result of decoding one row.
#[derive(Clone, Debug, Default)]
pub struct Decoded {
    pub node: Option<NodeSpec>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Decoded {
    pub fn node(spec: NodeSpec) -> Self {
        Self {
            node: Some(spec),
            diagnostics: Vec::new(),
        }
    }

    pub fn warn(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

// ── Row Context ─────────────────────────────────────────────────────

/// Read-only view handed to a recipe.
pub struct RowContext<'a> {
    pub table: &'a str,
    pub definition: &'a TableDefinition,
    pub row: &'a Row,
    pub index: &'a ElementIndex,
    pub tree: &'a DocumentTree,
}

impl RowContext<'_> {
    /// Composite primary key of the row.
    pub fn key(&self) -> String {
        self.row.primary_key(self.definition)
    }

    /// Non-null value of a named column.
    pub fn get(&self, column: &str) -> Option<String> {
        let position = self.definition.column_index(column).ok()?;
        self.row.string(position)
    }

    /// Integer value of a named column. Unparsable values are reported
    /// and read as absent.
    pub fn integer(&self, column: &str, out: &mut Decoded) -> Option<i64> {
        let position = self.definition.column_index(column).ok()?;
        match self.row.field(position).as_integer() {
            Ok(value) => value,
            Err(raw) => {
                out.warn(self.warning(
                    DiagnosticCode::UnparsableNumber,
                    format!("column {} value '{}' is not a number", column, raw),
                ));
                None
            }
        }
    }

    /// Warning located at this row.
    pub fn warning(&self, code: DiagnosticCode, message: impl Into<String>) -> Diagnostic {
        Diagnostic::warning(code, message).at(self.table, &self.key())
    }

    /// Decompose `bits` into attributes, reporting bits no flag covers.
    pub fn apply_flags(
        &self,
        column: &str,
        bits: i64,
        flags: &[BitFlag],
        consumed: i64,
        attrs: &mut Attributes,
        out: &mut Decoded,
    ) {
        let unknown = flags::apply_flags(bits, flags, consumed, attrs);
        if unknown != 0 {
            out.warn(self.warning(
                DiagnosticCode::UnknownBits,
                format!("column {} has unknown bits 0x{:x}", column, unknown),
            ));
        }
    }

    /// Report when more than one of a set of exclusive bits is set.
    pub fn check_exclusive(&self, column: &str, bits: i64, masks: &[i64], out: &mut Decoded) {
        if flags::conflicting(bits, masks) {
            out.warn(self.warning(
                DiagnosticCode::AmbiguousBits,
                format!("column {} sets exclusive bits together (0x{:x})", column, bits),
            ));
        }
    }

    /// Report a value outside the known enumerants of a column.
    pub fn unknown_enumerant(&self, column: &str, value: impl std::fmt::Display) -> Diagnostic {
        self.warning(
            DiagnosticCode::UnknownEnumerant,
            format!("column {} has unknown value {}", column, value),
        )
    }
}

/// A decoding recipe supplied from outside the crate.
pub trait TableRecipe: Send + Sync {
    /// Table this recipe decodes.
    fn table(&self) -> &str;

    fn decode(&self, cx: &RowContext<'_>) -> Decoded;
}

// ── Row Decoder ─────────────────────────────────────────────────────

/// Mutable state the decoder fills.
pub struct DecodeTarget<'a, 's> {
    pub tree: &'a mut DocumentTree,
    pub index: &'a mut ElementIndex,
    pub diagnostics: &'a mut DiagnosticLog<'s>,
}

/// A decoded row waiting for its parent link.
struct PendingRow {
    diagnostics: Vec<Diagnostic>,
    link: Option<(NodeId, ParentRef, String)>,
}

/// Create and register the node described by `spec`.
fn create_node(
    table: &str,
    definition: &TableDefinition,
    row: &Row,
    spec: NodeSpec,
    target: &mut DecodeTarget<'_, '_>,
) -> DecompileResult<(NodeId, ParentRef, String)> {
    let id = target.tree.create(spec.kind, spec.attributes);
    for (child_kind, child_attrs) in spec.children {
        target.tree.create_child(id, child_kind, child_attrs)?;
    }
    target.index.register(table, row.key_values(definition), id)?;
    if let Some(partial) = spec.partial_key {
        target.index.register_partial(table, partial, id);
    }
    Ok((id, spec.parent, row.primary_key(definition)))
}

/// Dispatches rows to recipes and links the produced nodes.
pub struct RowDecoder<'r> {
    config: &'r DecompilerConfig,
    extensions: &'r BTreeMap<String, Box<dyn TableRecipe>>,
}

impl<'r> RowDecoder<'r> {
    pub fn new(
        config: &'r DecompilerConfig,
        extensions: &'r BTreeMap<String, Box<dyn TableRecipe>>,
    ) -> Self {
        Self { config, extensions }
    }

    /// Decode every row of `table`. Returns the number of nodes created.
    pub fn decode_table(&self, table: &Table, target: &mut DecodeTarget<'_, '_>) -> DecompileResult<usize> {
        let name = table.name();
        let kind = TableKind::from_name(name);

        if kind == TableKind::System {
            debug!(table = %name, "skipping system table");
            return Ok(0);
        }
        if self.config.is_deprecated(name) {
            target.diagnostics.push(
                Diagnostic::warning(
                    DiagnosticCode::DeprecatedTable,
                    format!("table {} is deprecated and was not decompiled", name),
                )
                .in_table(name),
            );
            return Ok(0);
        }

        let extension = self.extensions.get(name);
        if matches!(kind, TableKind::Extension(_)) && extension.is_none() {
            if !table.is_empty() {
                target.diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticCode::UnimplementedTable,
                        format!("no recipe decodes table {}", name),
                    )
                    .in_table(name),
                );
            }
            return Ok(0);
        }

        let mut pending: Vec<PendingRow> = Vec::with_capacity(table.len());

        for row in &table.rows {
            let decoded = {
                let cx = RowContext {
                    table: name,
                    definition: &table.definition,
                    row,
                    index: &*target.index,
                    tree: &*target.tree,
                };
                match kind.decode(&cx) {
                    Some(decoded) => decoded,
                    None => match extension {
                        Some(recipe) => recipe.decode(&cx),
                        None => Decoded::default(),
                    },
                }
            };
            let mut entry = PendingRow {
                diagnostics: decoded.diagnostics,
                link: None,
            };
            if let Some(spec) = decoded.node {
                match create_node(name, &table.definition, row, spec, target) {
                    Ok(link) => entry.link = Some(link),
                    Err(e) => {
                        pending.push(entry);
                        for earlier in pending {
                            target.diagnostics.extend(earlier.diagnostics);
                        }
                        return Err(e);
                    }
                }
            }
            pending.push(entry);
        }

        // Each row's warnings are reported together, decode first, link second.
        let mut created = 0usize;
        for entry in pending {
            target.diagnostics.extend(entry.diagnostics);
            if let Some((id, parent, key)) = entry.link {
                self.link_parent(name, id, parent, &key, target)?;
                created += 1;
            }
        }

        debug!(table = %name, rows = table.len(), nodes = created, "decoded table");
        Ok(created)
    }

    fn link_parent(
        &self,
        table: &str,
        id: NodeId,
        parent: ParentRef,
        key: &str,
        target: &mut DecodeTarget<'_, '_>,
    ) -> DecompileResult<()> {
        let root = target.tree.root();
        match parent {
            ParentRef::Root => target.tree.attach(root, id)?,
            ParentRef::Deferred => target.tree.set_needs_parent(id, true)?,
            ParentRef::Row {
                table: parent_table,
                key: parent_key,
                warn_on_self,
            } => {
                let lookup: Vec<&str> = parent_key.iter().map(String::as_str).collect();
                let joined = parent_key.join("/");
                match target.index.get(&parent_table, &lookup) {
                    Some(parent_id) if parent_id == id => {
                        if warn_on_self {
                            target.diagnostics.push(
                                Diagnostic::warning(
                                    DiagnosticCode::SelfNestedFeature,
                                    format!("{} names itself as parent; placed at the root", key),
                                )
                                .at(table, key)
                                .referencing(&parent_table, &joined),
                            );
                        }
                        target.tree.attach(root, id)?;
                    }
                    Some(parent_id) => match target.tree.attach(parent_id, id) {
                        Ok(()) => {}
                        Err(TreeError::Cycle { .. }) => {
                            target.diagnostics.push(
                                Diagnostic::warning(
                                    DiagnosticCode::ParentCycle,
                                    format!("parent {} is nested below {}", joined, key),
                                )
                                .at(table, key)
                                .referencing(&parent_table, &joined),
                            );
                            target.tree.set_needs_parent(id, true)?;
                        }
                        Err(e) => return Err(e.into()),
                    },
                    None => {
                        target.diagnostics.push(
                            Diagnostic::warning(
                                DiagnosticCode::ExpectedForeignRow,
                                format!("{} refers to missing {} row {}", key, parent_table, joined),
                            )
                            .at(table, key)
                            .referencing(&parent_table, &joined),
                        );
                        target.tree.set_needs_parent(id, true)?;
                    }
                }
            }
        }
        Ok(())
    }
}
