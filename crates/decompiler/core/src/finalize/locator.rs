//! Locator chains.
//!
//! Search rows are grouped by signature. Each group is placed under the
//! consumers of its signature: one `Property` per `AppSearch` row and the
//! `ComplianceCheck` for a `CCPSearch` row. A search node has exactly one
//! owner, the first consumer that places it; later consumers receive a
//! reference node carrying only the signature.
//!
//! Directory searches may chain through a parent search. A chained search
//! is nested inside its parent and never placed under a consumer directly.
//! Only the first chained row of a parent, in table order, nests in the
//! parent itself, and only while the parent is unconsumed and holds no
//! file search. Every other chained search goes under a reference standing
//! in for the parent.
//!
//! Searches nobody consumes are kept aside until every group is placed.
//! One that contains a consumed search is then owned by the first consumer
//! of that search; its other consumers get references. The rest are
//! reported as unreachable.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use msi_document::{NodeId, NodeKind, TreeError};

use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::error::DecompileResult;

use super::{LinkContext, LinkingUnit, UnitId, UnitReport};

/// Locator tables in the order their rows join a signature group.
const LOCATOR_TABLES: [&str; 5] = ["CompLocator", "RegLocator", "IniLocator", "DrLocator", "Signature"];

/// Tables other than `DrLocator` whose searches can hold a chained directory search.
const CONTAINER_TABLES: [&str; 3] = ["RegLocator", "CompLocator", "IniLocator"];

/// Places every search node under its consumers.
pub struct LocatorChainUnit;

impl LinkingUnit for LocatorChainUnit {
    fn unit_id(&self) -> UnitId {
        UnitId::LocatorChain
    }

    fn link(&self, cx: &mut LinkContext<'_, '_>) -> DecompileResult<UnitReport> {
        let marker = cx.config.root_drive_marker.clone();
        let groups = signature_groups(cx, &marker);
        let nesting = NestingPlan::new(&groups, &marker);
        let mut linker = ChainLinker {
            consumers: Consumers::load(cx),
            compliance_check: None,
            unused: Vec::new(),
            placed: 0,
        };

        for (signature, elements) in &groups {
            let mut containers: Vec<NodeId> = Vec::new();
            for element in elements {
                match (element.table, element.parent.as_deref()) {
                    ("DrLocator", Some(parent)) if parent == marker => {
                        linker.place_drive_rooted(cx, signature, element.node)?
                    }
                    ("DrLocator", Some(parent)) if parent != signature.as_str() => {
                        let direct = nesting.nests_directly(parent, element.node);
                        linker.place_chained(cx, parent, element, direct)?
                    }
                    ("Signature", _) if !containers.is_empty() => {
                        for container in &containers {
                            linker.attach_or_ref(cx, *container, element.node, signature)?;
                        }
                    }
                    _ => linker.place(cx, signature, element.node)?,
                }
                if element.table != "Signature" {
                    containers.push(element.node);
                }
            }
        }

        let unreachable = linker.place_unused(cx)?;
        debug!(
            signatures = groups.len(),
            placed = linker.placed,
            unreachable,
            "linked locator chains"
        );
        Ok(UnitReport::new(
            UnitId::LocatorChain,
            linker.placed,
            format!(
                "{} signatures, {} unreachable searches",
                groups.len(),
                unreachable
            ),
        ))
    }
}

// ── Signature Groups ────────────────────────────────────────────────

/// One locator row and its decoded search node.
struct Element {
    table: &'static str,
    /// Position of the row in its table.
    row: usize,
    node: NodeId,
    /// `Parent` of a directory search.
    parent: Option<String>,
    key: String,
}

/// Locator rows by signature. Directory searches rooted at a drive come
/// first in their group.
fn signature_groups(cx: &LinkContext<'_, '_>, marker: &str) -> BTreeMap<String, Vec<Element>> {
    let mut groups: BTreeMap<String, Vec<Element>> = BTreeMap::new();
    for table in LOCATOR_TABLES {
        let signature_column = if table == "Signature" { "Signature" } else { "Signature_" };
        for (position, row) in cx.rows(table).into_iter().enumerate() {
            let Some(signature) = row.get(signature_column) else {
                continue;
            };
            let key = row.row.key_values(row.definition);
            let lookup: Vec<&str> = key.iter().map(String::as_str).collect();
            let Some(node) = cx.index.get(table, &lookup) else {
                continue;
            };
            let element = Element {
                table,
                row: position,
                node,
                parent: if table == "DrLocator" { row.get("Parent") } else { None },
                key: row.key(),
            };

            let group = groups.entry(signature).or_default();
            let drive_rooted = |e: &Element| e.parent.as_deref() == Some(marker);
            if drive_rooted(&element) {
                let at = group.iter().take_while(|e| drive_rooted(*e)).count();
                group.insert(at, element);
            } else {
                group.push(element);
            }
        }
    }
    groups
}

impl Element {
    /// The parent signature of a directory search nested in another search.
    fn chained_parent(&self, signature: &str, marker: &str) -> Option<&str> {
        match (self.table, self.parent.as_deref()) {
            ("DrLocator", Some(parent)) if parent != marker && parent != signature => Some(parent),
            _ => None,
        }
    }
}

/// Which chained searches nest in their parent search itself.
struct NestingPlan {
    /// First chained `DrLocator` row per parent signature, by row position.
    first_child: BTreeMap<String, (usize, NodeId)>,
    /// Signatures whose searches already hold a file search.
    with_file: BTreeSet<String>,
}

impl NestingPlan {
    fn new(groups: &BTreeMap<String, Vec<Element>>, marker: &str) -> Self {
        let mut first_child: BTreeMap<String, (usize, NodeId)> = BTreeMap::new();
        let mut with_file = BTreeSet::new();
        for (signature, elements) in groups {
            let has_file = elements.iter().any(|e| e.table == "Signature");
            if has_file && elements.iter().any(|e| e.table != "Signature") {
                with_file.insert(signature.clone());
            }
            for element in elements {
                let Some(parent) = element.chained_parent(signature, marker) else {
                    continue;
                };
                let slot = first_child
                    .entry(parent.to_string())
                    .or_insert((element.row, element.node));
                if element.row < slot.0 {
                    *slot = (element.row, element.node);
                }
            }
        }
        Self {
            first_child,
            with_file,
        }
    }

    fn nests_directly(&self, parent: &str, node: NodeId) -> bool {
        !self.with_file.contains(parent)
            && self.first_child.get(parent).map(|(_, first)| *first) == Some(node)
    }
}

// ── Consumers ───────────────────────────────────────────────────────

/// Signatures named by the consumer tables.
struct Consumers {
    /// `AppSearch` properties per signature, in row order.
    properties: BTreeMap<String, Vec<String>>,
    /// Signatures named by `CCPSearch`.
    compliance: BTreeSet<String>,
}

impl Consumers {
    fn load(cx: &LinkContext<'_, '_>) -> Self {
        let mut properties: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for row in cx.rows("AppSearch") {
            if let (Some(property), Some(signature)) = (row.get("Property"), row.get("Signature_")) {
                let list = properties.entry(signature).or_default();
                if !list.contains(&property) {
                    list.push(property);
                }
            }
        }
        let compliance = cx
            .rows("CCPSearch")
            .into_iter()
            .filter_map(|row| row.get("Signature_"))
            .collect();
        Self {
            properties,
            compliance,
        }
    }

    fn properties(&self, signature: &str) -> Vec<String> {
        self.properties.get(signature).cloned().unwrap_or_default()
    }

    fn compliance(&self, signature: &str) -> bool {
        self.compliance.contains(signature)
    }

    fn is_consumed(&self, signature: &str) -> bool {
        self.properties.contains_key(signature) || self.compliance(signature)
    }
}

// ── Linker ──────────────────────────────────────────────────────────

struct ChainLinker {
    consumers: Consumers,
    compliance_check: Option<NodeId>,
    /// Searches with no owner yet, in the order they were set aside.
    unused: Vec<NodeId>,
    placed: u32,
}

impl ChainLinker {
    /// The `ComplianceCheck` under the root, created on first use.
    fn compliance_check(&mut self, cx: &mut LinkContext<'_, '_>) -> DecompileResult<NodeId> {
        if let Some(check) = self.compliance_check {
            return Ok(check);
        }
        let root = cx.tree.root();
        let check = match cx.tree.find_child(root, |n| n.kind == NodeKind::ComplianceCheck) {
            Some(check) => check,
            None => cx
                .tree
                .create_child(root, NodeKind::ComplianceCheck, Default::default())?,
        };
        self.compliance_check = Some(check);
        Ok(check)
    }

    /// The `ComplianceDrive` under `parent`, created on first use.
    fn drive(&mut self, cx: &mut LinkContext<'_, '_>, parent: NodeId) -> DecompileResult<NodeId> {
        match cx.tree.find_child(parent, |n| n.kind == NodeKind::ComplianceDrive) {
            Some(drive) => Ok(drive),
            None => Ok(cx
                .tree
                .create_child(parent, NodeKind::ComplianceDrive, Default::default())?),
        }
    }

    /// Give `node` to `parent` if it has no owner yet, otherwise give
    /// `parent` a reference to it.
    fn attach_or_ref(
        &mut self,
        cx: &mut LinkContext<'_, '_>,
        parent: NodeId,
        node: NodeId,
        signature: &str,
    ) -> DecompileResult<()> {
        if cx.tree.parent(node).is_none() {
            cx.tree.attach(parent, node)?;
        } else if let Some(reference) = cx.tree.get(node)?.kind.search_reference() {
            cx.tree
                .create_child(parent, reference, [("Id", signature)].into())?;
        }
        self.placed += 1;
        Ok(())
    }

    /// A search consumed by properties and compliance checks as it is.
    fn place(
        &mut self,
        cx: &mut LinkContext<'_, '_>,
        signature: &str,
        node: NodeId,
    ) -> DecompileResult<()> {
        let properties = self.consumers.properties(signature);
        for property in &properties {
            let host = cx.ensure_property(property)?;
            self.attach_or_ref(cx, host, node, signature)?;
        }
        if self.consumers.compliance(signature) {
            let check = self.compliance_check(cx)?;
            self.attach_or_ref(cx, check, node, signature)?;
        }
        if !self.consumers.is_consumed(signature) {
            self.unused.push(node);
        }
        Ok(())
    }

    /// A directory search rooted at a drive: consumed through a drive
    /// element under each consumer.
    fn place_drive_rooted(
        &mut self,
        cx: &mut LinkContext<'_, '_>,
        signature: &str,
        node: NodeId,
    ) -> DecompileResult<()> {
        let properties = self.consumers.properties(signature);
        for property in &properties {
            let host = cx.ensure_property(property)?;
            let drive = self.drive(cx, host)?;
            self.attach_or_ref(cx, drive, node, signature)?;
        }
        if self.consumers.compliance(signature) {
            let check = self.compliance_check(cx)?;
            let drive = self.drive(cx, check)?;
            self.attach_or_ref(cx, drive, node, signature)?;
        }
        if !self.consumers.is_consumed(signature) {
            self.unused.push(node);
        }
        Ok(())
    }

    /// A directory search nested inside the search named by `parent`.
    fn place_chained(
        &mut self,
        cx: &mut LinkContext<'_, '_>,
        parent: &str,
        element: &Element,
        direct: bool,
    ) -> DecompileResult<()> {
        let container = cx
            .index
            .get_partial("DrLocator", &[parent])
            .first()
            .copied()
            .or_else(|| cx.index.find_in(&CONTAINER_TABLES, parent).map(|(_, n)| n));
        let Some(container) = container else {
            cx.diagnostics.push(
                Diagnostic::warning(
                    DiagnosticCode::ExpectedForeignRow,
                    format!("{} is nested in missing search {}", element.key, parent),
                )
                .at(element.table, &element.key)
                .referencing("DrLocator", parent),
            );
            self.unused.push(element.node);
            return Ok(());
        };

        let host = if self.consumers.is_consumed(parent) || !direct {
            let kind = cx
                .tree
                .get(container)?
                .kind
                .search_reference()
                .unwrap_or(NodeKind::DirectorySearchRef);
            let stand_in = cx.tree.create(kind, [("Id", parent)].into());
            cx.tree.set_needs_parent(stand_in, true)?;
            self.unused.push(stand_in);
            stand_in
        } else {
            container
        };

        match cx.tree.attach(host, element.node) {
            Ok(()) => self.placed += 1,
            Err(TreeError::Cycle { .. }) => {
                cx.diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticCode::ParentCycle,
                        format!("search {} is nested below {}", parent, element.key),
                    )
                    .at(element.table, &element.key)
                    .referencing("DrLocator", parent),
                );
                self.unused.push(element.node);
            }
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    /// Place set-aside searches that contain a consumed search. The first
    /// consumer owns the set-aside subtree, the others reference the
    /// consumed search. Returns how many remain unreachable.
    fn place_unused(&mut self, cx: &mut LinkContext<'_, '_>) -> DecompileResult<u32> {
        let mut unreachable = 0u32;
        for candidate in std::mem::take(&mut self.unused) {
            if cx.tree.parent(candidate).is_some() {
                continue;
            }
            let consumed = std::iter::once(candidate)
                .chain(cx.tree.descendants(candidate))
                .find_map(|id| {
                    let node = cx.tree.get(id).ok()?;
                    let signature = node.id()?;
                    (node.kind.is_search() && self.consumers.is_consumed(signature))
                        .then(|| (id, signature.to_string()))
                });

            match consumed {
                Some((search, signature)) => {
                    let mut hosts = Vec::new();
                    for property in self.consumers.properties(&signature) {
                        hosts.push(cx.ensure_property(&property)?);
                    }
                    if self.consumers.compliance(&signature) {
                        hosts.push(self.compliance_check(cx)?);
                    }
                    let mut hosts = hosts.into_iter();
                    if let Some(owner) = hosts.next() {
                        cx.tree.attach(owner, candidate)?;
                        self.placed += 1;
                    }
                    for host in hosts {
                        self.attach_or_ref(cx, host, search, &signature)?;
                    }
                }
                None => {
                    let node = cx.tree.get(candidate)?;
                    let id = node.id().unwrap_or_default().to_string();
                    let (table, key) = match cx.index.origin(candidate) {
                        Some((table, key)) => (table.to_string(), key),
                        None => ("DrLocator".to_string(), id.clone()),
                    };
                    cx.diagnostics.push(
                        Diagnostic::warning(
                            DiagnosticCode::UnreachableSearch,
                            format!("search {} is not used by any property or compliance check", id),
                        )
                        .at(&table, &key),
                    );
                    unreachable += 1;
                }
            }
        }
        Ok(unreachable)
    }
}
