//! Decompiler engine.
//!
//! One [`Decompiler::decompile`] call runs the whole reconstruction over
//! one table dump: table ordering, row decoding, the finalization
//! pipeline and the orphan sweep. Either every step completes, possibly
//! with warnings, and a tree is returned, or a fatal error ends the run
//! and only the diagnostics are returned.

use std::collections::BTreeMap;

use tracing::{debug, info};

use msi_document::{DocumentTree, NodeView};
use msi_schema::{catalog, SchemaSet, TableSet};

use crate::config::DecompilerConfig;
use crate::decoder::{DecodeTarget, RowDecoder, TableRecipe};
use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticLog, DiagnosticSink, TracingSink};
use crate::error::DecompileResult;
use crate::extension::ExtensionRegistry;
use crate::finalize::{FinalizePipeline, LinkContext, UnitReport};
use crate::index::ElementIndex;
use crate::resolver::resolve_order;

// ── Output ──────────────────────────────────────────────────────────

/// Result of one decompile run.
#[derive(Debug)]
pub struct DecompileOutput {
    /// The document, absent when the run ended on a fatal error.
    pub tree: Option<DocumentTree>,
    /// Every diagnostic in the order it was produced.
    pub diagnostics: Vec<Diagnostic>,
    /// One report per finalization unit that ran.
    pub reports: Vec<UnitReport>,
}

impl DecompileOutput {
    pub fn is_success(&self) -> bool {
        self.tree.is_some()
    }

    /// The fatal diagnostic that ended the run, if any.
    pub fn fatal(&self) -> Option<&Diagnostic> {
        self.diagnostics.iter().find(|d| d.is_fatal())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_fatal())
    }

    /// Snapshot of the document from its root.
    pub fn view(&self) -> Option<NodeView> {
        let tree = self.tree.as_ref()?;
        tree.view(tree.root()).ok()
    }
}

// ── Decompiler ──────────────────────────────────────────────────────

/// Rebuilds a package document from its table dump.
pub struct Decompiler {
    config: DecompilerConfig,
    recipes: BTreeMap<String, Box<dyn TableRecipe>>,
    pipeline: FinalizePipeline,
}

impl Decompiler {
    /// A decompiler with the built-in recipes and units only.
    pub fn new(config: DecompilerConfig) -> Self {
        Self::with_extensions(config, ExtensionRegistry::new())
    }

    /// A decompiler that also uses the recipes and units in `extensions`.
    /// Extension units run after the built-in ones.
    pub fn with_extensions(config: DecompilerConfig, extensions: ExtensionRegistry) -> Self {
        let (recipes, units) = extensions.into_parts();
        let mut pipeline = FinalizePipeline::standard();
        for unit in units {
            pipeline.push(unit);
        }
        Self {
            config,
            recipes,
            pipeline,
        }
    }

    pub fn config(&self) -> &DecompilerConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &FinalizePipeline {
        &self.pipeline
    }

    /// Decompile `tables`, logging diagnostics through `tracing`.
    pub fn decompile(&self, tables: &TableSet) -> DecompileOutput {
        let mut sink = TracingSink;
        self.decompile_with_sink(tables, &mut sink)
    }

    /// Decompile `tables`, handing each diagnostic to `sink` as it occurs.
    pub fn decompile_with_sink(&self, tables: &TableSet, sink: &mut dyn DiagnosticSink) -> DecompileOutput {
        info!(tables = tables.len(), root = %self.config.root_kind, "decompile started");
        let mut log = DiagnosticLog::new(sink);
        let result = self.run(tables, &mut log);

        let (tree, reports) = match result {
            Ok((tree, reports)) => (Some(tree), reports),
            Err(e) => {
                log.push(Diagnostic::fatal(e.code(), e.to_string()));
                (None, Vec::new())
            }
        };
        let diagnostics = log.into_entries();
        info!(
            success = tree.is_some(),
            diagnostics = diagnostics.len(),
            "decompile finished"
        );
        DecompileOutput {
            tree,
            diagnostics,
            reports,
        }
    }

    fn run(
        &self,
        tables: &TableSet,
        log: &mut DiagnosticLog<'_>,
    ) -> DecompileResult<(DocumentTree, Vec<UnitReport>)> {
        let root_kind = self.config.root_node_kind()?;
        self.pipeline.validate()?;

        let schema = merged_schema(tables);
        let order = resolve_order(&schema)?;
        info!(tables = order.len(), "table order resolved");

        let mut tree = DocumentTree::new(root_kind);
        let mut index = ElementIndex::new();

        let decoder = RowDecoder::new(&self.config, &self.recipes);
        let mut target = DecodeTarget {
            tree: &mut tree,
            index: &mut index,
            diagnostics: &mut *log,
        };
        let mut nodes = 0usize;
        for name in &order {
            if let Some(table) = tables.get(name) {
                nodes += decoder.decode_table(table, &mut target)?;
            }
        }
        info!(nodes, "decoding finished");

        let mut cx = LinkContext {
            tables,
            tree: &mut tree,
            index: &mut index,
            config: &self.config,
            diagnostics: &mut *log,
        };
        let reports = self.pipeline.run(&mut cx)?;
        info!(units = reports.len(), "finalization finished");

        if self.config.report_orphans {
            sweep_orphans(&tree, &index, log);
        }
        Ok((tree, reports))
    }
}

/// Definitions carried by the dump, completed with the built-in catalog
/// for tables the dump leaves out. A dump definition replaces the
/// catalog's definition of the same table.
fn merged_schema(tables: &TableSet) -> SchemaSet {
    let mut schema = tables.schema();
    for definition in catalog::standard_tables() {
        schema.insert_if_absent(definition);
    }
    schema
}

/// Report every node that did not end up under the root.
fn sweep_orphans(tree: &DocumentTree, index: &ElementIndex, log: &mut DiagnosticLog<'_>) {
    let root = tree.root();
    let mut orphans = 0usize;
    for id in tree.ids() {
        if id == root || tree.is_reachable(id) {
            continue;
        }
        let Ok(node) = tree.get(id) else {
            continue;
        };
        let (table, key) = match index.origin(id) {
            Some((table, key)) => (table.to_string(), key),
            None => (
                node.kind.name().to_string(),
                node.id().unwrap_or_default().to_string(),
            ),
        };
        log.push(
            Diagnostic::warning(
                DiagnosticCode::OrphanedNode,
                format!("{} {} is not reachable from the document root", node.kind, key),
            )
            .at(&table, &key),
        );
        orphans += 1;
    }
    debug!(orphans, "orphan sweep finished");
}
