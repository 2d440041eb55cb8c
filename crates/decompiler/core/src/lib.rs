//! # msi-decompiler
//!
//! Rebuilds the hierarchical package document from the flat table dump of
//! an installer database.
//!
//! ## Architecture
//!
//! ```text
//! TableSet (definitions + rows)
//!     │
//!     ▼
//! resolve_order ─── referenced tables before their referrers
//!     │
//!     ▼
//! RowDecoder ─── one recipe per table kind
//!     │─── create node, register in ElementIndex
//!     │─── attach under its parent once the table is loaded
//!     ▼
//! FinalizePipeline
//!     │─── key paths, file sources, removal folders
//!     │─── secure properties, locator chains, upgrade groups
//!     │─── action sequences (SequenceReconstructor)
//!     │─── extension units
//!     ▼
//! orphan sweep
//!     ▼
//! DocumentTree + Diagnostics
//! ```
//!
//! ## Key Types
//!
//! - [`Decompiler`] — Runs one decompile over a [`msi_schema::TableSet`]
//! - [`DecompileOutput`] — The tree (absent on fatal errors) and every diagnostic
//! - [`DecompilerConfig`] — Root kind, sequencing switches, standard-action overrides
//! - [`ElementIndex`] — Nodes by table and composite key
//! - [`FinalizePipeline`] / [`LinkingUnit`] — Ordered deferred linking
//! - [`SequenceReconstructor`] — Integer positions to relative scheduling
//! - [`ExtensionRegistry`] — Extra table recipes and linking units
//! - [`Diagnostic`] / [`DiagnosticSink`] — Warnings and fatal errors as they occur

#![deny(unsafe_code)]

pub mod config;
pub mod decoder;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod extension;
pub mod finalize;
pub mod index;
pub mod resolver;
pub mod sequence;

pub use config::{DecompilerConfig, StandardActionEntry};
pub use decoder::{Decoded, NodeSpec, ParentRef, RowContext, TableRecipe};
pub use diagnostics::{
    CollectingSink, Diagnostic, DiagnosticCode, DiagnosticSink, Severity, TracingSink,
};
pub use engine::{DecompileOutput, Decompiler};
pub use error::{DecompileError, DecompileResult};
pub use extension::ExtensionRegistry;
pub use finalize::{FinalizePipeline, LinkContext, LinkingUnit, RowView, UnitId, UnitReport};
pub use index::ElementIndex;
pub use resolver::resolve_order;
pub use sequence::{
    Placement, PlacedAction, SequencePhase, SequenceReconstructor, SequenceRow, StandardAction,
    StandardActions,
};
