//! # msi-document
//!
//! The hierarchical package document the decompiler rebuilds from flat
//! tables. Nodes live in an arena ([`DocumentTree`]) and are addressed by
//! stable [`NodeId`]s, so the same node can be referenced from indexes and
//! linking passes without aliasing: ownership is the single `parent` link,
//! and moving a node re-parents it rather than copying it.
//!
//! ## Key Types
//!
//! - [`NodeKind`] — Closed set of element kinds
//! - [`Attributes`] — Insertion-ordered attribute map
//! - [`DocumentNode`] — Kind, attributes, children, parent link
//! - [`DocumentTree`] — The arena and its root
//! - [`NodeView`] — Owned, serializable snapshot of a subtree

#![deny(unsafe_code)]

pub mod attributes;
pub mod error;
pub mod kind;
pub mod tree;

pub use attributes::Attributes;
pub use error::{TreeError, TreeResult};
pub use kind::NodeKind;
pub use tree::{DocumentNode, DocumentTree, NodeId, NodeView};
