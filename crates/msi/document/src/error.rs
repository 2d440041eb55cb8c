//! Document tree error types.

use thiserror::Error;

use crate::tree::NodeId;

/// Errors from structural tree operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("node {0} has been pruned")]
    Pruned(NodeId),

    #[error("attaching {child} under {parent} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },

    #[error("the document root cannot be attached or pruned")]
    RootImmovable,
}

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, TreeError>;
