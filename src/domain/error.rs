//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::entities::{EdgeId, NodeId};

/// Domain errors represent invalid tree data.
/// Structural operations on a live tree never produce them; they surface when
/// collections coming from storage or an import are checked.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("map has no nodes")]
    EmptyTree,

    #[error("duplicate node id: {0}")]
    DuplicateNode(NodeId),

    #[error("duplicate edge id: {0}")]
    DuplicateEdge(EdgeId),

    #[error("edge {edge} references unknown node: {node}")]
    DanglingEdge { edge: EdgeId, node: NodeId },

    #[error("root node has an incoming edge: {0}")]
    RootHasParent(NodeId),

    #[error("node has more than one parent: {0}")]
    MultipleParents(NodeId),

    #[error("node has no parent: {0}")]
    Orphan(NodeId),

    #[error("children of {0} do not match its outgoing edges")]
    ChildrenMismatch(NodeId),

    #[error("node not reachable from root (cycle?): {0}")]
    Unreachable(NodeId),

    #[error("invalid color '{0}': expected #rrggbb")]
    InvalidColor(String),

    #[error("palette needs at least one branch color")]
    EmptyPalette,
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
