#![forbid(unsafe_code)]

use crate::node::NodeId;

/// Errors raised by document mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// The handle does not belong to this document.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// Appending would make a node its own ancestor.
    #[error("cannot append {child} under {parent}: would create a cycle")]
    CycleDetected { parent: NodeId, child: NodeId },

    /// The document root has no parent and cannot be reparented or removed.
    #[error("the document root cannot be moved or removed")]
    RootNotMovable,
}
