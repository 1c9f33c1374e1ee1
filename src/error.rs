//! error.rs
//! Crate-wide error type. All failures are immediate and local to the call
//! that triggered them; no operation leaves a structure partially mutated.

use crate::store::{DagId, NodeId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("dag already exists: {0}")]
    DagAlreadyExists(DagId),
    #[error("dag not found: {0}")]
    DagNotFound(DagId),
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),
    #[error("node not found for key: {0}")]
    NodeKeyNotFound(String),
    #[error("edge not found: {from} -> {to}")]
    EdgeNotFound { from: NodeId, to: NodeId },
    #[error("empty queue popped")]
    EmptyQueue,
    #[error("waypoints must not be empty")]
    EmptyWaypoints,
    #[error("cannot normalize an empty path")]
    EmptyPath,
    /// Path search popped a node with no edge-storage entry at all. Every
    /// node reachable from a queued path has at least an empty entry once
    /// touched, so this indicates a corrupt adjacency index.
    #[error("no edge entry for node {0}")]
    MissingEdgeEntry(NodeId),
}
