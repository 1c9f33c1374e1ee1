//! canopy — a prioritized forest of directed acyclic graphs with least-cost
//! path search, waypoint-constrained routing, grapheme-aware substring
//! search across node labels, and interchangeable edge-storage backends
//! (plain adjacency, flat array, succinct bit-vector).
//!
//! Everything is single-threaded and cooperative: searches are lazy
//! iterators, and the steerable ones (`dfs`, `find_partial_path`,
//! `string_search`) expose an explicit `next_with(control)` step so the
//! caller can prune branches or abandon a DAG mid-search.

pub mod collections;
pub mod error;
pub mod forest;
pub mod graph;
pub mod search;
pub mod store;
pub mod succinct;

pub use collections::{Heap, PriorityQueue};
pub use error::Error;
pub use forest::{
    DagEntry, DagForest, DagForestData, DagPriorityMap, FindPathCandidate, ForestWaypointPath,
    MinCostPerDag, PartialPath, PartialPathMatcher, PartialPathOp, PartialPathSearch,
    StringSearch, VisitedForestPathQueue,
};
pub use graph::{
    AdjacencyEdges, CostFn, Cycle, CycleReason, Dag, DfsControl, Edge, EdgeGroup, EdgeStore,
    FindPathOptions, FlatEdges, Path, SuccinctEdges,
};
pub use search::{StringFinder, StringMatch};
pub use store::{DagId, NodeId, Nodes, SharedNodes};
pub use succinct::SuccinctBitVector;
