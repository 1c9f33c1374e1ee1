//! Core graph structures: edge storage backends, paths, and the DAG itself.
pub mod dag;
pub mod edges;
pub mod path;

pub use dag::{
    CostFn, Cycle, CycleReason, Dag, DfsControl, DfsIter, FindPathIter, FindPathOptions,
    NodeHandler, WaypointPathIter,
};
pub use edges::{
    AdjacencyEdges, Edge, EdgeGroup, EdgeHandler, EdgeList, EdgeStore, FlatEdges, SerializedEdges,
    SuccinctEdges,
};
pub use path::Path;
