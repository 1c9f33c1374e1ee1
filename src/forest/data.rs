//! data.rs
//! Wire format for a persisted forest: the node array (index == id) and one
//! entry per DAG with its priority and children-adjacency list.

use crate::graph::SerializedEdges;
use crate::store::DagId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DagForestData<N, E> {
    pub nodes: Vec<N>,
    pub dags: Vec<DagEntry<E>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DagEntry<E> {
    pub id: DagId,
    pub priority: i64,
    pub edges: SerializedEdges<E>,
}

impl<N, E> DagForestData<N, E> {
    pub fn to_json(&self) -> serde_json::Result<String>
    where
        N: Serialize,
        E: Serialize,
    {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self>
    where
        N: DeserializeOwned,
        E: DeserializeOwned,
    {
        serde_json::from_str(json)
    }
}
