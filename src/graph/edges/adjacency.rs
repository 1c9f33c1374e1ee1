//! adjacency.rs
//! Plain hash-map adjacency backend: forward and reverse edge lists per
//! node. O(1) amortized add, O(degree) reads.

use super::{fire_handlers, Edge, EdgeGroup, EdgeHandler, EdgeList, EdgeStore, SerializedEdges};
use crate::error::Error;
use crate::store::NodeId;
use std::collections::HashMap;

pub struct AdjacencyEdges<E> {
    forward: HashMap<NodeId, EdgeList<E>>,
    reverse: HashMap<NodeId, EdgeList<E>>,
    handlers: Vec<EdgeHandler<E>>,
}

impl<E> AdjacencyEdges<E> {
    pub fn new() -> Self {
        Self {
            forward: HashMap::new(),
            reverse: HashMap::new(),
            handlers: Vec::new(),
        }
    }
}

impl<E> Default for AdjacencyEdges<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone> EdgeStore<E> for AdjacencyEdges<E> {
    fn add(&mut self, from: NodeId, to: NodeId, value: E) {
        let edge = Edge { from, to, value };
        self.forward.entry(from).or_default().push(edge.clone());
        self.reverse.entry(to).or_default().push(edge.clone());
        fire_handlers(&mut self.handlers, from, to, &edge.value);
    }

    fn get(&self, node: NodeId) -> Option<EdgeGroup<E>> {
        let parent = self.reverse.get(&node);
        let children = self.forward.get(&node);
        if parent.is_none() && children.is_none() {
            return None;
        }
        Some(EdgeGroup {
            parent: parent.cloned().unwrap_or_default(),
            children: children.cloned().unwrap_or_default(),
        })
    }

    fn get_value(&self, from: NodeId, to: NodeId) -> Result<E, Error> {
        self.forward
            .get(&from)
            .and_then(|edges| edges.iter().find(|e| e.to == to))
            .map(|e| e.value.clone())
            .ok_or(Error::EdgeNotFound { from, to })
    }

    fn serialize(&self) -> SerializedEdges<E> {
        let mut sources: Vec<NodeId> = self.forward.keys().copied().collect();
        sources.sort();
        sources
            .into_iter()
            .filter_map(|from| {
                let edges = self.forward.get(&from)?;
                Some((
                    from,
                    edges.iter().map(|e| (e.to, e.value.clone())).collect(),
                ))
            })
            .collect()
    }

    fn add_handler(&mut self, handler: EdgeHandler<E>) {
        self.handlers.push(handler);
    }
}
