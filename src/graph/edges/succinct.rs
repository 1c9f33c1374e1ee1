//! succinct.rs
//! Bit-vector backend: adjacency entries grouped by source node, groups
//! ordered by node id and concatenated into one flat array. A succinct bit
//! vector marks each group start (1) vs continuation (0), so a group's end
//! is `select(1, group + 1)` — or the end of the array for the last group.
//! A mirror structure serves reverse adjacency. Rebuilt lazily like the
//! flat backend.

use super::{fire_handlers, Edge, EdgeGroup, EdgeHandler, EdgeList, EdgeStore, SerializedEdges};
use crate::error::Error;
use crate::store::NodeId;
use crate::succinct::SuccinctBitVector;
use std::cell::RefCell;
use std::collections::BTreeMap;

struct DirectionIndex<E> {
    /// Group owners, ascending.
    nodes: Vec<NodeId>,
    /// Flat offset of each group's first entry, parallel to `nodes`.
    starts: Vec<usize>,
    /// Concatenated `(neighbor, value)` entries.
    flat: Vec<(NodeId, E)>,
    boundaries: SuccinctBitVector,
}

impl<E> DirectionIndex<E> {
    fn build(groups: BTreeMap<NodeId, Vec<(NodeId, E)>>) -> Self {
        let mut nodes = Vec::with_capacity(groups.len());
        let mut starts = Vec::with_capacity(groups.len());
        let mut flat = Vec::new();
        let mut bits = Vec::new();
        for (node, entries) in groups {
            nodes.push(node);
            starts.push(flat.len());
            bits.push(true);
            for _ in 1..entries.len() {
                bits.push(false);
            }
            flat.extend(entries);
        }
        Self {
            nodes,
            starts,
            flat,
            boundaries: SuccinctBitVector::new(&bits),
        }
    }

    fn entries(&self, node: NodeId) -> Option<&[(NodeId, E)]> {
        let group = self.nodes.binary_search(&node).ok()?;
        let start = self.starts[group];
        let end = self
            .boundaries
            .select(true, group + 1)
            .unwrap_or(self.flat.len());
        Some(&self.flat[start..end])
    }
}

struct CompactIndex<E> {
    forward: DirectionIndex<E>,
    reverse: DirectionIndex<E>,
}

pub struct SuccinctEdges<E> {
    /// Insertion-ordered source of truth.
    pending: Vec<Edge<E>>,
    // None == dirty; rebuilt on first read after an add.
    index: RefCell<Option<CompactIndex<E>>>,
    handlers: Vec<EdgeHandler<E>>,
}

impl<E> SuccinctEdges<E> {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            index: RefCell::new(None),
            handlers: Vec::new(),
        }
    }
}

impl<E> Default for SuccinctEdges<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone> SuccinctEdges<E> {
    fn with_index<R>(&self, f: impl FnOnce(&CompactIndex<E>) -> R) -> R {
        let mut slot = self.index.borrow_mut();
        let index = slot.get_or_insert_with(|| {
            let mut forward: BTreeMap<NodeId, Vec<(NodeId, E)>> = BTreeMap::new();
            let mut reverse: BTreeMap<NodeId, Vec<(NodeId, E)>> = BTreeMap::new();
            for edge in &self.pending {
                forward
                    .entry(edge.from)
                    .or_default()
                    .push((edge.to, edge.value.clone()));
                reverse
                    .entry(edge.to)
                    .or_default()
                    .push((edge.from, edge.value.clone()));
            }
            CompactIndex {
                forward: DirectionIndex::build(forward),
                reverse: DirectionIndex::build(reverse),
            }
        });
        f(index)
    }
}

impl<E: Clone> EdgeStore<E> for SuccinctEdges<E> {
    fn add(&mut self, from: NodeId, to: NodeId, value: E) {
        self.pending.push(Edge { from, to, value });
        *self.index.borrow_mut() = None;
        if let Some(edge) = self.pending.last() {
            fire_handlers(&mut self.handlers, from, to, &edge.value);
        }
    }

    fn get(&self, node: NodeId) -> Option<EdgeGroup<E>> {
        self.with_index(|index| {
            let children = index.forward.entries(node);
            let parent = index.reverse.entries(node);
            if children.is_none() && parent.is_none() {
                return None;
            }
            let children: EdgeList<E> = children
                .unwrap_or(&[])
                .iter()
                .map(|(to, value)| Edge {
                    from: node,
                    to: *to,
                    value: value.clone(),
                })
                .collect();
            let parent: EdgeList<E> = parent
                .unwrap_or(&[])
                .iter()
                .map(|(from, value)| Edge {
                    from: *from,
                    to: node,
                    value: value.clone(),
                })
                .collect();
            Some(EdgeGroup { parent, children })
        })
    }

    fn get_value(&self, from: NodeId, to: NodeId) -> Result<E, Error> {
        self.with_index(|index| {
            index
                .forward
                .entries(from)
                .and_then(|entries| entries.iter().find(|(t, _)| *t == to))
                .map(|(_, value)| value.clone())
                .ok_or(Error::EdgeNotFound { from, to })
        })
    }

    fn serialize(&self) -> SerializedEdges<E> {
        self.with_index(|index| {
            index
                .forward
                .nodes
                .iter()
                .filter_map(|&node| Some((node, index.forward.entries(node)?.to_vec())))
                .collect()
        })
    }

    fn add_handler(&mut self, handler: EdgeHandler<E>) {
        self.handlers.push(handler);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(i: usize) -> NodeId {
        NodeId::new(i)
    }

    #[test]
    fn test_group_ends_via_boundary_select() {
        let mut edges = SuccinctEdges::new();
        // Node 0: 2 edges, node 2: 3 edges, node 5: 1 edge.
        edges.add(id(0), id(1), 1);
        edges.add(id(0), id(2), 2);
        edges.add(id(2), id(3), 3);
        edges.add(id(2), id(4), 4);
        edges.add(id(2), id(5), 5);
        edges.add(id(5), id(6), 6);

        assert_eq!(edges.get(id(0)).unwrap().children.len(), 2);
        assert_eq!(edges.get(id(2)).unwrap().children.len(), 3);
        // Last group is bounded by the array end, not a boundary bit.
        assert_eq!(edges.get(id(5)).unwrap().children.len(), 1);
        assert_eq!(edges.get_value(id(2), id(5)), Ok(5));
    }

    #[test]
    fn test_reverse_adjacency_mirrors_forward() {
        let mut edges = SuccinctEdges::new();
        edges.add(id(0), id(2), 1);
        edges.add(id(1), id(2), 2);
        let group = edges.get(id(2)).unwrap();
        assert!(group.children.is_empty());
        let parents: Vec<NodeId> = group.parent.iter().map(|e| e.from).collect();
        assert_eq!(parents, vec![id(0), id(1)]);
    }
}
