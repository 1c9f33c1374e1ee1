//! flat.rs
//! Flat-array backend: every edge in one insertion-ordered list, with
//! from/to lookup maps rebuilt lazily. Any `add` drops the index; the first
//! subsequent read rebuilds it in full.

use super::{fire_handlers, Edge, EdgeGroup, EdgeHandler, EdgeList, EdgeStore, SerializedEdges};
use crate::error::Error;
use crate::store::NodeId;
use std::cell::RefCell;
use std::collections::HashMap;

#[derive(Default)]
struct FlatIndex {
    by_from: HashMap<NodeId, Vec<usize>>,
    by_to: HashMap<NodeId, Vec<usize>>,
}

fn build_index<E>(list: &[Edge<E>]) -> FlatIndex {
    let mut index = FlatIndex::default();
    for (i, edge) in list.iter().enumerate() {
        index.by_from.entry(edge.from).or_default().push(i);
        index.by_to.entry(edge.to).or_default().push(i);
    }
    index
}

pub struct FlatEdges<E> {
    list: Vec<Edge<E>>,
    // None == dirty; rebuilt on first read after an add.
    index: RefCell<Option<FlatIndex>>,
    handlers: Vec<EdgeHandler<E>>,
}

impl<E> FlatEdges<E> {
    pub fn new() -> Self {
        Self {
            list: Vec::new(),
            index: RefCell::new(None),
            handlers: Vec::new(),
        }
    }

    fn with_index<R>(&self, f: impl FnOnce(&FlatIndex, &[Edge<E>]) -> R) -> R {
        let mut slot = self.index.borrow_mut();
        let index = slot.get_or_insert_with(|| build_index(&self.list));
        f(index, &self.list)
    }
}

impl<E> Default for FlatEdges<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone> EdgeStore<E> for FlatEdges<E> {
    fn add(&mut self, from: NodeId, to: NodeId, value: E) {
        self.list.push(Edge { from, to, value });
        *self.index.borrow_mut() = None;
        if let Some(edge) = self.list.last() {
            fire_handlers(&mut self.handlers, from, to, &edge.value);
        }
    }

    fn get(&self, node: NodeId) -> Option<EdgeGroup<E>> {
        self.with_index(|index, list| {
            let parent = index.by_to.get(&node);
            let children = index.by_from.get(&node);
            if parent.is_none() && children.is_none() {
                return None;
            }
            let collect = |positions: Option<&Vec<usize>>| -> EdgeList<E> {
                positions
                    .map(|p| p.iter().map(|&i| list[i].clone()).collect())
                    .unwrap_or_default()
            };
            Some(EdgeGroup {
                parent: collect(parent),
                children: collect(children),
            })
        })
    }

    fn get_value(&self, from: NodeId, to: NodeId) -> Result<E, Error> {
        self.with_index(|index, list| {
            index
                .by_from
                .get(&from)
                .and_then(|positions| positions.iter().find(|&&i| list[i].to == to))
                .map(|&i| list[i].value.clone())
                .ok_or(Error::EdgeNotFound { from, to })
        })
    }

    fn serialize(&self) -> SerializedEdges<E> {
        self.with_index(|index, list| {
            let mut sources: Vec<NodeId> = index.by_from.keys().copied().collect();
            sources.sort();
            sources
                .into_iter()
                .filter_map(|from| {
                    let positions = index.by_from.get(&from)?;
                    Some((
                        from,
                        positions
                            .iter()
                            .map(|&i| (list[i].to, list[i].value.clone()))
                            .collect(),
                    ))
                })
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
    fn test_add_invalidates_index() {
        let mut edges = FlatEdges::new();
        edges.add(id(0), id(1), 1);
        // Read builds the index.
        assert!(edges.get(id(0)).is_some());
        assert!(edges.index.borrow().is_some());
        // Add drops it again.
        edges.add(id(1), id(2), 2);
        assert!(edges.index.borrow().is_none());
        assert_eq!(edges.get(id(1)).unwrap().children.len(), 1);
    }

    #[test]
    fn test_preserves_insertion_order_per_node() {
        let mut edges = FlatEdges::new();
        edges.add(id(0), id(3), 3);
        edges.add(id(0), id(1), 1);
        edges.add(id(0), id(2), 2);
        let children = edges.get(id(0)).unwrap().children;
        let targets: Vec<NodeId> = children.iter().map(|e| e.to).collect();
        assert_eq!(targets, vec![id(3), id(1), id(2)]);
    }
}
