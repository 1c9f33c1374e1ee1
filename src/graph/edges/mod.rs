//! Edge storage behind one capability contract. Three interchangeable
//! backends implement it; which one a DAG carries is purely a storage
//! decision and never observable through `get`/`get_value`/`serialize`.

use crate::error::Error;
use crate::store::NodeId;
use smallvec::SmallVec;

pub mod adjacency;
pub mod flat;
pub mod succinct;

pub use adjacency::AdjacencyEdges;
pub use flat::FlatEdges;
pub use succinct::SuccinctEdges;

#[derive(Debug, Clone, PartialEq)]
pub struct Edge<E> {
    pub from: NodeId,
    pub to: NodeId,
    pub value: E,
}

pub type EdgeList<E> = SmallVec<[Edge<E>; 4]>;

/// Incoming (`parent`) and outgoing (`children`) edges of one node.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeGroup<E> {
    pub parent: EdgeList<E>,
    pub children: EdgeList<E>,
}

/// Invoked synchronously on every `add`. Owners use this to maintain derived
/// indices (node membership, forest reverse index) without the store knowing
/// about them.
pub type EdgeHandler<E> = Box<dyn FnMut(NodeId, NodeId, &E)>;

/// Children-adjacency form: `(from, [(to, value), ...])`, outer entries in
/// ascending `from` order, inner lists in insertion order. Identical across
/// backends.
pub type SerializedEdges<E> = Vec<(NodeId, Vec<(NodeId, E)>)>;

pub trait EdgeStore<E> {
    fn add(&mut self, from: NodeId, to: NodeId, value: E);

    /// Parents and children of `node`, or `None` when no edge has ever
    /// touched it.
    fn get(&self, node: NodeId) -> Option<EdgeGroup<E>>;

    /// Value of the first edge `from -> to`.
    fn get_value(&self, from: NodeId, to: NodeId) -> Result<E, Error>;

    fn serialize(&self) -> SerializedEdges<E>;

    fn add_handler(&mut self, handler: EdgeHandler<E>);
}

pub(crate) fn fire_handlers<E>(
    handlers: &mut [EdgeHandler<E>],
    from: NodeId,
    to: NodeId,
    value: &E,
) {
    for handler in handlers {
        handler(from, to, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(i: usize) -> NodeId {
        NodeId::new(i)
    }

    fn all_backends() -> Vec<(&'static str, Box<dyn EdgeStore<i32>>)> {
        vec![
            ("adjacency", Box::new(AdjacencyEdges::<i32>::new())),
            ("flat", Box::new(FlatEdges::<i32>::new())),
            ("succinct", Box::new(SuccinctEdges::<i32>::new())),
        ]
    }

    /// Out-of-order sources, a parallel edge, and a shared sink.
    fn populate(store: &mut dyn EdgeStore<i32>) {
        store.add(id(2), id(3), 23);
        store.add(id(0), id(1), 1);
        store.add(id(0), id(2), 2);
        store.add(id(1), id(3), 13);
        store.add(id(0), id(1), 7); // parallel edge
    }

    #[test]
    fn test_backends_agree_with_adjacency() {
        let mut reference = AdjacencyEdges::<i32>::new();
        populate(&mut reference);

        for (name, mut store) in all_backends() {
            populate(store.as_mut());
            for n in 0..5 {
                assert_eq!(store.get(id(n)), reference.get(id(n)), "get, {name}");
            }
            for (from, to) in [(0, 1), (0, 2), (1, 3), (2, 3)] {
                assert_eq!(
                    store.get_value(id(from), id(to)),
                    reference.get_value(id(from), id(to)),
                    "get_value, {name}"
                );
            }
            assert_eq!(store.serialize(), reference.serialize(), "serialize, {name}");
        }
    }

    #[test]
    fn test_get_untouched_node_is_absent() {
        for (name, mut store) in all_backends() {
            store.add(id(0), id(1), 1);
            assert_eq!(store.get(id(5)), None, "{name}");
        }
    }

    #[test]
    fn test_get_value_missing_edge_fails() {
        for (name, mut store) in all_backends() {
            store.add(id(0), id(1), 1);
            assert_eq!(
                store.get_value(id(1), id(0)),
                Err(Error::EdgeNotFound {
                    from: id(1),
                    to: id(0)
                }),
                "{name}"
            );
        }
    }

    #[test]
    fn test_parallel_edges_kept_and_first_value_wins() {
        for (name, mut store) in all_backends() {
            store.add(id(0), id(1), 10);
            store.add(id(0), id(1), 20);
            let group = store.get(id(0)).unwrap();
            assert_eq!(group.children.len(), 2, "{name}");
            assert_eq!(store.get_value(id(0), id(1)), Ok(10), "{name}");
        }
    }

    #[test]
    fn test_reads_interleaved_with_adds() {
        // Lazy backends must invalidate and rebuild between adds.
        for (name, mut store) in all_backends() {
            store.add(id(0), id(1), 1);
            assert_eq!(store.get(id(0)).unwrap().children.len(), 1, "{name}");
            store.add(id(0), id(2), 2);
            let group = store.get(id(0)).unwrap();
            assert_eq!(group.children.len(), 2, "{name}");
            assert_eq!(group.children[1].to, id(2), "{name}");
            assert_eq!(store.get(id(2)).unwrap().parent.len(), 1, "{name}");
        }
    }

    #[test]
    fn test_serialize_orders_sources_by_id() {
        for (name, mut store) in all_backends() {
            store.add(id(3), id(0), 30);
            store.add(id(1), id(0), 10);
            store.add(id(1), id(2), 12);
            let serialized = store.serialize();
            assert_eq!(
                serialized,
                vec![
                    (id(1), vec![(id(0), 10), (id(2), 12)]),
                    (id(3), vec![(id(0), 30)]),
                ],
                "{name}"
            );
        }
    }

    #[test]
    fn test_handlers_fire_on_every_add() {
        use std::cell::RefCell;
        use std::rc::Rc;

        for (name, mut store) in all_backends() {
            let seen: Rc<RefCell<Vec<(NodeId, NodeId, i32)>>> = Rc::new(RefCell::new(Vec::new()));
            let log = Rc::clone(&seen);
            store.add_handler(Box::new(move |from, to, value| {
                log.borrow_mut().push((from, to, *value));
            }));
            store.add(id(0), id(1), 5);
            store.add(id(1), id(2), 6);
            assert_eq!(
                &*seen.borrow(),
                &[(id(0), id(1), 5), (id(1), id(2), 6)],
                "{name}"
            );
        }
    }
}
