//! dag.rs
//! A single directed acyclic graph over a shared node registry: root/leaf
//! derivation, lazy least-cost path search, waypoint composition, pruneable
//! depth-first traversal and cycle detection.
//!
//! Acyclicity is not enforced at insertion time; `detect_cycle` is the
//! explicit check.

use crate::collections::{trace_hook, PriorityQueue};
use crate::error::Error;
use crate::graph::edges::{AdjacencyEdges, Edge, EdgeGroup, EdgeStore, SerializedEdges};
use crate::graph::path::Path;
use crate::store::{NodeId, SharedNodes};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

/// Cost of traversing one edge, in the context of the DAG being searched.
pub type CostFn<'f, N, E> = &'f dyn Fn(&Edge<E>, &Dag<N, E>) -> f64;

pub struct FindPathOptions<'f, N, E> {
    /// Start node; all roots when unset (multi-source).
    pub from: Option<NodeId>,
    /// Accepted terminal; all leafs when unset (multi-sink).
    pub to: Option<NodeId>,
    /// Edge cost; zero when unset.
    pub cost: Option<CostFn<'f, N, E>>,
    /// Cost each seeded source path starts with.
    pub default_cost: f64,
}

impl<'f, N, E> FindPathOptions<'f, N, E> {
    pub fn new() -> Self {
        Self {
            from: None,
            to: None,
            cost: None,
            default_cost: 0.0,
        }
    }

    pub fn from(mut self, node: NodeId) -> Self {
        self.from = Some(node);
        self
    }

    pub fn to(mut self, node: NodeId) -> Self {
        self.to = Some(node);
        self
    }

    pub fn cost(mut self, cost: CostFn<'f, N, E>) -> Self {
        self.cost = Some(cost);
        self
    }

    pub fn default_cost(mut self, cost: f64) -> Self {
        self.default_cost = cost;
        self
    }
}

impl<'f, N, E> Default for FindPathOptions<'f, N, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'f, N, E> Clone for FindPathOptions<'f, N, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'f, N, E> Copy for FindPathOptions<'f, N, E> {}

pub type NodeHandler = Box<dyn FnMut(NodeId)>;

pub struct Dag<N, E> {
    nodes: SharedNodes<N>,
    edges: Box<dyn EdgeStore<E>>,
    /// Every node touched by an edge or added through this DAG.
    node_set: Rc<RefCell<BTreeSet<NodeId>>>,
    node_handlers: Vec<NodeHandler>,
}

impl<N, E: Clone + 'static> Dag<N, E> {
    pub fn new(nodes: SharedNodes<N>) -> Self {
        Self::with_store(nodes, Box::new(AdjacencyEdges::new()))
    }

    pub fn with_store(nodes: SharedNodes<N>, mut edges: Box<dyn EdgeStore<E>>) -> Self {
        let node_set = Rc::new(RefCell::new(BTreeSet::new()));
        let set = Rc::clone(&node_set);
        edges.add_handler(Box::new(move |from, to, _| {
            let mut set = set.borrow_mut();
            set.insert(from);
            set.insert(to);
        }));
        Self {
            nodes,
            edges,
            node_set,
            node_handlers: Vec::new(),
        }
    }

    /// Adds a value to the shared registry and records membership in this
    /// DAG. Registered node handlers fire afterwards.
    pub fn add_node(&mut self, value: N) -> NodeId {
        let id = self.nodes.borrow_mut().add(value);
        self.node_set.borrow_mut().insert(id);
        for handler in &mut self.node_handlers {
            handler(id);
        }
        id
    }

    pub fn add_edge(&mut self, from: NodeId, to: NodeId, value: E) {
        self.edges.add(from, to, value);
    }

    pub fn add_node_handler(&mut self, handler: NodeHandler) {
        self.node_handlers.push(handler);
    }

    pub fn nodes(&self) -> &SharedNodes<N> {
        &self.nodes
    }

    pub fn edges(&self) -> &dyn EdgeStore<E> {
        &*self.edges
    }

    pub fn edges_mut(&mut self) -> &mut dyn EdgeStore<E> {
        &mut *self.edges
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.node_set.borrow().contains(&node)
    }

    /// Member nodes in ascending id order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.node_set.borrow().iter().copied().collect()
    }

    /// Nodes with no incoming edge. Recomputed per call; edges may arrive
    /// incrementally.
    pub fn roots(&self) -> Vec<NodeId> {
        self.filter_members(|group| group.parent.is_empty())
    }

    /// Nodes with no outgoing edge.
    pub fn leafs(&self) -> Vec<NodeId> {
        self.filter_members(|group| group.children.is_empty())
    }

    fn filter_members(&self, keep: impl Fn(&EdgeGroup<E>) -> bool) -> Vec<NodeId> {
        self.node_set
            .borrow()
            .iter()
            .copied()
            .filter(|&node| match self.edges.get(node) {
                None => true,
                Some(group) => keep(&group),
            })
            .collect()
    }

    pub fn serialize_edges(&self) -> SerializedEdges<E> {
        self.edges.serialize()
    }

    /// Lazy least-cost path search. Paths pop in ascending accumulated-cost
    /// order; every popped path ending at an accepted terminal is yielded
    /// and the search continues, so all terminal-reaching paths eventually
    /// appear, cheapest first. Non-negative costs are required for the
    /// cheapest-first guarantee to hold.
    pub fn find_path<'a>(&'a self, options: FindPathOptions<'a, N, E>) -> FindPathIter<'a, N, E> {
        tracing::debug!(
            target: "canopy::dag",
            from = ?options.from,
            to = ?options.to,
            "find_path: start"
        );
        let mut queue =
            PriorityQueue::new_asc(|p: &Path| p.cost).with_hook(trace_hook("find_path"));
        let sources = match options.from {
            Some(from) => vec![from],
            None => self.roots(),
        };
        for source in sources {
            queue.push(Path::single(source, options.default_cost));
        }
        let to = match options.to {
            Some(to) => vec![to],
            None => self.leafs(),
        };
        FindPathIter {
            dag: self,
            queue,
            to,
            cost: options.cost,
            failed: false,
        }
    }

    /// Paths visiting every waypoint in order. One `find_path` runs per
    /// consecutive waypoint pair, plus the unconstrained lead-in and
    /// lead-out; per-segment alternatives combine as a Cartesian product
    /// (earlier segments vary fastest), costs summed and the shared junction
    /// nodes collapsed. Combinatorial by design: callers needing bounded
    /// output must cap it upstream.
    pub fn find_waypoint_path<'a>(
        &'a self,
        waypoints: &[NodeId],
        options: FindPathOptions<'a, N, E>,
    ) -> Result<WaypointPathIter<'a, N, E>, Error> {
        let (first, rest) = waypoints.split_first().ok_or(Error::EmptyWaypoints)?;
        let mut segments: Vec<(Option<NodeId>, Option<NodeId>)> =
            Vec::with_capacity(waypoints.len() + 1);
        segments.push((options.from, Some(*first)));
        let mut prev = *first;
        for &waypoint in rest {
            segments.push((Some(prev), Some(waypoint)));
            prev = waypoint;
        }
        segments.push((Some(prev), options.to));

        // All segments but the last are materialized; the last stays lazy.
        let mut prefixes = vec![Path::empty()];
        for &(from, to) in &segments[..segments.len() - 1] {
            let segment = FindPathOptions {
                from,
                to,
                cost: options.cost,
                default_cost: options.default_cost,
            };
            let paths: Vec<Path> = self.find_path(segment).collect::<Result<_, _>>()?;
            let mut combined = Vec::with_capacity(paths.len() * prefixes.len());
            for path in &paths {
                for prefix in &prefixes {
                    combined.push(prefix.concat(path));
                }
            }
            prefixes = combined;
        }

        let (last_from, last_to) = segments[segments.len() - 1];
        let last = self.find_path(FindPathOptions {
            from: last_from,
            to: last_to,
            cost: options.cost,
            default_cost: options.default_cost,
        });
        Ok(WaypointPathIter {
            prefixes,
            last,
            current: None,
            prefix_idx: 0,
            failed: false,
        })
    }

    /// Depth-first traversal from the roots, yielding the path so far at
    /// every step (every non-empty prefix of every maximal path), children
    /// in adjacency order. `next_with(DfsControl::Skip)` prunes the children
    /// of the previously yielded path.
    pub fn dfs(&self) -> DfsIter<'_, N, E> {
        self.dfs_from(Vec::new())
    }

    /// As `dfs`, but starting from `prefix` (yielded first) instead of the
    /// roots. An empty prefix is the plain root traversal.
    pub fn dfs_from(&self, prefix: Vec<NodeId>) -> DfsIter<'_, N, E> {
        let stack = if prefix.is_empty() {
            let mut stack: Vec<Vec<NodeId>> =
                self.roots().into_iter().map(|root| vec![root]).collect();
            stack.reverse();
            stack
        } else {
            vec![prefix]
        };
        DfsIter {
            dag: self,
            stack,
            last: None,
        }
    }

    /// Explicit acyclicity check over the structure reachable from the
    /// declared roots. Zero roots means a cycle by necessity whenever edges
    /// exist (`NoRoots`); otherwise the first traversal path whose last node
    /// already occurs earlier in that same path is reported.
    ///
    /// Components unreachable from any root are not inspected: two disjoint
    /// cycles where every node has an in-edge report as `NoRoots` with no
    /// path, and a cyclic component hanging off no root stays invisible when
    /// other roots exist.
    pub fn detect_cycle(&self) -> Option<Cycle> {
        if self.roots().is_empty() {
            return Some(Cycle {
                reason: CycleReason::NoRoots,
                path: Vec::new(),
            });
        }
        let mut dfs = self.dfs();
        while let Some(path) = dfs.next_with(DfsControl::Continue) {
            if let Some((last, rest)) = path.split_last() {
                if rest.contains(last) {
                    return Some(Cycle {
                        reason: CycleReason::Cycle,
                        path,
                    });
                }
            }
        }
        None
    }
}

pub struct FindPathIter<'a, N, E> {
    dag: &'a Dag<N, E>,
    queue: PriorityQueue<Path>,
    to: Vec<NodeId>,
    cost: Option<CostFn<'a, N, E>>,
    failed: bool,
}

impl<N, E: Clone + 'static> FindPathIter<'_, N, E> {
    fn edge_cost(&self, edge: &Edge<E>) -> f64 {
        match self.cost {
            Some(cost) => cost(edge, self.dag),
            None => 0.0,
        }
    }
}

impl<N, E: Clone + 'static> Iterator for FindPathIter<'_, N, E> {
    type Item = Result<Path, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        while let Some(path) = self.queue.safe_pop() {
            let last = match path.last() {
                Some(last) => last,
                None => continue,
            };
            if self.to.contains(&last) {
                return Some(Ok(path));
            }
            let group = match self.dag.edges().get(last) {
                Some(group) => group,
                None => {
                    self.failed = true;
                    return Some(Err(Error::MissingEdgeEntry(last)));
                }
            };
            for edge in &group.children {
                let cost = self.edge_cost(edge);
                self.queue.push(path.extended(edge.to, cost));
            }
        }
        None
    }
}

pub struct WaypointPathIter<'a, N, E> {
    /// Cartesian product of every segment but the last, already composed.
    prefixes: Vec<Path>,
    last: FindPathIter<'a, N, E>,
    current: Option<Path>,
    prefix_idx: usize,
    failed: bool,
}

impl<N, E: Clone + 'static> Iterator for WaypointPathIter<'_, N, E> {
    type Item = Result<Path, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            if let Some(current) = &self.current {
                if self.prefix_idx < self.prefixes.len() {
                    let combined = self.prefixes[self.prefix_idx].concat(current);
                    self.prefix_idx += 1;
                    return Some(combined.normalize());
                }
                self.current = None;
            }
            match self.last.next()? {
                Ok(path) => {
                    self.current = Some(path);
                    self.prefix_idx = 0;
                }
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DfsControl {
    Continue,
    /// Do not descend into the children of the path just yielded.
    Skip,
}

pub struct DfsIter<'a, N, E> {
    dag: &'a Dag<N, E>,
    stack: Vec<Vec<NodeId>>,
    last: Option<Vec<NodeId>>,
}

impl<N, E: Clone + 'static> DfsIter<'_, N, E> {
    /// Advances the traversal. The control applies to the previously yielded
    /// path: `Skip` prunes its children before the next path is produced.
    pub fn next_with(&mut self, control: DfsControl) -> Option<Vec<NodeId>> {
        if let Some(prev) = self.last.take() {
            if control == DfsControl::Continue {
                if let Some(&last_node) = prev.last() {
                    if let Some(group) = self.dag.edges().get(last_node) {
                        for edge in group.children.iter().rev() {
                            let mut path = prev.clone();
                            path.push(edge.to);
                            self.stack.push(path);
                        }
                    }
                }
            }
        }
        let next = self.stack.pop()?;
        self.last = Some(next.clone());
        Some(next)
    }
}

impl<N, E: Clone + 'static> Iterator for DfsIter<'_, N, E> {
    type Item = Vec<NodeId>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_with(DfsControl::Continue)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleReason {
    NoRoots,
    Cycle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle {
    pub reason: CycleReason,
    pub path: Vec<NodeId>,
}
