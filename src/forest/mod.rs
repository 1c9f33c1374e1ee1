//! A prioritized collection of independent DAGs sharing one node registry.
//! Cross-DAG queries return results ordered by DAG priority and path cost;
//! the partial-path search protocol lets callers steer the iteration with
//! control tokens.

pub mod data;
pub mod priority;
pub mod visited;

pub use data::{DagEntry, DagForestData};
pub use priority::{DagPriorityMap, PrioritizedDag};
pub use visited::{FindPathCandidate, VisitedForestPathQueue};

use crate::error::Error;
use crate::graph::{CostFn, Dag, EdgeStore, FindPathOptions, Path, WaypointPathIter};
use crate::search::StringFinder;
use crate::store::{DagId, NodeId, Nodes, SharedNodes};
use priority::new_dag_priority_queue;
use std::cell::{Ref, RefCell};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::fmt::Display;
use std::rc::Rc;

/// Control token for the resumable forest searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartialPathOp {
    /// Continue with the next match.
    Next,
    /// Abandon the current DAG's remaining matches.
    NextDag,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialPath {
    pub path: Vec<NodeId>,
    pub dag_id: DagId,
}

/// Yields candidate node paths for one `(node, dag)` pair.
pub type PartialPathMatcher<'m, N, E> =
    Box<dyn FnMut(NodeId, &Dag<N, E>) -> Result<Vec<Vec<NodeId>>, Error> + 'm>;

#[derive(Debug, Clone, PartialEq)]
pub struct ForestWaypointPath {
    pub path: Path,
    pub dag_id: DagId,
    pub priority: i64,
}

pub struct ForestDags<N, E> {
    nodes: SharedNodes<N>,
    dags: Vec<Dag<N, E>>,
    priority_map: DagPriorityMap,
    /// Which DAGs touch a node; maintained through the handlers wired into
    /// every member DAG, so it stays consistent however edges are added.
    node_dag_index: Rc<RefCell<HashMap<NodeId, BTreeSet<DagId>>>>,
}

impl<N, E: Clone + 'static> ForestDags<N, E> {
    fn new(nodes: SharedNodes<N>) -> Self {
        Self {
            nodes,
            dags: Vec::new(),
            priority_map: DagPriorityMap::new(),
            node_dag_index: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// Creates a DAG on the default edge backend.
    pub fn new_dag(&mut self, priority: i64) -> Result<DagId, Error> {
        let dag = Dag::new(Rc::clone(&self.nodes));
        self.register(dag, priority)
    }

    /// Creates a DAG on a caller-chosen edge backend.
    pub fn new_dag_with_store(
        &mut self,
        priority: i64,
        store: Box<dyn EdgeStore<E>>,
    ) -> Result<DagId, Error> {
        let dag = Dag::with_store(Rc::clone(&self.nodes), store);
        self.register(dag, priority)
    }

    fn register(&mut self, mut dag: Dag<N, E>, priority: i64) -> Result<DagId, Error> {
        let id = DagId::new(self.dags.len());
        self.priority_map.set(id, priority)?;
        let index = Rc::clone(&self.node_dag_index);
        dag.add_node_handler(Box::new(move |node| {
            index.borrow_mut().entry(node).or_default().insert(id);
        }));
        let index = Rc::clone(&self.node_dag_index);
        dag.edges_mut().add_handler(Box::new(move |from, to, _| {
            let mut index = index.borrow_mut();
            index.entry(from).or_default().insert(id);
            index.entry(to).or_default().insert(id);
        }));
        self.dags.push(dag);
        tracing::debug!(target: "canopy::forest", %id, priority, "dag registered");
        Ok(id)
    }

    pub fn get(&self, id: DagId) -> Result<&Dag<N, E>, Error> {
        self.dags.get(id.index()).ok_or(Error::DagNotFound(id))
    }

    pub fn get_mut(&mut self, id: DagId) -> Result<&mut Dag<N, E>, Error> {
        self.dags.get_mut(id.index()).ok_or(Error::DagNotFound(id))
    }

    pub fn len(&self) -> usize {
        self.dags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dags.is_empty()
    }

    pub fn priority_map(&self) -> &DagPriorityMap {
        &self.priority_map
    }

    pub fn priority(&self, id: DagId) -> Result<i64, Error> {
        self.priority_map.get(id)
    }

    /// DAGs containing `node`, in descending priority order (registration
    /// order within a priority).
    pub fn list_by_node(&self, node: NodeId) -> Vec<DagId> {
        let index = self.node_dag_index.borrow();
        let members = match index.get(&node) {
            Some(members) => members,
            None => return Vec::new(),
        };
        let mut queue = new_dag_priority_queue();
        for &dag_id in members {
            if let Ok(priority) = self.priority_map.get(dag_id) {
                queue.push(PrioritizedDag { dag_id, priority });
            }
        }
        queue.pop_all().into_iter().map(|d| d.dag_id).collect()
    }

    /// Member DAGs in descending priority order.
    pub fn iter_by_priority(&self) -> impl Iterator<Item = (&Dag<N, E>, DagId, i64)> + '_ {
        self.priority_map.iter().filter_map(move |p| {
            self.dags
                .get(p.dag_id.index())
                .map(|dag| (dag, p.dag_id, p.priority))
        })
    }

    /// One wire entry per DAG, in id order so replay reassigns identical
    /// ids.
    pub fn serialize(&self) -> Result<Vec<DagEntry<E>>, Error> {
        let mut entries = Vec::with_capacity(self.dags.len());
        for (idx, dag) in self.dags.iter().enumerate() {
            let id = DagId::new(idx);
            entries.push(DagEntry {
                id,
                priority: self.priority_map.get(id)?,
                edges: dag.serialize_edges(),
            });
        }
        Ok(entries)
    }
}

pub struct DagForest<N, E> {
    nodes: SharedNodes<N>,
    dags: ForestDags<N, E>,
}

impl<N: Display, E: Clone + 'static> DagForest<N, E> {
    pub fn new() -> Self {
        Self::with_nodes(Nodes::new())
    }

    /// Rebuilds a forest from its wire form: node insertions replay in
    /// array order (ids come out dense and equal to the original indices),
    /// then every edge replays into a freshly created DAG per entry.
    pub fn from_data(data: DagForestData<N, E>) -> Result<Self, Error> {
        let mut forest = Self::new();
        for node in data.nodes {
            forest.add_node(node);
        }
        for entry in data.dags {
            let id = forest.dags.new_dag(entry.priority)?;
            for (from, children) in entry.edges {
                for (to, value) in children {
                    forest.add_edge(id, from, to, value)?;
                }
            }
        }
        Ok(forest)
    }
}

impl<N: Display, E: Clone + 'static> Default for DagForest<N, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N, E: Clone + 'static> DagForest<N, E> {
    /// Builds on an explicit registry, e.g. one with a custom key function.
    pub fn with_nodes(nodes: Nodes<N>) -> Self {
        let nodes = nodes.into_shared();
        Self {
            dags: ForestDags::new(Rc::clone(&nodes)),
            nodes,
        }
    }

    pub fn nodes(&self) -> Ref<'_, Nodes<N>> {
        self.nodes.borrow()
    }

    /// Adds to the shared registry without touching any DAG's membership;
    /// route through `Dag::add_node` when membership matters.
    pub fn add_node(&mut self, value: N) -> NodeId {
        self.nodes.borrow_mut().add(value)
    }

    pub fn dags(&self) -> &ForestDags<N, E> {
        &self.dags
    }

    pub fn dags_mut(&mut self) -> &mut ForestDags<N, E> {
        &mut self.dags
    }

    pub fn new_dag(&mut self, priority: i64) -> Result<DagId, Error> {
        self.dags.new_dag(priority)
    }

    pub fn add_edge(&mut self, dag_id: DagId, from: NodeId, to: NodeId, value: E) -> Result<(), Error> {
        self.dags.get_mut(dag_id)?.add_edge(from, to, value);
        Ok(())
    }

    /// Resumable search for matcher-defined partial paths: every registry
    /// node in insertion order, every DAG containing it in priority order,
    /// every match the matcher yields. The caller steers with
    /// [`PartialPathOp`] through `next_with`.
    pub fn find_partial_path<'a, 'm>(
        &'a self,
        matcher: PartialPathMatcher<'m, N, E>,
    ) -> PartialPathSearch<'a, 'm, N, E> {
        PartialPathSearch {
            forest: self,
            matcher,
            node_count: self.nodes.borrow().len(),
            next_node: 0,
            current_node: None,
            dag_order: Vec::new(),
            dag_cursor: 0,
            current_dag: None,
            pending: VecDeque::new(),
            done: false,
        }
    }

    /// Waypoint search run independently on every DAG in priority order;
    /// results are tagged with their DAG, never combined across DAGs.
    pub fn find_waypoint_path<'a>(
        &'a self,
        waypoints: &[NodeId],
        options: FindPathOptions<'a, N, E>,
    ) -> Result<ForestWaypointIter<'a, N, E>, Error> {
        if waypoints.is_empty() {
            return Err(Error::EmptyWaypoints);
        }
        Ok(ForestWaypointIter {
            forest: self,
            order: self.dags.priority_map().iter().collect(),
            order_cursor: 0,
            waypoints: waypoints.to_vec(),
            options,
            current: None,
            failed: false,
        })
    }

    /// The controlled candidate stream behind `find_min_cost_per_dag`:
    /// every string match becomes a waypoint search on its DAG, and the
    /// caller's `NextDag` is forwarded into the partial-path protocol.
    pub fn string_search<'a>(
        &'a self,
        query: &str,
        mapper: impl Fn(&N) -> String + 'static,
        cost: CostFn<'a, N, E>,
    ) -> StringSearch<'a, N, E>
    where
        N: 'static,
    {
        let finder = Rc::new(StringFinder::new(mapper));
        let matcher = StringFinder::matcher(finder, query);
        StringSearch {
            forest: self,
            partial: self.find_partial_path(matcher),
            current: None,
            cost: Some(cost),
            failed: false,
        }
    }

    /// Full string-driven forest search: one partial-match exploration per
    /// DAG per registry node, all waypoint expansions funneled through a
    /// bounded dedup queue, returned best-first.
    pub fn find_path_by_string(
        &self,
        query: &str,
        mapper: impl Fn(&N) -> String + 'static,
        result_num: usize,
        cost: CostFn<'_, N, E>,
    ) -> Result<Vec<FindPathCandidate>, Error>
    where
        N: 'static,
    {
        tracing::debug!(target: "canopy::forest", query, result_num, "find_path_by_string");
        let finder = Rc::new(StringFinder::new(mapper));
        let matcher = StringFinder::matcher(finder, query);
        let mut visited = VisitedForestPathQueue::new(self.dags.priority_map(), result_num);
        let mut search = self.find_partial_path(matcher);
        let mut op = PartialPathOp::Next;
        while let Some(result) = search.next_with(op) {
            let partial = result?;
            let dag = self.dags.get(partial.dag_id)?;
            let options = FindPathOptions {
                from: None,
                to: None,
                cost: Some(cost),
                default_cost: 0.0,
            };
            for path in dag.find_waypoint_path(&partial.path, options)? {
                visited.push(partial.dag_id, path?)?;
            }
            op = PartialPathOp::NextDag;
        }
        Ok(visited.pop_all())
    }

    /// Yields every candidate costing at most `min_cost` as soon as it is
    /// found; once the stream is exhausted, the deferred remainder follows
    /// in ascending cost order.
    pub fn find_min_cost_per_dag<'a>(
        &'a self,
        query: &str,
        mapper: impl Fn(&N) -> String + 'static,
        cost: CostFn<'a, N, E>,
        min_cost: f64,
    ) -> MinCostPerDag<'a, N, E>
    where
        N: 'static,
    {
        tracing::debug!(target: "canopy::forest", query, min_cost, "find_min_cost_per_dag");
        MinCostPerDag {
            search: self.string_search(query, mapper, cost),
            min_cost,
            deferred: Vec::new(),
            drain: None,
            first: true,
            failed: false,
        }
    }

    pub fn serialize(&self) -> Result<DagForestData<N, E>, Error>
    where
        N: Clone,
    {
        Ok(DagForestData {
            nodes: self.nodes.borrow().to_vec(),
            dags: self.dags.serialize()?,
        })
    }
}

pub struct PartialPathSearch<'a, 'm, N, E> {
    forest: &'a DagForest<N, E>,
    matcher: PartialPathMatcher<'m, N, E>,
    /// Registry size at search start; later insertions are out of scope.
    node_count: usize,
    next_node: usize,
    current_node: Option<NodeId>,
    dag_order: Vec<DagId>,
    dag_cursor: usize,
    current_dag: Option<DagId>,
    /// Matcher results for the current `(node, dag)` pair, drained one per
    /// step. `NextDag` throws the remainder away.
    pending: VecDeque<Vec<NodeId>>,
    done: bool,
}

impl<N, E: Clone + 'static> PartialPathSearch<'_, '_, N, E> {
    pub fn next_with(&mut self, op: PartialPathOp) -> Option<Result<PartialPath, Error>> {
        if self.done {
            return None;
        }
        if op == PartialPathOp::NextDag {
            self.pending.clear();
        }
        loop {
            if let Some(path) = self.pending.pop_front() {
                if let Some(dag_id) = self.current_dag {
                    return Some(Ok(PartialPath { path, dag_id }));
                }
            }
            if self.dag_cursor < self.dag_order.len() {
                let dag_id = self.dag_order[self.dag_cursor];
                self.dag_cursor += 1;
                let node = self.current_node?;
                let dag = match self.forest.dags.get(dag_id) {
                    Ok(dag) => dag,
                    Err(err) => {
                        self.done = true;
                        return Some(Err(err));
                    }
                };
                match (self.matcher)(node, dag) {
                    Ok(paths) => {
                        self.current_dag = Some(dag_id);
                        self.pending.extend(paths);
                        continue;
                    }
                    Err(err) => {
                        self.done = true;
                        return Some(Err(err));
                    }
                }
            }
            if self.next_node >= self.node_count {
                self.done = true;
                return None;
            }
            let node = NodeId::new(self.next_node);
            self.next_node += 1;
            self.current_node = Some(node);
            self.dag_order = self.forest.dags.list_by_node(node);
            self.dag_cursor = 0;
        }
    }
}

impl<N, E: Clone + 'static> Iterator for PartialPathSearch<'_, '_, N, E> {
    type Item = Result<PartialPath, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_with(PartialPathOp::Next)
    }
}

pub struct ForestWaypointIter<'a, N, E> {
    forest: &'a DagForest<N, E>,
    order: Vec<PrioritizedDag>,
    order_cursor: usize,
    waypoints: Vec<NodeId>,
    options: FindPathOptions<'a, N, E>,
    current: Option<(WaypointPathIter<'a, N, E>, DagId, i64)>,
    failed: bool,
}

impl<N, E: Clone + 'static> Iterator for ForestWaypointIter<'_, N, E> {
    type Item = Result<ForestWaypointPath, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            if let Some((mut iter, dag_id, priority)) = self.current.take() {
                match iter.next() {
                    Some(Ok(path)) => {
                        self.current = Some((iter, dag_id, priority));
                        return Some(Ok(ForestWaypointPath {
                            path,
                            dag_id,
                            priority,
                        }));
                    }
                    Some(Err(err)) => {
                        self.failed = true;
                        return Some(Err(err));
                    }
                    None => {}
                }
            }
            if self.order_cursor >= self.order.len() {
                return None;
            }
            let next = self.order[self.order_cursor];
            self.order_cursor += 1;
            let dag = match self.forest.dags.get(next.dag_id) {
                Ok(dag) => dag,
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err));
                }
            };
            match dag.find_waypoint_path(&self.waypoints, self.options) {
                Ok(iter) => self.current = Some((iter, next.dag_id, next.priority)),
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

pub struct StringSearch<'a, N, E> {
    forest: &'a DagForest<N, E>,
    partial: PartialPathSearch<'a, 'static, N, E>,
    current: Option<(WaypointPathIter<'a, N, E>, DagId)>,
    cost: Option<CostFn<'a, N, E>>,
    failed: bool,
}

impl<N, E: Clone + 'static> StringSearch<'_, N, E> {
    pub fn next_with(&mut self, op: PartialPathOp) -> Option<Result<FindPathCandidate, Error>> {
        if self.failed {
            return None;
        }
        if op == PartialPathOp::NextDag {
            self.current = None;
        }
        let mut forward = op;
        loop {
            if let Some((mut iter, dag_id)) = self.current.take() {
                match iter.next() {
                    Some(Ok(path)) => {
                        self.current = Some((iter, dag_id));
                        return Some(Ok(FindPathCandidate { dag_id, path }));
                    }
                    Some(Err(err)) => {
                        self.failed = true;
                        return Some(Err(err));
                    }
                    None => {}
                }
            }
            let partial = match self.partial.next_with(forward) {
                Some(Ok(partial)) => partial,
                Some(Err(err)) => {
                    self.failed = true;
                    return Some(Err(err));
                }
                None => return None,
            };
            forward = PartialPathOp::Next;
            let dag = match self.forest.dags.get(partial.dag_id) {
                Ok(dag) => dag,
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err));
                }
            };
            let options = FindPathOptions {
                from: None,
                to: None,
                cost: self.cost,
                default_cost: 0.0,
            };
            match dag.find_waypoint_path(&partial.path, options) {
                Ok(iter) => self.current = Some((iter, partial.dag_id)),
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

impl<N, E: Clone + 'static> Iterator for StringSearch<'_, N, E> {
    type Item = Result<FindPathCandidate, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_with(PartialPathOp::Next)
    }
}

pub struct MinCostPerDag<'a, N, E> {
    search: StringSearch<'a, N, E>,
    min_cost: f64,
    deferred: Vec<FindPathCandidate>,
    drain: Option<std::vec::IntoIter<FindPathCandidate>>,
    first: bool,
    failed: bool,
}

impl<N, E: Clone + 'static> Iterator for MinCostPerDag<'_, N, E> {
    type Item = Result<FindPathCandidate, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        if let Some(drain) = &mut self.drain {
            return drain.next().map(Ok);
        }
        loop {
            let op = if self.first {
                PartialPathOp::Next
            } else {
                PartialPathOp::NextDag
            };
            self.first = false;
            match self.search.next_with(op) {
                Some(Ok(candidate)) => {
                    if candidate.path.cost <= self.min_cost {
                        return Some(Ok(candidate));
                    }
                    self.deferred.push(candidate);
                }
                Some(Err(err)) => {
                    self.failed = true;
                    return Some(Err(err));
                }
                None => {
                    let mut deferred = std::mem::take(&mut self.deferred);
                    // Stable sort: insertion order survives within a cost.
                    deferred.sort_by(|a, b| a.path.cost.total_cmp(&b.path.cost));
                    let mut drain = deferred.into_iter();
                    let next = drain.next().map(Ok);
                    self.drain = Some(drain);
                    return next;
                }
            }
        }
    }
}
