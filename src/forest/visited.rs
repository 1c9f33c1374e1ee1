//! visited.rs
//! Bounded, deduplicating top-K queue for forest search candidates. The
//! internal heap is worst-first (highest cost at the top, lower DAG priority
//! losing cost ties) so capping the size evicts exactly the single worst
//! entry; draining reverses into best-first order.

use crate::collections::{trace_hook, PriorityQueue};
use crate::error::Error;
use crate::forest::priority::DagPriorityMap;
use crate::graph::Path;
use crate::store::{DagId, NodeId};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub struct FindPathCandidate {
    pub dag_id: DagId,
    pub path: Path,
}

#[derive(Debug, Clone)]
struct RankedCandidate {
    candidate: FindPathCandidate,
    priority: i64,
}

pub struct VisitedForestPathQueue<'p> {
    priority_map: &'p DagPriorityMap,
    queue: PriorityQueue<RankedCandidate>,
    /// Content-addressed dedup on the exact node sequence per DAG.
    seen: HashSet<(DagId, Vec<NodeId>)>,
    max_size: usize,
}

impl<'p> VisitedForestPathQueue<'p> {
    pub fn new(priority_map: &'p DagPriorityMap, max_size: usize) -> Self {
        let cmp = Rc::new(|a: &RankedCandidate, b: &RankedCandidate| -> Ordering {
            // Higher cost pops first; on a cost tie the lower-priority DAG
            // pops first, so the better entries stay in the queue.
            match b.candidate.path.cost.total_cmp(&a.candidate.path.cost) {
                Ordering::Equal => a.priority.cmp(&b.priority),
                other => other,
            }
        });
        Self {
            priority_map,
            queue: PriorityQueue::with_comparator(cmp).with_hook(trace_hook("path_queue")),
            seen: HashSet::new(),
            max_size,
        }
    }

    /// Pushing an already-seen `(dag, path)` pair is a no-op. When the queue
    /// grows past its capacity, the single worst entry is evicted.
    pub fn push(&mut self, dag_id: DagId, path: Path) -> Result<(), Error> {
        let key = (dag_id, path.nodes.clone());
        if self.seen.contains(&key) {
            return Ok(());
        }
        let priority = self.priority_map.get(dag_id)?;
        self.seen.insert(key);
        self.queue.push(RankedCandidate {
            candidate: FindPathCandidate { dag_id, path },
            priority,
        });
        if self.queue.len() > self.max_size {
            let _ = self.queue.safe_pop();
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drains best-first: ascending cost, higher DAG priority on ties.
    pub fn pop_all(&mut self) -> Vec<FindPathCandidate> {
        let mut worst_first = self.queue.pop_all();
        worst_first.reverse();
        worst_first.into_iter().map(|r| r.candidate).collect()
    }
}
