//! priority.rs
//! Priority bookkeeping for the DAGs of a forest. Registration order breaks
//! priority ties, so iteration is stable.

use crate::collections::PriorityQueue;
use crate::error::Error;
use crate::store::DagId;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrioritizedDag {
    pub dag_id: DagId,
    pub priority: i64,
}

pub(crate) fn new_dag_priority_queue() -> PriorityQueue<PrioritizedDag> {
    PriorityQueue::new_desc(|d: &PrioritizedDag| d.priority as f64)
}

pub struct DagPriorityMap {
    priorities: HashMap<DagId, i64>,
    queue: PriorityQueue<PrioritizedDag>,
}

impl Default for DagPriorityMap {
    fn default() -> Self {
        Self::new()
    }
}

impl DagPriorityMap {
    pub fn new() -> Self {
        Self {
            priorities: HashMap::new(),
            queue: new_dag_priority_queue(),
        }
    }

    /// Registers a DAG's priority. A DAG can be registered once.
    pub fn set(&mut self, id: DagId, priority: i64) -> Result<(), Error> {
        if self.priorities.contains_key(&id) {
            return Err(Error::DagAlreadyExists(id));
        }
        self.priorities.insert(id, priority);
        self.queue.push(PrioritizedDag {
            dag_id: id,
            priority,
        });
        Ok(())
    }

    pub fn get(&self, id: DagId) -> Result<i64, Error> {
        self.priorities
            .get(&id)
            .copied()
            .ok_or(Error::DagNotFound(id))
    }

    pub fn len(&self) -> usize {
        self.priorities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.priorities.is_empty()
    }

    /// Descending priority, registration order within a priority.
    pub fn iter(&self) -> impl Iterator<Item = PrioritizedDag> {
        self.queue.clone().pop_all().into_iter()
    }
}

impl Clone for DagPriorityMap {
    fn clone(&self) -> Self {
        Self {
            priorities: self.priorities.clone(),
            queue: self.queue.clone(),
        }
    }
}
