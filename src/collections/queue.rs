//! queue.rs
//! Priority queue over the binary heap, with named ascending/descending
//! construction, draining, and an optional push/pop observer hook used for
//! trace instrumentation.

use super::heap::{Heap, HeapCompare};
use crate::error::Error;
use std::fmt;
use std::rc::Rc;

pub enum QueueEvent<'e, T> {
    /// Item pushed; `size` is the queue size after the push.
    Push { item: &'e T, size: usize },
    /// Item popped; `size` is the queue size after the pop.
    Pop { item: &'e T, size: usize },
}

pub type QueueHook<T> = Rc<dyn Fn(QueueEvent<'_, T>)>;

/// Hook that forwards queue events to `tracing` at trace level.
pub fn trace_hook<T: fmt::Debug>(label: &'static str) -> QueueHook<T> {
    Rc::new(move |event| match event {
        QueueEvent::Push { item, size } => {
            tracing::trace!(target: "canopy::queue", label, ?item, size, "push");
        }
        QueueEvent::Pop { item, size } => {
            tracing::trace!(target: "canopy::queue", label, ?item, size, "pop");
        }
    })
}

pub struct PriorityQueue<T> {
    heap: Heap<T>,
    hook: Option<QueueHook<T>>,
}

impl<T> PriorityQueue<T> {
    /// Ascending order: the smallest key pops first.
    pub fn new_asc(key: impl Fn(&T) -> f64 + 'static) -> Self {
        Self {
            heap: Heap::by_key_asc(key),
            hook: None,
        }
    }

    /// Descending order: the largest key pops first.
    pub fn new_desc(key: impl Fn(&T) -> f64 + 'static) -> Self {
        Self {
            heap: Heap::by_key_desc(key),
            hook: None,
        }
    }

    pub fn with_comparator(cmp: HeapCompare<T>) -> Self {
        Self {
            heap: Heap::new(cmp),
            hook: None,
        }
    }

    pub fn with_hook(mut self, hook: QueueHook<T>) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn push(&mut self, item: T) {
        if let Some(hook) = &self.hook {
            hook(QueueEvent::Push {
                item: &item,
                size: self.heap.len() + 1,
            });
        }
        self.heap.push(item);
    }

    /// Fails with [`Error::EmptyQueue`] when the queue is empty.
    pub fn pop(&mut self) -> Result<T, Error> {
        self.safe_pop().ok_or(Error::EmptyQueue)
    }

    /// Non-failing pop variant.
    pub fn safe_pop(&mut self) -> Option<T> {
        let item = self.heap.pop()?;
        if let Some(hook) = &self.hook {
            hook(QueueEvent::Pop {
                item: &item,
                size: self.heap.len(),
            });
        }
        Some(item)
    }

    pub fn peek(&self) -> Option<&T> {
        self.heap.peek()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drains the queue in priority order. The queue is empty afterwards.
    pub fn pop_all(&mut self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.heap.len());
        while let Some(item) = self.safe_pop() {
            out.push(item);
        }
        out
    }
}

impl<T: Clone> Clone for PriorityQueue<T> {
    fn clone(&self) -> Self {
        Self {
            heap: self.heap.clone(),
            hook: self.hook.clone(),
        }
    }
}
