//! Ordering primitives underneath every search in the crate.
pub mod heap;
pub mod queue;

pub use heap::{Heap, HeapCompare};
pub use queue::{trace_hook, PriorityQueue, QueueEvent, QueueHook};
