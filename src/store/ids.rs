//! ids.rs
//! Opaque integer-backed identifiers. `NodeId` and `DagId` live in distinct
//! numeric spaces and expose no arithmetic; registries assign them densely
//! starting at 0 and never reuse them.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct NodeId(u32);

impl NodeId {
    pub fn new(idx: usize) -> Self {
        Self(idx as u32)
    }

    #[inline(always)]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct DagId(u32);

impl DagId {
    pub fn new(idx: usize) -> Self {
        Self(idx as u32)
    }

    #[inline(always)]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
