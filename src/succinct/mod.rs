//! Succinct data structures backing the compact edge encoding.
pub mod bitvec;

pub use bitvec::SuccinctBitVector;
