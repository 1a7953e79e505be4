//! Counters collected while driving a reached index.
//!
//! This module provides a mergeable per-worker structure counting profile queries,
//! reachability checks, pruned checks and label updates.

mod stats;
pub use stats::*;
