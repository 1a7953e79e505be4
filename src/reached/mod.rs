//! Per-trip, per-round reachability labels for trip-based profile queries.
//!
//! [`ReachedIndex`] answers "was position `p` of trip `t` already reached within
//! `k` rounds?" and records new reachability, propagating it to later rounds and
//! to later trips of the same route with a single vector minimum per trip.
//!
//! Trip and round arguments are caller contracts. They are checked with a
//! fail-fast assertion in every build unless the `unchecked-preconditions`
//! feature is enabled, in which case only debug builds check them.

/// Asserts a caller contract of the index.
macro_rules! precondition {
    ($cond:expr, $($arg:tt)+) => {
        #[cfg(not(feature = "unchecked-preconditions"))]
        assert!($cond, $($arg)+);
        #[cfg(feature = "unchecked-preconditions")]
        debug_assert!($cond, $($arg)+);
    };
}

mod error;
mod profile_index;

pub use error::*;
pub use profile_index::*;

use crate::numerics::{U8x16, U16x16};

/// Highest round a label can track. Lane `r - 1` holds round `r`.
pub const MAX_ROUNDS: u8 = 15;

/// Reached index with one byte per round; trips may have up to 255 stops.
pub type ReachedIndex<'a, S> = ProfileReachedIndex<'a, S, U8x16>;

/// Reached index with 16-bit positions, for schedules with longer trips.
pub type WideReachedIndex<'a, S> = ProfileReachedIndex<'a, S, U16x16>;
