//! Vector primitives for the reached index.
//!
//! - [`lanes`]: 16-lane `u8`/`u16` vectors over the native instruction set of
//!   the build target.
//! - [`AlignedAllocator`] and [`AlignedVec`]: storage whose buffers start on a
//!   vector-register boundary.

mod aligned_alloc;
pub mod lanes;

pub use aligned_alloc::{
    AlignedAllocator, AlignedVec, AllocationError, SIMD_ALIGNMENT, aligned_vec_from_elem,
};
pub use lanes::{FixedWidthVector, LANES, LaneValue, U8x16, U16x16};
