//! Fixed-width vectors of 16 unsigned lanes.
//!
//! [`U8x16`] and [`U16x16`] share the [`FixedWidthVector`] interface. Exactly one
//! backend implements it per build:
//!
//! - `sse2` on x86-64 (and 32-bit x86 with SSE2 enabled),
//! - `neon` on aarch64,
//! - `portable` (`std::simd`) everywhere else, or everywhere when the
//!   `portable-simd` feature is on.
//!
//! The choice is made by `cfg` at build time; nothing is detected at run time.

use std::{
    fmt::Debug,
    ops::{Add, BitAnd, BitOr, BitXor, Index, IndexMut, Shl, Shr, Sub},
};

#[cfg(all(
    not(feature = "portable-simd"),
    any(
        target_arch = "x86_64",
        all(target_arch = "x86", target_feature = "sse2")
    )
))]
#[path = "sse2.rs"]
mod backend;

#[cfg(all(not(feature = "portable-simd"), target_arch = "aarch64"))]
#[path = "neon.rs"]
mod backend;

#[cfg(any(
    feature = "portable-simd",
    not(any(
        target_arch = "x86_64",
        all(target_arch = "x86", target_feature = "sse2"),
        target_arch = "aarch64"
    ))
))]
#[path = "portable.rs"]
mod backend;

pub use backend::BACKEND_NAME;

/// Number of lanes in every vector of this module.
pub const LANES: usize = 16;

/// Unsigned integer type stored in a lane.
pub trait LaneValue: Copy + Ord + Debug + Default + Send + Sync + 'static {
    const ZERO: Self;
    /// All bits set; also the canonical "true" lane of a mask.
    const MAX: Self;
    const BITS: u32;

    /// Converts a count, or `None` if it does not fit the lane.
    fn from_count(count: usize) -> Option<Self>;

    fn to_count(self) -> usize;
}

impl LaneValue for u8 {
    const ZERO: Self = 0;
    const MAX: Self = u8::MAX;
    const BITS: u32 = u8::BITS;

    #[inline]
    fn from_count(count: usize) -> Option<Self> {
        u8::try_from(count).ok()
    }

    #[inline]
    fn to_count(self) -> usize {
        self as usize
    }
}

impl LaneValue for u16 {
    const ZERO: Self = 0;
    const MAX: Self = u16::MAX;
    const BITS: u32 = u16::BITS;

    #[inline]
    fn from_count(count: usize) -> Option<Self> {
        u16::try_from(count).ok()
    }

    #[inline]
    fn to_count(self) -> usize {
        self as usize
    }
}

/// 16 independent unsigned lanes, processed together.
///
/// All arithmetic wraps at the lane width. Masks returned by comparisons are
/// canonical: every bit of a lane is set (true) or clear (false).
///
/// The operators `+ - & | ^ << >>` are the lane-wise operations below.
///
/// # Examples
///
/// ```
/// use tripreach::numerics::{FixedWidthVector, U8x16};
///
/// let mut v = U8x16::from_array([5; 16]);
/// v[3] = 1;
/// let unchanged = v.min_in_place(U8x16::splat(4));
/// assert_eq!(v[0], 4);
/// assert_eq!(v[3], 1);
/// assert_eq!(unchanged[0], 0);
/// assert_eq!(unchanged[3], u8::MAX);
/// ```
pub trait FixedWidthVector:
    Copy
    + Debug
    + PartialEq
    + Eq
    + Default
    + Send
    + Sync
    + Add<Output = Self>
    + Sub<Output = Self>
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + BitXor<Output = Self>
    + Shl<u32, Output = Self>
    + Shr<u32, Output = Self>
    + Index<usize, Output = Self::Lane>
    + IndexMut<usize>
{
    type Lane: LaneValue;

    /// Every lane set to `value`.
    fn splat(value: Self::Lane) -> Self;

    fn fill(&mut self, value: Self::Lane) {
        *self = Self::splat(value);
    }

    fn load(src: &[Self::Lane; LANES]) -> Self;

    fn store(self, dst: &mut [Self::Lane; LANES]);

    fn from_array(lanes: [Self::Lane; LANES]) -> Self {
        Self::load(&lanes)
    }

    /// Lane view of the register. Same storage, no copy.
    fn as_array(&self) -> &[Self::Lane; LANES];

    fn as_mut_array(&mut self) -> &mut [Self::Lane; LANES];

    fn to_array(self) -> [Self::Lane; LANES] {
        *self.as_array()
    }

    fn wrapping_add(self, other: Self) -> Self;

    fn wrapping_sub(self, other: Self) -> Self;

    fn bit_and(self, other: Self) -> Self;

    fn bit_or(self, other: Self) -> Self;

    fn bit_xor(self, other: Self) -> Self;

    /// Logical shift of every lane by the same amount. Shifting by the lane
    /// width or more gives zero.
    fn shift_left(self, bits: u32) -> Self;

    /// See [`shift_left`](Self::shift_left).
    fn shift_right(self, bits: u32) -> Self;

    /// All-ones where the lanes are equal, zero elsewhere.
    fn lanes_eq(self, other: Self) -> Self;

    /// Replaces `self` with the lane-wise maximum.
    ///
    /// Returns all-ones in the lanes that did not change, i.e. where the old value
    /// was already the maximum.
    fn max_in_place(&mut self, other: Self) -> Self;

    /// Replaces `self` with the lane-wise minimum.
    ///
    /// Returns all-ones in the lanes that did not change, i.e. where the old value
    /// was already the minimum.
    fn min_in_place(&mut self, other: Self) -> Self;

    /// Bitwise select: keeps the bits of `self` where `mask` is set, takes the bits
    /// of `other` where it is clear. With a canonical mask this selects whole lanes.
    fn blend(&mut self, other: Self, mask: Self);
}

/// 16 lanes of `u8` in one 128-bit register.
#[derive(Clone, Copy)]
#[repr(transparent)]
pub struct U8x16(backend::Reg8);

/// 16 lanes of `u16` in 256 bits (one register, or a pair of 128-bit halves).
#[derive(Clone, Copy)]
#[repr(transparent)]
pub struct U16x16(backend::Reg16);

const _: () = {
    assert!(size_of::<U8x16>() == LANES);
    assert!(align_of::<U8x16>() >= 16);
    assert!(size_of::<U16x16>() == 2 * LANES);
    assert!(align_of::<U16x16>() >= 16);
};

macro_rules! lane_vector_common {
    ($vector:ty, $lane:ty) => {
        impl $vector {
            /// Lane view of the register.
            #[inline(always)]
            pub(crate) fn lanes(&self) -> &[$lane; LANES] {
                // SAFETY: the register is `LANES` plain integers of this width with no
                // padding (checked above); every bit pattern is a valid `$lane`, and the
                // register alignment exceeds the lane alignment.
                unsafe { &*(self as *const Self).cast::<[$lane; LANES]>() }
            }

            #[inline(always)]
            pub(crate) fn lanes_mut(&mut self) -> &mut [$lane; LANES] {
                // SAFETY: see `lanes`.
                unsafe { &mut *(self as *mut Self).cast::<[$lane; LANES]>() }
            }
        }

        impl Default for $vector {
            fn default() -> Self {
                <$vector as FixedWidthVector>::splat(0)
            }
        }

        impl PartialEq for $vector {
            fn eq(&self, other: &Self) -> bool {
                self.lanes() == other.lanes()
            }
        }

        impl Eq for $vector {}

        impl Debug for $vector {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_tuple(stringify!($vector))
                    .field(self.lanes())
                    .finish()
            }
        }

        impl Index<usize> for $vector {
            type Output = $lane;

            #[inline(always)]
            fn index(&self, lane: usize) -> &$lane {
                &self.lanes()[lane]
            }
        }

        impl IndexMut<usize> for $vector {
            #[inline(always)]
            fn index_mut(&mut self, lane: usize) -> &mut $lane {
                &mut self.lanes_mut()[lane]
            }
        }

        impl Add for $vector {
            type Output = Self;

            #[inline(always)]
            fn add(self, rhs: Self) -> Self {
                self.wrapping_add(rhs)
            }
        }

        impl Sub for $vector {
            type Output = Self;

            #[inline(always)]
            fn sub(self, rhs: Self) -> Self {
                self.wrapping_sub(rhs)
            }
        }

        impl BitAnd for $vector {
            type Output = Self;

            #[inline(always)]
            fn bitand(self, rhs: Self) -> Self {
                self.bit_and(rhs)
            }
        }

        impl BitOr for $vector {
            type Output = Self;

            #[inline(always)]
            fn bitor(self, rhs: Self) -> Self {
                self.bit_or(rhs)
            }
        }

        impl BitXor for $vector {
            type Output = Self;

            #[inline(always)]
            fn bitxor(self, rhs: Self) -> Self {
                self.bit_xor(rhs)
            }
        }

        impl Shl<u32> for $vector {
            type Output = Self;

            #[inline(always)]
            fn shl(self, bits: u32) -> Self {
                self.shift_left(bits)
            }
        }

        impl Shr<u32> for $vector {
            type Output = Self;

            #[inline(always)]
            fn shr(self, bits: u32) -> Self {
                self.shift_right(bits)
            }
        }
    };
}

lane_vector_common!(U8x16, u8);
lane_vector_common!(U16x16, u16);

#[cfg(test)]
mod tests;
