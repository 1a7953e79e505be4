//! `std::simd` backend, used where no native backend exists or when the
//! `portable-simd` feature asks for it.

use std::simd::{
    Simd,
    cmp::{SimdOrd, SimdPartialEq},
};

use super::{FixedWidthVector, LANES, U8x16, U16x16};

pub const BACKEND_NAME: &str = "portable";

pub(super) type Reg8 = Simd<u8, LANES>;
pub(super) type Reg16 = Simd<u16, LANES>;

macro_rules! portable_vector {
    ($vector:ident, $lane:ty) => {
        impl FixedWidthVector for $vector {
            type Lane = $lane;

            #[inline(always)]
            fn splat(value: $lane) -> Self {
                $vector(Simd::splat(value))
            }

            #[inline(always)]
            fn load(src: &[$lane; LANES]) -> Self {
                $vector(Simd::from_array(*src))
            }

            #[inline(always)]
            fn store(self, dst: &mut [$lane; LANES]) {
                *dst = self.0.to_array();
            }

            #[inline(always)]
            fn as_array(&self) -> &[$lane; LANES] {
                self.0.as_array()
            }

            #[inline(always)]
            fn as_mut_array(&mut self) -> &mut [$lane; LANES] {
                self.0.as_mut_array()
            }

            #[inline(always)]
            fn wrapping_add(self, other: Self) -> Self {
                $vector(self.0 + other.0)
            }

            #[inline(always)]
            fn wrapping_sub(self, other: Self) -> Self {
                $vector(self.0 - other.0)
            }

            #[inline(always)]
            fn bit_and(self, other: Self) -> Self {
                $vector(self.0 & other.0)
            }

            #[inline(always)]
            fn bit_or(self, other: Self) -> Self {
                $vector(self.0 | other.0)
            }

            #[inline(always)]
            fn bit_xor(self, other: Self) -> Self {
                $vector(self.0 ^ other.0)
            }

            // std::simd masks the shift amount; native backends saturate to zero.
            #[inline(always)]
            fn shift_left(self, bits: u32) -> Self {
                if bits >= <$lane>::BITS {
                    return Self::splat(0);
                }
                $vector(self.0 << Simd::splat(bits as $lane))
            }

            #[inline(always)]
            fn shift_right(self, bits: u32) -> Self {
                if bits >= <$lane>::BITS {
                    return Self::splat(0);
                }
                $vector(self.0 >> Simd::splat(bits as $lane))
            }

            #[inline(always)]
            fn lanes_eq(self, other: Self) -> Self {
                $vector(
                    self.0
                        .simd_eq(other.0)
                        .select(Simd::splat(<$lane>::MAX), Simd::splat(0)),
                )
            }

            #[inline(always)]
            fn max_in_place(&mut self, other: Self) -> Self {
                let max = $vector(self.0.simd_max(other.0));
                let unchanged = max.lanes_eq(*self);
                *self = max;
                unchanged
            }

            #[inline(always)]
            fn min_in_place(&mut self, other: Self) -> Self {
                let min = $vector(self.0.simd_min(other.0));
                let unchanged = min.lanes_eq(*self);
                *self = min;
                unchanged
            }

            #[inline(always)]
            fn blend(&mut self, other: Self, mask: Self) {
                self.0 = (mask.0 & self.0) | (!mask.0 & other.0);
            }
        }
    };
}

portable_vector!(U8x16, u8);
portable_vector!(U16x16, u16);
