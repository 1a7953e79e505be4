//! SSE2 backend. `U16x16` is a pair of 128-bit halves so that nothing beyond the
//! x86-64 baseline is required.
#![allow(unused_unsafe)]

#[cfg(target_arch = "x86")]
use std::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use super::{FixedWidthVector, LANES, U8x16, U16x16};

pub const BACKEND_NAME: &str = "sse2";

pub(super) type Reg8 = __m128i;
pub(super) type Reg16 = [__m128i; 2];

/// Applies a two-operand intrinsic to both halves of a `U16x16`.
macro_rules! halves {
    ($op:ident, $a:expr, $b:expr) => {{
        let (a, b) = ($a, $b);
        // SAFETY: SSE2 is part of the enabled target features.
        unsafe { [$op(a[0], b[0]), $op(a[1], b[1])] }
    }};
}

impl FixedWidthVector for U8x16 {
    type Lane = u8;

    #[inline(always)]
    fn splat(value: u8) -> Self {
        U8x16(unsafe { _mm_set1_epi8(value as i8) })
    }

    #[inline(always)]
    fn load(src: &[u8; LANES]) -> Self {
        // SAFETY: `src` is 16 readable bytes; the unaligned load has no alignment needs.
        U8x16(unsafe { _mm_loadu_si128(src.as_ptr().cast::<__m128i>()) })
    }

    #[inline(always)]
    fn store(self, dst: &mut [u8; LANES]) {
        // SAFETY: `dst` is 16 writable bytes.
        unsafe { _mm_storeu_si128(dst.as_mut_ptr().cast::<__m128i>(), self.0) }
    }

    #[inline(always)]
    fn as_array(&self) -> &[u8; LANES] {
        self.lanes()
    }

    #[inline(always)]
    fn as_mut_array(&mut self) -> &mut [u8; LANES] {
        self.lanes_mut()
    }

    #[inline(always)]
    fn wrapping_add(self, other: Self) -> Self {
        U8x16(unsafe { _mm_add_epi8(self.0, other.0) })
    }

    #[inline(always)]
    fn wrapping_sub(self, other: Self) -> Self {
        U8x16(unsafe { _mm_sub_epi8(self.0, other.0) })
    }

    #[inline(always)]
    fn bit_and(self, other: Self) -> Self {
        U8x16(unsafe { _mm_and_si128(self.0, other.0) })
    }

    #[inline(always)]
    fn bit_or(self, other: Self) -> Self {
        U8x16(unsafe { _mm_or_si128(self.0, other.0) })
    }

    #[inline(always)]
    fn bit_xor(self, other: Self) -> Self {
        U8x16(unsafe { _mm_xor_si128(self.0, other.0) })
    }

    // no byte shifts in SSE2: shift 16-bit words, then drop the bits that crossed
    // into the neighbouring byte.
    #[inline(always)]
    fn shift_left(self, bits: u32) -> Self {
        if bits >= u8::BITS {
            return Self::splat(0);
        }
        let keep = Self::splat(u8::MAX << bits);
        let shifted = U8x16(unsafe { _mm_sll_epi16(self.0, _mm_cvtsi32_si128(bits as i32)) });
        shifted & keep
    }

    #[inline(always)]
    fn shift_right(self, bits: u32) -> Self {
        if bits >= u8::BITS {
            return Self::splat(0);
        }
        let keep = Self::splat(u8::MAX >> bits);
        let shifted = U8x16(unsafe { _mm_srl_epi16(self.0, _mm_cvtsi32_si128(bits as i32)) });
        shifted & keep
    }

    #[inline(always)]
    fn lanes_eq(self, other: Self) -> Self {
        U8x16(unsafe { _mm_cmpeq_epi8(self.0, other.0) })
    }

    #[inline(always)]
    fn max_in_place(&mut self, other: Self) -> Self {
        let max = unsafe { _mm_max_epu8(self.0, other.0) };
        let unchanged = unsafe { _mm_cmpeq_epi8(max, self.0) };
        self.0 = max;
        U8x16(unchanged)
    }

    #[inline(always)]
    fn min_in_place(&mut self, other: Self) -> Self {
        let min = unsafe { _mm_min_epu8(self.0, other.0) };
        let unchanged = unsafe { _mm_cmpeq_epi8(min, self.0) };
        self.0 = min;
        U8x16(unchanged)
    }

    #[inline(always)]
    fn blend(&mut self, other: Self, mask: Self) {
        // andnot(m, o) = !m & o
        self.0 = unsafe {
            _mm_or_si128(
                _mm_and_si128(mask.0, self.0),
                _mm_andnot_si128(mask.0, other.0),
            )
        };
    }
}

impl FixedWidthVector for U16x16 {
    type Lane = u16;

    #[inline(always)]
    fn splat(value: u16) -> Self {
        let half = unsafe { _mm_set1_epi16(value as i16) };
        U16x16([half, half])
    }

    #[inline(always)]
    fn load(src: &[u16; LANES]) -> Self {
        let ptr = src.as_ptr();
        // SAFETY: `src` is 32 readable bytes, read as two unaligned 16-byte halves.
        unsafe {
            U16x16([
                _mm_loadu_si128(ptr.cast::<__m128i>()),
                _mm_loadu_si128(ptr.add(8).cast::<__m128i>()),
            ])
        }
    }

    #[inline(always)]
    fn store(self, dst: &mut [u16; LANES]) {
        let ptr = dst.as_mut_ptr();
        // SAFETY: `dst` is 32 writable bytes.
        unsafe {
            _mm_storeu_si128(ptr.cast::<__m128i>(), self.0[0]);
            _mm_storeu_si128(ptr.add(8).cast::<__m128i>(), self.0[1]);
        }
    }

    #[inline(always)]
    fn as_array(&self) -> &[u16; LANES] {
        self.lanes()
    }

    #[inline(always)]
    fn as_mut_array(&mut self) -> &mut [u16; LANES] {
        self.lanes_mut()
    }

    #[inline(always)]
    fn wrapping_add(self, other: Self) -> Self {
        U16x16(halves!(_mm_add_epi16, self.0, other.0))
    }

    #[inline(always)]
    fn wrapping_sub(self, other: Self) -> Self {
        U16x16(halves!(_mm_sub_epi16, self.0, other.0))
    }

    #[inline(always)]
    fn bit_and(self, other: Self) -> Self {
        U16x16(halves!(_mm_and_si128, self.0, other.0))
    }

    #[inline(always)]
    fn bit_or(self, other: Self) -> Self {
        U16x16(halves!(_mm_or_si128, self.0, other.0))
    }

    #[inline(always)]
    fn bit_xor(self, other: Self) -> Self {
        U16x16(halves!(_mm_xor_si128, self.0, other.0))
    }

    #[inline(always)]
    fn shift_left(self, bits: u32) -> Self {
        if bits >= u16::BITS {
            return Self::splat(0);
        }
        let count = unsafe { _mm_cvtsi32_si128(bits as i32) };
        U16x16(halves!(_mm_sll_epi16, self.0, [count, count]))
    }

    #[inline(always)]
    fn shift_right(self, bits: u32) -> Self {
        if bits >= u16::BITS {
            return Self::splat(0);
        }
        let count = unsafe { _mm_cvtsi32_si128(bits as i32) };
        U16x16(halves!(_mm_srl_epi16, self.0, [count, count]))
    }

    #[inline(always)]
    fn lanes_eq(self, other: Self) -> Self {
        U16x16(halves!(_mm_cmpeq_epi16, self.0, other.0))
    }

    // unsigned 16-bit min/max only arrive with SSE4.1. With the saturating
    // difference d = a -sat b:  max(a, b) = b + d  and  min(a, b) = a - d.
    #[inline(always)]
    fn max_in_place(&mut self, other: Self) -> Self {
        let diff = halves!(_mm_subs_epu16, self.0, other.0);
        let max = halves!(_mm_add_epi16, other.0, diff);
        let unchanged = halves!(_mm_cmpeq_epi16, max, self.0);
        self.0 = max;
        U16x16(unchanged)
    }

    #[inline(always)]
    fn min_in_place(&mut self, other: Self) -> Self {
        let diff = halves!(_mm_subs_epu16, self.0, other.0);
        let min = halves!(_mm_sub_epi16, self.0, diff);
        let unchanged = halves!(_mm_cmpeq_epi16, min, self.0);
        self.0 = min;
        U16x16(unchanged)
    }

    #[inline(always)]
    fn blend(&mut self, other: Self, mask: Self) {
        let kept = halves!(_mm_and_si128, mask.0, self.0);
        let taken = halves!(_mm_andnot_si128, mask.0, other.0);
        self.0 = halves!(_mm_or_si128, kept, taken);
    }
}
