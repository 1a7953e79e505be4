//! NEON backend. `U16x16` is emulated with two 128-bit registers.
#![allow(unused_unsafe)]

use std::arch::aarch64::*;

use super::{FixedWidthVector, LANES, U8x16, U16x16};

pub const BACKEND_NAME: &str = "neon";

pub(super) type Reg8 = uint8x16_t;
pub(super) type Reg16 = [uint16x8_t; 2];

macro_rules! halves {
    ($op:ident, $a:expr, $b:expr) => {{
        let (a, b) = ($a, $b);
        // SAFETY: NEON is mandatory on aarch64.
        unsafe { [$op(a[0], b[0]), $op(a[1], b[1])] }
    }};
}

impl FixedWidthVector for U8x16 {
    type Lane = u8;

    #[inline(always)]
    fn splat(value: u8) -> Self {
        U8x16(unsafe { vdupq_n_u8(value) })
    }

    #[inline(always)]
    fn load(src: &[u8; LANES]) -> Self {
        // SAFETY: `src` is 16 readable bytes; `vld1q` has no alignment requirement.
        U8x16(unsafe { vld1q_u8(src.as_ptr()) })
    }

    #[inline(always)]
    fn store(self, dst: &mut [u8; LANES]) {
        // SAFETY: `dst` is 16 writable bytes.
        unsafe { vst1q_u8(dst.as_mut_ptr(), self.0) }
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
        U8x16(unsafe { vaddq_u8(self.0, other.0) })
    }

    #[inline(always)]
    fn wrapping_sub(self, other: Self) -> Self {
        U8x16(unsafe { vsubq_u8(self.0, other.0) })
    }

    #[inline(always)]
    fn bit_and(self, other: Self) -> Self {
        U8x16(unsafe { vandq_u8(self.0, other.0) })
    }

    #[inline(always)]
    fn bit_or(self, other: Self) -> Self {
        U8x16(unsafe { vorrq_u8(self.0, other.0) })
    }

    #[inline(always)]
    fn bit_xor(self, other: Self) -> Self {
        U8x16(unsafe { veorq_u8(self.0, other.0) })
    }

    // vshlq shifts left for positive counts and right for negative ones.
    #[inline(always)]
    fn shift_left(self, bits: u32) -> Self {
        if bits >= u8::BITS {
            return Self::splat(0);
        }
        U8x16(unsafe { vshlq_u8(self.0, vdupq_n_s8(bits as i8)) })
    }

    #[inline(always)]
    fn shift_right(self, bits: u32) -> Self {
        if bits >= u8::BITS {
            return Self::splat(0);
        }
        U8x16(unsafe { vshlq_u8(self.0, vdupq_n_s8(-(bits as i8))) })
    }

    #[inline(always)]
    fn lanes_eq(self, other: Self) -> Self {
        U8x16(unsafe { vceqq_u8(self.0, other.0) })
    }

    #[inline(always)]
    fn max_in_place(&mut self, other: Self) -> Self {
        let max = unsafe { vmaxq_u8(self.0, other.0) };
        let unchanged = unsafe { vceqq_u8(max, self.0) };
        self.0 = max;
        U8x16(unchanged)
    }

    #[inline(always)]
    fn min_in_place(&mut self, other: Self) -> Self {
        let min = unsafe { vminq_u8(self.0, other.0) };
        let unchanged = unsafe { vceqq_u8(min, self.0) };
        self.0 = min;
        U8x16(unchanged)
    }

    #[inline(always)]
    fn blend(&mut self, other: Self, mask: Self) {
        // vbslq takes the first operand where a mask bit is set.
        self.0 = unsafe { vbslq_u8(mask.0, self.0, other.0) };
    }
}

impl FixedWidthVector for U16x16 {
    type Lane = u16;

    #[inline(always)]
    fn splat(value: u16) -> Self {
        let half = unsafe { vdupq_n_u16(value) };
        U16x16([half, half])
    }

    #[inline(always)]
    fn load(src: &[u16; LANES]) -> Self {
        let ptr = src.as_ptr();
        // SAFETY: `src` is 16 readable lanes, read as two halves of 8.
        unsafe { U16x16([vld1q_u16(ptr), vld1q_u16(ptr.add(8))]) }
    }

    #[inline(always)]
    fn store(self, dst: &mut [u16; LANES]) {
        let ptr = dst.as_mut_ptr();
        // SAFETY: `dst` is 16 writable lanes.
        unsafe {
            vst1q_u16(ptr, self.0[0]);
            vst1q_u16(ptr.add(8), self.0[1]);
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
        U16x16(halves!(vaddq_u16, self.0, other.0))
    }

    #[inline(always)]
    fn wrapping_sub(self, other: Self) -> Self {
        U16x16(halves!(vsubq_u16, self.0, other.0))
    }

    #[inline(always)]
    fn bit_and(self, other: Self) -> Self {
        U16x16(halves!(vandq_u16, self.0, other.0))
    }

    #[inline(always)]
    fn bit_or(self, other: Self) -> Self {
        U16x16(halves!(vorrq_u16, self.0, other.0))
    }

    #[inline(always)]
    fn bit_xor(self, other: Self) -> Self {
        U16x16(halves!(veorq_u16, self.0, other.0))
    }

    #[inline(always)]
    fn shift_left(self, bits: u32) -> Self {
        if bits >= u16::BITS {
            return Self::splat(0);
        }
        let shift = unsafe { vdupq_n_s16(bits as i16) };
        U16x16(halves!(vshlq_u16, self.0, [shift, shift]))
    }

    #[inline(always)]
    fn shift_right(self, bits: u32) -> Self {
        if bits >= u16::BITS {
            return Self::splat(0);
        }
        let shift = unsafe { vdupq_n_s16(-(bits as i16)) };
        U16x16(halves!(vshlq_u16, self.0, [shift, shift]))
    }

    #[inline(always)]
    fn lanes_eq(self, other: Self) -> Self {
        U16x16(halves!(vceqq_u16, self.0, other.0))
    }

    #[inline(always)]
    fn max_in_place(&mut self, other: Self) -> Self {
        let max = halves!(vmaxq_u16, self.0, other.0);
        let unchanged = halves!(vceqq_u16, max, self.0);
        self.0 = max;
        U16x16(unchanged)
    }

    #[inline(always)]
    fn min_in_place(&mut self, other: Self) -> Self {
        let min = halves!(vminq_u16, self.0, other.0);
        let unchanged = halves!(vceqq_u16, min, self.0);
        self.0 = min;
        U16x16(unchanged)
    }

    #[inline(always)]
    fn blend(&mut self, other: Self, mask: Self) {
        // SAFETY: NEON is mandatory on aarch64.
        self.0 = unsafe {
            [
                vbslq_u16(mask.0[0], self.0[0], other.0[0]),
                vbslq_u16(mask.0[1], self.0[1], other.0[1]),
            ]
        };
    }
}
