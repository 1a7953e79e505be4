use std::{
    alloc::{AllocError, Allocator, Layout},
    collections::TryReserveError,
    ptr::{self, NonNull},
};

use thiserror::Error;

/// Alignment of a 128-bit vector register, and the smallest alignment handed out here.
pub const SIMD_ALIGNMENT: usize = 16;

/// A `Vec` whose buffer always starts on an `ALIGN`-byte boundary.
pub type AlignedVec<T, const ALIGN: usize = SIMD_ALIGNMENT> = Vec<T, AlignedAllocator<ALIGN>>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    #[error("{count} elements of {element_size} bytes do not fit in the address space")]
    Overflow { count: usize, element_size: usize },

    #[error("aligned allocation of {bytes} bytes (alignment {align}) failed")]
    OutOfMemory { bytes: usize, align: usize },

    #[error("could not reserve {count} aligned elements")]
    Reserve {
        count: usize,
        #[source]
        source: TryReserveError,
    },
}

/// A stateless allocator whose blocks start on an `ALIGN`-byte boundary.
///
/// Fixed-width vector loads and stores want their operands on a register-sized
/// boundary, which the global allocator only promises up to the natural alignment
/// of the element type. Every block handed out here is aligned to
/// `max(ALIGN, layout.align())`, and its size is rounded up to a multiple of that
/// alignment.
///
/// `ALIGN` must be a power of two and at least [`SIMD_ALIGNMENT`]; this is
/// checked at compile time when the allocator is used.
///
/// # Examples
///
/// ```
/// #![feature(allocator_api)]
/// use tripreach::numerics::AlignedAllocator;
///
/// let mut v: Vec<u8, AlignedAllocator<64>> = Vec::new_in(AlignedAllocator);
/// v.extend_from_slice(&[1, 2, 3]);
/// assert_eq!(v.as_ptr() as usize % 64, 0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AlignedAllocator<const ALIGN: usize = SIMD_ALIGNMENT>;

impl<const ALIGN: usize> AlignedAllocator<ALIGN> {
    const VALID_ALIGNMENT: () = assert!(
        ALIGN.is_power_of_two() && ALIGN >= SIMD_ALIGNMENT,
        "AlignedAllocator needs a power-of-two alignment of at least 16 bytes"
    );

    pub const fn new() -> Self {
        let () = Self::VALID_ALIGNMENT;
        AlignedAllocator
    }

    /// Alignment actually used for a buffer of `T`.
    pub const fn alignment_for<T>() -> usize {
        let () = Self::VALID_ALIGNMENT;
        if align_of::<T>() > ALIGN {
            align_of::<T>()
        } else {
            ALIGN
        }
    }

    /// Allocates an uninitialized buffer for `count` elements of `T`.
    ///
    /// An empty request (`count == 0` or a zero-sized `T`) returns a dangling,
    /// well-aligned pointer and touches no memory.
    ///
    /// # Errors
    ///
    /// - [`AllocationError::Overflow`] if `count * size_of::<T>()`, rounded up to
    ///   the alignment, is not representable.
    /// - [`AllocationError::OutOfMemory`] if the global allocator fails.
    pub fn allocate_array<T>(&self, count: usize) -> Result<NonNull<T>, AllocationError> {
        let align = Self::alignment_for::<T>();
        let element_size = size_of::<T>();
        if count == 0 || element_size == 0 {
            return Ok(dangling(align));
        }

        let overflow = AllocationError::Overflow {
            count,
            element_size,
        };
        let layout = Layout::array::<T>(count).map_err(|_| overflow.clone())?;
        let padded = padded_layout(layout, align).ok_or(overflow)?;

        // SAFETY: `padded` has a non-zero size.
        let raw = unsafe { std::alloc::alloc(padded) };
        NonNull::new(raw.cast::<T>()).ok_or(AllocationError::OutOfMemory {
            bytes: padded.size(),
            align: padded.align(),
        })
    }

    /// Releases a buffer obtained from [`allocate_array`](Self::allocate_array).
    ///
    /// # Safety
    ///
    /// `ptr` must come from `allocate_array::<T>(count)` on an allocator with the
    /// same `ALIGN`, with the same `count`, and must not have been released yet.
    pub unsafe fn deallocate_array<T>(&self, ptr: NonNull<T>, count: usize) {
        let align = Self::alignment_for::<T>();
        let element_size = size_of::<T>();
        if count == 0 || element_size == 0 {
            return;
        }

        // the allocation succeeded with these numbers, so none of this overflows.
        let size = (count * element_size).next_multiple_of(align);
        // SAFETY: same layout as the one `allocate_array` validated and used.
        unsafe {
            let layout = Layout::from_size_align_unchecked(size, align);
            std::alloc::dealloc(ptr.as_ptr().cast::<u8>(), layout);
        }
    }
}

unsafe impl<const ALIGN: usize> Allocator for AlignedAllocator<ALIGN> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        let () = Self::VALID_ALIGNMENT;
        let padded = padded_layout(layout, ALIGN.max(layout.align())).ok_or(AllocError)?;
        if padded.size() == 0 {
            return Ok(NonNull::slice_from_raw_parts(dangling(padded.align()), 0));
        }

        // SAFETY: `padded` has a non-zero size.
        let raw = unsafe { std::alloc::alloc(padded) };
        let start = NonNull::new(raw).ok_or(AllocError)?;
        Ok(NonNull::slice_from_raw_parts(start, padded.size()))
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        if let Some(padded) = padded_layout(layout, ALIGN.max(layout.align()))
            && padded.size() != 0
        {
            // SAFETY: `allocate` derived the very same padded layout for this block.
            unsafe { std::alloc::dealloc(ptr.as_ptr(), padded) }
        }
    }
}

/// Builds an aligned vector of `count` clones of `value`.
///
/// Reservation failures are reported instead of aborting the process.
pub fn aligned_vec_from_elem<T: Clone, const ALIGN: usize>(
    value: T,
    count: usize,
) -> Result<AlignedVec<T, ALIGN>, AllocationError> {
    let mut v = reserve_exact::<T, ALIGN>(count)?;
    v.resize(count, value);
    Ok(v)
}

fn reserve_exact<T, const ALIGN: usize>(
    count: usize,
) -> Result<AlignedVec<T, ALIGN>, AllocationError> {
    let mut v = Vec::new_in(AlignedAllocator::<ALIGN>::new());
    v.try_reserve_exact(count)
        .map_err(|source| AllocationError::Reserve { count, source })?;
    Ok(v)
}

/// Raises `layout` to `align` and rounds its size up to a multiple of it.
///
/// Some aligned-allocation primitives only accept sizes that are multiples of the
/// alignment, so every block is padded the same way on allocation and release.
fn padded_layout(layout: Layout, align: usize) -> Option<Layout> {
    let size = layout.size().checked_next_multiple_of(align)?;
    Layout::from_size_align(size, align).ok()
}

fn dangling<T>(align: usize) -> NonNull<T> {
    // SAFETY: `align` is a power of two, hence non-zero.
    unsafe { NonNull::new_unchecked(ptr::without_provenance_mut(align)) }
}
