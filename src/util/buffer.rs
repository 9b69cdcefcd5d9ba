//! Aligned buffers for O_DIRECT transfers
//!
//! Direct IO bypasses the page cache, so the kernel DMAs straight into user
//! memory. That memory must start on a boundary the device accepts, which is
//! why the stress loop never hands a plain `Vec<u8>` to the device.

use crate::error::{Error, Result};
use std::alloc::{alloc, dealloc, Layout};
use std::ptr::{self, NonNull};

/// Memory-aligned buffer suitable for O_DIRECT operations
///
/// The buffer owns its allocation exclusively and releases it on drop, on
/// every exit path.
pub struct AlignedBuffer {
    ptr: NonNull<u8>,
    size: usize,
    alignment: usize,
    layout: Layout,
}

impl AlignedBuffer {
    /// Smallest alignment accepted (the width of a pointer)
    pub const MIN_ALIGNMENT: usize = std::mem::size_of::<*const u8>();

    /// Allocate `size` bytes whose base address is a multiple of `alignment`
    ///
    /// # Errors
    ///
    /// - `BadAlignment` if `alignment` is not a power of two or is smaller
    ///   than [`Self::MIN_ALIGNMENT`]
    /// - `BadSize` if `size` is zero
    /// - `AllocationFailed` if the allocator cannot satisfy the request
    pub fn new(alignment: usize, size: usize) -> Result<Self> {
        if alignment < Self::MIN_ALIGNMENT || !alignment.is_power_of_two() {
            return Err(Error::BadAlignment {
                alignment,
                min: Self::MIN_ALIGNMENT,
            });
        }
        if size == 0 {
            return Err(Error::BadSize);
        }

        let layout = Layout::from_size_align(size, alignment)
            .map_err(|_| Error::AllocationFailed { size, alignment })?;

        // SAFETY: layout has a non-zero size, checked above.
        let raw = unsafe { alloc(layout) };
        let ptr = NonNull::new(raw).ok_or(Error::AllocationFailed { size, alignment })?;

        Ok(AlignedBuffer {
            ptr,
            size,
            alignment,
            layout,
        })
    }

    /// Allocate a buffer aligned to the system page size
    pub fn page_aligned(size: usize) -> Result<Self> {
        Self::new(crate::util::iosize::page_size(), size)
    }

    #[inline(always)]
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    #[inline(always)]
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.size) }
    }

    #[inline(always)]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.size) }
    }

    /// Size of the buffer in bytes
    #[inline(always)]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline(always)]
    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /// Verify that the base address honours the requested alignment
    #[inline(always)]
    pub fn is_aligned(&self) -> bool {
        (self.ptr.as_ptr() as usize) % self.alignment == 0
    }

    /// Fill the whole buffer with zero bytes
    pub fn zero(&mut self) {
        unsafe { ptr::write_bytes(self.ptr.as_ptr(), 0, self.size) };
    }
}

impl Drop for AlignedBuffer {
    fn drop(&mut self) {
        unsafe {
            dealloc(self.ptr.as_ptr(), self.layout);
        }
    }
}

// AlignedBuffer is Send because it owns its memory
unsafe impl Send for AlignedBuffer {}

impl std::fmt::Debug for AlignedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignedBuffer")
            .field("ptr", &self.ptr)
            .field("size", &self.size)
            .field("alignment", &self.alignment)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_buffer_4k_alignment() {
        let buffer = AlignedBuffer::new(4096, 4096).unwrap();
        assert_eq!(buffer.size(), 4096);
        assert_eq!(buffer.alignment(), 4096);
        assert!(buffer.is_aligned());
        assert_eq!(buffer.as_ptr() as usize % 4096, 0);
    }

    #[test]
    fn test_unaligned_size_is_allowed() {
        // Only the base address is constrained, not the length
        let buffer = AlignedBuffer::new(512, 1000).unwrap();
        assert_eq!(buffer.size(), 1000);
        assert!(buffer.is_aligned());
    }

    #[test]
    fn test_non_power_of_two_alignment() {
        match AlignedBuffer::new(3, 4096) {
            Err(Error::BadAlignment { alignment, .. }) => assert_eq!(alignment, 3),
            other => panic!("expected BadAlignment, got {:?}", other),
        }
    }

    #[test]
    fn test_alignment_below_pointer_width() {
        let small = AlignedBuffer::MIN_ALIGNMENT / 2;
        assert!(matches!(
            AlignedBuffer::new(small, 64),
            Err(Error::BadAlignment { .. })
        ));
    }

    #[test]
    fn test_zero_size() {
        assert!(matches!(AlignedBuffer::new(4096, 0), Err(Error::BadSize)));
    }

    #[test]
    fn test_alignment_checked_before_size() {
        assert!(matches!(
            AlignedBuffer::new(3, 0),
            Err(Error::BadAlignment { .. })
        ));
    }

    #[test]
    fn test_zero_fill() {
        let mut buffer = AlignedBuffer::new(512, 1024).unwrap();
        buffer.as_mut_slice().fill(0xAB);
        buffer.zero();
        assert!(buffer.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_page_aligned() {
        let buffer = AlignedBuffer::page_aligned(8192).unwrap();
        assert!(buffer.is_aligned());
        assert_eq!(buffer.alignment(), crate::util::iosize::page_size());
    }
}
