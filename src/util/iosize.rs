//! Transfer-size rounding to the page granularity

/// System page size in bytes
///
/// Falls back to 4096 if `sysconf` cannot report it.
pub fn page_size() -> usize {
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 {
        size as usize
    } else {
        4096
    }
}

/// Rounds IO sizes up to a multiple of the page size
///
/// Sizes smaller than one page are left alone, as are exact multiples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoSizeAligner {
    page_size: u64,
}

impl IoSizeAligner {
    /// Aligner for the running system's page size
    pub fn new() -> Self {
        Self::with_page_size(page_size() as u64)
    }

    pub fn with_page_size(page_size: u64) -> Self {
        assert!(page_size > 0, "page size must be non-zero");
        Self { page_size }
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Round `minsize` up to the next page multiple
    ///
    /// Saturates at the largest page multiple that fits in a `u64`.
    pub fn align(&self, minsize: u64) -> u64 {
        if minsize % self.page_size == 0 || minsize < self.page_size {
            return minsize;
        }
        let pages = minsize.div_ceil(self.page_size);
        pages
            .checked_mul(self.page_size)
            .unwrap_or(u64::MAX / self.page_size * self.page_size)
    }
}

impl Default for IoSizeAligner {
    fn default() -> Self {
        Self::new()
    }
}
