//! Error types for diskstress
//!
//! Every failure is fatal to the run except `Overflow`, which the stress loop
//! absorbs by reseeding its accumulator.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by buffers, clocks, and the device wrapper
#[derive(Debug, Error)]
pub enum Error {
    /// Alignment is not a power of two or is smaller than a pointer
    #[error("Bad alignment: {alignment} (must be a power of two and at least {min})")]
    BadAlignment { alignment: usize, min: usize },

    /// Zero-sized buffer requested
    #[error("Bad size: buffer size must be greater than 0")]
    BadSize,

    /// The allocator could not satisfy the aligned request
    #[error("Failed alignment: could not allocate {size} bytes aligned to {alignment}")]
    AllocationFailed { size: usize, alignment: usize },

    /// `clock_gettime` failed
    #[error("clock {clock} unavailable: {source}")]
    ClockUnavailable {
        clock: &'static str,
        #[source]
        source: io::Error,
    },

    /// Seconds component of a duration sum is not representable
    #[error("duration overflow")]
    Overflow,

    /// Device or file could not be opened
    #[error("failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A seek, read, or write syscall failed
    #[error("{op} failed: {source}")]
    Io {
        op: &'static str,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Build an `Io` error from the current `errno`
    pub(crate) fn last_os(op: &'static str) -> Self {
        Error::Io {
            op,
            source: io::Error::last_os_error(),
        }
    }

    /// True for the buffer allocation family of errors
    pub fn is_allocation(&self) -> bool {
        matches!(
            self,
            Error::BadAlignment { .. } | Error::BadSize | Error::AllocationFailed { .. }
        )
    }

    /// Underlying OS error code, if this error came from a syscall
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Error::ClockUnavailable { source, .. }
            | Error::Open { source, .. }
            | Error::Io { source, .. } => source.raw_os_error(),
            _ => None,
        }
    }
}

/// Result type used throughout the diskstress library
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_kinds() {
        assert!(Error::BadSize.is_allocation());
        assert!(Error::BadAlignment { alignment: 3, min: 8 }.is_allocation());
        assert!(Error::AllocationFailed { size: 1, alignment: 8 }.is_allocation());
        assert!(!Error::Overflow.is_allocation());
    }

    #[test]
    fn test_raw_os_error() {
        let err = Error::Io {
            op: "read",
            source: io::Error::from_raw_os_error(libc::EIO),
        };
        assert_eq!(err.raw_os_error(), Some(libc::EIO));
        assert!(err.to_string().starts_with("read failed"));
        assert_eq!(Error::BadSize.raw_os_error(), None);
    }

    #[test]
    fn test_open_error_display() {
        let err = Error::Open {
            path: PathBuf::from("/dev/nope"),
            source: io::Error::from_raw_os_error(libc::ENOENT),
        };
        let msg = err.to_string();
        assert!(msg.contains("/dev/nope"));
        assert!(msg.contains("os error 2"));
    }
}
