//! IO target abstraction
//!
//! A target is the block device or regular file the stress loop hammers. It
//! is always opened read-write and never created: stress testing a path that
//! does not exist yet is a usage error, not something to paper over.
//!
//! # Example
//!
//! ```no_run
//! use diskstress::target::{OpenFlags, Whence};
//! use diskstress::target::device::Device;
//! use diskstress::util::AlignedBuffer;
//!
//! // Note: raw block devices usually require root
//! let mut device = Device::open("/dev/sdb", OpenFlags::default()).unwrap();
//! let size = device.size().unwrap();
//!
//! let mut buf = AlignedBuffer::page_aligned(4096).unwrap();
//! device.seek(0, Whence::Set).unwrap();
//! let read = device.read(&mut buf).unwrap();
//! assert!(read as u64 <= size);
//! ```

pub mod device;

pub use device::Device;

/// Open flags for targets
///
/// The default is the full stress configuration: O_DIRECT, O_SYNC and
/// O_DSYNC all set, so every transfer reaches the medium before returning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenFlags {
    /// Use direct IO (O_DIRECT) - bypass page cache
    pub direct: bool,

    /// Use synchronous IO (O_SYNC) - data and metadata durable on return
    pub sync: bool,

    /// Use data-synchronous IO (O_DSYNC) - data durable on return
    pub dsync: bool,
}

impl OpenFlags {
    /// Page-cache IO with synchronous writes, for filesystems that reject
    /// O_DIRECT (tmpfs, some network filesystems)
    pub fn buffered() -> Self {
        Self {
            direct: false,
            ..Self::default()
        }
    }

    /// Translate into `open(2)` flags, excluding the access mode
    pub fn custom_flags(&self) -> libc::c_int {
        let mut flags = 0;
        if self.direct {
            flags |= libc::O_DIRECT;
        }
        if self.sync {
            flags |= libc::O_SYNC;
        }
        if self.dsync {
            flags |= libc::O_DSYNC;
        }
        flags
    }
}

impl Default for OpenFlags {
    fn default() -> Self {
        Self {
            direct: true,
            sync: true,
            dsync: true,
        }
    }
}

/// Reference point for [`Device::seek`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    /// Absolute offset (SEEK_SET)
    Set,
    /// Relative to the current position (SEEK_CUR)
    Cur,
    /// Relative to the end of the target (SEEK_END)
    End,
}

impl Whence {
    pub fn as_raw(self) -> libc::c_int {
        match self {
            Whence::Set => libc::SEEK_SET,
            Whence::Cur => libc::SEEK_CUR,
            Whence::End => libc::SEEK_END,
        }
    }
}
