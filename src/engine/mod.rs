//! Timed synchronous IO operations
//!
//! Every operation is a positioned seek followed by a single blocking
//! `read(2)` or `write(2)`, bracketed by two samples of clock `C`. The
//! measured latency includes the seek.
//!
//! # Example
//!
//! ```no_run
//! use diskstress::engine::timed_read;
//! use diskstress::target::{Device, OpenFlags};
//! use diskstress::util::{AlignedBuffer, Monotonic};
//!
//! let mut device = Device::open("/dev/sdb", OpenFlags::default()).unwrap();
//! let mut buf = AlignedBuffer::page_aligned(4096).unwrap();
//! let latency = timed_read::<Monotonic>(&mut device, 0, &mut buf).unwrap();
//! println!("read took {}", latency);
//! ```

use crate::error::Result;
use crate::target::{Device, Whence};
use crate::util::{AlignedBuffer, Clock, Duration};

/// Direction of a timed operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    Read,
    Write,
}

/// Seek to `offset` and read into `buffer`, returning the elapsed time
///
/// Errors from the clock or the device propagate unchanged.
#[inline]
pub fn timed_read<C: Clock>(
    device: &mut Device,
    offset: i64,
    buffer: &mut AlignedBuffer,
) -> Result<Duration<C>> {
    let start = Duration::<C>::now()?;
    device.seek(offset, Whence::Set)?;
    let transferred = device.read(buffer)?;
    let elapsed = Duration::<C>::now()? - start;

    trace_short(OperationType::Read, offset, transferred, buffer.size());
    Ok(elapsed)
}

/// Seek to `offset` and write `buffer`, returning the elapsed time
///
/// Errors from the clock or the device propagate unchanged.
#[inline]
pub fn timed_write<C: Clock>(
    device: &mut Device,
    offset: i64,
    buffer: &AlignedBuffer,
) -> Result<Duration<C>> {
    let start = Duration::<C>::now()?;
    device.seek(offset, Whence::Set)?;
    let transferred = device.write(buffer)?;
    let elapsed = Duration::<C>::now()? - start;

    trace_short(OperationType::Write, offset, transferred, buffer.size());
    Ok(elapsed)
}

#[inline(always)]
fn trace_short(op: OperationType, offset: i64, transferred: usize, requested: usize) {
    if transferred < requested {
        tracing::trace!(?op, offset, transferred, requested, "Short transfer");
    }
}
