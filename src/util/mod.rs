//! Low-level utilities shared by the engine and the stress loop

pub mod buffer;
pub mod iosize;
pub mod time;

pub use buffer::AlignedBuffer;
pub use iosize::IoSizeAligner;
pub use time::{Clock, Duration, Monotonic, MonotonicRaw};
