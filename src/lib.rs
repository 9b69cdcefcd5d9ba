//! diskstress - butterfly seek stress and latency harness
//!
//! Hammers a block device (or file) with synchronous, unbuffered reads and
//! writes at two cursors that start at opposite ends and step toward each
//! other. Every cycle times six operations; the latencies are summed and
//! averaged per slot and reported at a fixed wall-clock cadence.
//!
//! # Architecture
//!
//! - **util**: clock-tagged durations, aligned buffers, IO-size rounding
//! - **target**: raw device handle opened O_DIRECT|O_SYNC|O_DSYNC
//! - **engine**: timed seek+read / seek+write primitives
//! - **stats**: six-slot accumulator and averaged reports
//! - **worker**: butterfly traversal and the stress loop
//! - **output**: text and JSON report lines
//! - **config**: CLI parsing, test matrix and validation
//!
//! WRITES DESTROY DATA on the target. There is no read-back verification.

pub mod config;
pub mod engine;
pub mod error;
pub mod output;
pub mod stats;
pub mod target;
pub mod util;
pub mod worker;

// Re-export commonly used types
pub use config::{RunConfig, StressConfig};
pub use error::{Error, Result};
pub use worker::{RunSummary, StressLoop};
