//! Plain-text report lines
//!
//! Format, space separated:
//!
//! ```text
//! <device> <cycle_count> <elapsed> [d0,d1,d2,d3,d4,d5] <begin> <end> <jump_increment>
//! ```
//!
//! Every duration renders as `seconds.nanoseconds` with nine nanosecond
//! digits. The array has no spaces, so the line always splits into exactly
//! seven whitespace-separated fields (assuming the device path has none).

use crate::stats::Report;
use crate::util::{Clock, Duration};
use std::fmt::Write;

/// Render a report as a single line without the trailing newline
pub fn format_report<C: Clock>(report: &Report<C>) -> String {
    format!(
        "{} {} {} {} {} {} {}",
        report.device,
        report.cycle_count,
        report.elapsed,
        format_durations(&report.averages),
        report.begin,
        report.end,
        report.jump_increment,
    )
}

/// Render durations as `[a,b,c]`
pub fn format_durations<C: Clock>(durations: &[Duration<C>]) -> String {
    let mut out = String::with_capacity(2 + durations.len() * 16);
    out.push('[');
    for (i, duration) in durations.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, "{}", duration);
    }
    out.push(']');
    out
}
