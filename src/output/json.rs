//! JSON report lines
//!
//! Each report serializes to a single-line JSON object. Durations are
//! rendered as strings in the same `seconds.nanoseconds` form as the text
//! output so no precision is lost to floating point.

use crate::stats::{Report, Slot, SLOTS};
use crate::util::Clock;
use serde::Serialize;

#[derive(Serialize)]
#[serde(bound = "")]
struct JsonReport<'a, C: Clock> {
    #[serde(flatten)]
    report: &'a Report<C>,
    /// Slot names matching `averages` positionally
    slots: [&'static str; SLOTS],
    clock: &'static str,
}

/// Serialize a report as one line of JSON
pub fn format_report<C: Clock>(report: &Report<C>) -> serde_json::Result<String> {
    serde_json::to_string(&JsonReport {
        report,
        slots: Slot::ALL.map(Slot::name),
        clock: C::NAME,
    })
}
