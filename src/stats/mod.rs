//! Latency accumulation and averaged reports
//!
//! Each stress cycle produces one [`Round`]: six latencies in a fixed slot
//! order. The [`Accumulator`] sums rounds slot by slot until the report
//! cadence fires, at which point the sums are divided by the cycle count to
//! produce a [`Report`].
//!
//! # Example
//!
//! ```
//! use diskstress::stats::{Accumulator, FoldOutcome, SLOTS};
//! use diskstress::util::{Duration, Monotonic};
//!
//! let round = [Duration::<Monotonic>::from_parts(0, 2_000); SLOTS];
//! let mut acc = Accumulator::new();
//!
//! assert_eq!(acc.record(&round, false).outcome, FoldOutcome::Seeded);
//! assert_eq!(acc.record(&round, false).outcome, FoldOutcome::Folded);
//! assert_eq!(acc.cycles(), 2);
//!
//! // Three rounds summed, divided by the two counted cycles
//! let step = acc.record(&round, true);
//! let report = step.report.unwrap();
//! assert_eq!(report.cycle_count, 2);
//! assert_eq!(report.averages[0], Duration::from_parts(0, 3_000));
//! assert_eq!(acc.cycles(), 0);
//! ```

use crate::util::{Clock, Duration};
use serde::Serialize;
use std::fmt;

/// Number of timed operations per cycle
pub const SLOTS: usize = 6;

/// Latencies of one cycle, indexed by [`Slot`]
pub type Round<C> = [Duration<C>; SLOTS];

/// Position of an operation within a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// First read at the begin cursor
    ReadBegin1 = 0,
    /// First read at the end cursor
    ReadEnd1 = 1,
    WriteBegin = 2,
    WriteEnd = 3,
    /// Second read at the begin cursor, after both writes
    ReadBegin2 = 4,
    /// Second read at the end cursor, after both writes
    ReadEnd2 = 5,
}

impl Slot {
    /// All slots in execution order
    pub const ALL: [Slot; SLOTS] = [
        Slot::ReadBegin1,
        Slot::ReadEnd1,
        Slot::WriteBegin,
        Slot::WriteEnd,
        Slot::ReadBegin2,
        Slot::ReadEnd2,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Slot::ReadBegin1 => "read-begin-1",
            Slot::ReadEnd1 => "read-end-1",
            Slot::WriteBegin => "write-begin",
            Slot::WriteEnd => "write-end",
            Slot::ReadBegin2 => "read-begin-2",
            Slot::ReadEnd2 => "read-end-2",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of folding one round into the accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldOutcome {
    /// Accumulator was empty; the round became the sums
    Seeded,
    /// Round was added to the existing sums
    Folded,
    /// A slot sum overflowed; the sums are unchanged
    Overflowed,
}

/// Averages produced at a report boundary
#[derive(Debug, Clone, Copy)]
pub struct Averaged<C: Clock> {
    /// Divisor used for every slot
    pub cycle_count: u64,
    pub averages: Round<C>,
}

/// What one [`Accumulator::record`] call did
#[derive(Debug, Clone, Copy)]
pub struct Step<C: Clock> {
    pub outcome: FoldOutcome,
    /// Present when a report was due and the accumulator held sums
    pub report: Option<Averaged<C>>,
}

/// Six-slot running sums plus a cycle counter
///
/// The counter advances only on cycles that do not report; the report
/// cycle's round is summed but not counted. A boundary reached with a count
/// of zero divides by one instead.
#[derive(Debug, Clone)]
pub struct Accumulator<C: Clock> {
    sums: Option<Round<C>>,
    cycles: u64,
}

impl<C: Clock> Accumulator<C> {
    pub fn new() -> Self {
        Self {
            sums: None,
            cycles: 0,
        }
    }

    /// Fold `round` and, if `report_due`, average and reset
    ///
    /// Reset clears the accumulator, or reseeds it with `round` and a count
    /// of 1 when `round` overflowed the sums.
    pub fn record(&mut self, round: &Round<C>, report_due: bool) -> Step<C> {
        let outcome = self.fold(round);
        if !report_due {
            self.cycles += 1;
            return Step {
                outcome,
                report: None,
            };
        }

        let report = self.average().map(|averages| Averaged {
            cycle_count: self.divisor(),
            averages,
        });
        if outcome == FoldOutcome::Overflowed {
            self.reseed(round);
        } else {
            self.clear();
        }

        Step { outcome, report }
    }

    /// Add `round` slot by slot, leaving the cycle count alone
    ///
    /// All-or-nothing: if any slot overflows, none of the sums change.
    pub fn fold(&mut self, round: &Round<C>) -> FoldOutcome {
        let Some(sums) = self.sums.as_ref() else {
            self.sums = Some(*round);
            return FoldOutcome::Seeded;
        };

        let mut next = *sums;
        for (sum, latency) in next.iter_mut().zip(round.iter()) {
            match sum.checked_add(*latency) {
                Ok(total) => *sum = total,
                Err(_) => return FoldOutcome::Overflowed,
            }
        }

        self.sums = Some(next);
        FoldOutcome::Folded
    }

    /// Per-slot averages, or `None` if nothing has been folded
    pub fn average(&self) -> Option<Round<C>> {
        let divisor = self.divisor();
        self.sums.map(|sums| sums.map(|sum| sum / divisor))
    }

    fn divisor(&self) -> u64 {
        self.cycles.max(1)
    }

    /// Drop all sums
    pub fn clear(&mut self) {
        self.sums = None;
        self.cycles = 0;
    }

    /// Restart from a single round
    pub fn reseed(&mut self, round: &Round<C>) {
        self.sums = Some(*round);
        self.cycles = 1;
    }

    /// Current cycle count
    pub fn cycles(&self) -> u64 {
        self.cycles
    }
}

impl<C: Clock> Default for Accumulator<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Averaged latencies for one reporting interval
#[derive(Debug, Clone, Serialize)]
#[serde(bound = "")]
pub struct Report<C: Clock> {
    /// Path of the device under test, as given on the command line
    pub device: String,
    /// Rounds averaged into this report
    pub cycle_count: u64,
    /// Time since the previous report (or since the run started)
    pub elapsed: Duration<C>,
    /// Per-slot averages, in [`Slot`] order
    pub averages: Round<C>,
    /// Begin cursor at report time
    pub begin: i64,
    /// End cursor at report time
    pub end: i64,
    pub jump_increment: u64,
}
