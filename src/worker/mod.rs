//! Butterfly stress loop
//!
//! The loop keeps two cursors on the device: one walking up from the start,
//! one walking down from the end. Every cycle it reads at both cursors,
//! writes at both, then reads at both again, so the head is forced across
//! the whole gap six times. Early cycles produce full-stroke seeks; as the
//! cursors converge the seeks shorten and direction changes come faster.
//!
//! Latencies are summed per slot and averaged into a [`Report`] whenever the
//! report interval has elapsed. Cycles accumulated after the last report are
//! dropped when the cursors meet.
//!
//! # Example
//!
//! ```no_run
//! use diskstress::config::StressConfig;
//! use diskstress::output::{OutputFormat, ReportWriter};
//! use diskstress::util::Monotonic;
//! use diskstress::worker::StressLoop;
//!
//! let config = StressConfig::new("/dev/sdb", 4096, 4096, 1024 * 1024);
//! let mut sink = ReportWriter::stdout(OutputFormat::Text);
//!
//! let summary = StressLoop::<Monotonic>::new(&config).run(&mut sink)?;
//! println!("{} cycles, {} reports", summary.cycles, summary.reports);
//! # Ok::<(), diskstress::error::Error>(())
//! ```

use crate::config::StressConfig;
use crate::engine::{timed_read, timed_write};
use crate::error::Result;
use crate::output::ReportSink;
use crate::stats::{Accumulator, FoldOutcome, Report, Round};
use crate::target::Device;
use crate::util::{iosize, AlignedBuffer, Clock, Duration, IoSizeAligner};
use std::marker::PhantomData;

/// Converging cursor pair
///
/// Yields `(begin, end)` for each cycle. Iteration stops once the cursors
/// cross, once a read at `begin` would run past the extent, or once `end`
/// reaches zero. A non-positive jump yields nothing.
#[derive(Debug, Clone)]
pub struct Butterfly {
    begin: i64,
    end: i64,
    extent: i64,
    read_extent: i64,
    jump: i64,
}

impl Butterfly {
    /// # Arguments
    ///
    /// * `extent` - Usable device size (already rounded to IO granularity)
    /// * `read_extent` - Read size rounded to IO granularity
    /// * `jump` - Distance each cursor moves per cycle
    pub fn new(extent: i64, read_extent: i64, jump: i64) -> Self {
        let end = if jump > 0 { extent.saturating_sub(jump) } else { 0 };
        Self {
            begin: 0,
            end,
            extent,
            read_extent,
            jump,
        }
    }

    fn in_bounds(&self) -> bool {
        self.begin < self.end
            && self.begin.saturating_add(self.read_extent) < self.extent
            && self.end > 0
    }
}

impl Iterator for Butterfly {
    type Item = (i64, i64);

    fn next(&mut self) -> Option<Self::Item> {
        if !self.in_bounds() {
            return None;
        }

        let cursors = (self.begin, self.end);
        self.begin = self.begin.saturating_add(self.jump);
        self.end = self.end.saturating_sub(self.jump);
        Some(cursors)
    }
}

/// Outcome of one completed traversal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Cycles executed (six operations each)
    pub cycles: u64,
    /// Reports handed to the sink
    pub reports: u64,
    /// Cycles still in the accumulator when the cursors met
    pub unreported_cycles: u64,
    /// Rounds that overflowed the accumulator
    pub overflowed_rounds: u64,
    /// Device size after IO-size rounding
    pub extent: u64,
}

/// One butterfly traversal for a single size/increment combination
///
/// The clock `C` is fixed for the whole run, so every latency, elapsed time
/// and average in the resulting reports comes from the same source.
pub struct StressLoop<'a, C: Clock> {
    config: &'a StressConfig,
    aligner: IoSizeAligner,
    _clock: PhantomData<C>,
}

impl<'a, C: Clock> StressLoop<'a, C> {
    pub fn new(config: &'a StressConfig) -> Self {
        Self::with_aligner(config, IoSizeAligner::new())
    }

    /// Use a specific page granularity for IO-size rounding
    pub fn with_aligner(config: &'a StressConfig, aligner: IoSizeAligner) -> Self {
        Self {
            config,
            aligner,
            _clock: PhantomData,
        }
    }

    /// Run the traversal to completion, emitting reports into `sink`
    ///
    /// Buffers and the device are released on every exit path. The first
    /// allocation, IO, or clock error aborts the run.
    pub fn run<S: ReportSink>(&self, sink: &mut S) -> Result<RunSummary> {
        let config = self.config;
        let alignment = config.alignment.unwrap_or_else(iosize::page_size);

        let mut read_buf = AlignedBuffer::new(alignment, config.read_size)?;
        let mut write_buf = AlignedBuffer::new(alignment, config.write_size)?;
        write_buf.zero();

        let read_extent = self.aligner.align(config.read_size as u64);

        let mut device = Device::open(&config.device, config.open_flags)?;
        let extent = self.aligner.align(device.size()?);
        let jump = to_i64(config.jump_increment);
        let interval = to_i64(config.report_interval_secs);

        tracing::debug!(
            device = %config.device.display(),
            extent,
            read_size = config.read_size,
            write_size = config.write_size,
            jump,
            clock = C::NAME,
            "Starting butterfly traversal"
        );

        let device_name = config.device.display().to_string();
        let mut summary = RunSummary {
            extent,
            ..RunSummary::default()
        };
        let mut accumulator = Accumulator::<C>::new();
        let mut last_report = Duration::<C>::now()?;

        let cursors = Butterfly::new(to_i64(extent), to_i64(read_extent), jump);
        for (begin, end) in cursors {
            let cycle_start = Duration::<C>::now()?;
            let round: Round<C> = [
                timed_read(&mut device, begin, &mut read_buf)?,
                timed_read(&mut device, end, &mut read_buf)?,
                timed_write(&mut device, begin, &write_buf)?,
                timed_write(&mut device, end, &write_buf)?,
                timed_read(&mut device, begin, &mut read_buf)?,
                timed_read(&mut device, end, &mut read_buf)?,
            ];
            summary.cycles += 1;

            let elapsed = cycle_start - last_report;
            let step = accumulator.record(&round, elapsed.secs() >= interval);
            if step.outcome == FoldOutcome::Overflowed {
                summary.overflowed_rounds += 1;
                tracing::warn!(begin, end, "Latency sums overflowed, round not accumulated");
            }

            let Some(averaged) = step.report else {
                continue;
            };
            sink.emit(&Report {
                device: device_name.clone(),
                cycle_count: averaged.cycle_count,
                elapsed,
                averages: averaged.averages,
                begin,
                end,
                jump_increment: config.jump_increment,
            })?;
            summary.reports += 1;
            last_report = Duration::<C>::now()?;
        }

        summary.unreported_cycles = accumulator.cycles();
        if summary.unreported_cycles > 0 {
            tracing::debug!(
                cycles = summary.unreported_cycles,
                "Traversal finished with unreported cycles, dropping them"
            );
        }

        Ok(summary)
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
