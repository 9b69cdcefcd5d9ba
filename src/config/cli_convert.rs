//! CLI to Config conversion utilities

use crate::config::cli::{self, Cli};
use crate::config::{ClockKind, RunConfig, TestMatrix};
use crate::output::OutputFormat;
use crate::target::OpenFlags;
use anyhow::{Context, Result};

/// Parse a size string (e.g., "1G", "100M", "4k") to bytes
pub fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim().to_lowercase();

    let (num_str, multiplier) = if s.ends_with("k") || s.ends_with("kb") {
        (s.trim_end_matches("kb").trim_end_matches("k"), 1024u64)
    } else if s.ends_with("m") || s.ends_with("mb") {
        (s.trim_end_matches("mb").trim_end_matches("m"), 1024 * 1024)
    } else if s.ends_with("g") || s.ends_with("gb") {
        (s.trim_end_matches("gb").trim_end_matches("g"), 1024 * 1024 * 1024)
    } else if s.ends_with("t") || s.ends_with("tb") {
        (s.trim_end_matches("tb").trim_end_matches("t"), 1024 * 1024 * 1024 * 1024)
    } else {
        (s.as_str(), 1)
    };

    let num: u64 = num_str.parse()
        .with_context(|| format!("Invalid size format: {}", s))?;

    num.checked_mul(multiplier)
        .with_context(|| format!("Size out of range: {}", s))
}

/// Parse a comma-split list of size strings
pub fn parse_sizes(values: &[String]) -> Result<Vec<u64>> {
    values.iter().map(|v| parse_size(v)).collect()
}

/// Parse a duration string (e.g., "60s", "5m", "1h") to seconds
pub fn parse_duration(s: &str) -> Result<u64> {
    let s = s.trim().to_lowercase();

    let (num_str, multiplier) = if s.ends_with("s") || s.ends_with("sec") {
        (s.trim_end_matches("sec").trim_end_matches("s"), 1u64)
    } else if s.ends_with("m") || s.ends_with("min") {
        (s.trim_end_matches("min").trim_end_matches("m"), 60)
    } else if s.ends_with("h") || s.ends_with("hr") {
        (s.trim_end_matches("hr").trim_end_matches("h"), 3600)
    } else {
        (s.as_str(), 1)
    };

    let num: u64 = num_str.parse()
        .with_context(|| format!("Invalid duration format: {}", s))?;

    num.checked_mul(multiplier)
        .with_context(|| format!("Duration out of range: {}", s))
}

/// Convert CLI ClockArg to ClockKind
pub fn convert_clock(arg: cli::ClockArg) -> ClockKind {
    match arg {
        cli::ClockArg::Monotonic => ClockKind::Monotonic,
        cli::ClockArg::MonotonicRaw => ClockKind::MonotonicRaw,
    }
}

/// Convert CLI FormatArg to OutputFormat
pub fn convert_format(arg: cli::FormatArg) -> OutputFormat {
    match arg {
        cli::FormatArg::Text => OutputFormat::Text,
        cli::FormatArg::Json => OutputFormat::Json,
    }
}

/// Build the run configuration from parsed arguments
pub fn build_run_config(cli: &Cli) -> Result<RunConfig> {
    let read_sizes = parse_sizes(&cli.read_sizes).context("Invalid read sizes")?;
    let write_sizes = match cli.write_sizes {
        Some(ref sizes) => parse_sizes(sizes).context("Invalid write sizes")?,
        None => read_sizes.clone(),
    };
    let increments = parse_sizes(&cli.increments).context("Invalid jump increments")?;

    let report_interval_secs = parse_duration(&cli.report_interval)
        .context("Invalid report interval")?;

    let alignment = match cli.alignment {
        Some(ref value) => {
            let bytes = parse_size(value).context("Invalid alignment")?;
            Some(usize::try_from(bytes).context("Alignment out of range")?)
        }
        None => None,
    };

    let open_flags = if cli.buffered {
        OpenFlags::buffered()
    } else {
        OpenFlags::default()
    };

    Ok(RunConfig {
        device: cli.target.clone(),
        matrix: TestMatrix {
            read_sizes,
            write_sizes,
            increments,
        },
        report_interval_secs,
        open_flags,
        alignment,
        clock: convert_clock(cli.clock),
        format: convert_format(cli.format),
    })
}
