//! CLI argument parsing using clap

use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

/// Clock source for latency measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ClockArg {
    /// CLOCK_MONOTONIC (default)
    Monotonic,
    /// CLOCK_MONOTONIC_RAW, unaffected by NTP slewing
    MonotonicRaw,
}

/// Report line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Space-separated fields
    Text,
    /// One JSON object per line
    Json,
}

/// diskstress - butterfly seek stress and latency harness
///
/// Reads and writes at two cursors converging from both ends of the target,
/// printing averaged latencies every report interval. WRITES DESTROY DATA on
/// the target.
#[derive(Parser, Debug)]
#[command(name = "diskstress")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Block device or file to stress (must already exist)
    #[arg(value_name = "PATH")]
    pub target: PathBuf,

    // === Matrix Options ===
    /// Read sizes, comma-separated (e.g. 1M,4k)
    #[arg(long, value_delimiter = ',', default_values = ["1M", "4k"])]
    pub read_sizes: Vec<String>,

    /// Write sizes, comma-separated (defaults to the read sizes)
    #[arg(long, value_delimiter = ',')]
    pub write_sizes: Option<Vec<String>>,

    /// Jump increments, comma-separated (e.g. 1G,128M,1M,4k,1k)
    #[arg(long, value_delimiter = ',', default_values = ["1G", "128M", "1M", "4k", "1k"])]
    pub increments: Vec<String>,

    // === Reporting Options ===
    /// Interval between averaged reports (e.g. 10s, 1m)
    #[arg(long, default_value = "10s")]
    pub report_interval: String,

    /// Report line format
    #[arg(long, value_enum, default_value = "text")]
    pub format: FormatArg,

    /// Clock used for all measurements
    #[arg(long, value_enum, default_value = "monotonic")]
    pub clock: ClockArg,

    // === IO Options ===
    /// Open without O_DIRECT (for filesystems that reject it); O_SYNC and
    /// O_DSYNC stay on
    #[arg(long)]
    pub buffered: bool,

    /// Buffer alignment (e.g. 512, 4k); defaults to the page size
    #[arg(long)]
    pub alignment: Option<String>,

    // === Misc ===
    /// Validate and print the test matrix without touching the target
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG wins
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate CLI arguments
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.read_sizes.is_empty() {
            anyhow::bail!("at least one read size is required");
        }
        if matches!(self.write_sizes.as_deref(), Some([])) {
            anyhow::bail!("at least one write size is required");
        }
        if self.increments.is_empty() {
            anyhow::bail!("at least one jump increment is required");
        }
        if self.target.as_os_str().is_empty() {
            anyhow::bail!("target path must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["diskstress", "/dev/sdb"]).unwrap();
        assert_eq!(cli.target, PathBuf::from("/dev/sdb"));
        assert_eq!(cli.read_sizes, vec!["1M", "4k"]);
        assert!(cli.write_sizes.is_none());
        assert_eq!(cli.increments, vec!["1G", "128M", "1M", "4k", "1k"]);
        assert_eq!(cli.report_interval, "10s");
        assert_eq!(cli.clock, ClockArg::Monotonic);
        assert_eq!(cli.format, FormatArg::Text);
        assert!(!cli.buffered);
        assert!(!cli.dry_run);
        assert_eq!(cli.verbose, 0);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_missing_target_is_usage_error() {
        let err = Cli::try_parse_from(["diskstress"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::try_parse_from([
            "diskstress",
            "disk.img",
            "--read-sizes",
            "64k,4k",
            "--write-sizes",
            "8k",
            "--increments",
            "1M",
            "--report-interval",
            "1m",
            "--clock",
            "monotonic-raw",
            "--format",
            "json",
            "--buffered",
            "--alignment",
            "512",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.read_sizes, vec!["64k", "4k"]);
        assert_eq!(cli.write_sizes, Some(vec!["8k".to_string()]));
        assert_eq!(cli.increments, vec!["1M"]);
        assert_eq!(cli.report_interval, "1m");
        assert_eq!(cli.clock, ClockArg::MonotonicRaw);
        assert_eq!(cli.format, FormatArg::Json);
        assert!(cli.buffered);
        assert_eq!(cli.alignment.as_deref(), Some("512"));
        assert_eq!(cli.verbose, 2);
    }
}
