//! Run configuration
//!
//! A run is a matrix of stress combinations against one device: every jump
//! increment, crossed with every read size, crossed with every write size.
//! Each combination becomes one [`StressConfig`] and one full butterfly
//! traversal. There is no configuration file; everything comes from the
//! command line.

pub mod cli;
pub mod cli_convert;
pub mod validator;

use crate::output::OutputFormat;
use crate::target::OpenFlags;
use std::fmt;
use std::path::PathBuf;

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;
const GIB: u64 = 1024 * MIB;

/// Read sizes exercised by default (write sizes mirror them)
pub const DEFAULT_TRANSFER_SIZES: [u64; 2] = [MIB, 4 * KIB];

/// Jump increments exercised by default, longest first
pub const DEFAULT_INCREMENTS: [u64; 5] = [GIB, 128 * MIB, MIB, 4 * KIB, KIB];

/// Seconds between averaged reports
pub const DEFAULT_REPORT_INTERVAL_SECS: u64 = 10;

/// Clock used for every latency measurement in a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockKind {
    #[default]
    Monotonic,
    MonotonicRaw,
}

impl fmt::Display for ClockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockKind::Monotonic => write!(f, "monotonic"),
            ClockKind::MonotonicRaw => write!(f, "monotonic-raw"),
        }
    }
}

/// Parameters of a single butterfly traversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StressConfig {
    /// Block device or file to stress (must exist)
    pub device: PathBuf,
    /// Bytes per read
    pub read_size: usize,
    /// Bytes per write
    pub write_size: usize,
    /// Distance each cursor moves per cycle
    pub jump_increment: u64,
    /// Whole seconds between reports
    pub report_interval_secs: u64,
    pub open_flags: OpenFlags,
    /// Buffer alignment; `None` means the system page size
    pub alignment: Option<usize>,
}

impl StressConfig {
    /// Combination with the default interval, O_DIRECT|O_SYNC|O_DSYNC and
    /// page-aligned buffers
    pub fn new(
        device: impl Into<PathBuf>,
        read_size: usize,
        write_size: usize,
        jump_increment: u64,
    ) -> Self {
        Self {
            device: device.into(),
            read_size,
            write_size,
            jump_increment,
            report_interval_secs: DEFAULT_REPORT_INTERVAL_SECS,
            open_flags: OpenFlags::default(),
            alignment: None,
        }
    }
}

impl fmt::Display for StressConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "device={} read={} write={} jump={}",
            self.device.display(),
            self.read_size,
            self.write_size,
            self.jump_increment
        )
    }
}

/// One cell of the test matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Combination {
    pub read_size: u64,
    pub write_size: u64,
    pub jump_increment: u64,
}

/// Sizes and increments to cross
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestMatrix {
    pub read_sizes: Vec<u64>,
    pub write_sizes: Vec<u64>,
    pub increments: Vec<u64>,
}

impl TestMatrix {
    /// Every combination, increment outermost and write size innermost
    pub fn combinations(&self) -> impl Iterator<Item = Combination> + '_ {
        self.increments.iter().flat_map(move |&jump_increment| {
            self.read_sizes.iter().flat_map(move |&read_size| {
                self.write_sizes.iter().map(move |&write_size| Combination {
                    read_size,
                    write_size,
                    jump_increment,
                })
            })
        })
    }

    /// Number of combinations
    pub fn len(&self) -> usize {
        self.increments.len() * self.read_sizes.len() * self.write_sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TestMatrix {
    fn default() -> Self {
        Self {
            read_sizes: DEFAULT_TRANSFER_SIZES.to_vec(),
            write_sizes: DEFAULT_TRANSFER_SIZES.to_vec(),
            increments: DEFAULT_INCREMENTS.to_vec(),
        }
    }
}

/// Complete run configuration
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub device: PathBuf,
    pub matrix: TestMatrix,
    pub report_interval_secs: u64,
    pub open_flags: OpenFlags,
    pub alignment: Option<usize>,
    pub clock: ClockKind,
    pub format: OutputFormat,
}

impl RunConfig {
    /// Defaults for `device`: the standard matrix, 10s reports, direct IO
    pub fn new(device: impl Into<PathBuf>) -> Self {
        Self {
            device: device.into(),
            matrix: TestMatrix::default(),
            report_interval_secs: DEFAULT_REPORT_INTERVAL_SECS,
            open_flags: OpenFlags::default(),
            alignment: None,
            clock: ClockKind::default(),
            format: OutputFormat::default(),
        }
    }

    /// Per-traversal configs in matrix order
    pub fn stress_configs(&self) -> impl Iterator<Item = StressConfig> + '_ {
        self.matrix.combinations().map(move |combo| StressConfig {
            device: self.device.clone(),
            read_size: combo.read_size as usize,
            write_size: combo.write_size as usize,
            jump_increment: combo.jump_increment,
            report_interval_secs: self.report_interval_secs,
            open_flags: self.open_flags,
            alignment: self.alignment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matrix() {
        let matrix = TestMatrix::default();
        assert_eq!(matrix.read_sizes, vec![1048576, 4096]);
        assert_eq!(matrix.write_sizes, matrix.read_sizes);
        assert_eq!(
            matrix.increments,
            vec![1073741824, 134217728, 1048576, 4096, 1024]
        );
        assert_eq!(matrix.len(), 20);
        assert_eq!(matrix.combinations().count(), 20);
    }

    #[test]
    fn test_combination_order() {
        let matrix = TestMatrix {
            read_sizes: vec![1, 2],
            write_sizes: vec![10, 20],
            increments: vec![100, 200],
        };
        let combos: Vec<(u64, u64, u64)> = matrix
            .combinations()
            .map(|c| (c.jump_increment, c.read_size, c.write_size))
            .collect();

        assert_eq!(
            combos,
            vec![
                (100, 1, 10),
                (100, 1, 20),
                (100, 2, 10),
                (100, 2, 20),
                (200, 1, 10),
                (200, 1, 20),
                (200, 2, 10),
                (200, 2, 20),
            ]
        );
    }

    #[test]
    fn test_stress_configs_carry_run_settings() {
        let mut run = RunConfig::new("/dev/sdq");
        run.report_interval_secs = 3;
        run.open_flags = OpenFlags::buffered();
        run.alignment = Some(512);

        let configs: Vec<StressConfig> = run.stress_configs().collect();
        assert_eq!(configs.len(), 20);
        assert!(configs.iter().all(|c| c.report_interval_secs == 3
            && c.alignment == Some(512)
            && !c.open_flags.direct
            && c.device == PathBuf::from("/dev/sdq")));
        assert_eq!(configs[0].jump_increment, 1073741824);
        assert_eq!(configs[19].jump_increment, 1024);
        assert_eq!(configs[19].write_size, 4096);
    }

    #[test]
    fn test_stress_config_defaults() {
        let config = StressConfig::new("/dev/sdb", 4096, 8192, 1024);
        assert_eq!(config.report_interval_secs, 10);
        assert_eq!(config.open_flags, OpenFlags::default());
        assert!(config.alignment.is_none());
        assert_eq!(
            config.to_string(),
            "device=/dev/sdb read=4096 write=8192 jump=1024"
        );
    }
}
