//! Report output
//!
//! Reports go to a [`ReportSink`]. The stock sink, [`ReportWriter`], renders
//! each report as one line (plain text or JSON) and flushes it immediately so
//! a long run can be followed with `tail -f` or piped into another tool.

pub mod json;
pub mod text;

use crate::error::{Error, Result};
use crate::stats::Report;
use crate::util::Clock;
use std::io::Write;

/// Line format for emitted reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Space-separated fields with a bracketed latency array
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Destination for averaged reports
pub trait ReportSink {
    fn emit<C: Clock>(&mut self, report: &Report<C>) -> Result<()>;
}

/// Writes one flushed line per report
#[derive(Debug)]
pub struct ReportWriter<W: Write> {
    writer: W,
    format: OutputFormat,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self { writer, format }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl ReportWriter<std::io::Stdout> {
    pub fn stdout(format: OutputFormat) -> Self {
        Self::new(std::io::stdout(), format)
    }
}

impl<W: Write> ReportSink for ReportWriter<W> {
    fn emit<C: Clock>(&mut self, report: &Report<C>) -> Result<()> {
        let line = match self.format {
            OutputFormat::Text => text::format_report(report),
            OutputFormat::Json => json::format_report(report).map_err(|e| Error::Io {
                op: "serialize report",
                source: e.into(),
            })?,
        };

        writeln!(self.writer, "{}", line)
            .and_then(|_| self.writer.flush())
            .map_err(|source| Error::Io {
                op: "write report",
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::SLOTS;
    use crate::util::{Duration, Monotonic};

    fn sample_report() -> Report<Monotonic> {
        Report {
            device: "/dev/sdz".to_string(),
            cycle_count: 3,
            elapsed: Duration::from_parts(10, 5),
            averages: [Duration::from_parts(0, 1_500); SLOTS],
            begin: 4096,
            end: 8192,
            jump_increment: 4096,
        }
    }

    #[test]
    fn test_writer_emits_one_line_per_report() {
        let mut writer = ReportWriter::new(Vec::new(), OutputFormat::Text);
        writer.emit(&sample_report()).unwrap();
        writer.emit(&sample_report()).unwrap();

        let out = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("/dev/sdz 3 10.000000005 ["));
    }

    #[test]
    fn test_writer_json_lines_parse() {
        let mut writer = ReportWriter::new(Vec::new(), OutputFormat::Json);
        writer.emit(&sample_report()).unwrap();

        let out = String::from_utf8(writer.into_inner()).unwrap();
        let value: serde_json::Value = serde_json::from_str(out.trim_end()).unwrap();
        assert_eq!(value["cycle_count"], 3);
    }
}
