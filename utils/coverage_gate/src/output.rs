//! Output formatters for gate results
//!
//! Supports text and JSON output formats. Failures always produce the
//! `Coverage regression: ...` line on the error stream, whatever the format.

use std::io::Write;

use anyhow::{Context, Result};

use crate::error::GateError;
use crate::threshold::GateReport;

/// Prefix of the single line written to stderr when the gate fails.
pub const FAILURE_PREFIX: &str = "Coverage regression: ";

/// Text-mode stdout line when the Tarpaulin check was skipped.
pub const SKIP_NOTICE: &str = "Tarpaulin skipped: optional flag set, baseline substituted";

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format '{}'. Use 'text' or 'json'", s)),
        }
    }
}

/// Format a report for stdout
pub fn format_report(report: &GateReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(report.summary_line()),
        OutputFormat::Json => {
            serde_json::to_string_pretty(report).context("failed to serialize gate report")
        }
    }
}

fn write_skip_notice<W: Write>(
    out: &mut W,
    report: &GateReport,
    format: OutputFormat,
) -> Result<()> {
    if format == OutputFormat::Text && report.tarpaulin.skipped {
        writeln!(out, "{SKIP_NOTICE}").context("failed to write skip notice")?;
    }
    Ok(())
}

pub fn write_success<W: Write>(
    out: &mut W,
    report: &GateReport,
    format: OutputFormat,
) -> Result<()> {
    write_skip_notice(out, report, format)?;
    let rendered = format_report(report, format)?;
    writeln!(out, "{rendered}").context("failed to write gate summary")?;
    Ok(())
}

/// In JSON mode a threshold failure still prints the full report on stdout.
pub fn write_failure<W: Write, E: Write>(
    out: &mut W,
    err_out: &mut E,
    error: &GateError,
    format: OutputFormat,
) -> Result<()> {
    if let Some(report) = error.report() {
        write_skip_notice(out, report, format)?;
        if format == OutputFormat::Json {
            let rendered = format_report(report, format)?;
            writeln!(out, "{rendered}").context("failed to write gate report")?;
        }
    }
    writeln!(err_out, "{FAILURE_PREFIX}{error}").context("failed to write failure line")?;
    Ok(())
}
