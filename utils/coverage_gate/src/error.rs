use std::{fmt, io, path::PathBuf};

use thiserror::Error;

use crate::reports::Tool;
use crate::threshold::GateReport;

#[derive(Debug, Error)]
pub enum GateError {
    #[error("{0}")]
    Configuration(String),
    #[error("{} missing: {}", .tool.report_label(), .path.display())]
    ReportMissing { tool: Tool, path: PathBuf },
    #[error("{} report at {} is malformed: {}", .tool, .path.display(), .detail)]
    ReportParse {
        tool: Tool,
        path: PathBuf,
        detail: String,
    },
    #[error("{message}")]
    ThresholdViolation {
        message: String,
        report: Box<GateReport>,
    },
    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type GateResult<T> = Result<T, GateError>;

impl GateError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn baseline_missing(path: impl Into<PathBuf>) -> Self {
        Self::Configuration(format!(
            "Coverage baseline config missing: {}",
            path.into().display()
        ))
    }

    pub fn invalid_baseline(details: impl fmt::Display) -> Self {
        Self::Configuration(format!("Invalid baseline configuration ({details})"))
    }

    pub fn report_missing(tool: Tool, path: impl Into<PathBuf>) -> Self {
        Self::ReportMissing {
            tool,
            path: path.into(),
        }
    }

    pub fn report_parse(tool: Tool, path: impl Into<PathBuf>, details: impl fmt::Display) -> Self {
        Self::ReportParse {
            tool,
            path: path.into(),
            detail: details.to_string(),
        }
    }

    /// Wraps a report that has at least one violation.
    pub fn threshold_violation(report: GateReport) -> Self {
        Self::ThresholdViolation {
            message: report.violations.join("; "),
            report: Box::new(report),
        }
    }

    /// The enforcement report, when the failure came from the threshold check.
    pub fn report(&self) -> Option<&GateReport> {
        match self {
            Self::ThresholdViolation { report, .. } => Some(report),
            _ => None,
        }
    }

    pub fn is_missing_report(&self, tool: Tool) -> bool {
        matches!(self, Self::ReportMissing { tool: t, .. } if *t == tool)
    }
}
