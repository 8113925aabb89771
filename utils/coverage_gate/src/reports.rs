//! Readers for the two coverage report shapes the gate understands.
//!
//! - Tarpaulin (`cargo tarpaulin --out Json`): top-level `coverage` percentage.
//! - llvm-cov (`llvm-cov export --summary-only`): `data[0].totals.lines.percent`.

use std::{
    fmt,
    fs::File,
    io::{self, BufReader},
    path::Path,
};

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{GateError, GateResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Tarpaulin,
    Llvm,
}

impl Tool {
    /// What the tool's input file is called in messages.
    pub fn report_label(&self) -> &'static str {
        match self {
            Self::Tarpaulin => "Tarpaulin report",
            Self::Llvm => "LLVM summary",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tarpaulin => write!(f, "Tarpaulin"),
            Self::Llvm => write!(f, "LLVM"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Segment {
    Key(&'static str),
    Index(usize),
}

const TARPAULIN_LINE_PERCENT: &[Segment] = &[Segment::Key("coverage")];

const LLVM_LINE_PERCENT: &[Segment] = &[
    Segment::Key("data"),
    Segment::Index(0),
    Segment::Key("totals"),
    Segment::Key("lines"),
    Segment::Key("percent"),
];

/// Line coverage from a Tarpaulin JSON report.
pub fn read_tarpaulin(path: &Path) -> GateResult<f64> {
    read_line_percent(Tool::Tarpaulin, path, TARPAULIN_LINE_PERCENT)
}

/// Line coverage from an llvm-cov JSON summary.
pub fn read_llvm(path: &Path) -> GateResult<f64> {
    read_line_percent(Tool::Llvm, path, LLVM_LINE_PERCENT)
}

fn read_line_percent(tool: Tool, path: &Path, segments: &[Segment]) -> GateResult<f64> {
    let root = read_json(tool, path)?;
    let value =
        resolve(&root, segments).map_err(|detail| GateError::report_parse(tool, path, detail))?;
    let percent = as_percent(value).ok_or_else(|| {
        GateError::report_parse(
            tool,
            path,
            format!("`{}` is not a number: {value}", describe(segments)),
        )
    })?;

    debug!(tool = %tool, path = %path.display(), percent, "Read line coverage");
    Ok(percent)
}

fn read_json(tool: Tool, path: &Path) -> GateResult<Value> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(GateError::report_missing(tool, path));
        }
        Err(err) => return Err(GateError::io(path, err)),
    };

    serde_json::from_reader(BufReader::new(file))
        .map_err(|err| GateError::report_parse(tool, path, format!("invalid JSON: {err}")))
}

fn resolve<'a>(root: &'a Value, segments: &[Segment]) -> Result<&'a Value, String> {
    let mut current = root;
    for (depth, segment) in segments.iter().enumerate() {
        let next = match segment {
            Segment::Key(key) => current.get(*key),
            Segment::Index(index) => current.get(*index),
        };
        current = next.ok_or_else(|| {
            format!("`{}` does not resolve", describe(&segments[..=depth]))
        })?;
    }
    Ok(current)
}

fn describe(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Key(key) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(key);
            }
            Segment::Index(index) => out.push_str(&format!("[{index}]")),
        }
    }
    out
}

/// Numbers and numeric strings are accepted; anything non-finite is not.
fn as_percent(value: &Value) -> Option<f64> {
    let percent = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    percent.is_finite().then_some(percent)
}
