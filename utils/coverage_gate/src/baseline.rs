//! Baseline configuration loading.
//!
//! The baseline lives in a small TOML file at the workspace root:
//!
//! ```toml
//! [baseline]
//! tarpaulin_line = 80.0
//! llvm_line = 75.0
//!
//! [threshold]
//! max_drop = 2.0
//! ```
//!
//! Values may be written as floats, integers, or numeric strings.

use std::{fs, io, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GateError, GateResult};
use crate::reports::Tool;

/// Last-known-good coverage plus the tolerated drop, in percentage points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BaselineConfig {
    pub tarpaulin_line: f64,
    pub llvm_line: f64,
    pub max_drop: f64,
}

impl BaselineConfig {
    pub fn baseline_for(&self, tool: Tool) -> f64 {
        match tool {
            Tool::Tarpaulin => self.tarpaulin_line,
            Tool::Llvm => self.llvm_line,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BaselineFile {
    baseline: BaselineSection,
    threshold: ThresholdSection,
}

#[derive(Debug, Deserialize)]
struct BaselineSection {
    tarpaulin_line: Percent,
    llvm_line: Percent,
}

#[derive(Debug, Deserialize)]
struct ThresholdSection {
    max_drop: Percent,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Percent {
    Number(f64),
    Text(String),
}

impl Percent {
    fn resolve(&self, key: &str) -> GateResult<f64> {
        let value = match self {
            Percent::Number(value) => *value,
            Percent::Text(text) => text.trim().parse::<f64>().map_err(|_| {
                GateError::invalid_baseline(format!("`{key}` is not a number: {text:?}"))
            })?,
        };

        if !value.is_finite() {
            return Err(GateError::invalid_baseline(format!(
                "`{key}` must be finite, got {value}"
            )));
        }
        if value < 0.0 {
            return Err(GateError::invalid_baseline(format!(
                "`{key}` must not be negative, got {value}"
            )));
        }
        Ok(value)
    }
}

impl FromStr for BaselineConfig {
    type Err = GateError;

    fn from_str(text: &str) -> GateResult<Self> {
        let file: BaselineFile =
            toml::from_str(text).map_err(|err| GateError::invalid_baseline(err.message()))?;

        Ok(Self {
            tarpaulin_line: file.baseline.tarpaulin_line.resolve("baseline.tarpaulin_line")?,
            llvm_line: file.baseline.llvm_line.resolve("baseline.llvm_line")?,
            max_drop: file.threshold.max_drop.resolve("threshold.max_drop")?,
        })
    }
}

/// Read the baseline file. A missing file is a configuration error, not an I/O error.
pub fn load_baseline(path: &Path) -> GateResult<BaselineConfig> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(GateError::baseline_missing(path));
        }
        Err(err) => return Err(GateError::io(path, err)),
    };

    let config: BaselineConfig = text.parse()?;
    debug!(
        path = %path.display(),
        tarpaulin_line = config.tarpaulin_line,
        llvm_line = config.llvm_line,
        max_drop = config.max_drop,
        "Loaded coverage baseline",
    );
    Ok(config)
}
