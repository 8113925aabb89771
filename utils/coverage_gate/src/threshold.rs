//! Floor computation and enforcement.

use serde::Serialize;
use tracing::info;

use crate::baseline::BaselineConfig;
use crate::error::{GateError, GateResult};
use crate::reports::Tool;

/// Slack applied below the floor so float noise never fails a run.
pub const EPSILON: f64 = 1e-6;

/// Minimum acceptable coverage; never negative.
pub fn floor(baseline: f64, max_drop: f64) -> f64 {
    (baseline - max_drop).max(0.0)
}

/// A coverage value fed into enforcement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub current: f64,
    pub skipped: bool,
}

impl Measurement {
    pub fn measured(current: f64) -> Self {
        Self {
            current,
            skipped: false,
        }
    }

    /// Stand-in for a report that was allowed to be absent: the baseline
    /// itself, which can never fall below its own floor.
    pub fn skipped(baseline: f64) -> Self {
        Self {
            current: baseline,
            skipped: true,
        }
    }
}

/// Outcome of comparing one tool's reading against its floor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ToolCheck {
    pub tool: Tool,
    pub current: f64,
    pub baseline: f64,
    pub floor: f64,
    pub skipped: bool,
}

impl ToolCheck {
    pub fn new(tool: Tool, measurement: Measurement, baseline: f64, max_drop: f64) -> Self {
        Self {
            tool,
            current: measurement.current,
            baseline,
            floor: floor(baseline, max_drop),
            skipped: measurement.skipped,
        }
    }

    pub fn delta(&self) -> f64 {
        self.current - self.baseline
    }

    pub fn is_violation(&self) -> bool {
        self.current < self.floor - EPSILON
    }

    pub fn violation(&self) -> Option<String> {
        self.is_violation().then(|| {
            format!(
                "{} coverage {:.2}% (Δ {:+.2}%) below floor {:.2}%",
                self.tool,
                self.current,
                self.delta(),
                self.floor
            )
        })
    }

    fn summary(&self) -> String {
        format!(
            "{}: {:.2}% (baseline {:.2}%, floor {:.2}%{})",
            self.tool,
            self.current,
            self.baseline,
            self.floor,
            if self.skipped { ", skipped" } else { "" }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GateStatus {
    Ok,
    Regression,
}

/// Both checks plus every violation found, in tool order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateReport {
    pub status: GateStatus,
    pub max_drop: f64,
    pub tarpaulin: ToolCheck,
    pub llvm: ToolCheck,
    pub violations: Vec<String>,
}

impl GateReport {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn summary_line(&self) -> String {
        format!(
            "Coverage OK | {} | {}",
            self.tarpaulin.summary(),
            self.llvm.summary()
        )
    }
}

/// Compare both measurements against their floors without failing.
pub fn evaluate(
    tarpaulin: Measurement,
    llvm: Measurement,
    baseline: &BaselineConfig,
) -> GateReport {
    let tarpaulin = ToolCheck::new(
        Tool::Tarpaulin,
        tarpaulin,
        baseline.tarpaulin_line,
        baseline.max_drop,
    );
    let llvm = ToolCheck::new(Tool::Llvm, llvm, baseline.llvm_line, baseline.max_drop);

    let violations: Vec<String> = [&tarpaulin, &llvm]
        .iter()
        .filter_map(|check| check.violation())
        .collect();

    let status = if violations.is_empty() {
        GateStatus::Ok
    } else {
        GateStatus::Regression
    };

    GateReport {
        status,
        max_drop: baseline.max_drop,
        tarpaulin,
        llvm,
        violations,
    }
}

/// Like [`evaluate`], but any violation becomes [`GateError::ThresholdViolation`].
pub fn enforce(
    tarpaulin: Measurement,
    llvm: Measurement,
    baseline: &BaselineConfig,
) -> GateResult<GateReport> {
    let report = evaluate(tarpaulin, llvm, baseline);

    for check in [&report.tarpaulin, &report.llvm] {
        if check.is_violation() {
            info!(
                tool = %check.tool,
                current = check.current,
                floor = check.floor,
                delta = check.delta(),
                "Coverage below floor",
            );
        } else {
            info!(
                tool = %check.tool,
                current = check.current,
                floor = check.floor,
                skipped = check.skipped,
                "Coverage within tolerance",
            );
        }
    }

    if report.passed() {
        Ok(report)
    } else {
        Err(GateError::threshold_violation(report))
    }
}
