//! # Coverage Gate
//!
//! Guards CI against coverage regressions. Two reports are compared against a
//! stored baseline:
//!
//! - **Tarpaulin**: `target/coverage/tarpaulin-report.json`, top-level `coverage`
//! - **llvm-cov**: `target/coverage/llvm-summary.json`, `data[0].totals.lines.percent`
//!
//! Each tool gets a floor of `max(0, baseline - max_drop)`. The run fails when
//! either reading falls below its floor, listing every violation at once.
//!
//! ## Usage
//!
//! ```bash
//! cargo tarpaulin --out Json --output-dir target/coverage
//! cargo llvm-cov --json --summary-only --output-path target/coverage/llvm-summary.json
//! coverage_gate --root .
//! ```
//!
//! ## Environment Variables
//!
//! - `COVERAGE_OPTIONAL_TARPAULIN`: set to "1" to skip the Tarpaulin check and use its baseline
//! - `COVERAGE_GATE_ROOT`, `COVERAGE_TARPAULIN_REPORT`, `COVERAGE_LLVM_SUMMARY`,
//!   `COVERAGE_BASELINE`: path overrides
//! - `RUST_LOG`: log filter, logs are written to stderr

pub mod app;
pub mod baseline;
pub mod error;
pub mod output;
pub mod reports;
pub mod threshold;

pub use baseline::{load_baseline, BaselineConfig};
pub use error::{GateError, GateResult};
pub use reports::{read_llvm, read_tarpaulin, Tool};
pub use threshold::{enforce, evaluate, floor, GateReport, GateStatus, Measurement, ToolCheck};
