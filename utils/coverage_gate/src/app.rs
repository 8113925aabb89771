use std::{
    env,
    io::Write,
    path::{Path, PathBuf},
};

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::{
    baseline::{load_baseline, BaselineConfig},
    error::GateResult,
    output::{self, OutputFormat},
    reports::{read_llvm, read_tarpaulin},
    threshold::{enforce, GateReport, Measurement},
};

pub const OPTIONAL_TARPAULIN_ENV: &str = "COVERAGE_OPTIONAL_TARPAULIN";

pub const DEFAULT_TARPAULIN_REPORT: &str = "target/coverage/tarpaulin-report.json";
pub const DEFAULT_LLVM_SUMMARY: &str = "target/coverage/llvm-summary.json";
pub const DEFAULT_BASELINE: &str = "coverage_baseline.toml";

pub const EXIT_OK: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "coverage_gate",
    author,
    version,
    about = "Fail CI when line coverage drops below the stored baseline",
    long_about = None
)]
pub struct Args {
    /// Workspace root that default and relative paths are resolved against
    #[arg(long, value_name = "PATH", env = "COVERAGE_GATE_ROOT", default_value = ".")]
    pub root: PathBuf,

    /// Tarpaulin JSON report [default: <root>/target/coverage/tarpaulin-report.json]
    #[arg(long, value_name = "PATH", env = "COVERAGE_TARPAULIN_REPORT")]
    pub tarpaulin_report: Option<PathBuf>,

    /// llvm-cov JSON summary [default: <root>/target/coverage/llvm-summary.json]
    #[arg(long, value_name = "PATH", env = "COVERAGE_LLVM_SUMMARY")]
    pub llvm_summary: Option<PathBuf>,

    /// Baseline TOML file [default: <root>/coverage_baseline.toml]
    #[arg(long, value_name = "PATH", env = "COVERAGE_BASELINE")]
    pub baseline: Option<PathBuf>,

    /// Skip the Tarpaulin check and use its baseline (same as COVERAGE_OPTIONAL_TARPAULIN=1)
    #[arg(long)]
    pub optional_tarpaulin: bool,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Debug, Clone)]
pub struct GateConfig {
    pub tarpaulin_report: PathBuf,
    pub llvm_summary: PathBuf,
    pub baseline: PathBuf,
    pub optional_tarpaulin: bool,
    pub format: OutputFormat,
}

impl From<Args> for GateConfig {
    fn from(value: Args) -> Self {
        let optional_env = env::var(OPTIONAL_TARPAULIN_ENV).ok();
        Self {
            tarpaulin_report: resolve_path(
                &value.root,
                value.tarpaulin_report,
                DEFAULT_TARPAULIN_REPORT,
            ),
            llvm_summary: resolve_path(&value.root, value.llvm_summary, DEFAULT_LLVM_SUMMARY),
            baseline: resolve_path(&value.root, value.baseline, DEFAULT_BASELINE),
            optional_tarpaulin: value.optional_tarpaulin
                || optional_flag_enabled(optional_env.as_deref()),
            format: value.format,
        }
    }
}

/// Only the literal `"1"` turns the optional flag on.
pub fn optional_flag_enabled(value: Option<&str>) -> bool {
    value == Some("1")
}

fn resolve_path(root: &Path, explicit: Option<PathBuf>, default: &str) -> PathBuf {
    match explicit {
        Some(path) if path.is_absolute() => path,
        Some(path) => root.join(path),
        None => root.join(default),
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Load the baseline, read both reports, and enforce the floors.
///
/// The baseline is loaded first so a broken configuration fails before any
/// report is touched.
pub fn run(config: &GateConfig) -> GateResult<GateReport> {
    let baseline = load_baseline(&config.baseline)?;
    let tarpaulin = measure_tarpaulin(config, &baseline)?;
    let llvm = Measurement::measured(read_llvm(&config.llvm_summary)?);

    enforce(tarpaulin, llvm, &baseline)
}

/// Under the optional flag the Tarpaulin report is never opened.
fn measure_tarpaulin(config: &GateConfig, baseline: &BaselineConfig) -> GateResult<Measurement> {
    if config.optional_tarpaulin {
        info!(
            path = %config.tarpaulin_report.display(),
            substitute = baseline.tarpaulin_line,
            "Tarpaulin optional; substituting baseline",
        );
        return Ok(Measurement::skipped(baseline.tarpaulin_line));
    }

    read_tarpaulin(&config.tarpaulin_report).map(Measurement::measured)
}

/// Run the gate and write its result, returning the process exit code.
pub fn execute<W: Write, E: Write>(config: &GateConfig, out: &mut W, err_out: &mut E) -> u8 {
    debug!(
        tarpaulin_report = %config.tarpaulin_report.display(),
        llvm_summary = %config.llvm_summary.display(),
        baseline = %config.baseline.display(),
        optional_tarpaulin = config.optional_tarpaulin,
        "Starting coverage gate",
    );

    let written = match run(config) {
        Ok(report) => {
            info!("Coverage gate passed");
            output::write_success(out, &report, config.format).map(|()| EXIT_OK)
        }
        Err(gate_error) => {
            debug!(error = %gate_error, "Coverage gate failed");
            output::write_failure(out, err_out, &gate_error, config.format).map(|()| EXIT_FAILURE)
        }
    };

    written.unwrap_or_else(|write_error| {
        let _ = writeln!(err_out, "{}{write_error:#}", output::FAILURE_PREFIX);
        EXIT_FAILURE
    })
}
