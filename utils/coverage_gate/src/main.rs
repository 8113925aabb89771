use std::io;
use std::process::ExitCode;

use clap::Parser;
use coverage_gate::app::{self, Args, GateConfig};

fn main() -> ExitCode {
    let args = Args::parse();
    app::init_tracing();
    let config = GateConfig::from(args);

    let code = app::execute(&config, &mut io::stdout().lock(), &mut io::stderr().lock());
    ExitCode::from(code)
}
