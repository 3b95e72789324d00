use std::process::ExitCode;

use clap::Parser;
use rasterpad::cli::{self, CliArgs};
use rasterpad::logger;

fn main() -> ExitCode {
    let args = CliArgs::parse();
    logger::init();
    if let Some(path) = logger::log_path() {
        rasterpad::log_info!("rasterpad {} started, log at {}", env!("CARGO_PKG_VERSION"), path.display());
    }
    cli::run(args)
}
