//! Logging setup for the `hirex` binary.
//!
//! The log file lives at `<data dir>/hirex/hirex.log`.

use log::LevelFilter;

use super::cli::Cli;
use super::config::default_log_path;

pub fn initialize(cli: &Cli) {
    engine_logging::initialize(cli.log.into(), level_for(cli.verbose), &default_log_path());
}

fn level_for(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}
