mod cli;
mod commands;
mod report;

use std::process;
use std::str::FromStr;

use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::cli::Cli;

fn main() {
    let cli = Cli::parse();

    let log_level = LevelFilter::from_str(&cli.global.log_level).unwrap_or_else(|_| {
        eprintln!(
            "Invalid log level: {}. Using 'warn' instead.",
            cli.global.log_level
        );
        LevelFilter::Warn
    });
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();
    debug!(args:? = cli; "Parsed arguments");

    if let Err(err) = commands::run(cli) {
        report::report_error(&err);
        process::exit(1);
    }

    info!("Completed successfully");
}
