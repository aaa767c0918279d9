// src/main.rs

use std::fs::OpenOptions;
use std::process::ExitCode;

use log::{error, info, warn};

use pipesplash::cli::{self, Invocation};
use pipesplash::config::{Config, LoggingConfig};
use pipesplash::error::ExitStatus;

fn init_logging(logging: &LoggingConfig) -> Option<std::io::Error> {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(logging.filter.as_str()),
    );
    builder.format_timestamp_micros();

    let mut open_error = None;
    if let Some(path) = &logging.file {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => open_error = Some(e),
        }
    }
    builder.init();
    open_error
}

fn main() -> ExitCode {
    let cli = match cli::parse_args(std::env::args_os()) {
        Ok(Invocation::Run(cli)) => cli,
        Ok(Invocation::Info(text)) => {
            print!("{text}");
            return ExitStatus::Success.into();
        }
        Err(e) => {
            // Usage goes to stdout; stderr may be the console being splashed.
            print!("{e}");
            return e.exit_status().into();
        }
    };

    let (config, config_error) = match Config::load_from_env() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    if let Some(e) = init_logging(&config.logging) {
        warn!("Failed to open log file, logging to stderr: {}", e);
    }
    if let Some(e) = config_error {
        warn!("Using default configuration: {:#}", e);
    }

    info!("Starting pipesplash...");
    match pipesplash::run_splash(&cli, &config) {
        Ok(outcome) => {
            info!("pipesplash exited successfully ({:?}).", outcome);
            ExitStatus::Success.into()
        }
        Err(e) => {
            let status = e.exit_status();
            error!("pipesplash failed: {:#}", anyhow::Error::from(e));
            status.into()
        }
    }
}
