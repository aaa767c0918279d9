// src/cli.rs

//! Command-line handling.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::Parser;

use crate::error::SplashError;

/// A simple console splash screen which reads strings from a FIFO and prints
/// them to the screen, one at a time.
///
/// Write `exit` to the FIFO to close the splash screen.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "pipesplash", version)]
pub struct Cli {
    /// Existing named pipe to read status messages from.
    #[arg(value_name = "FIFO", value_parser = parse_fifo_path)]
    pub fifo: PathBuf,

    /// Caption drawn in the middle of the screen. Empty disables it.
    #[arg(value_name = "LOGO")]
    pub logo: Option<String>,
}

impl Cli {
    /// The caption, if one should be drawn.
    pub fn logo(&self) -> Option<&str> {
        self.logo.as_deref().filter(|logo| !logo.is_empty())
    }
}

/// What the command line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Run(Cli),
    /// Help or version output; print it and exit successfully.
    Info(String),
}

fn parse_fifo_path(value: &str) -> Result<PathBuf, String> {
    if value.is_empty() {
        Err("the FIFO path must not be empty".to_string())
    } else {
        Ok(PathBuf::from(value))
    }
}

/// Parses process arguments (including `argv[0]`).
///
/// Bad invocations come back as [`SplashError::Usage`] carrying the full
/// usage message.
pub fn parse_args<I, T>(args: I) -> Result<Invocation, SplashError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => Ok(Invocation::Run(cli)),
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                Ok(Invocation::Info(e.to_string()))
            }
            _ => Err(SplashError::Usage(e.to_string())),
        },
    }
}
