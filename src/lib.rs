// src/lib.rs

//! pipesplash: a console splash screen fed through a named pipe.
//!
//! A producer (typically a boot script) writes progress lines into a FIFO;
//! each read is drawn as the status line of a full-screen display until the
//! producer writes `exit`.

pub mod cli;
pub mod config;
pub mod error;
pub mod message;
pub mod os;
pub mod render_loop;
pub mod surface;

use log::info;

use crate::cli::Cli;
use crate::config::Config;
use crate::error::SplashError;
use crate::os::fifo::FifoChannel;
use crate::os::notify::SignalBridge;
use crate::render_loop::{LoopOutcome, RenderLoop};
use crate::surface::console::ConsoleSurface;

/// Runs a splash session on the real console, pipe and signals.
pub fn run_splash(cli: &Cli, config: &Config) -> Result<LoopOutcome, SplashError> {
    let mut channel = FifoChannel::open(&cli.fifo)?;
    let mut notifier = SignalBridge::new()?;
    let mut surface = ConsoleSurface::new();
    info!(
        "Splash session on {} (logo: {:?}).",
        channel.path().display(),
        cli.logo()
    );

    RenderLoop::new(
        &mut surface,
        &mut channel,
        &mut notifier,
        cli.logo(),
        config,
    )
    .run()
}
