// src/error.rs

//! Error taxonomy for pipesplash.
//!
//! Each component reports failures through its own error enum. `SplashError`
//! unifies them at the render-loop boundary and maps every variant onto a
//! distinct process exit status so a supervising init script can tell the
//! causes apart.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use thiserror::Error;

use crate::surface::{Dimensions, Position};

/// Process exit statuses. Values follow the `sysexits.h` range so they do not
/// collide with shell or signal-derived codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitStatus {
    /// The sentinel was received or an external termination was honoured.
    Success = 0,
    /// Invalid invocation.
    BadUsage = 64,
    /// Asynchronous notification could not be set up.
    Notification = 65,
    /// The pipe could not be opened or read.
    Channel = 66,
    /// The terminal could not be initialized or drawn to.
    Surface = 67,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status as u8)
    }
}

/// Errors raised by a [`crate::surface::DrawingSurface`].
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("standard input is not a terminal")]
    NotATerminal(#[source] io::Error),
    #[error("terminal operation '{op}' failed")]
    Terminal {
        op: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("refusing to draw empty text")]
    EmptyText,
    #[error("position ({}, {}) lies outside the {}x{} surface", .position.x, .position.y, .dimensions.width, .dimensions.height)]
    InvalidPosition {
        position: Position,
        dimensions: Dimensions,
    },
    #[error("drawing surface is not active")]
    NotActive,
    #[error("drawing surface was already initialized")]
    AlreadyInitialized,
}

/// Errors raised by a [`crate::os::fifo::PipeChannel`].
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("failed to open pipe {}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} is not a named pipe", .path.display())]
    NotAFifo { path: PathBuf },
    #[error("failed to read from pipe")]
    Read(#[source] io::Error),
    #[error("pipe channel is closed")]
    Closed,
}

/// Errors raised while registering for or waiting on notifications.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("failed to block the notification signal set")]
    Mask(#[source] nix::Error),
    #[error("failed to set the SIGIO disposition")]
    Disposition(#[source] nix::Error),
    #[error("failed to arm asynchronous I/O ({op})")]
    Arm {
        op: &'static str,
        #[source]
        source: nix::Error,
    },
    #[error("failed while waiting for a notification")]
    Wait(#[source] nix::Error),
}

/// Top-level error for a splash session.
#[derive(Debug, Error)]
pub enum SplashError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error(transparent)]
    Channel(#[from] ChannelError),
    #[error(transparent)]
    Notification(#[from] NotificationError),
}

impl SplashError {
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            SplashError::Usage(_) => ExitStatus::BadUsage,
            SplashError::Surface(_) => ExitStatus::Surface,
            SplashError::Channel(_) => ExitStatus::Channel,
            SplashError::Notification(_) => ExitStatus::Notification,
        }
    }
}
