// src/render_loop.rs
//! Drives a splash session: drains the pipe whenever the notifier reports
//! activity and renders every message onto the drawing surface.
//!
//! The loop is a small state machine:
//!
//! ```text
//! Starting -> Draining -> Waiting -> Draining -> ... -> Terminating
//! ```
//!
//! `Draining` always reads until the channel reports `Empty`. Notifications
//! coalesce, so one wake-up may stand for any number of writes; draining to
//! empty is what guarantees nothing is left behind before the next wait.

use log::{debug, error, info, trace, warn};
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::error::SplashError;
use crate::message::Message;
use crate::os::fifo::{PipeChannel, ReadOutcome};
use crate::os::notify::{Event, Notifier};
use crate::surface::{Dimensions, DrawingSurface, Position};

/// Logo captions are measured up to this many cells when centering.
pub const MAX_LOGO_LENGTH: usize = 128;

/// How a session that did not fail came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOutcome {
    /// The exit sentinel was read from the pipe.
    ExitRequested,
    /// An interrupt or termination signal arrived.
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Starting,
    Draining,
    Waiting,
    Terminating,
}

/// The caption and where it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Logo {
    pub text: String,
    pub position: Position,
}

impl Logo {
    /// Centers `text` on a surface of `dimensions`. Returns `None` for an
    /// empty caption, which disables logo drawing altogether.
    pub fn centered(text: &str, dimensions: Dimensions) -> Option<Self> {
        if text.is_empty() {
            return None;
        }
        let length = text.width().min(MAX_LOGO_LENGTH);
        let x = usize::from(dimensions.width).saturating_sub(length) / 2;
        let y = dimensions.height / 2;
        Some(Self {
            text: text.to_string(),
            position: Position::new(x as i32, i32::from(y)),
        })
    }
}

/// Status line position: a fixed column, a fixed offset above the bottom edge.
pub fn status_position(config: &Config, dimensions: Dimensions) -> Position {
    Position::new(
        config.layout.status_column,
        i32::from(dimensions.height) - config.layout.status_bottom_offset,
    )
}

pub struct RenderLoop<'a> {
    surface: &'a mut dyn DrawingSurface,
    channel: &'a mut dyn PipeChannel,
    notifier: &'a mut dyn Notifier,
    config: &'a Config,
    caption: Option<String>,
    logo: Option<Logo>,
    status_position: Position,
    /// Surface size, recorded when the status line does not fit on it.
    off_screen_status: Option<Dimensions>,
    read_buffer: Vec<u8>,
    state: LoopState,
}

impl<'a> RenderLoop<'a> {
    pub fn new(
        surface: &'a mut dyn DrawingSurface,
        channel: &'a mut dyn PipeChannel,
        notifier: &'a mut dyn Notifier,
        caption: Option<&str>,
        config: &'a Config,
    ) -> Self {
        RenderLoop {
            surface,
            channel,
            notifier,
            config,
            caption: caption.filter(|c| !c.is_empty()).map(str::to_string),
            logo: None,
            status_position: Position::default(),
            off_screen_status: None,
            // The last byte is never filled, mirroring a NUL-terminated buffer.
            read_buffer: vec![0; config.pipe.buffer_size.saturating_sub(1).max(1)],
            state: LoopState::Starting,
        }
    }

    /// Runs the session to completion. The surface is destroyed and the
    /// channel closed on every exit path, including errors.
    pub fn run(&mut self) -> Result<LoopOutcome, SplashError> {
        let result = self.start().and_then(|()| self.serve());
        self.terminate();
        // Reported only once the console is restored; stderr is the splash.
        if let Some(dimensions) = self.off_screen_status {
            warn!(
                "RenderLoop: status position {:?} is off-screen for {}x{}.",
                self.status_position, dimensions.width, dimensions.height
            );
        }
        match &result {
            Ok(outcome) => info!("RenderLoop: session ended: {:?}.", outcome),
            Err(e) => debug!("RenderLoop: session failed: {}", e),
        }
        result
    }

    /// Position the status line is drawn at, fixed once the session starts.
    pub fn status_position(&self) -> Position {
        self.status_position
    }

    pub fn logo(&self) -> Option<&Logo> {
        self.logo.as_ref()
    }

    /// Whether the configured status line falls outside the surface.
    pub fn status_off_screen(&self) -> bool {
        self.off_screen_status.is_some()
    }

    fn start(&mut self) -> Result<(), SplashError> {
        debug_assert_eq!(self.state, LoopState::Starting);
        let dimensions = self.surface.initialize()?;
        info!(
            "RenderLoop: surface active at {}x{}.",
            dimensions.width, dimensions.height
        );

        self.logo = self
            .caption
            .as_deref()
            .and_then(|caption| Logo::centered(caption, dimensions));
        if let Some(logo) = &self.logo {
            debug!("RenderLoop: logo '{}' at {:?}.", logo.text, logo.position);
            self.surface.draw_text(logo.position, &logo.text)?;
            self.surface.refresh()?;
        }

        self.notifier.arm(&*self.channel)?;

        self.status_position = status_position(self.config, dimensions);
        if !dimensions.contains(self.status_position) {
            self.off_screen_status = Some(dimensions);
        }
        Ok(())
    }

    /// Alternates drains and waits. The first drain runs before any wait to
    /// pick up data written before notifications were armed.
    fn serve(&mut self) -> Result<LoopOutcome, SplashError> {
        loop {
            self.state = LoopState::Draining;
            if let Some(outcome) = self.drain()? {
                return Ok(outcome);
            }

            self.state = LoopState::Waiting;
            trace!("RenderLoop: waiting for notification.");
            match self.notifier.wait_for_event()? {
                Event::DataReady => trace!("RenderLoop: data ready."),
                Event::Terminate => {
                    info!("RenderLoop: termination requested.");
                    return Ok(LoopOutcome::Interrupted);
                }
            }
        }
    }

    /// Reads until the channel is empty. Returns `Some` once the sentinel is
    /// seen; anything queued behind it is left unread.
    fn drain(&mut self) -> Result<Option<LoopOutcome>, SplashError> {
        loop {
            let count = match self.channel.read_available(&mut self.read_buffer)? {
                ReadOutcome::Empty => return Ok(None),
                ReadOutcome::Data(count) => count,
            };
            let message = Message::from_read(&self.read_buffer[..count]);
            if message.is_sentinel(&self.config.pipe.exit_text) {
                info!("RenderLoop: exit message received.");
                return Ok(Some(LoopOutcome::ExitRequested));
            }
            self.render_status(&message)?;
        }
    }

    /// Replaces the status line with `message` and re-asserts the logo.
    fn render_status(&mut self, message: &Message) -> Result<(), SplashError> {
        self.surface.clear()?;

        let text = message.display_text();
        if text.is_empty() {
            debug!("RenderLoop: blank message clears the status line.");
        } else {
            debug!("RenderLoop: status '{}'.", text);
            self.surface.draw_text(self.status_position, &text)?;
        }

        if let Some(logo) = &self.logo {
            self.surface.set_emphasis(true)?;
            self.surface.draw_text(logo.position, &logo.text)?;
            self.surface.set_emphasis(false)?;
        }

        self.surface.refresh()?;
        Ok(())
    }

    fn terminate(&mut self) {
        self.state = LoopState::Terminating;
        if let Err(e) = self.surface.destroy() {
            error!("RenderLoop: failed to restore the terminal: {}", e);
        }
        self.channel.close();
    }
}
