// src/surface/console.rs

//! A `DrawingSurface` for a plain Unix console, driven with ANSI escape codes.
//!
//! Initialization turns off input echo and canonical mode on the controlling
//! terminal (signal generation stays on so Ctrl-C still reaches the process),
//! switches to the alternate screen and hides the cursor. Every draw call is
//! buffered and only written out on `refresh`.

use std::io::{self, IsTerminal, Stdout, Write};
use std::mem;
use std::os::unix::io::RawFd;

use libc::{winsize, STDIN_FILENO, STDOUT_FILENO, TIOCGWINSZ};
use log::{debug, error, info, trace, warn};
use termios::{tcsetattr, Termios, ECHO, ICANON, TCSANOW};

use super::{fit_to_row, Dimensions, DrawingSurface, Position, SurfaceState};
use crate::error::SurfaceError;

// --- ANSI Escape Code Constants ---
const ALT_SCREEN_ENTER: &str = "\x1b[?1049h";
const ALT_SCREEN_LEAVE: &str = "\x1b[?1049l";
const CURSOR_HIDE: &str = "\x1b[?25l";
const CURSOR_SHOW: &str = "\x1b[?25h";
const CLEAR_SCREEN_AND_HOME: &str = "\x1b[2J\x1b[H";
const SGR_RESET_ALL: &str = "\x1b[0m";
const SGR_UNDERLINE: &str = "\x1b[4m";

/// Where the surface gets its terminal from.
#[derive(Debug, Clone, Copy)]
enum TerminalMode {
    /// The process's controlling terminal on stdin/stdout.
    Tty,
    /// No terminal attached; a fixed size and an arbitrary writer. Used by
    /// tests and for rendering into a capture buffer.
    Headless(Dimensions),
}

pub struct ConsoleSurface<W: Write> {
    out: W,
    mode: TerminalMode,
    /// Escape sequences and text queued since the last refresh.
    pending: Vec<u8>,
    original_termios: Option<Termios>,
    dimensions: Option<Dimensions>,
    underline: bool,
    state: SurfaceState,
}

impl ConsoleSurface<Stdout> {
    /// A surface bound to the process's terminal. Nothing is touched until
    /// [`DrawingSurface::initialize`] is called.
    pub fn new() -> Self {
        Self::with_mode(io::stdout(), TerminalMode::Tty)
    }
}

impl Default for ConsoleSurface<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> ConsoleSurface<W> {
    /// A surface that writes into `out` and pretends the terminal is
    /// `dimensions` large. Terminal attributes are never modified.
    pub fn headless(out: W, dimensions: Dimensions) -> Self {
        Self::with_mode(out, TerminalMode::Headless(dimensions))
    }

    fn with_mode(out: W, mode: TerminalMode) -> Self {
        Self {
            out,
            mode,
            pending: Vec::new(),
            original_termios: None,
            dimensions: None,
            underline: false,
            state: SurfaceState::Uninitialized,
        }
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    fn require_active(&self) -> Result<Dimensions, SurfaceError> {
        match (self.state, self.dimensions) {
            (SurfaceState::Active, Some(dims)) => Ok(dims),
            _ => Err(SurfaceError::NotActive),
        }
    }

    fn queue(&mut self, s: &str) {
        self.pending.extend_from_slice(s.as_bytes());
    }

    fn flush_pending(&mut self) -> Result<(), SurfaceError> {
        let result = self
            .out
            .write_all(&self.pending)
            .and_then(|()| self.out.flush());
        self.pending.clear();
        result.map_err(|source| SurfaceError::Terminal {
            op: "flush",
            source,
        })
    }

    fn enter_raw_mode(&mut self) -> Result<Dimensions, SurfaceError> {
        if !io::stdin().is_terminal() {
            return Err(SurfaceError::NotATerminal(io::Error::from_raw_os_error(
                libc::ENOTTY,
            )));
        }
        let original = Termios::from_fd(STDIN_FILENO).map_err(SurfaceError::NotATerminal)?;

        let mut quiet = original;
        quiet.c_lflag &= !(ECHO | ICANON);
        tcsetattr(STDIN_FILENO, TCSANOW, &quiet).map_err(|source| SurfaceError::Terminal {
            op: "tcsetattr",
            source,
        })?;
        self.original_termios = Some(original);
        debug!("ConsoleSurface: echo and canonical mode disabled.");

        match terminal_size_cells(STDOUT_FILENO) {
            Ok(dims) => Ok(dims),
            Err(source) => {
                if let Some(restore) = self.restore_termios() {
                    warn!("ConsoleSurface: failed to restore terminal attributes: {restore}");
                }
                Err(SurfaceError::Terminal {
                    op: "ioctl(TIOCGWINSZ)",
                    source,
                })
            }
        }
    }

    fn restore_termios(&mut self) -> Option<io::Error> {
        let original = self.original_termios.take()?;
        debug!("ConsoleSurface: restoring original terminal attributes.");
        tcsetattr(STDIN_FILENO, TCSANOW, &original).err()
    }
}

impl<W: Write> DrawingSurface for ConsoleSurface<W> {
    fn initialize(&mut self) -> Result<Dimensions, SurfaceError> {
        if self.state != SurfaceState::Uninitialized {
            return Err(SurfaceError::AlreadyInitialized);
        }

        let mode = self.mode;
        let dims = match mode {
            TerminalMode::Tty => self.enter_raw_mode()?,
            TerminalMode::Headless(dims) => dims.or_default_size(),
        };
        info!(
            "ConsoleSurface: terminal size {}x{} cells.",
            dims.width, dims.height
        );

        self.dimensions = Some(dims);
        self.state = SurfaceState::Active;

        self.queue(ALT_SCREEN_ENTER);
        self.queue(CURSOR_HIDE);
        self.queue(SGR_RESET_ALL);
        self.queue(CLEAR_SCREEN_AND_HOME);
        if let Err(e) = self.flush_pending() {
            if let Err(cleanup) = self.destroy() {
                warn!("ConsoleSurface: cleanup after failed init also failed: {cleanup}");
            }
            return Err(e);
        }
        Ok(dims)
    }

    fn draw_text(&mut self, position: Position, text: &str) -> Result<(), SurfaceError> {
        let dims = self.require_active()?;
        if text.is_empty() {
            return Err(SurfaceError::EmptyText);
        }
        dims.validate(position)?;

        let fitted = fit_to_row(text, position.x, dims.width);
        let mut cmd = format_cursor_position(position.y + 1, position.x + 1);
        cmd.push_str(SGR_RESET_ALL);
        if self.underline {
            cmd.push_str(SGR_UNDERLINE);
        }
        cmd.push_str(&fitted);
        trace!(
            "ConsoleSurface: draw at ({},{}) '{}' underline={}",
            position.x,
            position.y,
            fitted,
            self.underline
        );
        self.queue(&cmd);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), SurfaceError> {
        self.require_active()?;
        self.queue(CLEAR_SCREEN_AND_HOME);
        Ok(())
    }

    fn refresh(&mut self) -> Result<(), SurfaceError> {
        self.require_active()?;
        self.flush_pending()
    }

    fn set_emphasis(&mut self, enabled: bool) -> Result<(), SurfaceError> {
        self.require_active()?;
        self.underline = enabled;
        Ok(())
    }

    fn destroy(&mut self) -> Result<(), SurfaceError> {
        if self.state != SurfaceState::Active {
            trace!("ConsoleSurface: destroy on {:?} surface ignored.", self.state);
            return Ok(());
        }
        info!("ConsoleSurface: restoring terminal.");
        self.state = SurfaceState::Closed;
        self.underline = false;

        self.queue(SGR_RESET_ALL);
        self.queue(CLEAR_SCREEN_AND_HOME);
        self.queue(CURSOR_SHOW);
        self.queue(ALT_SCREEN_LEAVE);
        let flushed = self.flush_pending();

        if let Some(source) = self.restore_termios() {
            return Err(SurfaceError::Terminal {
                op: "tcsetattr",
                source,
            });
        }
        flushed
    }

    fn state(&self) -> SurfaceState {
        self.state
    }
}

impl<W: Write> Drop for ConsoleSurface<W> {
    fn drop(&mut self) {
        if let Err(e) = self.destroy() {
            error!("ConsoleSurface: error while restoring terminal in drop: {}", e);
        }
    }
}

fn format_cursor_position(row_1_based: i32, col_1_based: i32) -> String {
    format!("\x1b[{};{}H", row_1_based, col_1_based)
}

fn terminal_size_cells(fd: RawFd) -> io::Result<Dimensions> {
    // SAFETY: TIOCGWINSZ only writes into the zeroed winsize we pass.
    let winsz = unsafe {
        let mut winsz: winsize = mem::zeroed();
        if libc::ioctl(fd, TIOCGWINSZ, &mut winsz) == -1 {
            return Err(io::Error::last_os_error());
        }
        winsz
    };
    Ok(Dimensions {
        width: winsz.ws_col,
        height: winsz.ws_row,
    }
    .or_default_size())
}
