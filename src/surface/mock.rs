// src/surface/mock.rs

use super::{Dimensions, DrawingSurface, Position, SurfaceState};
use crate::error::SurfaceError;

/// One recorded surface call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceOp {
    Clear,
    Draw {
        position: Position,
        text: String,
        emphasis: bool,
    },
    Emphasis(bool),
    Refresh,
    Destroy,
}

/// In-memory surface that records every call, with the same state checks as
/// the console surface.
pub struct MockSurface {
    dimensions: Dimensions,
    state: SurfaceState,
    emphasis: bool,
    ops: Vec<SurfaceOp>,
    fail_initialize: bool,
}

impl MockSurface {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            dimensions: Dimensions { width, height },
            state: SurfaceState::Uninitialized,
            emphasis: false,
            ops: Vec::new(),
            fail_initialize: false,
        }
    }

    /// A surface whose `initialize` fails as if no terminal were attached.
    pub fn without_terminal() -> Self {
        Self {
            fail_initialize: true,
            ..Self::new(80, 24)
        }
    }

    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    /// Text of every draw call, in order.
    pub fn drawn_text(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                SurfaceOp::Draw { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn refresh_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, SurfaceOp::Refresh))
            .count()
    }

    fn require_active(&self) -> Result<(), SurfaceError> {
        if self.state == SurfaceState::Active {
            Ok(())
        } else {
            Err(SurfaceError::NotActive)
        }
    }
}

impl DrawingSurface for MockSurface {
    fn initialize(&mut self) -> Result<Dimensions, SurfaceError> {
        if self.state != SurfaceState::Uninitialized {
            return Err(SurfaceError::AlreadyInitialized);
        }
        if self.fail_initialize {
            return Err(SurfaceError::NotATerminal(std::io::Error::from_raw_os_error(
                libc::ENOTTY,
            )));
        }
        self.state = SurfaceState::Active;
        Ok(self.dimensions)
    }

    fn draw_text(&mut self, position: Position, text: &str) -> Result<(), SurfaceError> {
        self.require_active()?;
        if text.is_empty() {
            return Err(SurfaceError::EmptyText);
        }
        self.dimensions.validate(position)?;
        self.ops.push(SurfaceOp::Draw {
            position,
            text: text.to_string(),
            emphasis: self.emphasis,
        });
        Ok(())
    }

    fn clear(&mut self) -> Result<(), SurfaceError> {
        self.require_active()?;
        self.ops.push(SurfaceOp::Clear);
        Ok(())
    }

    fn refresh(&mut self) -> Result<(), SurfaceError> {
        self.require_active()?;
        self.ops.push(SurfaceOp::Refresh);
        Ok(())
    }

    fn set_emphasis(&mut self, enabled: bool) -> Result<(), SurfaceError> {
        self.require_active()?;
        self.emphasis = enabled;
        self.ops.push(SurfaceOp::Emphasis(enabled));
        Ok(())
    }

    fn destroy(&mut self) -> Result<(), SurfaceError> {
        if self.state != SurfaceState::Active {
            return Ok(());
        }
        self.state = SurfaceState::Closed;
        self.ops.push(SurfaceOp::Destroy);
        Ok(())
    }

    fn state(&self) -> SurfaceState {
        self.state
    }
}
