// src/surface/mod.rs

//! The drawing surface abstraction.
//!
//! A `DrawingSurface` owns the terminal canvas for the lifetime of a splash
//! session. The render loop talks to it exclusively through this trait so the
//! console implementation can be swapped for [`mock::MockSurface`] in tests.

pub mod console;
pub mod mock;

use crate::error::SurfaceError;

/// Fallback size used when the terminal reports zero rows or columns.
pub const DEFAULT_WIDTH_CELLS: u16 = 80;
pub const DEFAULT_HEIGHT_CELLS: u16 = 24;

/// A cell coordinate, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Terminal size in cells, sampled once at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u16,
    pub height: u16,
}

impl Dimensions {
    /// Substitutes the default size for any zero component.
    pub fn or_default_size(self) -> Self {
        Self {
            width: if self.width == 0 {
                DEFAULT_WIDTH_CELLS
            } else {
                self.width
            },
            height: if self.height == 0 {
                DEFAULT_HEIGHT_CELLS
            } else {
                self.height
            },
        }
    }

    pub fn contains(&self, position: Position) -> bool {
        position.x >= 0
            && position.y >= 0
            && position.x < i32::from(self.width)
            && position.y < i32::from(self.height)
    }

    /// Checks that `position` is drawable, producing the matching error if not.
    pub fn validate(&self, position: Position) -> Result<(), SurfaceError> {
        if self.contains(position) {
            Ok(())
        } else {
            Err(SurfaceError::InvalidPosition {
                position,
                dimensions: *self,
            })
        }
    }
}

/// Lifecycle of a surface. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceState {
    Uninitialized,
    Active,
    Closed,
}

/// Operations the render loop needs from a terminal canvas.
///
/// Draw, clear, refresh and emphasis calls are only valid while the surface
/// is [`SurfaceState::Active`]; implementations reject them otherwise with
/// [`SurfaceError::NotActive`].
pub trait DrawingSurface {
    /// Acquires the terminal and returns its size.
    fn initialize(&mut self) -> Result<Dimensions, SurfaceError>;

    /// Draws `text` starting at `position` without wrapping.
    fn draw_text(&mut self, position: Position, text: &str) -> Result<(), SurfaceError>;

    /// Erases the surface content.
    fn clear(&mut self) -> Result<(), SurfaceError>;

    /// Flushes buffered operations to the device.
    fn refresh(&mut self) -> Result<(), SurfaceError>;

    /// Toggles underlining for subsequently drawn text.
    fn set_emphasis(&mut self, enabled: bool) -> Result<(), SurfaceError>;

    /// Restores the terminal. A no-op unless the surface is active.
    fn destroy(&mut self) -> Result<(), SurfaceError>;

    fn state(&self) -> SurfaceState;
}

/// Prepares `text` for a single row starting at column `x`.
///
/// Control characters are replaced with spaces so the cursor cannot be moved
/// off the row, and the result is clipped to the cells left before the right
/// edge.
pub fn fit_to_row(text: &str, x: i32, width: u16) -> String {
    use unicode_width::UnicodeWidthChar;

    let available = usize::from(width).saturating_sub(x.max(0) as usize);
    let mut used = 0usize;
    let mut out = String::with_capacity(text.len().min(available * 4));
    for ch in text.chars() {
        let ch = if ch.is_control() { ' ' } else { ch };
        let cells = ch.width().unwrap_or(0);
        if used + cells > available {
            break;
        }
        used += cells;
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sized_terminal_falls_back_to_default() {
        let dims = Dimensions {
            width: 0,
            height: 0,
        }
        .or_default_size();
        assert_eq!(
            dims,
            Dimensions {
                width: DEFAULT_WIDTH_CELLS,
                height: DEFAULT_HEIGHT_CELLS
            }
        );
    }

    #[test]
    fn positions_outside_the_grid_are_rejected() {
        let dims = Dimensions {
            width: 10,
            height: 5,
        };
        assert!(dims.contains(Position::new(0, 0)));
        assert!(dims.contains(Position::new(9, 4)));
        assert!(!dims.contains(Position::new(10, 0)));
        assert!(!dims.contains(Position::new(0, 5)));
        assert!(!dims.contains(Position::new(-1, 2)));
        assert!(matches!(
            dims.validate(Position::new(3, 7)),
            Err(SurfaceError::InvalidPosition { .. })
        ));
    }

    #[test]
    fn fit_to_row_clips_at_right_edge() {
        assert_eq!(fit_to_row("abcdefgh", 6, 10), "abcd");
        assert_eq!(fit_to_row("abc", 0, 10), "abc");
    }

    #[test]
    fn fit_to_row_neutralises_control_characters() {
        assert_eq!(fit_to_row("a\nb\x1b[2Jc", 0, 80), "a b [2Jc");
    }

    #[test]
    fn fit_to_row_counts_wide_characters_as_two_cells() {
        assert_eq!(fit_to_row("日本語", 0, 5), "日本");
    }
}
