//! Editor state — one explicit aggregate, no ambient globals.
//!
//! Everything a command needs to run lives in [`EditorState`]: the grid,
//! the viewport offsets, the palette, the transparency sentinel, the
//! optional selection anchor, and the current drawing color. Operations
//! take `&mut EditorState` (plus the cursor position, which belongs to the
//! terminal, not to us), so a unit test constructs a state value and calls
//! them — no setup beyond that.

use px_term::terminal::Size;

use crate::color::{Color, SYSTEM_COLORS};
use crate::grid::PixelGrid;

// ---------------------------------------------------------------------------
// Viewport
// ---------------------------------------------------------------------------

/// The top-left logical coordinate currently visible.
///
/// Offsets are clamped so the visible rectangle never ends up empty: an
/// offset may reach `dimension - 1` (one last row/column still showing)
/// but never beyond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    /// First visible logical column.
    pub x_offset: usize,
    /// First visible row.
    pub y_offset: usize,
}

impl Viewport {
    /// Scroll one pixel left (decrease the x offset).
    pub fn scroll_left(&mut self) {
        self.x_offset = self.x_offset.saturating_sub(1);
    }

    /// Scroll one pixel right, clamped so at least one column stays visible.
    pub fn scroll_right(&mut self, grid_width: usize) {
        if self.x_offset + 1 < grid_width {
            self.x_offset += 1;
        }
    }

    /// Scroll one row up (decrease the y offset).
    pub fn scroll_up(&mut self) {
        self.y_offset = self.y_offset.saturating_sub(1);
    }

    /// Scroll one row down, clamped so at least one row stays visible.
    pub fn scroll_down(&mut self, grid_height: usize) {
        if self.y_offset + 1 < grid_height {
            self.y_offset += 1;
        }
    }

    /// Force the offsets back inside the grid (after a resize or load).
    pub fn clamp_to(&mut self, grid_width: usize, grid_height: usize) {
        self.x_offset = self.x_offset.min(grid_width.saturating_sub(1));
        self.y_offset = self.y_offset.min(grid_height.saturating_sub(1));
    }
}

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

/// Digit keys 0–9 mapped to colors.
///
/// Read by the color-select commands, written by pipette-save and by the
/// config file before the session starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    slots: [Color; 10],
}

impl Palette {
    /// The color in `slot`, or `None` for a slot outside 0–9.
    #[inline]
    #[must_use]
    pub fn get(&self, slot: u8) -> Option<Color> {
        self.slots.get(usize::from(slot)).copied()
    }

    /// Store `color` in `slot`. Returns `false` (and stores nothing) for a
    /// slot outside 0–9.
    pub fn set(&mut self, slot: u8, color: Color) -> bool {
        match self.slots.get_mut(usize::from(slot)) {
            Some(s) => {
                *s = color;
                true
            }
            None => false,
        }
    }
}

impl Default for Palette {
    /// The xterm system colors for the ten digit keys.
    fn default() -> Self {
        Self {
            slots: SYSTEM_COLORS,
        }
    }
}

// ---------------------------------------------------------------------------
// EditorState
// ---------------------------------------------------------------------------

/// The whole editing session in one value.
pub struct EditorState {
    /// The image being edited.
    pub grid: PixelGrid,
    /// Scroll offsets into the image.
    pub viewport: Viewport,
    /// Digit-key color slots.
    pub palette: Palette,
    /// The reserved "no content" color. Cells holding exactly this value
    /// are written with alpha 0 on save.
    pub transparency: Color,
    /// Selection anchor in grid coordinates, if a selection is active.
    pub selection: Option<(usize, usize)>,
    /// The color the next fill paints with.
    pub current_color: Color,
}

impl EditorState {
    /// Wrap a grid with default palette and viewport. The current color
    /// starts at palette slot 0, like the original editor.
    #[must_use]
    pub fn new(grid: PixelGrid, transparency: Color) -> Self {
        let palette = Palette::default();
        let current_color = palette.get(0).unwrap_or(Color::BLACK);
        Self {
            grid,
            viewport: Viewport::default(),
            palette,
            transparency,
            selection: None,
            current_color,
        }
    }

    /// Number of logical pixel columns actually visible: bounded by both
    /// the grid (minus the scroll offset) and the terminal width (two
    /// cells per pixel).
    #[must_use]
    pub fn visible_cols(&self, size: Size) -> usize {
        let from_grid = self.grid.width().saturating_sub(self.viewport.x_offset);
        from_grid.min(usize::from(size.cols) / 2)
    }

    /// Number of rows actually visible.
    #[must_use]
    pub fn visible_rows(&self, size: Size) -> usize {
        let from_grid = self.grid.height().saturating_sub(self.viewport.y_offset);
        from_grid.min(usize::from(size.rows))
    }

    /// Translate a terminal cursor position to grid coordinates.
    ///
    /// The screen x is halved (two cells per logical pixel) and both axes
    /// are shifted by the viewport. The result may lie outside the grid —
    /// the cursor roams the whole terminal; bounds policy belongs to the
    /// drawing commands.
    #[must_use]
    pub fn cursor_to_pixel(&self, x: u16, y: u16) -> (usize, usize) {
        (
            self.viewport.y_offset + usize::from(y),
            self.viewport.x_offset + usize::from(x) / 2,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
