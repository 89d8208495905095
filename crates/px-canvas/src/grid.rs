//! `PixelGrid` — the authoritative image buffer.
//!
//! A dense row-major mapping from `(row, col)` to [`Color`]. Every cell
//! always holds a defined color (a blank grid is filled with the
//! transparency sentinel, not left undefined), and the dimensions are fixed
//! for the grid's lifetime.
//!
//! Coordinates are **logical pixels**: the renderer turns one of them into
//! two adjacent terminal cells, but that is strictly a presentation concern
//! — nothing in here knows about escape sequences or cell pairs.
//!
//! Out-of-range access is an error value, never a panic and never a
//! mutation. Drawing commands treat that error as a silent no-op; the grid
//! itself just reports it.

use std::fmt;

use crate::color::Color;

// ---------------------------------------------------------------------------
// OutOfBounds
// ---------------------------------------------------------------------------

/// A coordinate fell outside the grid. Non-fatal by policy: drawing
/// commands absorb it without surfacing anything to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfBounds {
    pub row: usize,
    pub col: usize,
}

impl fmt::Display for OutOfBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pixel ({}, {}) is outside the image", self.row, self.col)
    }
}

impl std::error::Error for OutOfBounds {}

// ---------------------------------------------------------------------------
// PixelGrid
// ---------------------------------------------------------------------------

/// The in-memory image: `width × height` logical pixels, row-major.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: usize,
    height: usize,
    cells: Vec<Color>,
}

impl PixelGrid {
    /// Create a grid with every cell set to `fill`.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if either dimension is zero. Callers that
    /// take dimensions from the outside world (codec, size prompt) must
    /// validate before constructing.
    #[must_use]
    pub fn new(width: usize, height: usize, fill: Color) -> Self {
        debug_assert!(width > 0 && height > 0, "grid dimensions must be nonzero");
        Self {
            width,
            height,
            cells: vec![fill; width * height],
        }
    }

    /// Build a grid by taking ownership of decoded pixel rows.
    ///
    /// This is the codec's entry point: the loader produces owned rows and
    /// moves them in, so decoded data has exactly one owner at every step.
    /// Returns `None` if there are no rows, a row is empty, or the rows
    /// have uneven lengths.
    #[must_use]
    pub fn from_rows(rows: Vec<Vec<Color>>) -> Option<Self> {
        let height = rows.len();
        let width = rows.first()?.len();
        if width == 0 || rows.iter().any(|r| r.len() != width) {
            return None;
        }

        let mut cells = Vec::with_capacity(width * height);
        for row in rows {
            cells.extend(row);
        }
        Some(Self {
            width,
            height,
            cells,
        })
    }

    /// Width in logical pixels.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Height in rows.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// The color at `(row, col)`, or `None` out of range. O(1).
    #[inline]
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<Color> {
        if row < self.height && col < self.width {
            Some(self.cells[row * self.width + col])
        } else {
            None
        }
    }

    /// Set the color at `(row, col)`. O(1). Out-of-range coordinates are
    /// rejected without any mutation.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfBounds`] if the coordinate is outside the grid.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, color: Color) -> Result<(), OutOfBounds> {
        if row < self.height && col < self.width {
            self.cells[row * self.width + col] = color;
            Ok(())
        } else {
            Err(OutOfBounds { row, col })
        }
    }

    /// Overwrite every cell with `color`.
    pub fn fill_all(&mut self, color: Color) {
        self.cells.fill(color);
    }

    /// One full row of pixels, or `None` out of range.
    #[inline]
    #[must_use]
    pub fn row(&self, row: usize) -> Option<&[Color]> {
        if row < self.height {
            let start = row * self.width;
            Some(&self.cells[start..start + self.width])
        } else {
            None
        }
    }
}

impl fmt::Debug for PixelGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PixelGrid({}x{})", self.width, self.height)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const T: Color = Color::BLACK;
    const RED: Color = Color::new(255, 0, 0);

    #[test]
    fn new_grid_is_fully_defined() {
        let g = PixelGrid::new(4, 3, T);
        for row in 0..3 {
            for col in 0..4 {
                assert_eq!(g.get(row, col), Some(T));
            }
        }
    }

    #[test]
    fn set_then_get() {
        let mut g = PixelGrid::new(4, 2, T);
        g.set(1, 3, RED).unwrap();
        assert_eq!(g.get(1, 3), Some(RED));
        assert_eq!(g.get(1, 2), Some(T));
    }

    #[test]
    fn get_out_of_range_is_none() {
        let g = PixelGrid::new(4, 2, T);
        assert_eq!(g.get(2, 0), None);
        assert_eq!(g.get(0, 4), None);
        assert_eq!(g.get(usize::MAX, usize::MAX), None);
    }

    #[test]
    fn set_out_of_range_rejects_without_mutation() {
        let mut g = PixelGrid::new(4, 2, T);
        let before = g.clone();

        assert_eq!(g.set(2, 0, RED), Err(OutOfBounds { row: 2, col: 0 }));
        assert_eq!(g.set(0, 4, RED), Err(OutOfBounds { row: 0, col: 4 }));
        assert_eq!(g, before);
    }

    #[test]
    fn fill_all_overwrites_every_cell() {
        let mut g = PixelGrid::new(3, 3, T);
        g.set(1, 1, RED).unwrap();
        g.fill_all(RED);
        for row in 0..3 {
            for col in 0..3 {
                assert_eq!(g.get(row, col), Some(RED));
            }
        }
    }

    #[test]
    fn row_slices_are_row_major() {
        let mut g = PixelGrid::new(2, 2, T);
        g.set(0, 1, RED).unwrap();
        assert_eq!(g.row(0), Some(&[T, RED][..]));
        assert_eq!(g.row(1), Some(&[T, T][..]));
        assert_eq!(g.row(2), None);
    }

    #[test]
    fn from_rows_takes_ownership() {
        let rows = vec![vec![T, RED], vec![RED, T]];
        let g = PixelGrid::from_rows(rows).unwrap();
        assert_eq!(g.width(), 2);
        assert_eq!(g.height(), 2);
        assert_eq!(g.get(0, 1), Some(RED));
        assert_eq!(g.get(1, 0), Some(RED));
    }

    #[test]
    fn from_rows_rejects_empty_and_ragged() {
        assert!(PixelGrid::from_rows(vec![]).is_none());
        assert!(PixelGrid::from_rows(vec![vec![]]).is_none());
        assert!(PixelGrid::from_rows(vec![vec![T, T], vec![T]]).is_none());
    }

    #[test]
    fn dimensions_are_fixed() {
        let g = PixelGrid::new(7, 5, T);
        assert_eq!(g.width(), 7);
        assert_eq!(g.height(), 5);
    }
}
