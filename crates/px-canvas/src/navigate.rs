//! Navigator — cursor jumps along color boundaries.
//!
//! `w`/`b`-style motions for pixels: scan the cursor's row away from the
//! cursor until the color changes, and land there in one step. Everything
//! works in logical-pixel columns; the caller translates the result into
//! terminal columns (two per pixel), which is what makes the on-screen
//! displacement always even — the cursor can never land on the trailing
//! half-cell of a pixel pair.

use crate::grid::PixelGrid;

/// Scan direction for a jump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Toward higher columns (right).
    Forward,
    /// Toward lower columns (left).
    Backward,
}

/// Find the jump target from `(row, col)` in `direction`.
///
/// The scan runs from the pixel next to the cursor up to the visible edge
/// of the row (`first_visible..=last_visible`, both in grid columns), and
/// stops at the first pixel whose color differs from the reference color.
/// No boundary before the edge means the edge itself is the target.
///
/// The reference is the cursor's own pixel — except scanning backward when
/// the immediately adjacent pixel already differs, where that adjacent
/// pixel becomes the reference instead. Without that adjustment a backward
/// jump from the first pixel after a boundary would trivially land one
/// step away; with it, the scan crosses the whole neighboring run.
///
/// A cursor outside the grid has no color to compare against; the cursor
/// stays put.
#[must_use]
pub fn jump(
    grid: &PixelGrid,
    row: usize,
    col: usize,
    direction: Direction,
    first_visible: usize,
    last_visible: usize,
) -> usize {
    let Some(cursor_color) = grid.get(row, col) else {
        return col;
    };

    match direction {
        Direction::Forward => {
            if col >= last_visible {
                return col;
            }
            for c in (col + 1)..=last_visible {
                if grid.get(row, c) != Some(cursor_color) {
                    return c;
                }
            }
            last_visible
        }
        Direction::Backward => {
            if col <= first_visible {
                return col;
            }
            let reference = match grid.get(row, col - 1) {
                Some(adjacent) if adjacent != cursor_color => adjacent,
                _ => cursor_color,
            };
            for c in (first_visible..col).rev() {
                if grid.get(row, c) != Some(reference) {
                    return c;
                }
            }
            first_visible
        }
    }
}

/// Terminal-column displacement for a pixel-column move.
///
/// Two cells per pixel, so this is always even.
#[must_use]
#[allow(clippy::cast_possible_wrap)] // Pixel columns are far below isize::MAX.
pub const fn column_delta(from: usize, to: usize) -> isize {
    (to as isize - from as isize) * 2
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use pretty_assertions::assert_eq;

    const A: Color = Color::new(255, 0, 0);
    const B: Color = Color::new(0, 0, 0);
    const C: Color = Color::new(0, 255, 0);

    /// Build a one-row grid from a color sequence.
    fn row(colors: &[Color]) -> PixelGrid {
        PixelGrid::from_rows(vec![colors.to_vec()]).unwrap()
    }

    // -- forward ------------------------------------------------------------

    #[test]
    fn forward_lands_on_first_differing_pixel() {
        // Red at 0, black elsewhere.
        let g = row(&[A, B, B, B]);
        assert_eq!(jump(&g, 0, 0, Direction::Forward, 0, 3), 1);
    }

    #[test]
    fn forward_skips_the_cursor_run() {
        let g = row(&[A, A, A, B, B]);
        assert_eq!(jump(&g, 0, 0, Direction::Forward, 0, 4), 3);
    }

    #[test]
    fn forward_without_boundary_lands_on_edge() {
        let g = row(&[B, B, B, B]);
        assert_eq!(jump(&g, 0, 0, Direction::Forward, 0, 3), 3);
    }

    #[test]
    fn forward_stops_at_visible_edge() {
        // A boundary exists at column 5, but the view ends at 3.
        let g = row(&[B, B, B, B, B, A]);
        assert_eq!(jump(&g, 0, 0, Direction::Forward, 0, 3), 3);
    }

    #[test]
    fn forward_at_edge_stays() {
        let g = row(&[B, A, B]);
        assert_eq!(jump(&g, 0, 2, Direction::Forward, 0, 2), 2);
    }

    // -- backward -----------------------------------------------------------

    #[test]
    fn backward_same_colored_neighbor_uses_cursor_reference() {
        // [B, B, A, A, A], cursor at 4: the run of A ends at 1.
        let g = row(&[B, B, A, A, A]);
        assert_eq!(jump(&g, 0, 4, Direction::Backward, 0, 4), 1);
    }

    #[test]
    fn backward_differing_neighbor_becomes_the_reference() {
        // [C, B, B, B, A], cursor at 4. The adjacent pixel (B) already
        // differs, so B is the reference and the scan crosses the whole
        // B run instead of trivially stopping at column 3.
        let g = row(&[C, B, B, B, A]);
        assert_eq!(jump(&g, 0, 4, Direction::Backward, 0, 4), 0);
    }

    #[test]
    fn backward_without_boundary_lands_on_edge() {
        let g = row(&[A, A, A, A]);
        assert_eq!(jump(&g, 0, 3, Direction::Backward, 0, 3), 0);
    }

    #[test]
    fn backward_respects_first_visible() {
        // Scrolled view: columns 2..=5 visible, boundary further left.
        let g = row(&[C, C, B, B, B, A]);
        assert_eq!(jump(&g, 0, 5, Direction::Backward, 2, 5), 2);
    }

    #[test]
    fn backward_at_edge_stays() {
        let g = row(&[A, B]);
        assert_eq!(jump(&g, 0, 0, Direction::Backward, 0, 1), 0);
    }

    // -- degenerate cursors -------------------------------------------------

    #[test]
    fn cursor_outside_grid_stays_put() {
        let g = row(&[A, B]);
        assert_eq!(jump(&g, 3, 0, Direction::Forward, 0, 1), 0);
        assert_eq!(jump(&g, 0, 9, Direction::Backward, 0, 1), 9);
    }

    // -- displacement -------------------------------------------------------

    #[test]
    fn column_delta_is_always_even() {
        for (from, to) in [(0, 1), (0, 3), (4, 1), (7, 7), (2, 9)] {
            let d = column_delta(from, to);
            assert_eq!(d % 2, 0, "{from} -> {to} gave {d}");
        }
    }

    #[test]
    fn column_delta_signs() {
        assert_eq!(column_delta(0, 3), 6);
        assert_eq!(column_delta(3, 0), -6);
        assert_eq!(column_delta(5, 5), 0);
    }
}
