//! Renderer — from colors to terminal bytes.
//!
//! This module owns the whole text-encoding policy: one logical pixel
//! becomes two adjacent character cells, each cell a truecolor background
//! SGR followed by one blank glyph. The grid stores abstract [`Color`]
//! values only; the mapping to display bytes happens here, at redraw time.
//!
//! Three redraw granularities, so the cost of an edit is proportional to
//! what it touched:
//!
//! - [`render_full`] — every visible row (startup, scroll, resize)
//! - [`render_row`] — one row (single-pixel fill)
//! - [`render_rows`] — a row span (rectangular fill)
//!
//! # The cursor invariant
//!
//! The terminal's visible cursor is the editing cursor, so a redraw must
//! never move it. Every function here queries the position first, builds
//! the whole frame in memory, appends a reposition back to where the
//! cursor was, and writes it all in one go. A failed position query aborts
//! the redraw before any byte reaches the screen.

use std::io;

use px_term::ansi;
use px_term::terminal::TermIo;

use crate::color::Color;
use crate::state::EditorState;

/// Append one logical pixel: two cells, each a background SGR + blank.
fn encode_pixel(buf: &mut Vec<u8>, color: Color) -> io::Result<()> {
    ansi::bg_rgb(buf, color.r, color.g, color.b)?;
    buf.push(b' ');
    ansi::bg_rgb(buf, color.r, color.g, color.b)?;
    buf.push(b' ');
    Ok(())
}

/// Append the visible span of one grid row (`cols` pixels starting at the
/// viewport's x offset).
fn encode_span(
    buf: &mut Vec<u8>,
    state: &EditorState,
    row: usize,
    cols: usize,
) -> io::Result<()> {
    // Rows handed in are pre-clipped; a miss here is a logic error, but we
    // degrade to emitting nothing rather than panicking mid-frame.
    let Some(pixels) = state.grid.row(row) else {
        return Ok(());
    };
    let x0 = state.viewport.x_offset;
    for &color in &pixels[x0..x0 + cols] {
        encode_pixel(buf, color)?;
    }
    Ok(())
}

/// Redraw every visible row, clipped to the viewport and terminal size.
///
/// Repositions to the screen origin, emits the rows top to bottom, and
/// ends with a single formatting reset.
///
/// # Errors
///
/// Returns an error if the cursor query or the terminal write fails.
pub fn render_full(state: &EditorState, io: &mut impl TermIo) -> io::Result<()> {
    let size = io.size();
    let rows = state.visible_rows(size);
    let cols = state.visible_cols(size);
    if rows == 0 || cols == 0 {
        return Ok(());
    }

    let (cx, cy) = io.cursor_position()?;

    let mut buf = Vec::with_capacity(rows * cols * 40);
    for screen_row in 0..rows {
        #[allow(clippy::cast_possible_truncation)] // Bounded by terminal rows.
        ansi::cursor_to(&mut buf, 0, screen_row as u16)?;
        encode_span(&mut buf, state, state.viewport.y_offset + screen_row, cols)?;
    }
    ansi::reset(&mut buf)?;
    ansi::cursor_to(&mut buf, cx, cy)?;

    io.write_all(&buf)?;
    io.flush()
}

/// Redraw a single grid row if it is visible, clearing the screen line
/// first. Rows outside the viewport are a complete no-op.
///
/// # Errors
///
/// Returns an error if the cursor query or the terminal write fails.
pub fn render_row(state: &EditorState, row: usize, io: &mut impl TermIo) -> io::Result<()> {
    let size = io.size();
    let cols = state.visible_cols(size);
    let y0 = state.viewport.y_offset;
    if cols == 0 || row < y0 || row >= y0 + state.visible_rows(size) {
        return Ok(());
    }

    let (cx, cy) = io.cursor_position()?;

    let mut buf = Vec::with_capacity(cols * 40);
    #[allow(clippy::cast_possible_truncation)] // Bounded by terminal rows.
    ansi::cursor_to(&mut buf, 0, (row - y0) as u16)?;
    ansi::clear_line(&mut buf)?;
    encode_span(&mut buf, state, row, cols)?;
    ansi::reset(&mut buf)?;
    ansi::cursor_to(&mut buf, cx, cy)?;

    io.write_all(&buf)?;
    io.flush()
}

/// Redraw the rows `first..=last`, clipped to the viewport. Used after
/// rectangular fills so the cost is proportional to the affected rows.
/// Each row gets its own formatting reset.
///
/// # Errors
///
/// Returns an error if the cursor query or the terminal write fails.
pub fn render_rows(
    state: &EditorState,
    first: usize,
    last: usize,
    io: &mut impl TermIo,
) -> io::Result<()> {
    let size = io.size();
    let cols = state.visible_cols(size);
    let y0 = state.viewport.y_offset;
    let visible_last = y0 + state.visible_rows(size).saturating_sub(1);

    let lo = first.max(y0);
    let hi = last.min(visible_last);
    if cols == 0 || lo > hi {
        return Ok(());
    }

    let (cx, cy) = io.cursor_position()?;

    let mut buf = Vec::with_capacity((hi - lo + 1) * cols * 40);
    for row in lo..=hi {
        #[allow(clippy::cast_possible_truncation)] // Bounded by terminal rows.
        ansi::cursor_to(&mut buf, 0, (row - y0) as u16)?;
        encode_span(&mut buf, state, row, cols)?;
        ansi::reset(&mut buf)?;
    }
    ansi::cursor_to(&mut buf, cx, cy)?;

    io.write_all(&buf)?;
    io.flush()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::PixelGrid;
    use crate::testutil::FakeTerm;
    use pretty_assertions::assert_eq;

    const T: Color = Color::BLACK;
    const RED: Color = Color::new(255, 0, 0);

    fn state(w: usize, h: usize) -> EditorState {
        EditorState::new(PixelGrid::new(w, h, T), T)
    }

    fn black_pixel() -> String {
        "\x1b[48;2;0;0;0m \x1b[48;2;0;0;0m ".to_string()
    }

    fn red_pixel() -> String {
        "\x1b[48;2;255;0;0m \x1b[48;2;255;0;0m ".to_string()
    }

    // -- render_full --------------------------------------------------------

    #[test]
    fn full_emits_rows_and_restores_cursor() {
        let mut s = state(2, 2);
        s.grid.set(0, 0, RED).unwrap();
        let mut io = FakeTerm::new(80, 24).at(4, 1);

        render_full(&s, &mut io).unwrap();

        let expected = format!(
            "\x1b[1;1H{}{}\x1b[2;1H{}{}\x1b[0m\x1b[2;5H",
            red_pixel(),
            black_pixel(),
            black_pixel(),
            black_pixel(),
        );
        assert_eq!(io.screen(), expected);
        assert_eq!(io.flushes, 1);
    }

    #[test]
    fn full_clips_to_terminal_size() {
        // 4 pixels wide, but only 2 pairs fit in 5 columns; 3 rows, but
        // the terminal has 2.
        let s = state(4, 3);
        let mut io = FakeTerm::new(5, 2).at(0, 0);

        render_full(&s, &mut io).unwrap();

        let row = format!("{}{}", black_pixel(), black_pixel());
        let expected = format!("\x1b[1;1H{row}\x1b[2;1H{row}\x1b[0m\x1b[1;1H");
        assert_eq!(io.screen(), expected);
    }

    #[test]
    fn full_starts_at_viewport_offset() {
        let mut s = state(3, 2);
        s.grid.set(1, 2, RED).unwrap();
        s.viewport.x_offset = 2;
        s.viewport.y_offset = 1;
        let mut io = FakeTerm::new(80, 24).at(0, 0);

        render_full(&s, &mut io).unwrap();

        // Only pixel (1, 2) is visible, drawn at the screen origin.
        let expected = format!("\x1b[1;1H{}\x1b[0m\x1b[1;1H", red_pixel());
        assert_eq!(io.screen(), expected);
    }

    #[test]
    fn full_propagates_cursor_query_failure() {
        // No scripted position: the query fails and nothing is emitted.
        let s = state(2, 2);
        let mut io = FakeTerm::new(80, 24);

        assert!(render_full(&s, &mut io).is_err());
        assert!(io.out.is_empty());
    }

    // -- render_row ---------------------------------------------------------

    #[test]
    fn row_clears_line_and_restores_cursor() {
        let mut s = state(2, 2);
        s.grid.set(1, 1, RED).unwrap();
        let mut io = FakeTerm::new(80, 24).at(2, 1);

        render_row(&s, 1, &mut io).unwrap();

        let expected = format!(
            "\x1b[2;1H\x1b[2K{}{}\x1b[0m\x1b[2;3H",
            black_pixel(),
            red_pixel(),
        );
        assert_eq!(io.screen(), expected);
    }

    #[test]
    fn row_outside_viewport_is_a_no_op() {
        let mut s = state(2, 8);
        s.viewport.y_offset = 4;
        let mut io = FakeTerm::new(80, 2).at(0, 0);

        // Above the viewport, and below the visible window (rows 4-5).
        render_row(&s, 3, &mut io).unwrap();
        render_row(&s, 6, &mut io).unwrap();

        assert!(io.out.is_empty());
        // The scripted position was never consumed: no query happened.
        assert_eq!(io.positions.len(), 1);
    }

    #[test]
    fn row_maps_grid_row_to_screen_row() {
        let mut s = state(1, 8);
        s.viewport.y_offset = 3;
        let mut io = FakeTerm::new(80, 24).at(0, 0);

        render_row(&s, 5, &mut io).unwrap();

        // Grid row 5 with offset 3 lands on screen row 2 (1-indexed: 3).
        assert!(io.screen().starts_with("\x1b[3;1H\x1b[2K"));
    }

    // -- render_rows --------------------------------------------------------

    #[test]
    fn rows_emit_reset_per_row() {
        let s = state(1, 3);
        let mut io = FakeTerm::new(80, 24).at(0, 0);

        render_rows(&s, 0, 2, &mut io).unwrap();

        let p = black_pixel();
        let expected =
            format!("\x1b[1;1H{p}\x1b[0m\x1b[2;1H{p}\x1b[0m\x1b[3;1H{p}\x1b[0m\x1b[1;1H");
        assert_eq!(io.screen(), expected);
    }

    #[test]
    fn rows_clip_to_visible_window() {
        let mut s = state(1, 10);
        s.viewport.y_offset = 2;
        let mut io = FakeTerm::new(80, 3).at(0, 0);

        // Request 0..=9; only grid rows 2..=4 are on screen.
        render_rows(&s, 0, 9, &mut io).unwrap();

        let p = black_pixel();
        let expected =
            format!("\x1b[1;1H{p}\x1b[0m\x1b[2;1H{p}\x1b[0m\x1b[3;1H{p}\x1b[0m\x1b[1;1H");
        assert_eq!(io.screen(), expected);
    }

    #[test]
    fn rows_fully_outside_are_a_no_op() {
        let s = state(1, 3);
        let mut io = FakeTerm::new(80, 24).at(0, 0);

        render_rows(&s, 5, 9, &mut io).unwrap();

        assert!(io.out.is_empty());
        assert_eq!(io.positions.len(), 1);
    }

    // -- encoding -----------------------------------------------------------

    #[test]
    fn pixel_encodes_as_two_cells() {
        let mut buf = Vec::new();
        encode_pixel(&mut buf, Color::new(1, 2, 3)).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "\x1b[48;2;1;2;3m \x1b[48;2;1;2;3m "
        );
    }
}
