//! Edit engine — the drawing commands.
//!
//! Every operation takes the state aggregate plus the cursor's grid
//! position (the cursor itself lives in the terminal; the caller queries
//! it and translates through the viewport). Mutations go to the grid,
//! then the matching incremental redraw is invoked: one row for a
//! single-pixel fill, the affected row span for a rectangular fill.
//!
//! # Boundary policy
//!
//! One uniform rule for both fill shapes: if the primary target (the
//! cursor's cell) lies at or beyond the grid bounds, the whole operation
//! is a no-op — no mutation, no redraw, nothing surfaced to the user.
//! A rectangle whose far corner pokes past the grid is clamped to the
//! bounds before iteration; there are no partial row writes past the
//! edge.

use std::fmt;
use std::io;

use px_term::terminal::TermIo;

use crate::color::Color;
use crate::render::{render_row, render_rows};
use crate::state::EditorState;

// ---------------------------------------------------------------------------
// InvalidSlot
// ---------------------------------------------------------------------------

/// A palette command referenced a slot outside 0–9. Rejected without any
/// mutation; the session continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidSlot(pub u8);

impl fmt::Display for InvalidSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "palette slot {} is not a digit 0-9", self.0)
    }
}

impl std::error::Error for InvalidSlot {}

// ---------------------------------------------------------------------------
// Fill / delete
// ---------------------------------------------------------------------------

/// Paint with `color` at the cursor.
///
/// With an active selection: fill the axis-aligned rectangle spanning the
/// anchor and the cursor (inclusive, clamped to the grid), redraw the
/// affected rows, and clear the selection. Without one: set the cursor's
/// cell and redraw its row.
///
/// A cursor outside the grid makes the whole call a no-op (the selection
/// is left untouched, so a mis-aimed fill doesn't eat the anchor).
///
/// # Errors
///
/// Returns an error only if the redraw's terminal I/O fails.
pub fn fill(
    state: &mut EditorState,
    cursor: (usize, usize),
    color: Color,
    io: &mut impl TermIo,
) -> io::Result<()> {
    let (row, col) = cursor;

    if let Some((anchor_row, anchor_col)) = state.selection {
        if state.grid.get(row, col).is_none() {
            return Ok(());
        }

        let r0 = anchor_row.min(row);
        let c0 = anchor_col.min(col);
        // The cursor is in bounds, so the near corner is too; only the far
        // corner can poke past the grid.
        let r1 = anchor_row.max(row).min(state.grid.height() - 1);
        let c1 = anchor_col.max(col).min(state.grid.width() - 1);

        for r in r0..=r1 {
            for c in c0..=c1 {
                let _ = state.grid.set(r, c, color);
            }
        }
        state.selection = None;
        return render_rows(state, r0, r1, io);
    }

    if state.grid.set(row, col, color).is_err() {
        return Ok(());
    }
    render_row(state, row, io)
}

/// Erase at the cursor: exactly [`fill`] with the transparency color.
///
/// # Errors
///
/// Returns an error only if the redraw's terminal I/O fails.
pub fn delete(
    state: &mut EditorState,
    cursor: (usize, usize),
    io: &mut impl TermIo,
) -> io::Result<()> {
    let transparency = state.transparency;
    fill(state, cursor, transparency, io)
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Toggle the selection anchor: clear an active one, otherwise anchor at
/// the cursor. The anchor is stored as given — a cursor past the grid
/// still anchors, and the eventual rectangle is clamped at fill time.
pub fn toggle_select(state: &mut EditorState, cursor: (usize, usize)) {
    state.selection = match state.selection {
        Some(_) => None,
        None => Some(cursor),
    };
}

// ---------------------------------------------------------------------------
// Pipette / palette
// ---------------------------------------------------------------------------

/// Read the color under the cursor into the current color register.
/// Outside the grid there is nothing to sample; the register keeps its
/// value.
pub fn pipette(state: &mut EditorState, cursor: (usize, usize)) {
    if let Some(color) = state.grid.get(cursor.0, cursor.1) {
        state.current_color = color;
    }
}

/// [`pipette`], then store the register into palette slot `slot`.
///
/// # Errors
///
/// Returns [`InvalidSlot`] for a slot outside 0–9; neither the register
/// nor the palette is touched in that case.
pub fn pipette_save(
    state: &mut EditorState,
    cursor: (usize, usize),
    slot: u8,
) -> Result<(), InvalidSlot> {
    if slot > 9 {
        return Err(InvalidSlot(slot));
    }
    pipette(state, cursor);
    state.palette.set(slot, state.current_color);
    Ok(())
}

/// Set the current color register from palette slot `slot`.
///
/// # Errors
///
/// Returns [`InvalidSlot`] for a slot outside 0–9.
pub fn select_color(state: &mut EditorState, slot: u8) -> Result<(), InvalidSlot> {
    match state.palette.get(slot) {
        Some(color) => {
            state.current_color = color;
            Ok(())
        }
        None => Err(InvalidSlot(slot)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
