// SPDX-License-Identifier: MIT
//
// px-term — Terminal control layer for px.
//
// Raw termios sessions, ANSI escape generation, and the `TermIo` seam the
// editor core draws through. The drawing model is deliberately primitive:
// the terminal's own visible cursor is the editing cursor, every redraw
// saves and restores it with a DSR round-trip, and painting is nothing but
// background-colored blank cells.
//
// This crate intentionally avoids external TUI frameworks (ratatui,
// crossterm) in favor of direct terminal control via ANSI escape
// sequences and raw termios. Every byte sent to the terminal is
// accounted for.

pub mod ansi;
pub mod terminal;
