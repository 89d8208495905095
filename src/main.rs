// SPDX-License-Identifier: MIT
//
// px — a terminal-resident pixel art editor.
//
// This is the main binary that wires together the crates:
//
//   px-term   → raw mode, ANSI output, cursor queries, byte input
//   px-canvas → pixel grid, renderer, edit commands, jump motions, codec
//
// Each keypress flows through:
//
//   stdin byte → keymap → dispatch → grid mutation → incremental redraw
//                                  → cursor escapes for motions
//
// The terminal's visible cursor is the editing cursor. Motion commands
// move it with relative escapes (two columns per horizontal step — one
// logical pixel is two cells); drawing commands query its position, edit
// the grid there, and let the renderer put it back. The loop is strictly
// synchronous: one byte in, one command run to completion, repeat.

use std::env;
use std::error::Error;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use px_canvas::codec;
use px_canvas::color::Color;
use px_canvas::command::{Action, Keymap};
use px_canvas::config::{self, Config};
use px_canvas::edit;
use px_canvas::grid::PixelGrid;
use px_canvas::navigate::{self, Direction};
use px_canvas::render;
use px_canvas::state::EditorState;

use px_term::ansi;
use px_term::terminal::{TermIo, Terminal};

// ─── Editor ─────────────────────────────────────────────────────────────────

/// Loop control returned by dispatch.
enum Flow {
    Continue,
    Quit,
}

/// The editing session: state aggregate, key table, save target.
struct Editor {
    state: EditorState,
    keymap: Keymap,
    /// Primary (PNG) save target. The fallback writer swaps the extension.
    save_path: PathBuf,
}

impl Editor {
    /// Draw the initial frame and run the blocking byte loop.
    fn run(&mut self, term: &mut Terminal) -> io::Result<()> {
        render::render_full(&self.state, term)?;

        loop {
            let byte = term.read_byte()?;
            let Some(action) = self.keymap.decode(byte) else {
                continue;
            };
            match self.dispatch(action, term)? {
                Flow::Continue => {}
                Flow::Quit => return Ok(()),
            }
        }
    }

    /// Execute one decoded command to completion.
    #[allow(clippy::too_many_lines)] // One arm per command; splitting obscures the surface.
    fn dispatch(&mut self, action: Action, term: &mut Terminal) -> io::Result<Flow> {
        match action {
            // ── Cursor motion ───────────────────────────────────────
            Action::MoveLeft => {
                let (x, _) = term.cursor_position()?;
                if x >= 2 {
                    self.emit(term, |buf| ansi::cursor_back(buf, 2))?;
                }
            }
            Action::MoveRight => {
                let (x, _) = term.cursor_position()?;
                // Keep the full two-cell pair addressable: never move the
                // cursor onto a pair that would hang off the last column.
                if x + 4 <= term.size().cols {
                    self.emit(term, |buf| ansi::cursor_forward(buf, 2))?;
                }
            }
            Action::MoveDown => {
                let (_, y) = term.cursor_position()?;
                if y + 1 < term.size().rows {
                    self.emit(term, |buf| ansi::cursor_down(buf, 1))?;
                }
            }
            Action::MoveUp => {
                let (_, y) = term.cursor_position()?;
                if y > 0 {
                    self.emit(term, |buf| ansi::cursor_up(buf, 1))?;
                }
            }
            Action::JumpTop => {
                self.emit(term, |buf| ansi::cursor_home(buf))?;
            }
            Action::JumpBottom => {
                let (x, _) = term.cursor_position()?;
                let rows = self.state.visible_rows(term.size());
                if rows > 0 {
                    #[allow(clippy::cast_possible_truncation)] // Bounded by terminal rows.
                    self.emit(term, |buf| ansi::cursor_to(buf, x, rows as u16 - 1))?;
                }
            }

            // ── Boundary jumps ──────────────────────────────────────
            Action::JumpForward => self.jump(term, Direction::Forward)?,
            Action::JumpBackward => self.jump(term, Direction::Backward)?,

            // ── Drawing ─────────────────────────────────────────────
            Action::Fill => {
                let pixel = self.cursor_pixel(term)?;
                let color = self.state.current_color;
                edit::fill(&mut self.state, pixel, color, term)?;
            }
            Action::Delete => {
                let pixel = self.cursor_pixel(term)?;
                edit::delete(&mut self.state, pixel, term)?;
            }
            Action::ToggleSelect => {
                let pixel = self.cursor_pixel(term)?;
                edit::toggle_select(&mut self.state, pixel);
            }

            // ── Colors ──────────────────────────────────────────────
            Action::SelectColor(slot) => {
                // Out-of-range slots are absorbed; the session goes on.
                let _ = edit::select_color(&mut self.state, slot);
            }
            Action::Pipette => {
                let pixel = self.cursor_pixel(term)?;
                edit::pipette(&mut self.state, pixel);
            }
            Action::PipetteSave => {
                let pixel = self.cursor_pixel(term)?;
                // The slot is the next byte; anything but a digit lands
                // outside 0-9 and is rejected without mutation.
                let slot = term.read_byte()?.wrapping_sub(b'0');
                let _ = edit::pipette_save(&mut self.state, pixel, slot);
            }

            // ── Viewport ────────────────────────────────────────────
            Action::ScrollLeft => {
                self.state.viewport.scroll_left();
                self.redraw_all(term)?;
            }
            Action::ScrollRight => {
                let width = self.state.grid.width();
                self.state.viewport.scroll_right(width);
                self.redraw_all(term)?;
            }
            Action::ScrollUp => {
                self.state.viewport.scroll_up();
                self.redraw_all(term)?;
            }
            Action::ScrollDown => {
                let height = self.state.grid.height();
                self.state.viewport.scroll_down(height);
                self.redraw_all(term)?;
            }
            Action::ReloadSize => {
                term.refresh_size();
                let (w, h) = (self.state.grid.width(), self.state.grid.height());
                self.state.viewport.clamp_to(w, h);
                self.redraw_all(term)?;
                // The old cursor position may not exist on the new screen.
                self.emit(term, |buf| ansi::cursor_home(buf))?;
            }

            // ── Session ─────────────────────────────────────────────
            Action::Save => self.save()?,
            Action::Quit => return Ok(Flow::Quit),
        }

        Ok(Flow::Continue)
    }

    /// Write a small escape sequence and flush it.
    fn emit<F>(&self, term: &mut Terminal, f: F) -> io::Result<()>
    where
        F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
    {
        let mut buf = Vec::with_capacity(8);
        f(&mut buf)?;
        term.write_all(&buf)?;
        term.flush()
    }

    /// Query the cursor and translate to grid coordinates.
    fn cursor_pixel(&self, term: &mut Terminal) -> io::Result<(usize, usize)> {
        let (x, y) = term.cursor_position()?;
        Ok(self.state.cursor_to_pixel(x, y))
    }

    /// Jump the cursor to the next color boundary in `direction`.
    fn jump(&self, term: &mut Terminal, direction: Direction) -> io::Result<()> {
        let (x, y) = term.cursor_position()?;
        let (row, col) = self.state.cursor_to_pixel(x, y);

        let visible = self.state.visible_cols(term.size());
        if visible == 0 {
            return Ok(());
        }
        let first = self.state.viewport.x_offset;
        let last = first + visible - 1;

        let target = navigate::jump(&self.state.grid, row, col, direction, first, last);
        let delta = navigate::column_delta(col, target);

        #[allow(clippy::cast_possible_truncation)] // Bounded by terminal columns.
        if delta > 0 {
            self.emit(term, |buf| {
                ansi::cursor_forward(buf, delta.unsigned_abs() as u16)
            })?;
        } else if delta < 0 {
            self.emit(term, |buf| {
                ansi::cursor_back(buf, delta.unsigned_abs() as u16)
            })?;
        }
        Ok(())
    }

    /// Clear the screen and redraw everything (scroll, resize).
    fn redraw_all(&self, term: &mut Terminal) -> io::Result<()> {
        self.emit(term, |buf| ansi::clear_screen(buf))?;
        render::render_full(&self.state, term)
    }

    /// Save the image: PNG first, the plain-decimal writer only if the
    /// PNG encoder fails. Losing the in-memory image is the one outcome
    /// this cascade exists to prevent; if both writers fail, that is
    /// fatal and both reasons are reported.
    fn save(&self) -> io::Result<()> {
        let grid = &self.state.grid;
        let transparency = self.state.transparency;

        let primary = match codec::save(&self.save_path, grid, transparency) {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        let fallback_path = self.save_path.with_extension(codec::FALLBACK_EXT);
        match codec::save_plain(&fallback_path, grid, transparency) {
            Ok(()) => Ok(()),
            Err(fallback) => Err(io::Error::other(format!(
                "save failed: {primary}; fallback save to {} also failed: {fallback}",
                fallback_path.display()
            ))),
        }
    }
}

// ─── Startup ────────────────────────────────────────────────────────────────

/// Locate the config file: `$PX_CONFIG` wins, else `~/.config/px/config`
/// if it exists. An explicit `$PX_CONFIG` that can't be read is an error;
/// a missing default config just means defaults.
fn config_path() -> Option<PathBuf> {
    if let Ok(p) = env::var("PX_CONFIG") {
        return Some(PathBuf::from(p));
    }
    let home = env::var_os("HOME")?;
    let path = Path::new(&home).join(".config").join("px").join("config");
    path.exists().then_some(path)
}

fn load_config() -> Result<Config, Box<dyn Error>> {
    match config_path() {
        Some(path) => config::load(&path).map_err(|e| format!("{}: {e}", path.display()).into()),
        None => Ok(Config::default()),
    }
}

/// Ask for one dimension on the cooked (pre-raw-mode) terminal.
fn prompt_number(prompt: &str) -> Result<usize, Box<dyn Error>> {
    print!("{prompt}");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    let trimmed = line.trim();

    let n: usize = trimmed
        .parse()
        .map_err(|_| format!("`{trimmed}` is not a number"))?;
    if n == 0 {
        return Err("dimensions must be nonzero".into());
    }
    Ok(n)
}

fn run() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = env::args().collect();
    if args.len() > 2 {
        return Err("usage: px [file]".into());
    }
    let file = args.get(1).map(PathBuf::from);

    let cfg = load_config()?;
    let transparency = cfg.transparency.unwrap_or(Color::BLACK);

    // A named file must load; a fresh canvas asks for its dimensions
    // before the terminal goes raw.
    let grid = match &file {
        Some(path) => codec::load(path, transparency)
            .map_err(|e| format!("cannot load {}: {e}", path.display()))?,
        None => {
            let width = prompt_number("image width (pixels): ")?;
            let height = prompt_number("image height (pixels): ")?;
            PixelGrid::new(width, height, transparency)
        }
    };

    let mut state = EditorState::new(grid, transparency);
    let mut keymap = Keymap::default();
    cfg.apply(&mut state, &mut keymap);

    // The primary save is always PNG, whatever we loaded from.
    let save_path = file.map_or_else(
        || PathBuf::from("untitled.png"),
        |p| p.with_extension("png"),
    );

    let mut editor = Editor {
        state,
        keymap,
        save_path,
    };

    let mut term = Terminal::new()?;
    term.enter()?;
    let session = editor.run(&mut term);
    let restore = term.leave();

    session?;
    restore?;
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("px: {err}");
        process::exit(1);
    }
}
