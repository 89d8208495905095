// SPDX-License-Identifier: MIT
//
// Terminal control — raw mode, size queries, and RAII cleanup.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr), ioctl (TIOCGWINSZ), isatty, and raw fd reads/writes. These
// are the standard POSIX interfaces for terminal control — there is no
// safe alternative. Each unsafe block is minimal and documented.
#![allow(unsafe_code)]
//
// This module owns the terminal's raw state. It enters raw mode via termios,
// clears the screen for the drawing session, and guarantees cleanup on drop —
// even if the editor panics mid-redraw.
//
// It also defines `TermIo`, the seam everything above renders through: write
// bytes, flush, read one input byte, query the cursor position, report the
// size. The editor core takes `&mut impl TermIo`, so tests drive it with a
// scripted fake instead of a live terminal.
//
// The cursor position query deserves special mention. The editor never
// tracks the drawing cursor itself — the terminal's visible cursor IS the
// cursor. Before any redraw the current position is fetched with DSR 6
// (`ESC [ 6 n`), the terminal answers `ESC [ row ; col R` on stdin, and
// after the redraw the cursor is put back. That write-then-read exchange is
// the only synchronization barrier in the whole program.

use std::io::{self, Write};
use std::sync::{Mutex, Once};

use crate::ansi;

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal extent in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of columns (width in character cells).
    pub cols: u16,
    /// Number of rows (height in character cells).
    pub rows: u16,
}

impl Size {
    /// Total number of cells (`cols × rows`).
    #[inline]
    #[must_use]
    pub const fn area(self) -> u32 {
        self.cols as u32 * self.rows as u32
    }
}

// ─── Terminal Queries ───────────────────────────────────────────────────────

/// Ask the kernel for the terminal size via `ioctl(TIOCGWINSZ)`.
///
/// `None` when stdout is not a terminal or the ioctl fails; the
/// [`Terminal`] then falls back to the cursor-park probe.
#[cfg(unix)]
#[must_use]
pub fn get_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };

    if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Some(Size {
            cols: ws.ws_col,
            rows: ws.ws_row,
        })
    } else {
        None
    }
}

#[cfg(not(unix))]
#[must_use]
pub fn get_size() -> Option<Size> {
    None
}

/// Whether stdin is attached to a real terminal.
#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

// ─── TermIo ─────────────────────────────────────────────────────────────────

/// The terminal I/O seam.
///
/// The editor core never touches stdout/stdin directly — every redraw,
/// cursor move, and input read goes through this trait. [`Terminal`] is the
/// live implementation; tests substitute a scripted fake that records the
/// emitted bytes and replays canned cursor positions.
pub trait TermIo {
    /// Write raw bytes to the terminal.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying write fails.
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Flush buffered output to the device.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    fn flush(&mut self) -> io::Result<()>;

    /// Block until one input byte is available and return it.
    ///
    /// # Errors
    ///
    /// Returns an error on EOF or a failed read.
    fn read_byte(&mut self) -> io::Result<u8>;

    /// Query the visible cursor position, 0-indexed `(x, y)`.
    ///
    /// Implemented as a DSR 6 write followed by reading the terminal's
    /// report from stdin — a full round-trip with the device.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails or the report is malformed.
    fn cursor_position(&mut self) -> io::Result<(u16, u16)>;

    /// The terminal size as last measured.
    fn size(&self) -> Size;
}

/// Parse a DSR cursor position report: `ESC [ row ; col R`, 1-indexed.
///
/// Returns the 0-indexed `(x, y)` position, or `None` if the bytes are not
/// a well-formed report. Number parsing is done directly on the byte slice —
/// no intermediate `String`.
#[must_use]
pub fn parse_cursor_report(buf: &[u8]) -> Option<(u16, u16)> {
    let rest = buf.strip_prefix(b"\x1b[")?;
    let rest = rest.strip_suffix(b"R").unwrap_or(rest);

    let sep = rest.iter().position(|&b| b == b';')?;
    let row = parse_u16(&rest[..sep])?;
    let col = parse_u16(&rest[sep + 1..])?;

    // Reports are 1-indexed; a zero here is not a valid position.
    if row == 0 || col == 0 {
        return None;
    }
    Some((col - 1, row - 1))
}

/// Parse a decimal u16 from ASCII digits. `None` on empty or non-digit input.
fn parse_u16(bytes: &[u8]) -> Option<u16> {
    if bytes.is_empty() {
        return None;
    }
    let mut n: u32 = 0;
    for &b in bytes {
        if !b.is_ascii_digit() {
            return None;
        }
        n = n * 10 + u32::from(b - b'0');
        if n > u32::from(u16::MAX) {
            return None;
        }
    }
    #[allow(clippy::cast_possible_truncation)] // Bounded above.
    Some(n as u16)
}

// ─── Panic-Safe Terminal Restore ────────────────────────────────────────────

/// Process-wide copy of the termios state saved at raw-mode entry.
///
/// The panic hook has no path to the [`Terminal`] value that owns the
/// saved state, so a second copy lives here, behind a [`Mutex`] rather
/// than `static mut`, for the hook to restore from.
#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

/// Put termios back from the process-wide backup. Errors are ignored;
/// there is nowhere left to report them during a panic.
#[cfg(unix)]
fn restore_termios_from_backup() {
    if let Ok(guard) = TERMIOS_BACKUP.lock() {
        if let Some(ref original) = *guard {
            unsafe {
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, original);
            }
        }
    }
}

/// Display restore sequence for emergency use: reset SGR attributes, clear
/// the drawing, put the cursor at the origin. Raw mode is restored
/// separately through the termios backup.
const EMERGENCY_RESTORE: &[u8] = b"\x1b[0m\x1b[2J\x1b[H";

/// The hook is installed at most once per process.
static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Install a panic hook that puts the terminal back before the error prints.
///
/// A panic while raw mode is active would otherwise strand the user on a
/// terminal with no echo and no line editing, the panic message invisible
/// in the drawing. The hook sends [`EMERGENCY_RESTORE`] straight to fd 1,
/// restores termios from the backup, and only then lets the original
/// handler print to a terminal that works again.
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            emergency_restore();

            #[cfg(unix)]
            restore_termios_from_backup();

            original(info);
        }));
    });
}

/// Write the restore sequence to fd 1 without going through `io::stdout()`.
///
/// The panic may have fired while a redraw held the stdout lock; taking
/// it again here would deadlock, so the write goes to the raw descriptor.
fn emergency_restore() {
    #[cfg(unix)]
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
            EMERGENCY_RESTORE.len(),
        );
    }

    #[cfg(not(unix))]
    {
        let _ = io::stdout().write_all(EMERGENCY_RESTORE);
        let _ = io::stdout().flush();
    }
}

// ─── Terminal ───────────────────────────────────────────────────────────────

/// Handle on the live terminal, restored on drop.
///
/// [`enter`](Self::enter) starts a drawing session: raw mode, cleared
/// screen, cursor at the origin. Dropping the handle restores the
/// terminal, panic included.
///
/// The editor draws on the primary screen, not the alternate buffer: the
/// session ends by clearing the drawing, the same way it started.
pub struct Terminal {
    /// Original termios saved before entering raw mode.
    #[cfg(unix)]
    original_termios: Option<libc::termios>,

    /// Current terminal size (cached, refresh with [`refresh_size`](Self::refresh_size)).
    size: Size,

    /// Whether we're in a raw drawing session.
    active: bool,
}

impl Terminal {
    /// Create a terminal handle and query the current size.
    ///
    /// Does **not** enter raw mode — call [`enter`](Self::enter) for that.
    /// Falls back to 80×24 if the terminal size cannot be determined (e.g.,
    /// in tests or piped environments).
    ///
    /// # Errors
    ///
    /// Currently infallible, but returns `Result` for forward compatibility.
    pub fn new() -> io::Result<Self> {
        let size = get_size().unwrap_or(Size { cols: 80, rows: 24 });

        Ok(Self {
            #[cfg(unix)]
            original_termios: None,
            size,
            active: false,
        })
    }

    /// Re-query the terminal size.
    ///
    /// Tries `ioctl(TIOCGWINSZ)` first. If that fails while a raw session
    /// is active, falls back to the cursor probe: park the cursor at the
    /// far corner with `CUF 999` / `CUD 999` and ask where it ended up.
    /// Returns the updated size and caches it internally.
    pub fn refresh_size(&mut self) -> Size {
        if let Some(s) = get_size() {
            self.size = s;
        } else if self.active {
            if let Ok(s) = self.probe_size() {
                self.size = s;
            }
        }
        self.size
    }

    /// Measure the terminal by parking the cursor at the bottom-right
    /// corner and reading its position back.
    fn probe_size(&mut self) -> io::Result<Size> {
        self.write_all(b"\x1b[999C\x1b[999B")?;
        self.flush()?;
        let (x, y) = self.cursor_position()?;
        Ok(Size {
            cols: x + 1,
            rows: y + 1,
        })
    }

    /// Whether we're currently in a raw drawing session.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Enter the drawing session: raw mode, cleared screen, cursor home.
    ///
    /// Idempotent: calling `enter()` while already active is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if raw mode or terminal output fails. Raw-mode
    /// failure here is unrecoverable for the program — there is no way to
    /// run a keystroke-driven editor on a cooked terminal.
    pub fn enter(&mut self) -> io::Result<()> {
        if self.active {
            return Ok(());
        }

        // Install the panic hook (once per process).
        install_panic_hook();

        self.enable_raw_mode()?;

        let stdout = io::stdout();
        let mut lock = stdout.lock();
        ansi::clear_screen(&mut lock)?;
        ansi::cursor_home(&mut lock)?;
        lock.flush()?;

        self.active = true;
        Ok(())
    }

    /// End the drawing session and restore the terminal.
    ///
    /// Clears the drawing, resets attributes, and exits raw mode.
    /// Idempotent: calling `leave()` while inactive is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal output or termios restore fails.
    pub fn leave(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }

        let stdout = io::stdout();
        let mut lock = stdout.lock();
        ansi::reset(&mut lock)?;
        ansi::clear_screen(&mut lock)?;
        ansi::cursor_home(&mut lock)?;
        lock.flush()?;
        drop(lock);

        self.disable_raw_mode()?;
        self.active = false;
        Ok(())
    }

    // ── Raw Mode (termios) ──────────────────────────────────────────

    #[cfg(unix)]
    fn enable_raw_mode(&mut self) -> io::Result<()> {
        use std::os::unix::io::AsRawFd;

        if !is_tty() {
            return Ok(());
        }

        let fd = io::stdin().as_raw_fd();

        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &raw mut termios) != 0 {
                return Err(io::Error::last_os_error());
            }

            // Save original for restore.
            self.original_termios = Some(termios);

            // Also save to global backup for the panic hook.
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = Some(termios);
            }

            // No line buffering, no echo, no signals, no output processing.
            termios.c_iflag &= !(libc::ICRNL | libc::IXON);
            termios.c_oflag &= !libc::OPOST;
            termios.c_lflag &= !(libc::ECHO | libc::ICANON | libc::ISIG | libc::IEXTEN);

            // VMIN=1, VTIME=0: read() blocks until at least 1 byte available.
            termios.c_cc[libc::VMIN] = 1;
            termios.c_cc[libc::VTIME] = 0;

            if libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const termios) != 0 {
                return Err(io::Error::last_os_error());
            }
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn enable_raw_mode(&mut self) -> io::Result<()> {
        Ok(())
    }

    #[cfg(unix)]
    fn disable_raw_mode(&mut self) -> io::Result<()> {
        if let Some(ref original) = self.original_termios {
            use std::os::unix::io::AsRawFd;
            let fd = io::stdin().as_raw_fd();

            unsafe {
                if libc::tcsetattr(fd, libc::TCSAFLUSH, original) != 0 {
                    return Err(io::Error::last_os_error());
                }
            }

            // Clear the global backup — we've restored successfully.
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = None;
            }

            self.original_termios = None;
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn disable_raw_mode(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl TermIo for Terminal {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        io::stdout().lock().write_all(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().lock().flush()
    }

    #[cfg(unix)]
    fn read_byte(&mut self) -> io::Result<u8> {
        use std::os::unix::io::AsRawFd;

        let fd = io::stdin().as_raw_fd();
        let mut byte = 0u8;

        // Blocking single-byte read (VMIN=1 in raw mode).
        let n = unsafe { libc::read(fd, (&raw mut byte).cast::<libc::c_void>(), 1) };
        match n {
            1 => Ok(byte),
            0 => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed")),
            _ => Err(io::Error::last_os_error()),
        }
    }

    #[cfg(not(unix))]
    fn read_byte(&mut self) -> io::Result<u8> {
        use std::io::Read;

        let mut byte = [0u8; 1];
        io::stdin().lock().read_exact(&mut byte)?;
        Ok(byte[0])
    }

    fn cursor_position(&mut self) -> io::Result<(u16, u16)> {
        let mut out = Vec::with_capacity(4);
        ansi::request_cursor_position(&mut out)?;
        self.write_all(&out)?;
        self.flush()?;

        // Read the report byte by byte until the terminating 'R'. A bound
        // on the buffer keeps a misbehaving terminal from wedging us.
        let mut buf = [0u8; 16];
        let mut len = 0;
        while len < buf.len() {
            let b = self.read_byte()?;
            buf[len] = b;
            len += 1;
            if b == b'R' {
                break;
            }
        }

        parse_cursor_report(&buf[..len]).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidData, "malformed cursor report")
        })
    }

    fn size(&self) -> Size {
        self.size
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if self.active {
            let _ = self.leave();
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // ── Size ──────────────────────────────────────────────────────────

    #[test]
    fn size_area() {
        assert_eq!(Size { cols: 80, rows: 24 }.area(), 1920);
    }

    #[test]
    fn size_area_zero() {
        assert_eq!(Size { cols: 0, rows: 24 }.area(), 0);
    }

    #[test]
    fn size_is_copy() {
        let a = Size { cols: 80, rows: 24 };
        let b = a;
        assert_eq!(a, b);
    }

    // ── Cursor report parsing ─────────────────────────────────────────

    #[test]
    fn parse_report_origin() {
        assert_eq!(parse_cursor_report(b"\x1b[1;1R"), Some((0, 0)));
    }

    #[test]
    fn parse_report_position() {
        // Row 24, col 80 → 0-indexed (79, 23).
        assert_eq!(parse_cursor_report(b"\x1b[24;80R"), Some((79, 23)));
    }

    #[test]
    fn parse_report_without_terminator() {
        // The read loop may stop on a short buffer; parsing tolerates a
        // missing trailing 'R'.
        assert_eq!(parse_cursor_report(b"\x1b[5;9"), Some((8, 4)));
    }

    #[test]
    fn parse_report_rejects_missing_prefix() {
        assert_eq!(parse_cursor_report(b"[1;1R"), None);
        assert_eq!(parse_cursor_report(b"1;1R"), None);
    }

    #[test]
    fn parse_report_rejects_garbage() {
        assert_eq!(parse_cursor_report(b"\x1b[a;bR"), None);
        assert_eq!(parse_cursor_report(b"\x1b[12R"), None);
        assert_eq!(parse_cursor_report(b""), None);
    }

    #[test]
    fn parse_report_rejects_zero_coordinates() {
        // DSR reports are 1-indexed; zero means the terminal is lying.
        assert_eq!(parse_cursor_report(b"\x1b[0;5R"), None);
        assert_eq!(parse_cursor_report(b"\x1b[5;0R"), None);
    }

    #[test]
    fn parse_report_large_values() {
        assert_eq!(parse_cursor_report(b"\x1b[500;1000R"), Some((999, 499)));
    }

    #[test]
    fn parse_report_rejects_overflow() {
        assert_eq!(parse_cursor_report(b"\x1b[99999;1R"), None);
    }

    // ── Terminal queries ─────────────────────────────────────────────

    #[test]
    fn get_size_does_not_panic() {
        let _ = get_size();
    }

    #[test]
    fn is_tty_does_not_panic() {
        let _ = is_tty();
    }

    // ── Emergency restore sequence ──────────────────────────────────

    #[test]
    fn emergency_restore_is_valid_utf8() {
        std::str::from_utf8(EMERGENCY_RESTORE).unwrap();
    }

    #[test]
    fn emergency_restore_resets_then_clears() {
        let s = std::str::from_utf8(EMERGENCY_RESTORE).unwrap();
        assert!(s.starts_with("\x1b[0m"), "must reset SGR first");
        assert!(s.contains("\x1b[2J"), "must clear the drawing");
        assert!(s.ends_with("\x1b[H"), "must park the cursor at the origin");
    }

    // ── Terminal struct ─────────────────────────────────────────────

    #[test]
    fn terminal_new_succeeds() {
        let term = Terminal::new().unwrap();
        assert!(!term.is_active());
    }

    #[test]
    fn terminal_has_reasonable_default_size() {
        let term = Terminal::new().unwrap();
        let s = term.size();
        assert!(s.cols > 0);
        assert!(s.rows > 0);
    }

    #[test]
    fn terminal_leave_without_enter() {
        let mut term = Terminal::new().unwrap();
        term.leave().unwrap();
        assert!(!term.is_active());
    }

    #[test]
    fn terminal_drop_without_enter() {
        let term = Terminal::new().unwrap();
        drop(term);
    }
}
