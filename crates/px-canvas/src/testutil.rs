//! Scripted terminal for unit tests.
//!
//! Implements [`TermIo`] without a device: writes accumulate in a byte
//! buffer, cursor-position queries replay canned answers, input bytes come
//! from a queue. Renderer and edit-engine tests assert on the exact bytes
//! the real terminal would have received.

use std::collections::VecDeque;
use std::io;

use px_term::terminal::{Size, TermIo};

pub struct FakeTerm {
    /// Everything "written to the terminal", in order.
    pub out: Vec<u8>,
    /// Canned answers for cursor-position queries, consumed front to back.
    pub positions: VecDeque<(u16, u16)>,
    /// Scripted input bytes.
    pub input: VecDeque<u8>,
    /// Reported terminal size.
    pub size: Size,
    /// Number of flushes observed.
    pub flushes: usize,
}

impl FakeTerm {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            out: Vec::new(),
            positions: VecDeque::new(),
            input: VecDeque::new(),
            size: Size { cols, rows },
            flushes: 0,
        }
    }

    /// Queue a cursor position the next query will report.
    pub fn at(mut self, x: u16, y: u16) -> Self {
        self.positions.push_back((x, y));
        self
    }

    /// The output so far, as UTF-8.
    pub fn screen(&self) -> String {
        String::from_utf8(self.out.clone()).unwrap()
    }
}

impl TermIo for FakeTerm {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.out.extend_from_slice(bytes);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushes += 1;
        Ok(())
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        self.input
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted"))
    }

    fn cursor_position(&mut self) -> io::Result<(u16, u16)> {
        self.positions
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "no scripted position"))
    }

    fn size(&self) -> Size {
        self.size
    }
}
