//! Buffered byte scanner with position tracking
//!
//! Reads markup from any source implementing `Read`:
//! - Chunked, lazy refills (the source is only read when the window runs dry)
//! - Byte offset, line and column for every consumed run
//! - memchr-accelerated newline accounting

use memchr::{memchr_iter, memrchr};
use std::fmt;
use std::io::{self, Read};

/// Buffer size for reading chunks
const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Location in the source: byte offset plus 1-based line and column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Position {
    /// Position of the first byte of a source
    pub const fn start() -> Self {
        Position {
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// Move past `bytes`, counting newlines
    fn advance_over(&mut self, bytes: &[u8]) {
        self.offset += bytes.len();
        match memrchr(b'\n', bytes) {
            Some(last) => {
                self.line += memchr_iter(b'\n', bytes).count();
                self.column = bytes.len() - last;
            }
            None => self.column += bytes.len(),
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Byte scanner over a `Read` source
pub struct Scanner<R: Read> {
    reader: R,
    buffer: Vec<u8>,
    pos: usize,
    end: usize,
    eof: bool,
    position: Position,
}

impl<R: Read> Scanner<R> {
    /// Create a new scanner with the default chunk size
    pub fn new(reader: R) -> Self {
        Self::with_capacity(reader, DEFAULT_BUFFER_SIZE)
    }

    /// Create a new scanner reading chunks of at most `capacity` bytes
    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Scanner {
            reader,
            buffer: vec![0u8; capacity.max(1)],
            pos: 0,
            end: 0,
            eof: false,
            position: Position::start(),
        }
    }

    /// Position of the next unconsumed byte
    #[inline]
    pub fn position(&self) -> Position {
        self.position
    }

    /// Currently buffered, unconsumed bytes
    #[inline]
    pub fn buffered(&self) -> &[u8] {
        &self.buffer[self.pos..self.end]
    }

    /// Check if the source is exhausted and nothing is left in the window
    pub fn is_eof(&self) -> bool {
        self.eof && self.pos >= self.end
    }

    /// Refill the window if it is empty. Returns false at end of input.
    fn fill_buffer(&mut self) -> io::Result<bool> {
        while self.pos >= self.end {
            if self.eof {
                return Ok(false);
            }
            self.pos = 0;
            self.end = 0;
            match self.reader.read(&mut self.buffer) {
                Ok(0) => self.eof = true,
                Ok(read) => self.end = read,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(true)
    }

    /// Peek at the next byte without consuming it
    pub fn peek(&mut self) -> io::Result<Option<u8>> {
        if !self.fill_buffer()? {
            return Ok(None);
        }
        Ok(Some(self.buffer[self.pos]))
    }

    /// Consume up to `n` bytes of the current window
    pub fn advance(&mut self, n: usize) {
        let n = n.min(self.end - self.pos);
        self.position.advance_over(&self.buffer[self.pos..self.pos + n]);
        self.pos += n;
    }

    /// Consume a maximal run of bytes matching `accept`, appending them to `out`
    pub fn take_while<F>(&mut self, accept: F, out: &mut Vec<u8>) -> io::Result<()>
    where
        F: Fn(u8) -> bool,
    {
        while self.fill_buffer()? {
            let window = self.buffered();
            let len = window.len();
            let run = window.iter().position(|&b| !accept(b)).unwrap_or(len);
            out.extend_from_slice(&window[..run]);
            self.advance(run);
            if run < len {
                break;
            }
        }
        Ok(())
    }

    /// Skip a maximal run of bytes matching `skip`
    pub fn skip_while<F>(&mut self, skip: F) -> io::Result<()>
    where
        F: Fn(u8) -> bool,
    {
        while self.fill_buffer()? {
            let window = self.buffered();
            let len = window.len();
            let run = window.iter().position(|&b| !skip(b)).unwrap_or(len);
            self.advance(run);
            if run < len {
                break;
            }
        }
        Ok(())
    }

    /// Skip whitespace characters (space, tab, newline, form feed, carriage return)
    #[inline]
    pub fn skip_whitespace(&mut self) -> io::Result<()> {
        self.skip_while(|b| b.is_ascii_whitespace())
    }
}
