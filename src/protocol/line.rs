//! Line framing for the host link.
//!
//! Bytes accumulate until `\n` or `\r`.  Empty lines (including the second
//! half of a CRLF) produce nothing.  A line that outgrows the buffer is
//! dropped whole: everything up to the next terminator is discarded and a
//! single [`CommandError::LineTooLong`] is reported.

use crate::error::CommandError;

/// Longest accepted line, excluding the terminator.
pub const MAX_LINE_LEN: usize = 127;

pub type Line = heapless::String<MAX_LINE_LEN>;

#[derive(Default)]
pub struct LineAssembler {
    buf: heapless::Vec<u8, MAX_LINE_LEN>,
    overflowed: bool,
}

impl LineAssembler {
    pub const fn new() -> Self {
        Self {
            buf: heapless::Vec::new(),
            overflowed: false,
        }
    }

    /// Feed one byte.  Returns a result when a line terminates.
    pub fn push(&mut self, byte: u8) -> Option<Result<Line, CommandError>> {
        if byte != b'\n' && byte != b'\r' {
            if !self.overflowed && self.buf.push(byte).is_err() {
                self.overflowed = true;
                self.buf.clear();
            }
            return None;
        }

        if self.overflowed {
            self.overflowed = false;
            return Some(Err(CommandError::LineTooLong));
        }
        if self.buf.is_empty() {
            return None;
        }

        let result = match core::str::from_utf8(&self.buf) {
            Ok(text) => {
                let mut line = Line::new();
                // Capacity matches the buffer, so this cannot fail.
                let _ = line.push_str(text);
                Ok(line)
            }
            Err(_) => Err(CommandError::Malformed),
        };
        self.buf.clear();
        Some(result)
    }

    /// Bytes buffered for the current, unterminated line.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}
