//! Terminator-delimited line assembly for the serial link.

use core::fmt;
use core::str::{self, Utf8Error};

use heapless::Vec;

/// Size of the receive buffer including the terminator slot.
pub const LINE_BUFFER_SIZE: usize = 32;

/// Longest accepted line payload.
pub const MAX_LINE_LEN: usize = LINE_BUFFER_SIZE - 1;

const CR: u8 = b'\r';
const LF: u8 = b'\n';

/// Errors surfaced while assembling lines.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LineError {
    /// Line exceeded [`MAX_LINE_LEN`]; the remainder up to the next
    /// terminator is discarded.
    Overflow,
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineError::Overflow => write!(f, "line longer than {MAX_LINE_LEN} bytes"),
        }
    }
}

/// One complete line with the terminator stripped.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Line {
    bytes: Vec<u8, MAX_LINE_LEN>,
}

impl Line {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Views the payload as text.
    pub fn as_str(&self) -> Result<&str, Utf8Error> {
        str::from_utf8(&self.bytes)
    }
}

/// Accumulates bytes until CR or LF.
#[derive(Clone, Debug, Default)]
pub struct LineBuffer {
    bytes: Vec<u8, MAX_LINE_LEN>,
    discarding: bool,
}

impl LineBuffer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bytes: Vec::new(),
            discarding: false,
        }
    }

    /// Bytes buffered for the line in progress.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` while skipping the tail of an overlong line.
    #[must_use]
    pub const fn is_discarding(&self) -> bool {
        self.discarding
    }

    /// Feeds one byte and returns the line it terminates, if any.
    ///
    /// Empty lines (such as the LF of a CRLF pair) produce `Ok(None)`.
    pub fn ingest(&mut self, byte: u8) -> Result<Option<Line>, LineError> {
        if byte == CR || byte == LF {
            let discarded = core::mem::replace(&mut self.discarding, false);
            if discarded || self.bytes.is_empty() {
                self.bytes.clear();
                return Ok(None);
            }
            let bytes = core::mem::take(&mut self.bytes);
            return Ok(Some(Line { bytes }));
        }

        if self.discarding {
            return Ok(None);
        }

        if self.bytes.push(byte).is_err() {
            self.bytes.clear();
            self.discarding = true;
            return Err(LineError::Overflow);
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(buffer: &mut LineBuffer, input: &[u8]) -> heapless::Vec<Line, 4> {
        let mut lines = heapless::Vec::new();
        for byte in input {
            if let Ok(Some(line)) = buffer.ingest(*byte) {
                lines.push(line).expect("line capacity");
            }
        }
        lines
    }

    #[test]
    fn splits_on_cr_lf_and_crlf() {
        let mut buffer = LineBuffer::new();
        let lines = feed(&mut buffer, b"init\rtimer 30\nmaster on\r\n");
        let texts: heapless::Vec<&str, 4> = lines
            .iter()
            .map(|line| line.as_str().expect("ascii"))
            .collect();
        assert_eq!(texts.as_slice(), &["init", "timer 30", "master on"]);
        assert_eq!(buffer.pending(), 0);
    }

    #[test]
    fn empty_lines_are_ignored() {
        let mut buffer = LineBuffer::new();
        assert!(feed(&mut buffer, b"\r\n\n\r").is_empty());
    }

    #[test]
    fn payload_fills_buffer_exactly() {
        let mut buffer = LineBuffer::new();
        let payload = [b'x'; MAX_LINE_LEN];
        for byte in payload {
            assert_eq!(buffer.ingest(byte), Ok(None));
        }
        let line = buffer.ingest(b'\n').expect("no overflow").expect("line");
        assert_eq!(line.as_bytes(), &payload);
    }

    #[test]
    fn overflow_reports_once_and_resyncs() {
        let mut buffer = LineBuffer::new();
        for _ in 0..MAX_LINE_LEN {
            buffer.ingest(b'a').expect("fits");
        }
        assert_eq!(buffer.ingest(b'b'), Err(LineError::Overflow));
        assert!(buffer.is_discarding());
        assert_eq!(buffer.ingest(b'c'), Ok(None));
        assert_eq!(buffer.ingest(b'\n'), Ok(None));
        assert!(!buffer.is_discarding());

        let lines = feed(&mut buffer, b"init\n");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].as_bytes(), b"init");
    }

    #[test]
    fn non_utf8_payload_is_reported_by_as_str() {
        let mut buffer = LineBuffer::new();
        let lines = feed(&mut buffer, &[0xff, 0xfe, b'\n']);
        assert!(lines[0].as_str().is_err());
    }
}
