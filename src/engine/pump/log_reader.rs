//! Decoder for container output streams.
//!
//! Attach, logs and exec bodies come in two shapes. Without a TTY the daemon
//! multiplexes stdout and stderr into frames with an 8-byte header: one byte
//! naming the stream, three zero bytes, then a big-endian payload length.
//! With a TTY the body is the raw terminal output.
//!
//! The shape is sniffed from the first eight bytes. Output is emitted one line
//! at a time per stream, without the trailing newline.

use std::collections::VecDeque;

use bytes::{Buf, BytesMut};

use super::MessageDecoder;
use crate::error::EngineError;

const HEADER_LEN: usize = 8;

/// Which stream a line of output came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    /// Standard input echoed back by the daemon.
    Stdin,
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
    /// Unframed TTY output.
    Raw,
}

impl LogKind {
    const fn from_stream_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Stdin),
            1 => Some(Self::Stdout),
            2 => Some(Self::Stderr),
            _ => None,
        }
    }

    const fn slot(self) -> usize {
        match self {
            Self::Stdin => 0,
            Self::Stdout => 1,
            Self::Stderr => 2,
            Self::Raw => 3,
        }
    }
}

/// One line of container output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMessage {
    /// The originating stream.
    pub kind: LogKind,
    /// The line, without its newline.
    pub content: String,
}

impl LogMessage {
    /// Build a message.
    #[must_use]
    pub fn new(kind: LogKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Framing {
    Unknown,
    Multiplexed,
    Raw,
}

/// Turns container output into [`LogMessage`] lines.
#[derive(Debug)]
pub struct LogMessageReader {
    framing: Framing,
    buffer: BytesMut,
    lines: [Vec<u8>; 4],
    ready: VecDeque<LogMessage>,
}

impl Default for LogMessageReader {
    fn default() -> Self {
        Self {
            framing: Framing::Unknown,
            buffer: BytesMut::new(),
            lines: Default::default(),
            ready: VecDeque::new(),
        }
    }
}

impl LogMessageReader {
    /// A reader that detects the framing from the data.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A reader for TTY output, which is never multiplexed.
    #[must_use]
    pub fn raw() -> Self {
        Self {
            framing: Framing::Raw,
            ..Self::default()
        }
    }

    fn detect_framing(&mut self) {
        if self.framing != Framing::Unknown || self.buffer.len() < HEADER_LEN {
            return;
        }
        let stream_ok = self
            .buffer
            .first()
            .is_some_and(|byte| LogKind::from_stream_byte(*byte).is_some());
        let padding_ok = self
            .buffer
            .get(1..4)
            .is_some_and(|padding| padding.iter().all(|byte| *byte == 0));
        self.framing = if stream_ok && padding_ok {
            Framing::Multiplexed
        } else {
            Framing::Raw
        };
    }

    fn decode_frames(&mut self) {
        loop {
            let Some(header) = self.buffer.get(..HEADER_LEN) else {
                return;
            };
            let kind = header
                .first()
                .copied()
                .and_then(LogKind::from_stream_byte)
                .unwrap_or(LogKind::Raw);
            let length = header
                .get(4..)
                .unwrap_or_default()
                .iter()
                .fold(0_usize, |acc, byte| (acc << 8) | usize::from(*byte));
            if self.buffer.len() < HEADER_LEN + length {
                return;
            }
            self.buffer.advance(HEADER_LEN);
            let payload = self.buffer.split_to(length);
            self.push_bytes(kind, &payload);
        }
    }

    fn push_bytes(&mut self, kind: LogKind, bytes: &[u8]) {
        let slot = kind.slot();
        let Some(line) = self.lines.get_mut(slot) else {
            return;
        };
        for byte in bytes {
            if *byte == b'\n' {
                let content = String::from_utf8_lossy(line).into_owned();
                line.clear();
                self.ready.push_back(LogMessage::new(kind, content));
            } else {
                line.push(*byte);
            }
        }
    }

    fn flush_partial_lines(&mut self) {
        for kind in [LogKind::Stdin, LogKind::Stdout, LogKind::Stderr, LogKind::Raw] {
            let Some(line) = self
                .lines
                .get_mut(kind.slot())
                .filter(|pending| !pending.is_empty())
            else {
                continue;
            };
            let content = String::from_utf8_lossy(line).into_owned();
            line.clear();
            self.ready.push_back(LogMessage::new(kind, content));
        }
    }

    fn process_buffer(&mut self) {
        self.detect_framing();
        match self.framing {
            Framing::Unknown => {}
            Framing::Multiplexed => self.decode_frames(),
            Framing::Raw => {
                let raw = self.buffer.split();
                self.push_bytes(LogKind::Raw, &raw);
            }
        }
    }
}

impl MessageDecoder for LogMessageReader {
    type Message = LogMessage;

    fn feed(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
        self.process_buffer();
    }

    fn next_message(&mut self) -> Result<Option<LogMessage>, EngineError> {
        Ok(self.ready.pop_front())
    }

    fn finish(&mut self) -> Result<Option<LogMessage>, EngineError> {
        if self.framing == Framing::Unknown && !self.buffer.is_empty() {
            self.framing = Framing::Raw;
            self.process_buffer();
        }
        if self.framing == Framing::Multiplexed && !self.buffer.is_empty() {
            let left = self.buffer.len();
            self.buffer.clear();
            return Err(EngineError::Parse {
                message: format!("output stream ended inside a frame ({left} bytes left)"),
            });
        }
        if self.ready.is_empty() {
            self.flush_partial_lines();
        }
        Ok(self.ready.pop_front())
    }
}
