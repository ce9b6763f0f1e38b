//! Decoder for concatenated JSON progress messages.

use std::marker::PhantomData;

use bytes::{Buf, BytesMut};
use serde::de::DeserializeOwned;

use super::MessageDecoder;
use crate::error::EngineError;

/// Splits a body of back-to-back JSON values into typed messages.
///
/// Values may be separated by newlines or nothing at all, and may arrive
/// split across any number of chunks. Objects and arrays are only handed to
/// the deserializer once their closing bracket has been buffered, and the
/// scan for that bracket resumes where the previous chunk left it.
#[derive(Debug)]
pub struct JsonMessageReader<T> {
    buffer: BytesMut,
    scan: Scan,
    message: PhantomData<fn() -> T>,
}

impl<T> Default for JsonMessageReader<T> {
    fn default() -> Self {
        Self {
            buffer: BytesMut::new(),
            scan: Scan::default(),
            message: PhantomData,
        }
    }
}

/// Bracket-matching state for the object or array at the head of the buffer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Scan {
    /// Buffered bytes already examined.
    offset: usize,
    depth: usize,
    in_string: bool,
    escaped: bool,
}

impl Scan {
    /// Continue scanning `buffer`, returning the length of the first complete
    /// value once its closing bracket is buffered.
    fn value_end(&mut self, buffer: &[u8]) -> Option<usize> {
        for (index, &byte) in buffer.iter().enumerate().skip(self.offset) {
            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if byte == b'\\' {
                    self.escaped = true;
                } else if byte == b'"' {
                    self.in_string = false;
                }
                continue;
            }
            match byte {
                b'"' => self.in_string = true,
                b'{' | b'[' => self.depth += 1,
                b'}' | b']' => {
                    self.depth = self.depth.saturating_sub(1);
                    if self.depth == 0 {
                        self.offset = index + 1;
                        return Some(self.offset);
                    }
                }
                _ => {}
            }
        }
        self.offset = buffer.len();
        None
    }
}

fn malformed(error: &serde_json::Error) -> EngineError {
    EngineError::Parse {
        message: format!("malformed stream message: {error}"),
    }
}

impl<T> JsonMessageReader<T> {
    /// An empty reader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn skip_whitespace(&mut self) {
        let blank = self
            .buffer
            .iter()
            .take_while(|byte| byte.is_ascii_whitespace())
            .count();
        self.buffer.advance(blank);
    }

    /// Decode a leading scalar, or report garbage, directly.
    fn next_scalar(&mut self) -> Result<Option<T>, EngineError>
    where
        T: DeserializeOwned,
    {
        let mut values = serde_json::Deserializer::from_slice(&self.buffer).into_iter::<T>();
        match values.next() {
            Some(Ok(value)) => {
                let consumed = values.byte_offset();
                self.buffer.advance(consumed);
                Ok(Some(value))
            }
            Some(Err(error)) if error.is_eof() => Ok(None),
            Some(Err(error)) => Err(malformed(&error)),
            None => Ok(None),
        }
    }
}

impl<T> MessageDecoder for JsonMessageReader<T>
where
    T: DeserializeOwned + Send + 'static,
{
    type Message = T;

    fn feed(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    fn next_message(&mut self) -> Result<Option<T>, EngineError> {
        self.skip_whitespace();
        match self.buffer.first() {
            None => return Ok(None),
            Some(b'{' | b'[') => {}
            Some(_) => return self.next_scalar(),
        }

        let Some(end) = self.scan.value_end(&self.buffer) else {
            return Ok(None);
        };
        let value = self.buffer.split_to(end);
        self.scan = Scan::default();
        serde_json::from_slice(&value)
            .map(Some)
            .map_err(|error| malformed(&error))
    }

    fn finish(&mut self) -> Result<Option<T>, EngineError> {
        if let Some(value) = self.next_message()? {
            return Ok(Some(value));
        }
        if self.buffer.is_empty() {
            return Ok(None);
        }
        Err(EngineError::Parse {
            message: format!(
                "stream ended inside a message ({} bytes left)",
                self.buffer.len()
            ),
        })
    }
}
