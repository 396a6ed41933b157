//! Response capture buffer.
//!
//! Stands in for the real response while the inner service runs, accumulating
//! whatever the upstream writes. Mirrors the contract of the response it
//! replaces: a single buffer accepts either binary writes or text writes,
//! never both. The captured bytes decode as UTF-8; anything else is a capture
//! error and fails the request through the normal error path.
//!
//! No size bound is enforced here; an oversized template blocks on memory,
//! not on this buffer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("binary and text writes cannot be mixed on one capture buffer")]
    MixedWriteModes,

    #[error("captured body is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    Unset,
    Binary,
    Text,
}

/// Accumulates one response body for later inspection.
#[derive(Debug)]
pub struct CaptureBuffer {
    buf: Vec<u8>,
    mode: WriteMode,
}

impl CaptureBuffer {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            mode: WriteMode::Unset,
        }
    }

    /// Append raw bytes. Fails if the buffer is already in text mode.
    pub fn write_bytes(&mut self, chunk: &[u8]) -> Result<(), CaptureError> {
        match self.mode {
            WriteMode::Text => Err(CaptureError::MixedWriteModes),
            _ => {
                self.mode = WriteMode::Binary;
                self.buf.extend_from_slice(chunk);
                Ok(())
            }
        }
    }

    /// Append text. Fails if the buffer is already in binary mode.
    pub fn write_str(&mut self, text: &str) -> Result<(), CaptureError> {
        match self.mode {
            WriteMode::Binary => Err(CaptureError::MixedWriteModes),
            _ => {
                self.mode = WriteMode::Text;
                self.buf.extend_from_slice(text.as_bytes());
                Ok(())
            }
        }
    }

    /// Bytes captured so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The captured content, decoded with the fixed text encoding.
    pub fn into_string(self) -> Result<String, CaptureError> {
        Ok(String::from_utf8(self.buf)?)
    }
}

impl Default for CaptureBuffer {
    fn default() -> Self {
        Self::new()
    }
}
