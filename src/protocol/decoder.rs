//! Request Frame Decoder
//!
//! Decodes the request side of the wire protocol: one array-of-bulk-strings
//! frame at a time from a buffered byte stream.
//!
//! ```text
//! "*" <decimal-count> EOL
//!   ( "$" <decimal-length> EOL <length-bytes> EOL ) x count
//! ```
//!
//! Lines may be CRLF- or LF-terminated; header remainders are trimmed
//! before parsing. Decoding is strictly sequential and fails fast.
//!
//! ## Error Classes
//!
//! A malformed *array header* (missing `*`, or a zero/negative/non-numeric
//! count) is the one recoverable decode error: the caller sends an error
//! reply and resumes with the next frame. Everything after the array header
//! is fatal when malformed — a bad bulk header, an unparsable length, or a
//! short read mean the stream position is no longer trustworthy, so the
//! connection must be terminated with no reply for that frame.
//!
//! Declared lengths and counts are bounded ([`MAX_BULK_SIZE`],
//! [`MAX_FRAME_ARGS`]) before any allocation, so a hostile header cannot
//! commit an arbitrarily large buffer. Exceeding a bound is fatal.

use bytes::Bytes;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::protocol::types::Reply;

/// Maximum size of a single bulk string payload (512 MB, same as Redis).
pub const MAX_BULK_SIZE: usize = 512 * 1024 * 1024;

/// Maximum number of elements in one request frame. No command takes more
/// than a handful of arguments, so this bounds the per-frame allocation.
pub const MAX_FRAME_ARGS: usize = 1024;

/// Errors produced while decoding a request frame.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The frame did not start with an array header
    #[error("expected array input")]
    ExpectedArray,

    /// The array count was zero, negative, or not a number
    #[error("invalid argument count")]
    BadArgCount,

    /// An element line did not start with a bulk string header
    #[error("expected bulk string")]
    ExpectedBulk,

    /// The bulk string length was negative or not a number
    #[error("invalid bulk length")]
    BadBulkLength,

    /// A declared length or count exceeds the allowed maximum
    #[error("message too large: {size} (max: {max})")]
    TooLarge { size: u64, max: usize },

    /// The stream ended or failed mid-frame
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl DecodeError {
    /// Whether the connection can keep reading frames after this error.
    ///
    /// Only array-header errors are recoverable; the reader is still
    /// positioned at a line boundary, so the next frame can be decoded.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ExpectedArray | Self::BadArgCount)
    }

    /// The error reply to send for a recoverable decode error.
    pub fn to_reply(&self) -> Reply {
        Reply::error(format!("ERR {}", self))
    }
}

/// Decodes request frames from a buffered async reader.
pub struct FrameDecoder<R> {
    reader: R,
}

impl<R: AsyncBufRead + Unpin> FrameDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Reads the next frame as an ordered list of arguments.
    ///
    /// Returns `Ok(None)` on a clean end of stream at a frame boundary.
    /// A frame always holds at least one argument: the count must be
    /// positive, so a zero-argument frame is rejected as
    /// [`DecodeError::BadArgCount`].
    pub async fn read_frame(&mut self) -> Result<Option<Vec<Bytes>>, DecodeError> {
        let mut line = String::new();
        if self.reader.read_line(&mut line).await? == 0 {
            return Ok(None);
        }

        let count = match line.trim().strip_prefix('*') {
            Some(rest) => rest.parse::<i64>().map_err(|_| DecodeError::BadArgCount)?,
            None => return Err(DecodeError::ExpectedArray),
        };
        if count <= 0 {
            return Err(DecodeError::BadArgCount);
        }
        if count as u64 > MAX_FRAME_ARGS as u64 {
            return Err(DecodeError::TooLarge {
                size: count as u64,
                max: MAX_FRAME_ARGS,
            });
        }

        let mut args = Vec::with_capacity(count as usize);
        for _ in 0..count {
            args.push(self.read_bulk().await?);
        }
        Ok(Some(args))
    }

    /// Reads one `$<length>` header line plus its payload.
    async fn read_bulk(&mut self) -> Result<Bytes, DecodeError> {
        let mut line = String::new();
        if self.reader.read_line(&mut line).await? == 0 {
            return Err(DecodeError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "stream closed mid-frame",
            )));
        }

        let len = match line.trim().strip_prefix('$') {
            Some(rest) => rest.parse::<i64>().map_err(|_| DecodeError::BadBulkLength)?,
            None => return Err(DecodeError::ExpectedBulk),
        };
        if len < 0 {
            return Err(DecodeError::BadBulkLength);
        }
        if len as u64 > MAX_BULK_SIZE as u64 {
            return Err(DecodeError::TooLarge {
                size: len as u64,
                max: MAX_BULK_SIZE,
            });
        }
        let len = len as usize;

        // Payload plus the trailing line terminator, which is discarded.
        let mut buf = vec![0u8; len + 2];
        self.reader.read_exact(&mut buf).await?;
        buf.truncate(len);
        Ok(Bytes::from(buf))
    }
}
