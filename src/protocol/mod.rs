//! Wire Protocol
//!
//! KegDB speaks a RESP-like protocol: requests are arrays of bulk strings,
//! replies are a mix of status lines, errors, integers, bulk strings and
//! arrays.
//!
//! - [`decoder`]: reads one request frame at a time from a byte stream
//! - [`types`]: the [`Reply`] enum and its wire encoding
//!
//! ## Example
//!
//! ```
//! use kegdb::protocol::Reply;
//!
//! let reply = Reply::bulk("value");
//! assert_eq!(reply.encode(), b"$5\r\nvalue\r\n");
//! ```

pub mod decoder;
pub mod types;

pub use decoder::{DecodeError, FrameDecoder};
pub use types::Reply;
