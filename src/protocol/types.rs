//! Wire Reply Types
//!
//! The reply side of the RESP-like protocol KegDB speaks. Each reply type
//! starts with a prefix byte and every line is terminated with CRLF:
//!
//! - `+<string>\r\n` status
//! - `-<message>\r\n` error
//! - `:<integer>\r\n` integer
//! - `$<length>\r\n<bytes>\r\n` bulk string, `$-1\r\n` nil
//! - `*<count>\r\n<elements...>` array

use bytes::Bytes;

/// The line terminator used on the wire.
pub const CRLF: &[u8] = b"\r\n";

/// A reply to be encoded and sent back to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Status line, e.g. `+OK`
    Simple(String),
    /// Error line; rendered with a `-` prefix
    Error(String),
    /// Signed 64-bit integer
    Integer(i64),
    /// Binary-safe, length-prefixed string
    Bulk(Bytes),
    /// Nil bulk string (`$-1`)
    Nil,
    /// Array of replies
    Array(Vec<Reply>),
}

impl Reply {
    /// The `+OK` status reply.
    pub fn ok() -> Self {
        Reply::Simple("OK".to_string())
    }

    /// The `+PONG` status reply.
    pub fn pong() -> Self {
        Reply::Simple("PONG".to_string())
    }

    /// Creates an error reply.
    pub fn error(msg: impl Into<String>) -> Self {
        Reply::Error(msg.into())
    }

    /// Creates a bulk string reply.
    pub fn bulk(data: impl Into<Bytes>) -> Self {
        Reply::Bulk(data.into())
    }

    /// Encodes the reply to its wire representation.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode_into(&mut buf);
        buf
    }

    /// Encodes the reply into an existing buffer.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        match self {
            Reply::Simple(s) => {
                buf.push(b'+');
                buf.extend_from_slice(s.as_bytes());
                buf.extend_from_slice(CRLF);
            }
            Reply::Error(s) => {
                buf.push(b'-');
                buf.extend_from_slice(s.as_bytes());
                buf.extend_from_slice(CRLF);
            }
            Reply::Integer(n) => {
                buf.push(b':');
                buf.extend_from_slice(n.to_string().as_bytes());
                buf.extend_from_slice(CRLF);
            }
            Reply::Bulk(data) => {
                buf.push(b'$');
                buf.extend_from_slice(data.len().to_string().as_bytes());
                buf.extend_from_slice(CRLF);
                buf.extend_from_slice(data);
                buf.extend_from_slice(CRLF);
            }
            Reply::Nil => {
                buf.extend_from_slice(b"$-1");
                buf.extend_from_slice(CRLF);
            }
            Reply::Array(elements) => {
                buf.push(b'*');
                buf.extend_from_slice(elements.len().to_string().as_bytes());
                buf.extend_from_slice(CRLF);
                for element in elements {
                    element.encode_into(buf);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_encoding() {
        assert_eq!(Reply::ok().encode(), b"+OK\r\n");
        assert_eq!(Reply::pong().encode(), b"+PONG\r\n");
    }

    #[test]
    fn error_encoding() {
        let reply = Reply::error("ERR unknown command 'FOO'");
        assert_eq!(reply.encode(), b"-ERR unknown command 'FOO'\r\n");
    }

    #[test]
    fn integer_encoding() {
        assert_eq!(Reply::Integer(1000).encode(), b":1000\r\n");
        assert_eq!(Reply::Integer(-2).encode(), b":-2\r\n");
    }

    #[test]
    fn bulk_encoding() {
        assert_eq!(Reply::bulk("hello").encode(), b"$5\r\nhello\r\n");
        assert_eq!(Reply::bulk("").encode(), b"$0\r\n\r\n");
    }

    #[test]
    fn binary_safe_bulk() {
        let reply = Reply::Bulk(Bytes::from(&b"he\x00lo"[..]));
        assert_eq!(reply.encode(), b"$5\r\nhe\x00lo\r\n");
    }

    #[test]
    fn nil_encoding() {
        assert_eq!(Reply::Nil.encode(), b"$-1\r\n");
    }

    #[test]
    fn array_encoding() {
        let reply = Reply::Array(vec![Reply::bulk("user:a"), Reply::bulk("user:b")]);
        assert_eq!(reply.encode(), b"*2\r\n$6\r\nuser:a\r\n$6\r\nuser:b\r\n");

        assert_eq!(Reply::Array(vec![]).encode(), b"*0\r\n");
    }
}
