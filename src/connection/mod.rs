//! Connection Management
//!
//! One async task per accepted client. Each task owns a frame decoder and
//! a command handler bound to the shared store, and runs a
//! read-dispatch-reply loop until disconnect or a fatal protocol error.
//! A stalled or misbehaving client affects only its own task.

pub mod handler;

pub use handler::{handle_connection, ConnectionError, ConnectionHandler, ConnectionStats};
