//! Command Layer
//!
//! Receives decoded request frames, validates them, executes them against
//! the store and produces replies.
//!
//! ```text
//! bytes ──> FrameDecoder ──> Vec<Bytes> ──> CommandHandler ──> Store
//!                                                │
//!                                                └──> Reply ──> bytes
//! ```

pub mod handler;

pub use handler::{CommandError, CommandHandler};
