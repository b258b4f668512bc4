//! # KegDB - An In-Memory Key-Value Store with TTL Support
//!
//! KegDB is a small key-value server speaking a RESP-like wire protocol.
//! It serves concurrent clients simple get/set/expire workloads over TCP.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ TCP Listener │───>│  Connection  │───>│   Command    │
//! │   (main.rs)  │    │   Handler    │    │   Handler    │
//! └──────────────┘    └──────┬───────┘    └──────┬───────┘
//!                            │                   │
//!                     ┌──────▼───────┐    ┌──────▼───────┐
//!                     │ FrameDecoder │    │    Store     │
//!                     │   + Reply    │    │ (one mutex)  │
//!                     └──────────────┘    └──────▲───────┘
//!                                                │
//!                                       ┌────────┴────────┐
//!                                       │  ExpirySweeper  │
//!                                       │ (1s tokio task) │
//!                                       └─────────────────┘
//! ```
//!
//! Data flow: bytes → decoder → argument list → dispatcher → store call →
//! reply bytes.
//!
//! ## Expiry
//!
//! Keys with a TTL are expired two independent ways:
//! 1. **Lazy**: every read-path operation treats a past-deadline key as
//!    absent and removes it on access.
//! 2. **Active**: a background task sweeps all expired keys once a second,
//!    so memory is reclaimed even for keys never read again.
//!
//! ## Supported Commands
//!
//! `PING`, `SET key value [EX seconds]`, `GET`, `DEL`, `EXISTS`,
//! `PERSIST`, `FLUSHALL`, `KEYS pattern`, `RENAME`, `TTL`, `EXPIRE`
//!
//! ## Quick Start
//!
//! ```ignore
//! use kegdb::commands::CommandHandler;
//! use kegdb::connection::{handle_connection, ConnectionStats};
//! use kegdb::store::{start_sweeper, Store};
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(Store::new());
//!     let _sweeper = start_sweeper(Arc::clone(&store));
//!     let stats = Arc::new(ConnectionStats::new());
//!
//!     let listener = TcpListener::bind("127.0.0.1:6380").await.unwrap();
//!     loop {
//!         let (stream, addr) = listener.accept().await.unwrap();
//!         let commands = CommandHandler::new(Arc::clone(&store));
//!         tokio::spawn(handle_connection(stream, addr, commands, Arc::clone(&stats)));
//!     }
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`store`]: the single-lock TTL-aware map and the expiry sweeper
//! - [`protocol`]: request frame decoder and reply encoding
//! - [`commands`]: command validation and dispatch
//! - [`connection`]: per-client connection loop

pub mod commands;
pub mod connection;
pub mod protocol;
pub mod store;

// Re-export commonly used types for convenience
pub use commands::{CommandError, CommandHandler};
pub use connection::{handle_connection, ConnectionStats};
pub use protocol::{DecodeError, FrameDecoder, Reply};
pub use store::{start_sweeper, Store, SweeperConfig, SweeperHandle};

/// The default port KegDB listens on
pub const DEFAULT_PORT: u16 = 6380;

/// The default host KegDB binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Version of KegDB
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
