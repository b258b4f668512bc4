//! Store Module
//!
//! The heart of KegDB: a TTL-aware key-value map behind one coarse lock,
//! plus the background sweeper that implements active expiry.
//!
//! - [`engine`]: the [`Store`] itself with all key operations
//! - [`sweeper`]: the periodic expiry sweep task and its shutdown handle
//!
//! ## Example
//!
//! ```
//! use kegdb::store::Store;
//! use bytes::Bytes;
//! use std::time::Duration;
//!
//! let store = Store::new();
//! store.set("session".to_string(), Bytes::from("token123"), Some(Duration::from_secs(3600)));
//! assert!(store.exists("session"));
//! assert!(store.ttl("session") > 0);
//! ```

pub mod engine;
mod glob;
pub mod sweeper;

pub use engine::{Entry, Store};
pub use sweeper::{start_sweeper, SweeperConfig, SweeperHandle};
