//! Parley Persistence - durable key-value storage for local state
//!
//! Every piece of client state (user list, per-user room list, per-room message
//! log) is stored as one JSON value under a string key. Two backends are
//! provided: SQLite for the real client and an in-memory map for tests and
//! embedders.

pub mod error;
pub mod keys;
pub mod memory;
pub mod sqlite;
pub mod store;

pub use error::{Result, StorageError};
pub use keys::{chatrooms_key, messages_key, USERS_KEY};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use store::{get_json, set_json, KeyValueStore};
