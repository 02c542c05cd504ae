//! Wallnance Persistence - Key-value stores and versioned snapshots

pub mod keys;
pub mod memory;
pub mod migrations;
pub mod snapshot;
pub mod sqlite;
pub mod store;

pub use memory::MemoryStore;
pub use snapshot::Schema;
pub use sqlite::SqliteStore;
pub use store::KeyValueStore;
