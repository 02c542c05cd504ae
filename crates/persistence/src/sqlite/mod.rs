//! SQLite-backed key-value store

mod connection;

pub use connection::SqliteStore;
