//! The opaque key-value interface all game state is saved through

use std::future::Future;
use wallnance_core::Result;

/// Async string key-value storage
///
/// Values are opaque strings; callers decide the encoding.
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` if the key was never set or was removed
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Insert or overwrite a value
    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<()>> + Send;

    /// Delete a key; removing a missing key is not an error
    fn remove(&self, key: &str) -> impl Future<Output = Result<()>> + Send;
}
