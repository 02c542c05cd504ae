//! Versioned JSON snapshots
//!
//! Payloads are stored as `{"version": N, "data": ...}`. A payload without
//! that wrapper is a pre-versioning save and is read as version 0. Each
//! schema carries its migration chain; `migrations[i]` upgrades version
//! `i` to `i + 1`, so the current version is the chain length.

use crate::store::KeyValueStore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use wallnance_core::{Error, Result};

/// Upgrade a payload by one version
pub type Migration = fn(Value) -> Result<Value>;

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    version: u32,
    data: &'a T,
}

#[derive(Deserialize)]
struct Envelope {
    version: u32,
    data: Value,
}

/// A storage key together with its migration chain
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub key: &'static str,
    pub migrations: &'static [Migration],
}

impl Schema {
    pub const fn new(key: &'static str, migrations: &'static [Migration]) -> Self {
        Self { key, migrations }
    }

    /// Version written by `save`
    pub fn version(&self) -> u32 {
        self.migrations.len() as u32
    }

    /// Load and upgrade the stored payload, `None` if nothing is stored
    pub async fn load<T, S>(&self, store: &S) -> Result<Option<T>>
    where
        T: DeserializeOwned,
        S: KeyValueStore,
    {
        let Some(raw) = store.get(self.key).await? else {
            return Ok(None);
        };
        let value: Value = serde_json::from_str(&raw)?;
        let data = self.upgrade(value)?;
        Ok(Some(serde_json::from_value(data)?))
    }

    /// Serialize `value` in the current envelope and store it
    pub async fn save<T, S>(&self, store: &S, value: &T) -> Result<()>
    where
        T: Serialize,
        S: KeyValueStore,
    {
        let json = serde_json::to_string(&EnvelopeRef {
            version: self.version(),
            data: value,
        })?;
        store.set(self.key, &json).await
    }

    pub async fn remove<S: KeyValueStore>(&self, store: &S) -> Result<()> {
        store.remove(self.key).await
    }

    /// Unwrap the envelope and run the pending migrations
    pub fn upgrade(&self, value: Value) -> Result<Value> {
        let (mut version, mut data) = if is_envelope(&value) {
            let envelope: Envelope = serde_json::from_value(value)?;
            (envelope.version, envelope.data)
        } else {
            (0, value)
        };

        let current = self.version();
        if version > current {
            return Err(Error::InvalidData(format!(
                "{} was saved with schema version {}, newest known is {}",
                self.key, version, current
            )));
        }

        if version < current {
            info!("Migrating {} from version {} to {}", self.key, version, current);
        }
        while version < current {
            data = (self.migrations[version as usize])(data)?;
            version += 1;
            debug!("{} upgraded to version {}", self.key, version);
        }

        Ok(data)
    }
}

fn is_envelope(value: &Value) -> bool {
    match value.as_object() {
        Some(obj) => {
            obj.len() == 2
                && obj.get("version").map(Value::is_u64).unwrap_or(false)
                && obj.contains_key("data")
        }
        None => false,
    }
}

/// Migration that accepts the payload unchanged
pub fn unchanged(value: Value) -> Result<Value> {
    Ok(value)
}

/// Read a plain stringified number (the balance layout)
pub async fn load_number<S: KeyValueStore>(store: &S, key: &str) -> Result<Option<f64>> {
    match store.get(key).await? {
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|e| Error::InvalidData(format!("{}: {}", key, e))),
        None => Ok(None),
    }
}

/// Store a number as its decimal string
pub async fn save_number<S: KeyValueStore>(store: &S, key: &str, value: f64) -> Result<()> {
    store.set(key, &value.to_string()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use serde_json::json;

    fn add_flag(mut value: Value) -> Result<Value> {
        value["migrated"] = json!(true);
        Ok(value)
    }

    static TWO_STEP: Schema = Schema::new("thing", &[unchanged, add_flag]);

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Thing {
        name: String,
        #[serde(default)]
        migrated: bool,
    }

    #[tokio::test]
    async fn test_save_writes_envelope() {
        let store = MemoryStore::new();
        let thing = Thing { name: "a".into(), migrated: true };
        TWO_STEP.save(&store, &thing).await.unwrap();

        let raw: Value = serde_json::from_str(&store.get("thing").await.unwrap().unwrap()).unwrap();
        assert_eq!(raw["version"], 2);
        assert_eq!(raw["data"]["name"], "a");

        let loaded: Thing = TWO_STEP.load(&store).await.unwrap().unwrap();
        assert_eq!(loaded, thing);
    }

    #[tokio::test]
    async fn test_unversioned_payload_is_migrated() {
        let store = MemoryStore::new();
        store.set("thing", r#"{"name":"legacy"}"#).await.unwrap();

        let loaded: Thing = TWO_STEP.load(&store).await.unwrap().unwrap();
        assert_eq!(loaded.name, "legacy");
        assert!(loaded.migrated);
    }

    #[tokio::test]
    async fn test_future_version_rejected() {
        let store = MemoryStore::new();
        store.set("thing", r#"{"version":9,"data":{"name":"x"}}"#).await.unwrap();

        let result: Result<Option<Thing>> = TWO_STEP.load(&store).await;
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }

    #[tokio::test]
    async fn test_missing_key_loads_none() {
        let store = MemoryStore::new();
        let loaded: Option<Thing> = TWO_STEP.load(&store).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_number_layout() {
        let store = MemoryStore::new();
        save_number(&store, "player_balance", 1234.5).await.unwrap();
        assert_eq!(store.get("player_balance").await.unwrap().as_deref(), Some("1234.5"));
        assert_eq!(load_number(&store, "player_balance").await.unwrap(), Some(1234.5));

        store.set("player_balance", "abc").await.unwrap();
        assert!(load_number(&store, "player_balance").await.is_err());
    }
}
