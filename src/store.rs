//! Persistence collaborators.
//!
//! The core reads and writes configuration and per-user state as opaque
//! JSON blobs; the storage mechanism behind these traits is out of scope.
//! `Ok(None)` from a read means "never written", which callers treat
//! differently from a backend failure (`Err`).

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Local};
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of a config key's append-only change history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigRevision {
    /// 1-based, monotonically increasing per key.
    pub version: u32,
    pub value: Value,
    pub description: Option<String>,
    pub updated_at: DateTime<Local>,
}

/// Versioned configuration store with per-key change history.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Appends a new revision and returns its version number.
    async fn put(&self, key: &str, value: Value, description: Option<String>) -> Result<u32>;

    /// Full revision history for `key`, oldest first.
    async fn history(&self, key: &str) -> Result<Vec<ConfigRevision>>;
}

/// Key-value store for per-user session state blobs.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<Value>>;

    async fn save(&self, key: &str, value: Value) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory reference implementation of both stores. Backs tests and
/// single-process deployments; real adapters implement the same traits.
#[derive(Default)]
pub struct MemoryStore {
    configs: Mutex<HashMap<String, Vec<ConfigRevision>>>,
    state: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let configs = self.configs.lock().expect("config store poisoned");
        Ok(configs
            .get(key)
            .and_then(|revisions| revisions.last())
            .map(|revision| revision.value.clone()))
    }

    async fn put(&self, key: &str, value: Value, description: Option<String>) -> Result<u32> {
        let mut configs = self.configs.lock().expect("config store poisoned");
        let revisions = configs.entry(key.to_string()).or_default();
        let version = revisions.len() as u32 + 1;
        revisions.push(ConfigRevision {
            version,
            value,
            description,
            updated_at: Local::now(),
        });
        Ok(version)
    }

    async fn history(&self, key: &str) -> Result<Vec<ConfigRevision>> {
        let configs = self.configs.lock().expect("config store poisoned");
        Ok(configs.get(key).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn load(&self, key: &str) -> Result<Option<Value>> {
        let state = self.state.lock().expect("state store poisoned");
        Ok(state.get(key).cloned())
    }

    async fn save(&self, key: &str, value: Value) -> Result<()> {
        let mut state = self.state.lock().expect("state store poisoned");
        state.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut state = self.state.lock().expect("state store poisoned");
        state.remove(key);
        Ok(())
    }
}
