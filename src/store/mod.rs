//! Durable key-value collaborator.
//!
//! The only shared resource across service restarts. Rehydration reads it
//! once at boot; all later mutations funnel through the session store's
//! debounced writer and the history manager. Last-write-wins, no
//! transactional guarantees.

mod sqlite;

pub use sqlite::SqliteKvStore;

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Well-known keys used by the service.
pub mod keys {
    pub const SESSIONS: &str = "sessions";
    pub const HISTORY: &str = "summary_history";
    pub const CREDENTIAL: &str = "gemini_api_key";
}

#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory store for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}
