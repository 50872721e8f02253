//! Concrete [`KvStore`] areas: volatile memory and on-disk cnidarium.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use cnidarium::{StateDelta, StateRead, StateWrite, Storage};
use futures::StreamExt;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::KvStore;

/// Process-local area. Contents vanish with the process.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .entries
            .read()
            .await
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

/// Persistent area backed by a cnidarium database directory.
pub struct CnidariumStore {
    storage: Storage,
}

impl CnidariumStore {
    pub async fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create {}", data_dir.display()))?;
        let storage = Storage::load(data_dir.to_path_buf(), vec![])
            .await
            .context("Failed to init cnidarium storage")?;
        debug!(path = %data_dir.display(), "marker storage opened");
        Ok(Self { storage })
    }
}

#[async_trait]
impl KvStore for CnidariumStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let snapshot = self.storage.latest_snapshot();
        snapshot.get_raw(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let mut delta = StateDelta::new(self.storage.latest_snapshot());
        delta.put_raw(key.to_string(), value);
        self.storage.commit(delta).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut delta = StateDelta::new(self.storage.latest_snapshot());
        delta.delete(key.to_string());
        self.storage.commit(delta).await?;
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let snapshot = self.storage.latest_snapshot();
        let mut stream = snapshot.prefix_raw(prefix);
        let mut keys = Vec::new();

        while let Some(entry) = stream.next().await {
            match entry {
                Ok((key, _)) => keys.push(key),
                Err(e) => warn!("Error reading key stream: {}", e),
            }
        }

        Ok(keys)
    }
}
