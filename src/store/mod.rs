pub mod backend;
pub mod types;

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::anchor::identity::KEY_NAMESPACE;
use crate::state::{Settings, SETTINGS_KEY};
use types::{Marker, MarkerKind, PageRecord};

/// Minimal key-value contract shared by the sync and local areas.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;

    /// All keys starting with `prefix`, in no particular order.
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;
}

/// The two storage areas. Settings pick which one holds page records.
#[derive(Clone)]
pub struct Backends {
    sync: Arc<dyn KvStore>,
    local: Arc<dyn KvStore>,
}

impl Backends {
    pub fn new(sync: Arc<dyn KvStore>, local: Arc<dyn KvStore>) -> Self {
        Self { sync, local }
    }

    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(backend::MemoryStore::new()),
            Arc::new(backend::MemoryStore::new()),
        )
    }

    /// Area holding settings.
    pub fn sync(&self) -> &dyn KvStore {
        self.sync.as_ref()
    }

    pub async fn settings(&self) -> Settings {
        Settings::load(self.sync.as_ref()).await
    }

    /// Marker store for the area `settings` selects.
    pub fn markers(&self, settings: &Settings) -> MarkerStore {
        let kv = if settings.use_sync {
            Arc::clone(&self.sync)
        } else {
            Arc::clone(&self.local)
        };
        MarkerStore { kv }
    }
}

/// Reads and writes whole [`PageRecord`]s keyed by page key.
///
/// Every mutation is a read-modify-write of the full record with no version
/// check, so concurrent writers race and the last write wins.
#[derive(Clone)]
pub struct MarkerStore {
    kv: Arc<dyn KvStore>,
}

impl MarkerStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Record for `key`. A corrupt record is logged and treated as absent.
    pub async fn load(&self, key: &str) -> Result<Option<PageRecord>> {
        let Some(bytes) = self.kv.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_slice::<PageRecord>(&bytes) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!(page_key = key, "Ignoring unreadable page record: {}", e);
                Ok(None)
            }
        }
    }

    pub async fn save(&self, key: &str, record: &PageRecord) -> Result<()> {
        let bytes = serde_json::to_vec(record).context("serialize page record")?;
        self.kv.set(key, bytes).await
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        self.kv.remove(key).await?;
        debug!(page_key = key, "page record removed");
        Ok(())
    }

    /// Adds `marker` to the record for `key` and writes the record back.
    ///
    /// An auto marker replaces any previous auto marker. Manual markers
    /// accumulate up to `max_manual`, evicting the oldest.
    pub async fn append(
        &self,
        key: &str,
        marker: Marker,
        max_manual: usize,
        now: i64,
    ) -> Result<PageRecord> {
        let mut record = self.load(key).await?.unwrap_or_default();
        let kind = marker.kind;

        if kind == MarkerKind::Auto {
            record.markers.retain(|m| m.kind != MarkerKind::Auto);
        }
        record.markers.push(marker);
        if kind == MarkerKind::Manual {
            evict_oldest_manual(&mut record, max_manual.max(1));
        }
        record.last_updated = now;

        self.save(key, &record).await?;
        debug!(
            page_key = key,
            markers = record.markers.len(),
            "page record written"
        );
        Ok(record)
    }

    /// Page keys with a stored record.
    pub async fn page_keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self
            .kv
            .keys_with_prefix(KEY_NAMESPACE)
            .await?
            .into_iter()
            .filter(|k| k != SETTINGS_KEY)
            .collect();
        keys.sort();
        Ok(keys)
    }
}

fn evict_oldest_manual(record: &mut PageRecord, max_manual: usize) {
    let mut excess = record.count(MarkerKind::Manual).saturating_sub(max_manual);
    if excess == 0 {
        return;
    }
    record.markers.retain(|m| {
        if excess > 0 && m.kind == MarkerKind::Manual {
            excess -= 1;
            false
        } else {
            true
        }
    });
}
