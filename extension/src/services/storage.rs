// Extension storage with tiered fallback
// Sync area first, local area second, empty result when everything fails

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::StorageError;

/// Key/value payload exchanged with a storage area
pub type StorageMap = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageTier {
    /// `storage.sync`, replicated across the user's browsers
    Sync,
    /// `storage.local`, this device only
    Local,
    /// Process memory, for hosts without extension storage
    Memory,
}

impl StorageTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageTier::Sync => "sync",
            StorageTier::Local => "local",
            StorageTier::Memory => "memory",
        }
    }
}

/// How the host exposes `storage.<area>.get/set`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallingConvention {
    /// Methods return a Promise (Firefox `browser.*`, Chrome MV3)
    Promise,
    /// Methods take a completion callback and report via `runtime.lastError`
    Callback,
}

#[async_trait(?Send)]
pub trait StorageBackend {
    fn name(&self) -> &str;

    /// Read `key`. An absent key is an empty map, not an error.
    async fn get(&self, key: &str) -> Result<StorageMap, StorageError>;

    async fn set(&self, items: &StorageMap) -> Result<(), StorageError>;
}

/// Ordered list of storage backends; the first one that answers wins.
///
/// Failures never reach the caller: a read that no backend can serve is an
/// empty map, a write that no backend accepts is dropped after logging.
/// A value written to a later tier is only visible while earlier tiers keep
/// failing the same way.
#[derive(Clone)]
pub struct TieredStorage {
    backends: Rc<Vec<Box<dyn StorageBackend>>>,
}

impl TieredStorage {
    pub fn new(backends: Vec<Box<dyn StorageBackend>>) -> Self {
        Self {
            backends: Rc::new(backends),
        }
    }

    pub fn tier_names(&self) -> Vec<String> {
        self.backends.iter().map(|b| b.name().to_string()).collect()
    }

    pub async fn get(&self, key: &str) -> StorageMap {
        for backend in self.backends.iter() {
            log::debug!("Reading '{}' from {} storage", key, backend.name());
            match backend.get(key).await {
                Ok(data) => {
                    log::info!(
                        "Retrieved '{}' from {} storage (present: {})",
                        key,
                        backend.name(),
                        data.contains_key(key)
                    );
                    return data;
                }
                Err(e) => {
                    log::warn!("{} storage get failed, trying next tier: {}", backend.name(), e);
                }
            }
        }

        log::error!("All storage tiers failed to read '{}'", key);
        StorageMap::new()
    }

    /// Non-empty string stored under `key`, if any
    pub async fn get_string(&self, key: &str) -> Option<String> {
        self.get(key)
            .await
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    pub async fn set(&self, key: &str, value: impl Into<Value>) {
        let mut items = StorageMap::new();
        items.insert(key.to_string(), value.into());
        self.set_items(&items).await;
    }

    pub async fn set_items(&self, items: &StorageMap) {
        let keys: Vec<&String> = items.keys().collect();
        for backend in self.backends.iter() {
            log::debug!("Saving {:?} to {} storage", keys, backend.name());
            match backend.set(items).await {
                Ok(()) => {
                    log::info!("Saved {:?} to {} storage successfully", keys, backend.name());
                    return;
                }
                Err(e) => {
                    log::warn!("{} storage set failed, trying next tier: {}", backend.name(), e);
                }
            }
        }

        log::error!("All storage tiers failed to save {:?}", keys);
    }
}

/// In-memory storage area. Clones share the same contents.
#[derive(Clone, Default)]
pub struct MemoryArea {
    name: String,
    inner: Rc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    data: RefCell<StorageMap>,
    fail_reads: Cell<bool>,
    fail_writes: Cell<bool>,
    writes: Cell<usize>,
}

impl MemoryArea {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: Rc::default(),
        }
    }

    /// Make every subsequent read fail (or succeed again)
    pub fn fail_reads(&self, fail: bool) {
        self.inner.fail_reads.set(fail);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.inner.fail_writes.set(fail);
    }

    /// Number of accepted writes
    pub fn write_count(&self) -> usize {
        self.inner.writes.get()
    }

    pub fn value(&self, key: &str) -> Option<Value> {
        self.inner.data.borrow().get(key).cloned()
    }

    pub fn boxed(&self) -> Box<dyn StorageBackend> {
        Box::new(self.clone())
    }
}

#[async_trait(?Send)]
impl StorageBackend for MemoryArea {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> Result<StorageMap, StorageError> {
        if self.inner.fail_reads.get() {
            return Err(StorageError::Unavailable(self.name.clone()));
        }
        let mut result = StorageMap::new();
        if let Some(value) = self.inner.data.borrow().get(key) {
            result.insert(key.to_string(), value.clone());
        }
        Ok(result)
    }

    async fn set(&self, items: &StorageMap) -> Result<(), StorageError> {
        if self.inner.fail_writes.get() {
            return Err(StorageError::Rejected {
                area: self.name.clone(),
                message: "QUOTA_BYTES_PER_ITEM quota exceeded".to_string(),
            });
        }
        let mut data = self.inner.data.borrow_mut();
        for (key, value) in items {
            data.insert(key.clone(), value.clone());
        }
        self.inner.writes.set(self.inner.writes.get() + 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use serde_json::json;

    fn tiers() -> (MemoryArea, MemoryArea, TieredStorage) {
        let sync = MemoryArea::new("sync");
        let local = MemoryArea::new("local");
        let storage = TieredStorage::new(vec![sync.boxed(), local.boxed()]);
        (sync, local, storage)
    }

    #[test]
    fn test_read_after_write_same_tier() {
        let (sync, local, storage) = tiers();

        block_on(storage.set("openaiApiKey", "sk-12345"));

        let data = block_on(storage.get("openaiApiKey"));
        assert_eq!(data.get("openaiApiKey"), Some(&json!("sk-12345")));
        assert_eq!(sync.write_count(), 1);
        assert_eq!(local.write_count(), 0);
    }

    #[test]
    fn test_absent_key_is_empty_map() {
        let (_, _, storage) = tiers();
        assert!(block_on(storage.get("missing")).is_empty());
        assert_eq!(block_on(storage.get_string("missing")), None);
    }

    #[test]
    fn test_sync_write_failure_falls_back_to_local() {
        let (sync, local, storage) = tiers();
        sync.fail_writes(true);
        sync.fail_reads(true);

        block_on(storage.set("openaiApiKey", "sk-local"));

        assert_eq!(sync.value("openaiApiKey"), None);
        assert_eq!(local.value("openaiApiKey"), Some(json!("sk-local")));
        assert_eq!(
            block_on(storage.get_string("openaiApiKey")).as_deref(),
            Some("sk-local")
        );
    }

    #[test]
    fn test_sync_value_shadows_local_once_sync_recovers() {
        let (sync, local, storage) = tiers();
        sync.fail_writes(true);
        sync.fail_reads(true);
        block_on(storage.set("openaiApiKey", "sk-local"));

        sync.fail_writes(false);
        sync.fail_reads(false);
        block_on(sync.set(&{
            let mut items = StorageMap::new();
            items.insert("openaiApiKey".into(), json!("sk-elsewhere"));
            items
        }))
        .unwrap();

        assert_eq!(
            block_on(storage.get_string("openaiApiKey")).as_deref(),
            Some("sk-elsewhere")
        );
        assert_eq!(local.value("openaiApiKey"), Some(json!("sk-local")));
    }

    #[test]
    fn test_all_tiers_failing_read_is_empty() {
        let (sync, local, storage) = tiers();
        block_on(storage.set("openaiApiKey", "sk-12345"));
        sync.fail_reads(true);
        local.fail_reads(true);

        assert!(block_on(storage.get("openaiApiKey")).is_empty());
    }

    #[test]
    fn test_all_tiers_failing_write_completes() {
        let (sync, local, storage) = tiers();
        sync.fail_writes(true);
        local.fail_writes(true);

        block_on(storage.set("openaiApiKey", "sk-12345"));

        assert_eq!(sync.write_count() + local.write_count(), 0);
        assert!(block_on(storage.get("openaiApiKey")).is_empty());
    }

    #[test]
    fn test_empty_tier_list() {
        let storage = TieredStorage::new(Vec::new());
        block_on(storage.set("k", "v"));
        assert!(block_on(storage.get("k")).is_empty());
    }

    #[test]
    fn test_empty_string_is_not_a_value() {
        let (_, _, storage) = tiers();
        block_on(storage.set("openaiApiKey", ""));
        assert_eq!(block_on(storage.get_string("openaiApiKey")), None);
    }
}
