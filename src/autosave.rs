//! Debounced draft autosave
//!
//! Best-effort persistence of the active session's drafts to a local
//! key-value area, so a reload survives. On any mutation the caller hands
//! the fresh snapshot to [`DraftAutosave::schedule`]; the write happens
//! after a quiet debounce window and a newer snapshot supersedes any
//! pending one (single flight, last write wins). Storage failures never
//! surface to the user and never block editing or submission.
//!
//! The key-value area sits behind the narrow [`DraftArea`] trait so tests
//! substitute an in-memory store without touching validation logic.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::draft::{DraftStore, Variant};
use crate::error::RegistryError;

/// Key for the active variant selector
pub const ACTIVE_VARIANT_KEY: &str = "draft/active_variant";
/// Key for the Local draft snapshot
pub const LOCAL_DRAFT_KEY: &str = "draft/local";
/// Key for the Organization draft snapshot
pub const ORGANIZATION_DRAFT_KEY: &str = "draft/organization";

/// Narrow persistent key-value interface for draft snapshots
pub trait DraftArea: Send + Sync {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), RegistryError>;
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, RegistryError>;
    fn remove(&self, key: &str) -> Result<(), RegistryError>;
}

/// sled-backed draft area
pub struct SledDraftArea {
    db: sled::Db,
}

impl SledDraftArea {
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self, RegistryError> {
        let db = sled::open(path.as_ref())?;
        Ok(Self { db })
    }
}

impl DraftArea for SledDraftArea {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), RegistryError> {
        self.db.insert(key.as_bytes(), value)?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, RegistryError> {
        Ok(self.db.get(key.as_bytes())?.map(|v| v.to_vec()))
    }

    fn remove(&self, key: &str) -> Result<(), RegistryError> {
        self.db.remove(key.as_bytes())?;
        Ok(())
    }
}

/// In-memory draft area for tests, with write counting and injectable
/// failures
#[derive(Default)]
pub struct MemoryDraftArea {
    map: Mutex<std::collections::HashMap<String, Vec<u8>>>,
    puts: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryDraftArea {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl DraftArea for MemoryDraftArea {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), RegistryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RegistryError::DraftStorage("quota exceeded".into()));
        }
        self.puts.fetch_add(1, Ordering::SeqCst);
        let Ok(mut map) = self.map.lock() else {
            return Err(RegistryError::DraftStorage("lock poisoned".into()));
        };
        map.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, RegistryError> {
        let Ok(map) = self.map.lock() else {
            return Err(RegistryError::DraftStorage("lock poisoned".into()));
        };
        Ok(map.get(key).cloned())
    }

    fn remove(&self, key: &str) -> Result<(), RegistryError> {
        let Ok(mut map) = self.map.lock() else {
            return Err(RegistryError::DraftStorage("lock poisoned".into()));
        };
        map.remove(key);
        Ok(())
    }
}

/// Write all three draft keys immediately
pub fn write_now(area: &dyn DraftArea, store: &DraftStore) -> Result<(), RegistryError> {
    area.put(ACTIVE_VARIANT_KEY, store.active.as_str().as_bytes())?;

    let local = rmp_serde::to_vec_named(&store.local)
        .map_err(|e| RegistryError::DraftStorage(format!("Serialization error: {}", e)))?;
    area.put(LOCAL_DRAFT_KEY, &local)?;

    let organization = rmp_serde::to_vec_named(&store.organization)
        .map_err(|e| RegistryError::DraftStorage(format!("Serialization error: {}", e)))?;
    area.put(ORGANIZATION_DRAFT_KEY, &organization)?;

    Ok(())
}

/// Restore the draft store from the last successful write.
///
/// Missing or corrupt data silently yields defaults; a reload must never
/// show the user a draft-storage error.
pub fn hydrate(area: &dyn DraftArea) -> DraftStore {
    let active = area
        .get(ACTIVE_VARIANT_KEY)
        .ok()
        .flatten()
        .and_then(|b| String::from_utf8(b).ok())
        .and_then(|s| Variant::parse(&s))
        .unwrap_or(Variant::Local);

    let local = area
        .get(LOCAL_DRAFT_KEY)
        .ok()
        .flatten()
        .and_then(|b| rmp_serde::from_slice(&b).ok())
        .unwrap_or_default();

    let organization = area
        .get(ORGANIZATION_DRAFT_KEY)
        .ok()
        .flatten()
        .and_then(|b| rmp_serde::from_slice(&b).ok())
        .unwrap_or_default();

    DraftStore {
        active,
        local,
        organization,
    }
}

/// Debounced, single-flight draft writer
pub struct DraftAutosave {
    area: Arc<dyn DraftArea>,
    debounce: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl DraftAutosave {
    pub fn new(area: Arc<dyn DraftArea>, debounce: Duration) -> Self {
        Self {
            area,
            debounce,
            pending: Mutex::new(None),
        }
    }

    /// Manager with the configured debounce window
    pub fn from_config(area: Arc<dyn DraftArea>, config: &crate::config::Config) -> Self {
        Self::new(area, Duration::from_millis(config.autosave_debounce_ms))
    }

    /// Schedule a write of this snapshot after the debounce window. A
    /// pending scheduled write is superseded.
    pub fn schedule(&self, store: &DraftStore) {
        let snapshot = store.clone();
        let area = Arc::clone(&self.area);
        let debounce = self.debounce;

        let Ok(mut pending) = self.pending.lock() else {
            return;
        };
        if let Some(handle) = pending.take() {
            handle.abort();
        }
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if let Err(e) = write_now(area.as_ref(), &snapshot) {
                debug!(error = %e, "Draft autosave failed; continuing without it");
            }
        }));
    }

    /// Cancel any pending write and persist this snapshot right away
    pub fn flush(&self, store: &DraftStore) {
        if let Ok(mut pending) = self.pending.lock() {
            if let Some(handle) = pending.take() {
                handle.abort();
            }
        }
        if let Err(e) = write_now(self.area.as_ref(), store) {
            debug!(error = %e, "Draft flush failed; continuing without it");
        }
    }
}
