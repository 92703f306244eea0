//! Client-local preference persistence.
//!
//! Preferences live under one string key in a key/value store, serialized
//! as JSON. They are loaded once when the store opens and written through on
//! every update.

use anyhow::{Context, Result};
use async_trait::async_trait;
use flow_core::{Preferences, PreferencesPatch};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::json_file;

/// Storage key holding the serialized preferences.
pub const PREFERENCES_KEY: &str = "preferences";

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: String) -> Result<()>;
}

/// String map persisted as a single JSON object on disk.
pub struct FileKeyValueStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileKeyValueStore {
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = json_file::read_or_default(&path).await;
        Self {
            path,
            entries: RwLock::new(entries),
        }
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let mut entries = self.entries.write().await;
        let mut next = entries.clone();
        next.insert(key.to_string(), value);
        json_file::write_atomic(&self.path, &next).await?;
        *entries = next;
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryKeyValueStore {
    entries: RwLock<BTreeMap<String, String>>,
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

pub struct PreferenceStore {
    kv: Arc<dyn KeyValueStore>,
    current: RwLock<Preferences>,
}

impl PreferenceStore {
    /// Load preferences once. A missing or unreadable blob falls back to
    /// defaults; an out-of-range one is kept but logged.
    pub async fn load(kv: Arc<dyn KeyValueStore>) -> Result<Self> {
        let current = match kv.get(PREFERENCES_KEY).await? {
            Some(blob) => match serde_json::from_str::<Preferences>(&blob) {
                Ok(prefs) => {
                    if let Err(e) = prefs.validate() {
                        tracing::warn!("Stored preferences out of range: {}", e);
                    }
                    prefs
                }
                Err(e) => {
                    tracing::warn!("Stored preferences unreadable, using defaults: {}", e);
                    Preferences::default()
                }
            },
            None => Preferences::default(),
        };
        Ok(Self {
            kv,
            current: RwLock::new(current),
        })
    }

    pub async fn open_file(path: impl Into<PathBuf>) -> Result<Self> {
        let kv: Arc<dyn KeyValueStore> = Arc::new(FileKeyValueStore::open(path).await);
        Self::load(kv).await
    }

    pub async fn get(&self) -> Preferences {
        self.current.read().await.clone()
    }

    /// Replace all preferences. Invalid values are rejected and nothing is
    /// written.
    pub async fn set(&self, prefs: Preferences) -> Result<Preferences> {
        prefs.validate()?;
        let blob = serde_json::to_string(&prefs).context("Failed to serialize preferences")?;
        let mut current = self.current.write().await;
        self.kv.set(PREFERENCES_KEY, blob).await?;
        *current = prefs.clone();
        Ok(prefs)
    }

    pub async fn update(&self, patch: PreferencesPatch) -> Result<Preferences> {
        let mut next = self.get().await;
        next.apply(patch);
        self.set(next).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_core::CoachPersonality;

    #[tokio::test]
    async fn test_defaults_when_empty() {
        let store = PreferenceStore::load(Arc::new(InMemoryKeyValueStore::default()))
            .await
            .unwrap();
        assert_eq!(store.get().await, Preferences::default());
    }

    #[tokio::test]
    async fn test_roundtrip_through_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("prefs.json");

        let store = PreferenceStore::open_file(&path).await.unwrap();
        let mut prefs = Preferences::default();
        prefs.break_ratio.work_minutes = 50;
        prefs.break_ratio.break_minutes = 10;
        prefs.coach_personality = CoachPersonality::Minimal;
        prefs.preferred_study_time = Some("14:00".into());
        store.set(prefs.clone()).await.unwrap();

        let reopened = PreferenceStore::open_file(&path).await.unwrap();
        assert_eq!(reopened.get().await, prefs);

        // Stored under the single preferences key.
        let raw: BTreeMap<String, String> =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert!(raw.contains_key(PREFERENCES_KEY));
    }

    #[tokio::test]
    async fn test_invalid_update_is_rejected_and_not_written() {
        let kv = Arc::new(InMemoryKeyValueStore::default());
        let store = PreferenceStore::load(kv.clone()).await.unwrap();
        let result = store
            .update(PreferencesPatch {
                work_minutes: Some(500),
                ..Default::default()
            })
            .await;
        assert!(result.is_err());
        assert_eq!(store.get().await.break_ratio.work_minutes, 25);
        assert!(kv.get(PREFERENCES_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_garbage_blob_falls_back_to_defaults() {
        let kv = Arc::new(InMemoryKeyValueStore::default());
        kv.set(PREFERENCES_KEY, "not json".into()).await.unwrap();
        let store = PreferenceStore::load(kv).await.unwrap();
        assert_eq!(store.get().await, Preferences::default());
    }

    #[tokio::test]
    async fn test_failed_file_write_keeps_previous_value() {
        let dir = tempfile::TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        let kv = Arc::new(FileKeyValueStore::open(blocker.join("prefs.json")).await);
        let store = PreferenceStore::load(kv.clone()).await.unwrap();

        let result = store
            .update(PreferencesPatch {
                work_minutes: Some(50),
                ..Default::default()
            })
            .await;
        assert!(result.is_err());
        assert_eq!(store.get().await.break_ratio.work_minutes, 25);
        assert!(kv.get(PREFERENCES_KEY).await.unwrap().is_none());
    }
}
