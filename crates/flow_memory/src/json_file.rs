//! Small helpers for the JSON files every store sits on.

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;

/// Read and parse `path`. A missing file yields `T::default()`; a corrupt one
/// is logged and also yields the default, so a bad file never blocks startup.
pub async fn read_or_default<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    match tokio::fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Ignoring unreadable store {}: {}", path.display(), e);
                T::default()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => T::default(),
        Err(e) => {
            tracing::warn!("Failed to read {}: {}", path.display(), e);
            T::default()
        }
    }
}

/// Pretty-print `value` into `path` via a temp file + rename.
pub async fn write_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let bytes = serde_json::to_vec_pretty(value).context("Failed to serialize store")?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn test_missing_file_is_default() {
        let dir = tempfile::TempDir::new().unwrap();
        let v: BTreeMap<String, u32> = read_or_default(&dir.path().join("nope.json")).await;
        assert!(v.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_default() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();
        let v: BTreeMap<String, u32> = read_or_default(&path).await;
        assert!(v.is_empty());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested/store.json");
        let mut v = BTreeMap::new();
        v.insert("a".to_string(), 1u32);
        write_atomic(&path, &v).await.unwrap();
        let back: BTreeMap<String, u32> = read_or_default(&path).await;
        assert_eq!(back, v);
        assert!(!path.with_extension("json.tmp").exists());
    }
}
