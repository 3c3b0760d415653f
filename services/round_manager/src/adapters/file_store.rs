//! JSON-file backed state store
//!
//! The whole key space is held in memory and rewritten on every `set` through a
//! temporary file and an atomic rename, so a crash leaves either the old or the new
//! file on disk.

use crate::error::{Result, RoundError};
use crate::traits::StateStore;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

#[derive(Debug)]
pub struct FileStateStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileStateStore {
    /// Open the store at `path`, creating parent directories as needed
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let values = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                RoundError::state_store(format!("Corrupt state file {:?}: {}", path, e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        info!("📂 State store opened at {:?} ({} keys)", path, values.len());

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, values: &BTreeMap<String, String>) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(values)
            .map_err(|e| RoundError::state_store(format!("Failed to encode state: {}", e)))?;

        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &bytes).await.map_err(|e| {
            RoundError::state_store(format!("Failed to write {:?}: {}", temp_path, e))
        })?;
        tokio::fs::rename(&temp_path, &self.path).await.map_err(|e| {
            RoundError::state_store(format!("Failed to rename state file: {}", e))
        })?;

        debug!("State persisted to {:?}", self.path);
        Ok(())
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        // Lock held across the write so concurrent sets persist in order
        let mut values = self.values.lock().await;
        let previous = values.insert(key.to_string(), value.to_string());

        if let Err(e) = self.persist(&values).await {
            match previous {
                Some(previous) => values.insert(key.to_string(), previous),
                None => values.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state").join("round_state.json");

        let store = FileStateStore::open(&path).await.unwrap();
        store.set("frozen:1", "true").await.unwrap();
        store.set("snapshot_tx:1", "0xabc").await.unwrap();
        drop(store);

        let reopened = FileStateStore::open(&path).await.unwrap();
        assert_eq!(reopened.get("frozen:1").await.unwrap().as_deref(), Some("true"));
        assert_eq!(
            reopened.get("snapshot_tx:1").await.unwrap().as_deref(),
            Some("0xabc")
        );
        assert_eq!(reopened.get("frozen:2").await.unwrap(), None);
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("round_state.json");
        std::fs::write(&path, b"{not json").unwrap();

        let result = FileStateStore::open(&path).await;
        assert!(matches!(result, Err(RoundError::StateStore { .. })));
    }
}
