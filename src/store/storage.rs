use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage contents corrupted: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Asynchronous durable key-value capability the preference store writes
/// through. Values are opaque text; callers own the encoding.
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// File-backed storage: one JSON object of key → value per file.
pub struct FileStorage {
    entries: RwLock<HashMap<String, String>>,
    file_path: PathBuf,
}

impl FileStorage {
    /// Open storage at the given path. A missing file starts empty.
    pub async fn open(file_path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let file_path = file_path.into();

        let entries = match tokio::fs::try_exists(&file_path).await? {
            true => {
                let content = tokio::fs::read_to_string(&file_path).await?;
                let entries: HashMap<String, String> = serde_json::from_str(&content)?;
                tracing::info!(count = entries.len(), "loaded preference file");
                entries
            }
            false => {
                tracing::debug!("preference file does not exist, starting fresh");
                HashMap::new()
            }
        };

        Ok(Self {
            entries: RwLock::new(entries),
            file_path,
        })
    }

    async fn persist(&self) -> Result<(), StorageError> {
        let entries = self.entries.read().await;
        let content = serde_json::to_string_pretty(&*entries)?;

        // Create parent directory if needed
        if let Some(parent) = self.file_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&self.file_path, content).await?;

        tracing::debug!(count = entries.len(), "saved preference file");

        Ok(())
    }
}

#[async_trait]
impl KeyValueStorage for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        {
            let mut entries = self.entries.write().await;
            entries.insert(key.to_string(), value.to_string());
        }
        self.persist().await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let existed = {
            let mut entries = self.entries.write().await;
            entries.remove(key).is_some()
        };

        if existed {
            self.persist().await?;
        }

        Ok(())
    }
}

/// In-memory storage. Backs unit tests and ephemeral sessions where no
/// preference file is wanted.
#[derive(Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
