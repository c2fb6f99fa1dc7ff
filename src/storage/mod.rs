//! Avatar object storage.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait AvatarStorage: Send + Sync {
    /// Stores `bytes` under `key` and returns the public URL
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, StorageError>;

    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Recovers the storage key from a URL returned by `put`
    fn key_from_url(&self, url: &str) -> Option<String>;
}

/// Collision-resistant key: `{user_id}/{millis}-{digest}.{ext}`, where the
/// digest covers the user id, upload time and original filename.
pub fn avatar_key(user_id: &str, uploaded_at_millis: i64, filename: &str, content_type: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user_id.as_bytes());
    hasher.update(b":");
    hasher.update(uploaded_at_millis.to_string().as_bytes());
    hasher.update(b":");
    hasher.update(filename.as_bytes());
    let digest: String = hasher.finalize().iter().take(8).map(|b| format!("{:02x}", b)).collect();

    format!("{}/{}-{}.{}", user_id, uploaded_at_millis, digest, extension(filename, content_type))
}

fn extension(filename: &str, content_type: &str) -> String {
    let from_name = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 8 && e.chars().all(|c| c.is_ascii_alphanumeric()));
    let from_mime = content_type
        .split('/')
        .nth(1)
        .map(|sub| sub.split(['+', ';']).next().unwrap_or(sub).trim())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()));

    from_name.or(from_mime).unwrap_or("img").to_ascii_lowercase()
}

fn validate_key(key: &str) -> Result<(), StorageError> {
    let path = Path::new(key);
    let safe = !key.is_empty() && path.components().all(|c| matches!(c, Component::Normal(_)));
    if safe {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

fn strip_base<'a>(base_url: &str, url: &'a str) -> Option<&'a str> {
    url.strip_prefix(base_url.trim_end_matches('/'))
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|key| !key.is_empty())
}

/// Avatars on the local filesystem, served by a static file host at `base_url`
pub struct LocalAvatarStorage {
    root: PathBuf,
    base_url: String,
}

impl LocalAvatarStorage {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl AvatarStorage for LocalAvatarStorage {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, StorageError> {
        validate_key(key)?;
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        debug!("Stored avatar {} ({})", key, content_type);
        Ok(format!("{}/{}", self.base_url.trim_end_matches('/'), key))
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        match tokio::fs::remove_file(self.root.join(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn key_from_url(&self, url: &str) -> Option<String> {
        strip_base(&self.base_url, url).map(str::to_string)
    }
}

/// In-process storage for `--memory` mode and tests
#[derive(Clone)]
pub struct MemoryAvatarStorage {
    objects: Arc<RwLock<HashMap<String, (String, Vec<u8>)>>>,
    base_url: String,
}

impl MemoryAvatarStorage {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            objects: Arc::new(RwLock::new(HashMap::new())),
            base_url: base_url.into(),
        }
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub async fn content_type(&self, key: &str) -> Option<String> {
        self.objects.read().await.get(key).map(|(ct, _)| ct.clone())
    }
}

#[async_trait]
impl AvatarStorage for MemoryAvatarStorage {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, StorageError> {
        validate_key(key)?;
        self.objects
            .write()
            .await
            .insert(key.to_string(), (content_type.to_string(), bytes));
        Ok(format!("{}/{}", self.base_url.trim_end_matches('/'), key))
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.objects.write().await.remove(key);
        Ok(())
    }

    fn key_from_url(&self, url: &str) -> Option<String> {
        strip_base(&self.base_url, url).map(str::to_string)
    }
}
