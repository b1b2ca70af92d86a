//! Object storage for uploaded media and script archives.
//!
//! [`ObjectStore`] is the seam to the storage backend. [`LocalObjectStore`]
//! keeps objects under a root directory and is what the server runs with.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

/// Longest accepted object key.
pub const MAX_KEY_LEN: usize = 512;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` under `key`, replacing any previous object.
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<(), StorageError>;

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Delete `key`. Returns `false` if it did not exist.
    async fn delete(&self, key: &str) -> Result<bool, StorageError>;

    async fn exists(&self, key: &str) -> Result<bool, StorageError>;
}

/// Validate an object key: relative, `/`-separated, no `.`/`..` segments.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let invalid = || StorageError::InvalidKey(key.to_string());
    if key.is_empty() || key.len() > MAX_KEY_LEN || key.contains('\\') {
        return Err(invalid());
    }
    let all_normal = Path::new(key)
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if !all_normal || key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..") {
        return Err(invalid());
    }
    Ok(())
}

/// Filesystem-backed object store.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, key: &str, data: &[u8], _content_type: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        // Write to a sibling temp file first so readers never see partial data.
        let tmp = path.with_extension("part");
        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.path_for(key)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn key_validation() {
        assert!(validate_key("media/1/abc.png").is_ok());
        for bad in ["", "/etc/passwd", "../x", "media/../x", "a//b", "a/./b", "a\\b"] {
            assert!(validate_key(bad).is_err(), "{bad} should be rejected");
        }
        assert!(validate_key(&"a".repeat(MAX_KEY_LEN + 1)).is_err());
    }

    #[tokio::test]
    async fn put_get_delete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());

        store
            .put("scripts/3/1.0.0.zip", b"PK-data", "application/zip")
            .await
            .unwrap();
        assert!(store.exists("scripts/3/1.0.0.zip").await.unwrap());
        assert_eq!(store.get("scripts/3/1.0.0.zip").await.unwrap(), b"PK-data");

        assert!(store.delete("scripts/3/1.0.0.zip").await.unwrap());
        assert!(!store.delete("scripts/3/1.0.0.zip").await.unwrap());
        assert!(!store.exists("scripts/3/1.0.0.zip").await.unwrap());
    }

    #[tokio::test]
    async fn put_overwrites_existing_object() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        store.put("media/1/a.txt", b"one", "text/plain").await.unwrap();
        store.put("media/1/a.txt", b"two", "text/plain").await.unwrap();
        assert_eq!(store.get("media/1/a.txt").await.unwrap(), b"two");
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        assert_matches!(
            store.get("media/1/missing.png").await,
            Err(StorageError::NotFound(_))
        );
    }

    #[tokio::test]
    async fn traversal_keys_never_touch_the_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path().join("root"));
        assert_matches!(
            store.put("../escape.txt", b"x", "text/plain").await,
            Err(StorageError::InvalidKey(_))
        );
        assert!(!dir.path().join("escape.txt").exists());
    }
}
