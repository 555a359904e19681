use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::storage::BlobStore;

/// Local file system storage, served back under `public_base`
pub struct LocalStorage {
    base_path: PathBuf,
    public_base: String,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>, public_base: &str) -> Self {
        Self {
            base_path: base_path.into(),
            public_base: public_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn get_full_path(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let is_plain = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !is_plain {
            return Err(AppError::BadRequest(format!("Invalid storage path: {}", path)));
        }
        Ok(self.base_path.join(relative))
    }

    /// Remove now-empty directories between `full_path` and the base
    async fn prune_empty_parents(&self, full_path: &Path) -> Result<()> {
        let mut current_dir = full_path.parent().map(|p| p.to_path_buf());
        while let Some(dir) = current_dir {
            if dir == self.base_path {
                break;
            }
            match fs::read_dir(&dir).await {
                Ok(mut entries) => {
                    if entries.next_entry().await?.is_some() {
                        break;
                    }
                    let _ = fs::remove_dir(&dir).await;
                }
                Err(_) => break,
            }
            current_dir = dir.parent().map(|p| p.to_path_buf());
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for LocalStorage {
    async fn put(&self, path: &str, data: Bytes) -> Result<()> {
        let full_path = self.get_full_path(path)?;

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&full_path).await?;
        file.write_all(&data).await?;
        file.flush().await?;

        tracing::debug!("Saved blob to {:?}", full_path);
        Ok(())
    }

    async fn remove(&self, paths: &[String]) -> Result<()> {
        for path in paths {
            let full_path = self.get_full_path(path)?;

            match fs::remove_file(&full_path).await {
                Ok(()) => {
                    tracing::debug!("Deleted blob {:?}", full_path);
                    self.prune_empty_parents(&full_path).await?;
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::debug!("Blob {:?} already absent", full_path);
                }
                Err(e) => {
                    return Err(AppError::Storage(format!("Failed to remove {}: {}", path, e)));
                }
            }
        }
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        let encoded: Vec<String> = path
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}/{}", self.public_base, encoded.join("/"))
    }

    fn storage_type(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(dir: &tempfile::TempDir) -> LocalStorage {
        LocalStorage::new(dir.path(), "http://localhost:8080/media/")
    }

    #[tokio::test]
    async fn test_put_then_remove_prunes_user_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = storage(&dir);

        store
            .put("user-1/1700000000000-abc.jpg", Bytes::from_static(b"jpeg"))
            .await
            .unwrap();
        let written = dir.path().join("user-1/1700000000000-abc.jpg");
        assert_eq!(std::fs::read(&written).unwrap(), b"jpeg");

        store
            .remove(&["user-1/1700000000000-abc.jpg".to_string()])
            .await
            .unwrap();
        assert!(!written.exists());
        assert!(!dir.path().join("user-1").exists());
        assert!(dir.path().exists());
    }

    #[tokio::test]
    async fn test_remove_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = storage(&dir);
        store.remove(&["nobody/missing.png".to_string()]).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = storage(&dir);

        let err = store
            .put("../outside.png", Bytes::from_static(b"x"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = store.remove(&["/etc/passwd".to_string()]).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_public_url_encodes_segments() {
        let dir = tempfile::tempdir().unwrap();
        let store = storage(&dir);
        assert_eq!(
            store.public_url("user-1/a b.png"),
            "http://localhost:8080/media/user-1/a%20b.png"
        );
    }
}
