use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Blob storage holding the image bytes
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write data under `path`
    async fn put(&self, path: &str, data: Bytes) -> Result<()>;

    /// Remove every listed path; paths that do not exist are ignored
    async fn remove(&self, paths: &[String]) -> Result<()>;

    /// URL a browser can load the blob from
    fn public_url(&self, path: &str) -> String;

    /// Get the storage type name
    fn storage_type(&self) -> &'static str;
}
