//! In-memory collaborators with switchable failures.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{Duration, SecondsFormat, TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Identity, Image, ImageFlag, NewImage};
use crate::repository::ImageStore;
use crate::services::OAuthProvider;
use crate::storage::BlobStore;

#[derive(Default)]
pub struct MemoryImageStore {
    rows: Mutex<Vec<Image>>,
    seq: AtomicI64,
    pub fail_list: AtomicBool,
    pub fail_update: AtomicBool,
    pub fail_delete: AtomicBool,
    /// Filenames whose insert fails
    pub fail_insert_for: Mutex<HashSet<String>>,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> Vec<Image> {
        self.rows.lock().unwrap().clone()
    }

    pub fn seed(&self, user_id: &str, filename: &str, published: bool, dark: bool) -> Image {
        let mut image = self.make_row(NewImage {
            user_id: user_id.to_string(),
            filename: filename.to_string(),
            storage_path: format!("{}/{}", user_id, filename),
        });
        image.published = published;
        image.dark = dark;
        self.rows.lock().unwrap().push(image.clone());
        image
    }

    pub fn fail_insert(&self, filename: &str) {
        self.fail_insert_for
            .lock()
            .unwrap()
            .insert(filename.to_string());
    }

    fn make_row(&self, image: NewImage) -> Image {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        Image {
            id: Uuid::new_v4().to_string(),
            user_id: image.user_id,
            filename: image.filename,
            storage_path: image.storage_path,
            published: false,
            dark: false,
            created_at: (base + Duration::seconds(seq)).to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

fn unavailable(what: &str) -> AppError {
    AppError::Internal(format!("{} unavailable", what))
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn list_published(&self) -> Result<Vec<Image>> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(unavailable("row store"));
        }
        Ok(self.rows().into_iter().filter(|i| i.published).collect())
    }

    async fn list_by_owner(&self, user_id: &str) -> Result<Vec<Image>> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(unavailable("row store"));
        }
        let mut images: Vec<Image> = self
            .rows()
            .into_iter()
            .filter(|i| i.user_id == user_id)
            .collect();
        images.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(images)
    }

    async fn insert(&self, image: NewImage) -> Result<Image> {
        if self.fail_insert_for.lock().unwrap().contains(&image.filename) {
            return Err(unavailable("row insert"));
        }
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|i| i.storage_path == image.storage_path) {
            return Err(AppError::BadRequest("duplicate storage_path".to_string()));
        }
        let row = self.make_row(image);
        rows.push(row.clone());
        Ok(row)
    }

    async fn update_flag(&self, user_id: &str, id: &str, flag: ImageFlag, value: bool) -> Result<()> {
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(unavailable("row update"));
        }
        let mut rows = self.rows.lock().unwrap();
        for row in rows.iter_mut().filter(|i| i.id == id && i.user_id == user_id) {
            match flag {
                ImageFlag::Published => row.published = value,
                ImageFlag::Dark => row.dark = value,
            }
        }
        Ok(())
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(unavailable("row delete"));
        }
        self.rows
            .lock()
            .unwrap()
            .retain(|i| !(i.id == id && i.user_id == user_id));
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Bytes>>,
    pub fail_remove: AtomicBool,
    /// Any path ending with one of these suffixes fails to upload
    pub fail_put_suffixes: Mutex<Vec<String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.blobs.lock().unwrap().keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn insert_raw(&self, path: &str) {
        self.blobs
            .lock()
            .unwrap()
            .insert(path.to_string(), Bytes::from_static(b"img"));
    }

    pub fn fail_put(&self, suffix: &str) {
        self.fail_put_suffixes.lock().unwrap().push(suffix.to_string());
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, path: &str, data: Bytes) -> Result<()> {
        let fails = self
            .fail_put_suffixes
            .lock()
            .unwrap()
            .iter()
            .any(|s| path.ends_with(s.as_str()));
        if fails {
            return Err(AppError::Storage(format!("upload of {} rejected", path)));
        }
        self.blobs.lock().unwrap().insert(path.to_string(), data);
        Ok(())
    }

    async fn remove(&self, paths: &[String]) -> Result<()> {
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(AppError::Storage("remove rejected".to_string()));
        }
        let mut blobs = self.blobs.lock().unwrap();
        for path in paths {
            blobs.remove(path);
        }
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("https://cdn.test/images/{}", path)
    }

    fn storage_type(&self) -> &'static str {
        "memory"
    }
}

/// Provider that accepts one code and returns a fixed identity
pub struct StaticOAuth {
    pub code: String,
    pub identity: Identity,
}

impl StaticOAuth {
    pub fn new(code: &str, email: &str) -> Self {
        Self {
            code: code.to_string(),
            identity: Identity {
                subject: format!("sub-{}", email),
                email: email.to_string(),
                name: "Test User".to_string(),
            },
        }
    }
}

#[async_trait]
impl OAuthProvider for StaticOAuth {
    fn name(&self) -> &str {
        "static"
    }

    fn authorize_url(&self, state: &str) -> String {
        format!("https://idp.test/authorize?state={}", state)
    }

    async fn exchange_code(&self, code: &str) -> Result<Identity> {
        if code == self.code {
            Ok(self.identity.clone())
        } else {
            Err(AppError::Unauthorized("Unknown authorization code".to_string()))
        }
    }
}
