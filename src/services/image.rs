use chrono::{DateTime, Utc};
use rand::Rng;
use std::path::{Component, Path};

use crate::error::{AppError, Result};
use crate::models::{
    DeleteImageRequest, DeleteOutcome, Image, ImageFlag, ImageRow, NewImage, ToggleOutcome,
    UploadFile, UploadSummary,
};
use crate::repository::ImageStore;
use crate::storage::BlobStore;

pub const NO_FILES_MESSAGE: &str = "Please select files first.";

/// Owner-side image management. Every mutation is followed by a full
/// reload on the client; nothing is cached here.
pub struct ImageService;

impl ImageService {
    /// List the user's images, newest first
    pub async fn reload(
        images: &dyn ImageStore,
        blobs: &dyn BlobStore,
        user_id: &str,
    ) -> Result<Vec<ImageRow>> {
        let rows = images.list_by_owner(user_id).await.map_err(|e| {
            tracing::error!("Error loading images for {}: {}", user_id, e);
            e
        })?;

        Ok(rows.iter().map(|image| Self::to_row(image, blobs)).collect())
    }

    fn to_row(image: &Image, blobs: &dyn BlobStore) -> ImageRow {
        ImageRow {
            id: image.id.clone(),
            filename: image.filename.clone(),
            storage_path: image.storage_path.clone(),
            url: blobs.public_url(&image.storage_path),
            date: display_date(&image.created_at),
            published: image.published,
            dark: image.dark,
        }
    }

    /// Upload each file independently: blob first, then its row.
    /// A failed row insert leaves the blob behind.
    pub async fn upload(
        images: &dyn ImageStore,
        blobs: &dyn BlobStore,
        user_id: &str,
        files: Vec<UploadFile>,
    ) -> Result<UploadSummary> {
        if files.is_empty() {
            return Err(AppError::BadRequest(NO_FILES_MESSAGE.to_string()));
        }

        tracing::info!("Uploading {} file(s) for {}", files.len(), user_id);
        let mut summary = UploadSummary::default();

        for file in files {
            let storage_path = Self::storage_path(
                user_id,
                &file.name,
                Utc::now().timestamp_millis(),
                &random_suffix(),
            );

            if let Err(e) = blobs.put(&storage_path, file.data).await {
                tracing::error!("Upload error for {}: {}", file.name, e);
                summary.failed += 1;
                continue;
            }

            let row = NewImage {
                user_id: user_id.to_string(),
                filename: file.name.clone(),
                storage_path: storage_path.clone(),
            };
            match images.insert(row).await {
                Ok(_) => summary.uploaded += 1,
                Err(e) => {
                    tracing::error!(
                        "Insert error for {} (blob {} left without a row): {}",
                        file.name,
                        storage_path,
                        e
                    );
                    summary.failed += 1;
                }
            }
        }

        tracing::info!("{}", summary.status_text());
        Ok(summary)
    }

    /// `{user_id}/{millis}-{suffix}.{ext}`, extension kept when the name has one
    pub fn storage_path(user_id: &str, filename: &str, millis: i64, suffix: &str) -> String {
        let ext: String = match filename.rsplit_once('.') {
            Some((_, ext)) => ext.chars().filter(|c| c.is_ascii_alphanumeric()).collect(),
            None => String::new(),
        };

        if ext.is_empty() {
            format!("{}/{}-{}", user_id, millis, suffix)
        } else {
            format!("{}/{}-{}.{}", user_id, millis, suffix, ext)
        }
    }

    /// Set one flag. On failure the returned state is the previous one so
    /// the control can be put back without a reload.
    pub async fn set_flag(
        images: &dyn ImageStore,
        user_id: &str,
        image_id: &str,
        flag: ImageFlag,
        value: bool,
    ) -> ToggleOutcome {
        match images.update_flag(user_id, image_id, flag, value).await {
            Ok(()) => ToggleOutcome { checked: value },
            Err(e) => {
                tracing::error!("Error updating {} on {}: {}", flag.column(), image_id, e);
                ToggleOutcome { checked: !value }
            }
        }
    }

    /// Remove the blob, then the row. A failed blob removal is logged and
    /// the row is still deleted.
    pub async fn delete(
        images: &dyn ImageStore,
        blobs: &dyn BlobStore,
        user_id: &str,
        image_id: &str,
        req: DeleteImageRequest,
    ) -> Result<DeleteOutcome> {
        if !req.confirmed {
            return Ok(DeleteOutcome::Cancelled);
        }

        if !Self::owns_path(user_id, &req.storage_path) {
            return Err(AppError::Forbidden("Access denied".to_string()));
        }

        if let Err(e) = blobs.remove(&[req.storage_path.clone()]).await {
            tracing::error!("Storage delete error for {}: {}", req.storage_path, e);
        }

        if let Err(e) = images.delete(user_id, image_id).await {
            tracing::error!("DB delete error for {}: {}", image_id, e);
            return Ok(DeleteOutcome::RowDeleteFailed);
        }

        Ok(DeleteOutcome::Deleted)
    }

    fn owns_path(user_id: &str, storage_path: &str) -> bool {
        let mut components = Path::new(storage_path).components();
        let owner_matches = matches!(
            components.next(),
            Some(Component::Normal(first)) if first == user_id
        );
        let rest: Vec<Component> = components.collect();
        owner_matches
            && !rest.is_empty()
            && rest.iter().all(|c| matches!(c, Component::Normal(_)))
    }
}

fn random_suffix() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    (0..11)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

fn display_date(created_at: &str) -> String {
    match DateTime::parse_from_rfc3339(created_at) {
        Ok(dt) => dt.with_timezone(&Utc).format("%Y-%m-%d").to_string(),
        Err(_) => created_at.chars().take(10).collect(),
    }
}
