use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;

use crate::error::AppError;

/// Image metadata row; `storage_path` is the key of the blob it describes
#[derive(Debug, Clone, FromRow, Serialize, PartialEq, Eq)]
pub struct Image {
    pub id: String,
    pub user_id: String,
    pub filename: String,
    pub storage_path: String,
    pub published: bool,
    pub dark: bool,
    pub created_at: String,
}

/// Row written after a successful blob upload
#[derive(Debug, Clone)]
pub struct NewImage {
    pub user_id: String,
    pub filename: String,
    pub storage_path: String,
}

/// Boolean attributes that can be toggled from the console
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFlag {
    Published,
    Dark,
}

impl ImageFlag {
    pub fn column(&self) -> &'static str {
        match self {
            ImageFlag::Published => "published",
            ImageFlag::Dark => "dark",
        }
    }
}

impl FromStr for ImageFlag {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "published" => Ok(ImageFlag::Published),
            "dark" => Ok(ImageFlag::Dark),
            _ => Err(AppError::BadRequest(format!("Unknown flag: {}", s))),
        }
    }
}

/// One rendered row of the management list
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ImageRow {
    pub id: String,
    pub filename: String,
    pub storage_path: String,
    pub url: String,
    pub date: String,
    pub published: bool,
    pub dark: bool,
}

/// File received from the upload form
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub data: bytes::Bytes,
}

/// Result of an upload batch
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct UploadSummary {
    pub uploaded: usize,
    pub failed: usize,
}

impl UploadSummary {
    pub fn status_text(&self) -> String {
        format!("Done. {} uploaded, {} failed.", self.uploaded, self.failed)
    }
}

/// Toggle request body
#[derive(Debug, Deserialize)]
pub struct SetFlagRequest {
    pub value: bool,
}

/// State the console checkbox should show after a toggle
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub checked: bool,
}

/// Delete request body
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteImageRequest {
    pub storage_path: String,
    #[serde(default)]
    pub confirmed: bool,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// Confirmation declined, nothing touched
    Cancelled,
    Deleted,
    /// Row deletion failed; the blob may already be gone
    RowDeleteFailed,
}

/// Light or dark page scheme chosen from the displayed image
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    Light,
    Dark,
}

impl ColorScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorScheme::Light => "light",
            ColorScheme::Dark => "dark",
        }
    }
}

/// Image picked for the public page
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RandomImage {
    pub id: String,
    pub url: String,
    pub filename: String,
    pub color_scheme: ColorScheme,
}

/// Upload response: the counts plus the status line shown to the user
#[derive(Debug, Clone, Serialize)]
pub struct UploadReport {
    pub uploaded: usize,
    pub failed: usize,
    pub status: String,
}

impl From<UploadSummary> for UploadReport {
    fn from(summary: UploadSummary) -> Self {
        Self {
            uploaded: summary.uploaded,
            failed: summary.failed,
            status: summary.status_text(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_parses_route_segment() {
        assert_eq!("published".parse::<ImageFlag>().unwrap(), ImageFlag::Published);
        assert_eq!("dark".parse::<ImageFlag>().unwrap().column(), "dark");
        assert!(matches!(
            "Published".parse::<ImageFlag>(),
            Err(AppError::BadRequest(_))
        ));
        assert!("featured".parse::<ImageFlag>().is_err());
    }
}
