use axum::{
    extract::{Multipart, Path, State},
    Extension, Json,
};

use crate::error::{ApiResponse, AppError, Result};
use crate::models::{
    DeleteImageRequest, DeleteOutcome, ImageFlag, ImageRow, Session, SetFlagRequest,
    ToggleOutcome, UploadFile, UploadReport,
};
use crate::services::ImageService;
use crate::AppState;

/// List the caller's images
/// GET /api/v1/images
pub async fn list_images(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<ApiResponse<Vec<ImageRow>>>> {
    let rows =
        ImageService::reload(state.images.as_ref(), state.blobs.as_ref(), &session.user_id).await?;
    Ok(Json(ApiResponse::success(rows)))
}

/// Upload one or more images (repeated `file` fields)
/// POST /api/v1/images
pub async fn upload_images(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<UploadReport>>> {
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::BadRequest(format!("Failed to process multipart: {}", e))
    })? {
        if field.name() != Some("file") {
            continue;
        }
        let name = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => continue,
        };
        let data = field.bytes().await.map_err(|e| {
            AppError::BadRequest(format!("Failed to read {}: {}", name, e))
        })?;
        files.push(UploadFile { name, data });
    }

    let summary =
        ImageService::upload(state.images.as_ref(), state.blobs.as_ref(), &session.user_id, files)
            .await?;
    Ok(Json(ApiResponse::success(UploadReport::from(summary))))
}

/// Set the published or dark flag
/// PUT /api/v1/images/:id/:flag
pub async fn set_flag(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path((id, flag)): Path<(String, String)>,
    Json(req): Json<SetFlagRequest>,
) -> Result<Json<ApiResponse<ToggleOutcome>>> {
    let flag: ImageFlag = flag.parse()?;
    let outcome =
        ImageService::set_flag(state.images.as_ref(), &session.user_id, &id, flag, req.value).await;
    Ok(Json(ApiResponse::success(outcome)))
}

/// Delete an image and its blob
/// DELETE /api/v1/images/:id
pub async fn delete_image(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(req): Json<DeleteImageRequest>,
) -> Result<Json<ApiResponse<DeleteOutcome>>> {
    let outcome = ImageService::delete(
        state.images.as_ref(),
        state.blobs.as_ref(),
        &session.user_id,
        &id,
        req,
    )
    .await?;
    Ok(Json(ApiResponse::success(outcome)))
}
