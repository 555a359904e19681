use axum::{extract::State, response::Html, Json};

use crate::error::ApiResponse;
use crate::models::RandomImage;
use crate::services::GalleryService;
use crate::views::render_gallery;
use crate::AppState;

/// Public page with one random published image
/// GET /
pub async fn index(State(state): State<AppState>) -> Html<String> {
    let image =
        GalleryService::show_random_published(state.images.as_ref(), state.blobs.as_ref()).await;
    Html(render_gallery(image.as_ref()))
}

/// Random published image as JSON, `data` absent when there is none
/// GET /api/v1/gallery/random
pub async fn random_image(State(state): State<AppState>) -> Json<ApiResponse<RandomImage>> {
    match GalleryService::show_random_published(state.images.as_ref(), state.blobs.as_ref()).await {
        Some(image) => Json(ApiResponse::success(image)),
        None => Json(ApiResponse::empty("No published images")),
    }
}
