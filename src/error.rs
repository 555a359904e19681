use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// Blob store rejected a write or removal
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Session token error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Identity provider could not be reached or answered badly
    #[error("Provider error: {0}")]
    Provider(#[from] reqwest::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) | AppError::Jwt(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Provider(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_)
            | AppError::Internal(_)
            | AppError::Storage(_)
            | AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text safe to show in the console; server-side details stay in the log
    fn public_message(&self) -> String {
        match self {
            AppError::Unauthorized(msg) | AppError::Forbidden(msg) | AppError::BadRequest(msg) => {
                msg.clone()
            }
            AppError::Jwt(_) => "Invalid session".to_string(),
            AppError::Provider(_) => "Sign-in provider unavailable".to_string(),
            AppError::Storage(_) => "Image storage unavailable".to_string(),
            AppError::Database(_) | AppError::Internal(_) | AppError::Io(_) => {
                "Something went wrong".to_string()
            }
        }
    }
}

/// JSON envelope for every API answer; `code` is 0 on success, else the HTTP status
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            message: "ok".to_string(),
            data: Some(data),
        }
    }

    /// Successful answer that carries nothing, e.g. an empty gallery
    pub fn empty(message: &str) -> Self {
        Self {
            code: 0,
            message: message.to_string(),
            data: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("{}", self);
        }

        let body: ApiResponse<()> = ApiResponse {
            code: i32::from(status.as_u16()),
            message: self.public_message(),
            data: None,
        };
        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let resp = AppError::Forbidden("Access denied".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = AppError::BadRequest("Please select files first.".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = AppError::Unauthorized("Not signed in".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_server_errors_hide_details() {
        let err = AppError::Internal("row store at /var/db locked".to_string());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Something went wrong");

        let err = AppError::Storage("upload of u1/a.jpg rejected".to_string());
        assert_eq!(err.public_message(), "Image storage unavailable");
    }

    #[test]
    fn test_empty_response_skips_data() {
        let body = serde_json::to_value(ApiResponse::<()>::empty("nothing to show")).unwrap();
        assert_eq!(body["code"], 0);
        assert!(body.get("data").is_none());
    }
}
