use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::error::AppError;
use crate::models::{CurrentSession, Session};
use crate::services::auth::SESSION_COOKIE;
use crate::services::AuthService;
use crate::AppState;

/// Resolve the session cookie (or bearer token) into a `CurrentSession`
/// extension. Never rejects: an invalid or revoked token is no session.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = CookieJar::from_headers(request.headers())
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| {
            request
                .headers()
                .get(AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "))
                .map(|t| t.to_string())
        });

    let session = match token {
        Some(token) => match AuthService::get_session(&state.db, &state.config, &token).await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!("Session lookup failed: {}", e);
                None
            }
        },
        None => None,
    };

    request.extensions_mut().insert(CurrentSession(session));
    next.run(request).await
}

/// Gate for management routes: a session is required and its email must
/// pass the access policy. Inserts the `Session` extension.
pub async fn manager_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let session: Session = request
        .extensions()
        .get::<CurrentSession>()
        .and_then(|current| current.0.clone())
        .ok_or_else(|| AppError::Unauthorized("Not signed in".to_string()))?;

    if !state.policy.is_allowed(&session.email) {
        tracing::warn!("{} is not allowed to manage images", session.email);
        return Err(AppError::Forbidden("Access denied".to_string()));
    }

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}
