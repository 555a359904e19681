use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect},
    Extension,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;

use crate::models::{CurrentSession, OAuthCallback};
use crate::services::auth::{SESSION_COOKIE, STATE_COOKIE};
use crate::services::{AuthEvent, AuthService, SessionController};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub redirect_to: Option<String>,
}

/// Start provider sign-in
/// GET /auth/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<LoginQuery>,
) -> impl IntoResponse {
    let return_to = query.redirect_to.as_deref().unwrap_or("/manage");
    let pending = AuthService::sign_in_url(state.oauth.as_ref(), return_to);

    let cookie = Cookie::build((STATE_COOKIE, pending.state_cookie))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.jwt.cookie_secure)
        .path("/auth")
        .build();

    tracing::debug!("Redirecting to {} sign-in", state.oauth.name());
    (jar.add(cookie), Redirect::to(&pending.url))
}

/// Provider callback; on failure the console simply stays logged out
/// GET /auth/callback
pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(callback): Query<OAuthCallback>,
) -> impl IntoResponse {
    let state_cookie = jar.get(STATE_COOKIE).map(|c| c.value().to_string());
    let jar = jar.remove(Cookie::build(STATE_COOKIE).path("/auth").build());

    let result = AuthService::complete_sign_in(
        &state.db,
        &state.config,
        state.oauth.as_ref(),
        callback,
        state_cookie.as_deref(),
    )
    .await;

    match result {
        Ok(signed_in) => {
            let mut controller = SessionController::new(state.policy.clone());
            controller.apply(AuthEvent::SignedIn(signed_in.session.clone()));
            tracing::info!(
                "{} signed in, console is {}",
                signed_in.session.email,
                controller.mode().as_str()
            );

            let cookie = Cookie::build((SESSION_COOKIE, signed_in.token))
                .http_only(true)
                .same_site(SameSite::Lax)
                .secure(state.config.jwt.cookie_secure)
                .path("/")
                .build();
            (jar.add(cookie), Redirect::to(&signed_in.return_to))
        }
        Err(e) => {
            tracing::error!("Login error: {}", e);
            (jar, Redirect::to("/manage"))
        }
    }
}

/// Sign out and go back to the console
/// POST /auth/logout
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    Extension(current): Extension<CurrentSession>,
) -> impl IntoResponse {
    let mut controller = SessionController::new(state.policy.clone());
    controller.apply(AuthEvent::InitialSession(current.0));

    if let Some(session) = controller.mode().session() {
        if let Err(e) = AuthService::sign_out(&state.db, &session.id).await {
            tracing::error!("Logout error: {}", e);
        }
    }
    let transition = controller.apply(AuthEvent::SignedOut);
    if transition.changed {
        tracing::info!("Signed out");
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/").build());
    (jar, Redirect::to("/manage"))
}
