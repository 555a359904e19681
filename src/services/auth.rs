use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::{distributions::Alphanumeric, Rng};
use uuid::Uuid;

use crate::config::Config;
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{Claims, Identity, OAuthCallback, Session, User};
use crate::services::OAuthProvider;

pub const SESSION_COOKIE: &str = "fw_session";
pub const STATE_COOKIE: &str = "fw_oauth_state";

/// Redirect that starts a sign-in
#[derive(Debug, Clone)]
pub struct PendingSignIn {
    pub url: String,
    /// Value for the state cookie, checked again on callback
    pub state_cookie: String,
}

/// Outcome of a completed callback
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub session: Session,
    pub token: String,
    pub return_to: String,
}

/// Authentication service
pub struct AuthService;

impl AuthService {
    /// Build the provider redirect. `return_to` is where the browser lands
    /// after the callback; anything that is not a local path becomes `/manage`.
    pub fn sign_in_url(provider: &dyn OAuthProvider, return_to: &str) -> PendingSignIn {
        let state: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();

        PendingSignIn {
            url: provider.authorize_url(&state),
            state_cookie: format!("{}|{}", state, local_path_or_default(return_to)),
        }
    }

    /// Validate the callback against the state cookie, exchange the code
    /// and open a session
    pub async fn complete_sign_in(
        db: &Database,
        config: &Config,
        provider: &dyn OAuthProvider,
        callback: OAuthCallback,
        state_cookie: Option<&str>,
    ) -> Result<SignedIn> {
        if let Some(error) = callback.error {
            return Err(AppError::Unauthorized(format!("Provider error: {}", error)));
        }

        let (expected_state, return_to) = state_cookie
            .and_then(|value| value.split_once('|'))
            .ok_or_else(|| AppError::BadRequest("Missing sign-in state".to_string()))?;
        if callback.state.as_deref() != Some(expected_state) {
            return Err(AppError::BadRequest("Sign-in state mismatch".to_string()));
        }
        let code = callback
            .code
            .ok_or_else(|| AppError::BadRequest("Missing authorization code".to_string()))?;

        let identity = provider.exchange_code(&code).await?;
        let (session, token) = Self::start_session(db, config, provider.name(), &identity).await?;

        Ok(SignedIn {
            session,
            token,
            return_to: local_path_or_default(return_to).to_string(),
        })
    }

    /// Upsert the user and issue a session plus its signed token
    pub async fn start_session(
        db: &Database,
        config: &Config,
        provider_name: &str,
        identity: &Identity,
    ) -> Result<(Session, String)> {
        let user = Self::upsert_user(db, provider_name, identity).await?;
        let now = Utc::now();
        let now_str = now.to_rfc3339();

        let expires = now + Duration::hours(config.jwt.session_expire_hours as i64);
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id: user.id,
            email: user.email,
            expires_at: expires.to_rfc3339(),
        };

        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, email, expires_at, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&session.id)
        .bind(&session.user_id)
        .bind(&session.email)
        .bind(&session.expires_at)
        .bind(&now_str)
        .execute(db.pool())
        .await?;

        let claims = Claims {
            sub: session.user_id.clone(),
            email: session.email.clone(),
            sid: session.id.clone(),
            jti: Uuid::new_v4().to_string(),
            exp: expires.timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt.secret.as_bytes()),
        )?;

        tracing::info!("Session {} opened for {}", session.id, session.email);
        Ok((session, token))
    }

    /// One user row per provider identity; email and name follow the provider
    async fn upsert_user(db: &Database, provider_name: &str, identity: &Identity) -> Result<User> {
        let now = Utc::now().to_rfc3339();
        let user: User = sqlx::query_as(
            r#"
            INSERT INTO users (id, email, name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET email = excluded.email, name = excluded.name, updated_at = excluded.updated_at
            RETURNING id, email, name, created_at, updated_at
            "#,
        )
        .bind(format!("{}:{}", provider_name, identity.subject))
        .bind(&identity.email)
        .bind(&identity.name)
        .bind(&now)
        .bind(&now)
        .fetch_one(db.pool())
        .await?;

        if user.created_at == user.updated_at {
            tracing::info!("New user {} ({} <{}>)", user.id, user.name, user.email);
        }
        Ok(user)
    }

    /// Resolve a token to its live session; revoked or expired sessions are `None`
    pub async fn get_session(db: &Database, config: &Config, token: &str) -> Result<Option<Session>> {
        let claims = match Self::validate_token(token, config) {
            Ok(claims) => claims,
            Err(_) => return Ok(None),
        };

        let session: Option<Session> = sqlx::query_as(
            "SELECT id, user_id, email, expires_at FROM sessions WHERE id = ? AND user_id = ?",
        )
        .bind(&claims.sid)
        .bind(&claims.sub)
        .fetch_optional(db.pool())
        .await?;

        let Some(session) = session else {
            return Ok(None);
        };

        let expires_at = chrono::DateTime::parse_from_rfc3339(&session.expires_at)
            .map_err(|_| AppError::Internal("Invalid session expiry format".to_string()))?;
        if expires_at < Utc::now() {
            sqlx::query("DELETE FROM sessions WHERE id = ?")
                .bind(&session.id)
                .execute(db.pool())
                .await?;
            return Ok(None);
        }

        Ok(Some(session))
    }

    /// Revoke a session
    pub async fn sign_out(db: &Database, session_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(session_id)
            .execute(db.pool())
            .await?;
        Ok(())
    }

    /// Validate a session token and extract claims
    pub fn validate_token(token: &str, config: &Config) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        let keys = std::iter::once(config.jwt.secret.as_str())
            .chain(config.jwt.previous_secrets.iter().map(|s| s.as_str()));

        for secret in keys {
            if let Ok(token_data) = decode::<Claims>(
                token,
                &DecodingKey::from_secret(secret.as_bytes()),
                &validation,
            ) {
                return Ok(token_data.claims);
            }
        }

        Err(AppError::Unauthorized("Invalid token".to_string()))
    }
}

/// Same-origin path or `/manage`. `//host` and `/\host` are both
/// protocol-relative to browsers.
fn local_path_or_default(path: &str) -> &str {
    let mut chars = path.chars();
    let is_local = chars.next() == Some('/')
        && !matches!(chars.next(), Some('/') | Some('\\'))
        && !path.contains('|')
        && !path.chars().any(char::is_control);
    if is_local {
        path
    } else {
        "/manage"
    }
}
