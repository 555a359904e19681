use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// User model, one row per provider identity
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Identity returned by the OAuth provider after a code exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
    pub email: String,
    pub name: String,
}

/// Signed-in session
#[derive(Debug, Clone, FromRow, Serialize, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub email: String,
    pub expires_at: String,
}

/// Session resolved for the current request, if any
#[derive(Debug, Clone, Default)]
pub struct CurrentSession(pub Option<Session>);

/// JWT Claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub email: String,
    pub sid: String,
    pub jti: String,
    pub exp: usize,
    pub iat: usize,
}

/// Query string the provider sends back to the callback
#[derive(Debug, Deserialize)]
pub struct OAuthCallback {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}
