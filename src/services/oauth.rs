use async_trait::async_trait;
use serde::Deserialize;

use crate::config::OAuthConfig;
use crate::error::{AppError, Result};
use crate::models::Identity;

/// Identity provider reached through an authorization-code redirect
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Where to send the browser to start sign-in
    fn authorize_url(&self, state: &str) -> String;

    /// Trade the callback code for the signed-in identity
    async fn exchange_code(&self, code: &str) -> Result<Identity>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    email: Option<String>,
    #[serde(default)]
    email_verified: Option<bool>,
    #[serde(default)]
    name: Option<String>,
}

/// Google OpenID Connect, or any provider with the same endpoints
pub struct GoogleOAuth {
    config: OAuthConfig,
    http: reqwest::Client,
}

impl GoogleOAuth {
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl OAuthProvider for GoogleOAuth {
    fn name(&self) -> &str {
        &self.config.provider
    }

    fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}&prompt=select_account",
            self.config.auth_url,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_url),
            urlencoding::encode("openid email profile"),
            urlencoding::encode(state),
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<Identity> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_url.as_str()),
        ];

        let response = self
            .http
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Token exchange failed ({}): {}", status, body);
            return Err(AppError::Unauthorized("Sign-in was not accepted".to_string()));
        }
        let token: TokenResponse = response.json().await?;

        let info: UserInfo = self
            .http
            .get(&self.config.userinfo_url)
            .bearer_auth(&token.access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        identity_from(info)
    }
}

fn identity_from(info: UserInfo) -> Result<Identity> {
    let email = info
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| AppError::Unauthorized("Provider returned no email".to_string()))?;

    if info.email_verified == Some(false) {
        return Err(AppError::Unauthorized("Email address is not verified".to_string()));
    }

    Ok(Identity {
        subject: info.sub,
        name: info.name.unwrap_or_default(),
        email,
    })
}
