use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub jwt: JwtConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub oauth: OAuthConfig,
    #[serde(default)]
    pub access: AccessConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Externally visible origin, used for media URLs and the OAuth redirect
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    #[serde(default = "default_jwt_secret")]
    pub secret: String,
    #[serde(default)]
    pub previous_secrets: Vec<String>,
    #[serde(default = "default_session_expire")]
    pub session_expire_hours: u64,
    #[serde(default)]
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_local_path")]
    pub local_path: String,
    #[serde(default = "default_max_upload")]
    pub max_upload_mb: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OAuthConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_userinfo_url")]
    pub userinfo_url: String,
    /// Callback registered with the provider; derived from `server.public_url` when empty
    #[serde(default)]
    pub redirect_url: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AccessConfig {
    #[serde(default)]
    pub allowed_emails: Vec<String>,
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_public_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_db_path() -> String {
    "data/framewall.db".to_string()
}

fn default_jwt_secret() -> String {
    "change-me-framewall-secret".to_string()
}

fn default_session_expire() -> u64 {
    24 * 7
}

fn default_local_path() -> String {
    "data/images".to_string()
}

fn default_max_upload() -> usize {
    50
}

fn default_provider() -> String {
    "google".to_string()
}

fn default_auth_url() -> String {
    "https://accounts.google.com/o/oauth2/v2/auth".to_string()
}

fn default_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_userinfo_url() -> String {
    "https://openidconnect.googleapis.com/v1/userinfo".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: default_public_url(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: default_jwt_secret(),
            previous_secrets: Vec::new(),
            session_expire_hours: default_session_expire(),
            cookie_secure: false,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            local_path: default_local_path(),
            max_upload_mb: default_max_upload(),
        }
    }
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            client_id: String::new(),
            client_secret: String::new(),
            auth_url: default_auth_url(),
            token_url: default_token_url(),
            userinfo_url: default_userinfo_url(),
            redirect_url: String::new(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_from_file()?;
        config.apply_env_overrides();
        config.ensure_oauth_defaults();
        config.ensure_directories()?;
        config.ensure_jwt_secret()?;

        if config.access.allowed_emails.is_empty() {
            tracing::warn!("access.allowed_emails is empty, nobody can manage images");
        }
        if config.oauth.client_id.is_empty() {
            tracing::warn!("oauth.client_id is not set, sign-in will fail");
        }
        tracing::info!(
            "OAuth config: provider={}, redirect_url={}",
            config.oauth.provider,
            config.oauth.redirect_url
        );
        Ok(config)
    }

    /// Parse a configuration document, filling in defaults
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        config.ensure_oauth_defaults();
        Ok(config)
    }

    /// Ensure JWT secret is not the built-in default and persists across restarts
    fn ensure_jwt_secret(&mut self) -> anyhow::Result<()> {
        if self.jwt.secret == default_jwt_secret() || self.jwt.secret.is_empty() {
            let secret_path = Path::new("data/.jwt_secret");

            if secret_path.exists() {
                let secret = fs::read_to_string(secret_path)?;
                self.jwt.secret = secret.trim().to_string();
                tracing::info!("Loaded persisted JWT secret from data/.jwt_secret");
            } else {
                let secret = uuid::Uuid::new_v4().to_string();

                if let Some(parent) = secret_path.parent() {
                    fs::create_dir_all(parent)?;
                }

                fs::write(secret_path, &secret)?;
                self.jwt.secret = secret;
                tracing::info!("Generated and persisted new JWT secret to data/.jwt_secret");
            }
        }
        Ok(())
    }

    /// Load configuration from the first config file found
    fn load_from_file() -> anyhow::Result<Self> {
        let config_paths = [
            "framewall.toml",
            "config.toml",
            "data/framewall.toml",
            "data/config.toml",
        ];

        for path in config_paths {
            if Path::new(path).exists() {
                let content = fs::read_to_string(path)?;
                let config: Config = toml::from_str(&content)?;
                tracing::info!("Loaded configuration from {}", path);
                return Ok(config);
            }
        }

        tracing::info!("No configuration file found, using defaults");
        Ok(Config::default())
    }

    /// Apply environment variable overrides
    /// Format: FW_CONF_<SECTION>_<KEY>
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server overrides
        if let Some(val) = lookup("FW_CONF_SERVER_HOST") {
            self.server.host = val;
        }
        if let Some(val) = lookup("FW_CONF_SERVER_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = lookup("FW_CONF_SERVER_PUBLIC_URL") {
            self.server.public_url = val;
        }

        // Database overrides
        if let Some(val) = lookup("FW_CONF_DATABASE_PATH") {
            self.database.path = val;
        }

        // JWT overrides
        if let Some(val) = lookup("FW_CONF_JWT_SECRET") {
            self.jwt.secret = val;
        }
        if let Some(val) = lookup("FW_CONF_JWT_PREVIOUS_SECRETS") {
            self.jwt.previous_secrets = split_list(&val);
        }
        if let Some(val) = lookup("FW_CONF_JWT_SESSION_EXPIRE") {
            if let Ok(hours) = val.parse() {
                self.jwt.session_expire_hours = hours;
            }
        }
        if let Some(val) = lookup("FW_CONF_JWT_COOKIE_SECURE") {
            if let Ok(v) = val.parse() {
                self.jwt.cookie_secure = v;
            }
        }

        // Storage overrides
        if let Some(val) = lookup("FW_CONF_STORAGE_LOCAL_PATH") {
            self.storage.local_path = val;
        }
        if let Some(val) = lookup("FW_CONF_STORAGE_MAX_UPLOAD_MB") {
            if let Ok(mb) = val.parse() {
                self.storage.max_upload_mb = mb;
            }
        }

        // OAuth overrides
        if let Some(val) = lookup("FW_CONF_OAUTH_CLIENT_ID") {
            self.oauth.client_id = val;
        }
        if let Some(val) = lookup("FW_CONF_OAUTH_CLIENT_SECRET") {
            self.oauth.client_secret = val;
        }
        if let Some(val) = lookup("FW_CONF_OAUTH_REDIRECT_URL") {
            self.oauth.redirect_url = val;
        }

        // Access overrides
        if let Some(val) = lookup("FW_CONF_ACCESS_ALLOWED_EMAILS") {
            self.access.allowed_emails = split_list(&val);
        }
    }

    fn ensure_oauth_defaults(&mut self) {
        if self.oauth.redirect_url.trim().is_empty() {
            self.oauth.redirect_url = format!(
                "{}/auth/callback",
                self.server.public_url.trim_end_matches('/')
            );
        }
    }

    /// Ensure required directories exist
    fn ensure_directories(&self) -> anyhow::Result<()> {
        if let Some(parent) = Path::new(&self.database.path).parent() {
            fs::create_dir_all(parent)?;
        }

        fs::create_dir_all(&self.storage.local_path)?;

        Ok(())
    }
}

fn split_list(val: &str) -> Vec<String> {
    val.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config = Config::from_toml("[server]\nport = 9000\n").unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.storage.local_path, "data/images");
        assert!(config.access.allowed_emails.is_empty());
        assert_eq!(config.oauth.redirect_url, "http://localhost:8080/auth/callback");
    }

    #[test]
    fn test_redirect_follows_public_url() {
        let config = Config::from_toml(
            r#"
            [server]
            public_url = "https://wall.example.org/"

            [access]
            allowed_emails = ["me@example.org"]
            "#,
        )
        .unwrap();
        assert_eq!(config.oauth.redirect_url, "https://wall.example.org/auth/callback");
        assert_eq!(config.access.allowed_emails, vec!["me@example.org"]);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("FW_CONF_SERVER_PORT", "7070"),
            ("FW_CONF_ACCESS_ALLOWED_EMAILS", "a@x.org, b@x.org,,"),
            ("FW_CONF_JWT_COOKIE_SECURE", "true"),
            ("FW_CONF_STORAGE_MAX_UPLOAD_MB", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.server.port, 7070);
        assert_eq!(config.access.allowed_emails, vec!["a@x.org", "b@x.org"]);
        assert!(config.jwt.cookie_secure);
        assert_eq!(config.storage.max_upload_mb, 50);
    }
}
