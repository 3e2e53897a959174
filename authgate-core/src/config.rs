use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::provider::ProviderKind;
use crate::session::SameSite;

/// Gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub oauth: OAuthConfig,
    pub session: SessionConfig,
    pub cookie: CookieConfig,
    pub sess_store: SessStoreConfig,
    pub headers: HeadersConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9090,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "pretty"
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}

/// `OAuth` settings shared by every provider.
///
/// Endpoint fields left empty fall back to the selected provider's
/// well-known endpoints where it has them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthConfig {
    /// Provider identifier (`google`, `github`, `oidc`, ...)
    pub provider: String,
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: String,
    pub token_url: String,
    pub user_info_url: String,
    pub callback_url: String,
    /// Timeout applied to every outbound provider call
    pub http_timeout_secs: u64,
    /// Azure only: which token carries the user claims (`id_token` or `access_token`)
    pub azure_token: String,
    /// Google only: hosted domain hint
    pub preferred_domain: String,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            provider: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            auth_url: String::new(),
            token_url: String::new(),
            user_info_url: String::new(),
            callback_url: String::new(),
            http_timeout_secs: 10,
            azure_token: "id_token".to_string(),
            preferred_domain: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name of the session cookie
    pub name: String,
    /// Key material used to seal session cookies
    pub key: String,
    /// Session lifetime in minutes
    pub max_age: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: "AuthgateSession".to_string(),
            key: String::new(),
            max_age: 240,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieConfig {
    pub domain: String,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
    /// `lax`, `strict`, `none` or empty to omit the attribute
    pub same_site: String,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            path: "/".to_string(),
            secure: true,
            http_only: true,
            same_site: String::new(),
        }
    }
}

/// Session storage backend selector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackendKind {
    /// Sessions live inside the sealed cookie (per instance, nothing shared)
    #[default]
    Cookie,
    /// Sessions live in Redis and are shared across instances
    Redis,
    /// Sessions live in memcached and are shared across instances
    Memcached,
}

impl StoreBackendKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cookie => "cookie",
            Self::Redis => "redis",
            Self::Memcached => "memcached",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessStoreConfig {
    pub backend: StoreBackendKind,
    pub redis: RedisStoreConfig,
    pub memcached: MemcachedStoreConfig,
}

impl SessStoreConfig {
    /// Address of the selected shared backend, `None` for the cookie backend
    #[must_use]
    pub fn shared_address(&self) -> Option<&str> {
        match self.backend {
            StoreBackendKind::Cookie => None,
            StoreBackendKind::Redis => Some(self.redis.address.trim()),
            StoreBackendKind::Memcached => Some(self.memcached.address.trim()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisStoreConfig {
    /// `host:port` or a full `redis://` URL
    pub address: String,
    /// Key namespace; empty means the built-in default
    pub key_prefix: String,
    pub connect_timeout_secs: u64,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            key_prefix: String::new(),
            connect_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemcachedStoreConfig {
    /// `host:port` or a full `memcache://` URL
    pub address: String,
    /// Key namespace; empty means the built-in default
    pub key_prefix: String,
    pub connect_timeout_secs: u64,
}

impl Default for MemcachedStoreConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            key_prefix: String::new(),
            connect_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadersConfig {
    /// User-info claims copied into the custom claims map
    pub claims: Vec<String>,
}

impl Config {
    /// Load configuration from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. Config file (if provided)
    /// 3. Defaults (lowest priority)
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_file {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path));
            }
        }

        // AUTHGATE__OAUTH__PROVIDER=github, AUTHGATE__SESS_STORE__BACKEND=redis, ...
        builder = builder.add_source(
            Environment::with_prefix("AUTHGATE")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Load from environment variables only (for Docker/K8s)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Load from file path
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Self::load(Some(path))
    }

    #[must_use]
    pub fn http_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Check every section and collect all problems at once.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.oauth.provider.is_empty() {
            errors.push("oauth.provider must be set".to_string());
        } else if let Err(e) = self.oauth.provider.parse::<ProviderKind>() {
            errors.push(e.to_string());
        }
        if self.oauth.client_id.is_empty() {
            errors.push("oauth.client_id must be set".to_string());
        }
        if self.oauth.callback_url.is_empty() {
            errors.push("oauth.callback_url must be set".to_string());
        }
        if self.oauth.http_timeout_secs == 0 {
            errors.push("oauth.http_timeout_secs must be greater than zero".to_string());
        }
        if !matches!(self.oauth.azure_token.as_str(), "id_token" | "access_token") {
            errors.push(format!(
                "oauth.azure_token must be id_token or access_token, got '{}'",
                self.oauth.azure_token
            ));
        }

        if self.session.key.is_empty() {
            errors.push("session.key must be set".to_string());
        }
        if self.session.name.is_empty() {
            errors.push("session.name must be set".to_string());
        }
        if self.session.max_age == 0 {
            errors.push("session.max_age must be greater than zero".to_string());
        }

        if let Err(e) = SameSite::parse_optional(&self.cookie.same_site) {
            errors.push(e);
        }

        if self.sess_store.shared_address() == Some("") {
            let backend = self.sess_store.backend.as_str();
            errors.push(format!(
                "sess_store.{backend}.address must be set for the {backend} backend"
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
