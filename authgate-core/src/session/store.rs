//! Session store initialization and the shared store handle

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use super::{
    BackendKind, CookieOptions, CookieSessionBackend, MemcachedSessionBackend,
    RedisSessionBackend, Session, SessionBackend, SessionCodec,
};
use crate::config::{Config, StoreBackendKind};
use crate::{Error, Result};

/// Key namespace used when the shared backend's `key_prefix` is empty
pub const DEFAULT_KEY_PREFIX: &str = "authgate_";

/// Browsers drop cookies beyond 4096 bytes
const MAX_COOKIE_VALUE_LEN: usize = 4096;

/// Where session values live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Redis { address: String, key_prefix: String },
    Memcached { address: String, key_prefix: String },
    Cookie,
}

impl StoreBackend {
    /// Whether sessions are shared across gateway instances
    #[must_use]
    pub const fn is_shared(&self) -> bool {
        !matches!(self, Self::Cookie)
    }
}

fn key_prefix_or_default(key_prefix: &str) -> String {
    if key_prefix.is_empty() {
        DEFAULT_KEY_PREFIX.to_string()
    } else {
        key_prefix.to_string()
    }
}

/// Everything needed to build the session store, derived from `Config`
#[derive(Clone, PartialEq, Eq)]
pub struct SessionStoreConfig {
    pub backend: StoreBackend,
    pub key: String,
    pub cookie: CookieOptions,
    pub connect_timeout: Duration,
}

impl std::fmt::Debug for SessionStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStoreConfig")
            .field("backend", &self.backend)
            .field("key", &"[REDACTED]")
            .field("cookie", &self.cookie)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl SessionStoreConfig {
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = &config.sess_store;

        // A shared backend without an address falls back to cookies
        let (backend, connect_timeout_secs) = match store.backend {
            StoreBackendKind::Redis if !store.redis.address.trim().is_empty() => (
                StoreBackend::Redis {
                    address: store.redis.address.trim().to_string(),
                    key_prefix: key_prefix_or_default(&store.redis.key_prefix),
                },
                store.redis.connect_timeout_secs,
            ),
            StoreBackendKind::Memcached if !store.memcached.address.trim().is_empty() => (
                StoreBackend::Memcached {
                    address: store.memcached.address.trim().to_string(),
                    key_prefix: key_prefix_or_default(&store.memcached.key_prefix),
                },
                store.memcached.connect_timeout_secs,
            ),
            _ => (StoreBackend::Cookie, store.redis.connect_timeout_secs),
        };

        Ok(Self {
            backend,
            key: config.session.key.clone(),
            cookie: CookieOptions::from_config(config).map_err(Error::Config)?,
            connect_timeout: Duration::from_secs(connect_timeout_secs.max(1)),
        })
    }
}

/// Build the configured backend and wrap it in a ready-to-use handle.
///
/// # Errors
/// `StoreInit` when the key is empty or the shared backend is unreachable.
pub async fn init_session_store(config: &SessionStoreConfig) -> Result<SessionStoreHandle> {
    let codec = SessionCodec::new(config.key.as_bytes())?;

    let backend: Arc<dyn SessionBackend> = match &config.backend {
        StoreBackend::Redis {
            address,
            key_prefix,
        } => {
            let backend =
                RedisSessionBackend::connect(address, key_prefix, config.connect_timeout).await?;
            info!(
                backend = "redis",
                address = %address,
                key_prefix = %key_prefix,
                "Session store connected"
            );
            Arc::new(backend)
        }
        StoreBackend::Memcached {
            address,
            key_prefix,
        } => {
            let backend =
                MemcachedSessionBackend::connect(address, key_prefix, config.connect_timeout)
                    .await?;
            info!(
                backend = "memcached",
                address = %address,
                key_prefix = %key_prefix,
                "Session store connected"
            );
            Arc::new(backend)
        }
        StoreBackend::Cookie => {
            info!(backend = "cookie", "Session store using encrypted cookies");
            Arc::new(CookieSessionBackend::new())
        }
    };

    Ok(SessionStoreHandle::new(backend, codec, config.cookie.clone()))
}

/// The live session store shared by every request
#[derive(Clone)]
pub struct SessionStoreHandle {
    backend: Arc<dyn SessionBackend>,
    codec: SessionCodec,
    options: Arc<CookieOptions>,
}

impl std::fmt::Debug for SessionStoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStoreHandle")
            .field("backend", &self.backend.describe())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl SessionStoreHandle {
    /// Attach the cookie policy to a backend. Every backend goes through here.
    #[must_use]
    pub fn new(backend: Arc<dyn SessionBackend>, codec: SessionCodec, options: CookieOptions) -> Self {
        Self {
            backend,
            codec,
            options: Arc::new(options),
        }
    }

    #[must_use]
    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }

    #[must_use]
    pub fn describe(&self) -> String {
        self.backend.describe()
    }

    #[must_use]
    pub fn options(&self) -> &CookieOptions {
        &self.options
    }

    fn ttl(&self) -> Duration {
        Duration::from_secs(self.options.max_age_secs)
    }

    /// Session for the incoming cookie value.
    ///
    /// A missing, tampered or expired cookie yields a new empty session;
    /// only backend failures are errors.
    pub async fn load(&self, cookie_value: Option<&str>) -> Result<Session> {
        let Some(cookie_value) = cookie_value.filter(|value| !value.is_empty()) else {
            return Ok(Session::new());
        };

        let payload = match self.codec.open(cookie_value).map(String::from_utf8) {
            Ok(Ok(payload)) => payload,
            Ok(Err(_)) | Err(_) => {
                debug!("Discarding undecodable session cookie");
                return Ok(Session::new());
            }
        };

        match self.backend.load(&payload).await {
            Ok(Some(session)) => Ok(session),
            Ok(None) => Ok(Session::new()),
            Err(Error::Serialization(e)) => {
                debug!(error = %e, "Discarding unreadable session");
                Ok(Session::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Persist `session` and return the sealed cookie value.
    pub async fn save(&self, session: &Session) -> Result<String> {
        let payload = self.backend.save(session, self.ttl()).await?;
        let sealed = self.codec.seal(payload.as_bytes())?;
        if sealed.len() > MAX_COOKIE_VALUE_LEN {
            return Err(Error::Codec(format!(
                "Session cookie is {} bytes, limit is {MAX_COOKIE_VALUE_LEN}",
                sealed.len()
            )));
        }
        Ok(sealed)
    }

    pub async fn delete(&self, session: &Session) -> Result<()> {
        self.backend.delete(session).await
    }

    #[must_use]
    pub fn set_cookie_header(&self, value: &str) -> String {
        self.options.render(value)
    }

    #[must_use]
    pub fn expire_cookie_header(&self) -> String {
        self.options.render_expired()
    }
}
