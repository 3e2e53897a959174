//! Memcached session backend
//!
//! The `memcache` client is blocking, so every call runs on the blocking
//! thread pool.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::task;
use tracing::debug;

use super::{BackendKind, Session, SessionBackend};
use crate::{Error, Result};

/// Memcached reads expirations above 30 days as absolute unix times
const MAX_RELATIVE_EXPIRATION: u64 = 60 * 60 * 24 * 30;

/// Sessions stored as JSON under `{prefix}{id}` with an expiration
#[derive(Clone)]
pub struct MemcachedSessionBackend {
    client: Arc<memcache::Client>,
    address: String,
    key_prefix: String,
}

impl std::fmt::Debug for MemcachedSessionBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemcachedSessionBackend")
            .field("address", &self.address)
            .field("key_prefix", &self.key_prefix)
            .finish_non_exhaustive()
    }
}

impl MemcachedSessionBackend {
    /// Connect and verify the server answers `version` within `timeout`.
    ///
    /// # Errors
    /// Every failure is reported as `StoreInit`.
    pub async fn connect(address: &str, key_prefix: &str, timeout: Duration) -> Result<Self> {
        let url = memcache_url(address, timeout);
        let connecting = task::spawn_blocking(move || {
            let client = memcache::Client::connect(url.as_str())?;
            client.version()?;
            Ok::<_, memcache::MemcacheError>(client)
        });

        let client = tokio::time::timeout(timeout, connecting)
            .await
            .map_err(|_| Error::StoreInit(format!("Timed out connecting to memcached at {address}")))?
            .map_err(|e| Error::StoreInit(format!("Memcached connect task failed: {e}")))?
            .map_err(|e| {
                Error::StoreInit(format!("Failed to connect to memcached at {address}: {e}"))
            })?;

        Ok(Self {
            client: Arc::new(client),
            address: address.to_string(),
            key_prefix: key_prefix.to_string(),
        })
    }

    fn key(&self, id: &str) -> String {
        format!("{}{}", self.key_prefix, id)
    }

    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&memcache::Client) -> std::result::Result<T, memcache::MemcacheError>
            + Send
            + 'static,
    {
        let client = Arc::clone(&self.client);
        task::spawn_blocking(move || op(&client))
            .await
            .map_err(|e| Error::Internal(format!("Memcached task failed: {e}")))?
            .map_err(Error::from)
    }
}

/// Accept both `host:port` and full `memcache://` URLs. The timeout becomes
/// the socket read/write timeout unless the URL already sets one.
fn memcache_url(address: &str, timeout: Duration) -> String {
    let address = address.trim();
    let url = if address.contains("://") {
        address.to_string()
    } else {
        format!("memcache://{address}")
    };

    if url.contains("timeout=") {
        url
    } else {
        let separator = if url.contains('?') { '&' } else { '?' };
        format!("{url}{separator}timeout={}", timeout.as_secs().max(1))
    }
}

/// Memcached expiration for `ttl`, switching to an absolute time past 30 days
fn expiration(ttl: Duration, now: u64) -> u32 {
    let secs = ttl.as_secs().max(1);
    let value = if secs > MAX_RELATIVE_EXPIRATION {
        now.saturating_add(secs)
    } else {
        secs
    };
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[async_trait]
impl SessionBackend for MemcachedSessionBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Shared
    }

    fn describe(&self) -> String {
        format!("memcached at {} (prefix {})", self.address, self.key_prefix)
    }

    async fn load(&self, payload: &str) -> Result<Option<Session>> {
        let key = self.key(payload);
        let stored: Option<String> = self.run(move |client| client.get::<String>(&key)).await?;

        let Some(stored) = stored else {
            debug!("Session not found or expired");
            return Ok(None);
        };
        let values: Map<String, Value> = serde_json::from_str(&stored)?;
        Ok(Some(Session::restored(payload.to_string(), values)))
    }

    async fn save(&self, session: &Session, ttl: Duration) -> Result<String> {
        let key = self.key(session.id());
        let json = serde_json::to_string(session.values())?;
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs());
        let expires = expiration(ttl, now);

        self.run(move |client| client.set(&key, json.as_str(), expires))
            .await?;
        Ok(session.id().to_string())
    }

    async fn delete(&self, session: &Session) -> Result<()> {
        let key = self.key(session.id());
        self.run(move |client| client.delete(&key)).await?;
        Ok(())
    }
}
