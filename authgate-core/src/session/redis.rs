//! Redis session backend

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde_json::{Map, Value};
use tracing::debug;

use super::{BackendKind, Session, SessionBackend};
use crate::{Error, Result};

/// Sessions stored as JSON under `{prefix}{id}` with a TTL
#[derive(Clone)]
pub struct RedisSessionBackend {
    conn: ConnectionManager,
    address: String,
    key_prefix: String,
}

impl std::fmt::Debug for RedisSessionBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisSessionBackend")
            .field("address", &self.address)
            .field("key_prefix", &self.key_prefix)
            .finish_non_exhaustive()
    }
}

impl RedisSessionBackend {
    /// Connect and verify the server answers `PING` within `timeout`.
    ///
    /// # Errors
    /// Every failure is reported as `StoreInit`.
    pub async fn connect(address: &str, key_prefix: &str, timeout: Duration) -> Result<Self> {
        let url = redis_url(address);
        let client = redis::Client::open(url.as_str())
            .map_err(|e| Error::StoreInit(format!("Invalid Redis address '{address}': {e}")))?;

        let mut conn = tokio::time::timeout(timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| Error::StoreInit(format!("Timed out connecting to Redis at {address}")))?
            .map_err(|e| Error::StoreInit(format!("Failed to connect to Redis at {address}: {e}")))?;

        let _: String = tokio::time::timeout(timeout, redis::cmd("PING").query_async(&mut conn))
            .await
            .map_err(|_| Error::StoreInit(format!("Redis at {address} did not answer PING")))?
            .map_err(|e| Error::StoreInit(format!("Redis PING failed: {e}")))?;

        Ok(Self {
            conn,
            address: address.to_string(),
            key_prefix: key_prefix.to_string(),
        })
    }

    fn key(&self, id: &str) -> String {
        format!("{}{}", self.key_prefix, id)
    }
}

/// Accept both `host:port` and full `redis://` / `rediss://` URLs.
fn redis_url(address: &str) -> String {
    let address = address.trim();
    if address.contains("://") {
        address.to_string()
    } else {
        format!("redis://{address}")
    }
}

#[async_trait]
impl SessionBackend for RedisSessionBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Shared
    }

    fn describe(&self) -> String {
        format!("redis at {} (prefix {})", self.address, self.key_prefix)
    }

    async fn load(&self, payload: &str) -> Result<Option<Session>> {
        let mut conn = self.conn.clone();
        let stored: Option<String> = conn.get(self.key(payload)).await?;

        let Some(stored) = stored else {
            debug!("Session not found or expired");
            return Ok(None);
        };
        let values: Map<String, Value> = serde_json::from_str(&stored)?;
        Ok(Some(Session::restored(payload.to_string(), values)))
    }

    async fn save(&self, session: &Session, ttl: Duration) -> Result<String> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(session.values())?;
        let _: () = conn
            .set_ex(self.key(session.id()), json, ttl.as_secs().max(1))
            .await?;
        Ok(session.id().to_string())
    }

    async fn delete(&self, session: &Session) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(self.key(session.id())).await?;
        Ok(())
    }
}
