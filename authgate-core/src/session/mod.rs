//! Encrypted session storage
//!
//! Two interchangeable backends sit behind [`SessionBackend`]:
//! - **Redis** / **Memcached**: session values shared across instances, the
//!   cookie carries only the sealed session id
//! - **Cookie**: session values sealed into the cookie itself, with an expiry
//!
//! Both go through the same [`SessionStoreHandle`], so sealing and cookie
//! attributes never depend on the backend.

pub mod codec;
pub mod cookie;
pub mod cookie_store;
pub mod memcached;
pub mod redis;
pub mod store;

pub use codec::SessionCodec;
pub use cookie::{CookieOptions, SameSite};
pub use cookie_store::CookieSessionBackend;
pub use memcached::MemcachedSessionBackend;
pub use self::redis::RedisSessionBackend;
pub use store::{init_session_store, SessionStoreConfig, SessionStoreHandle, StoreBackend};

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Result;

/// Length of generated session ids
const SESSION_ID_LEN: usize = 32;

/// Which kind of backend a store runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Distributed store shared by every gateway instance
    Shared,
    /// Values kept in the sealed cookie
    Cookie,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shared => f.write_str("shared"),
            Self::Cookie => f.write_str("cookie"),
        }
    }
}

/// A user session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    id: String,
    #[serde(default)]
    values: Map<String, Value>,
    #[serde(skip)]
    is_new: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Fresh session with a random id
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: nanoid::nanoid!(SESSION_ID_LEN),
            values: Map::new(),
            is_new: true,
        }
    }

    /// Session restored from a backend
    #[must_use]
    pub const fn restored(id: String, values: Map<String, Value>) -> Self {
        Self {
            id,
            values,
            is_new: false,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn is_new(&self) -> bool {
        self.is_new
    }

    #[must_use]
    pub const fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Serialize) -> Result<()> {
        self.values.insert(key.into(), serde_json::to_value(value)?);
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }
}

/// Storage for session values
///
/// The handle seals whatever `save()` returns into the cookie and hands the
/// opened payload back to `load()`.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Human readable location, used in logs
    fn describe(&self) -> String;

    /// Resolve an opened cookie payload. `None` when the session is gone.
    async fn load(&self, payload: &str) -> Result<Option<Session>>;

    /// Persist `session` for `ttl` and return the payload to seal.
    async fn save(&self, session: &Session, ttl: Duration) -> Result<String>;

    async fn delete(&self, session: &Session) -> Result<()>;
}
