//! Stateless backend: session values travel inside the sealed cookie

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{BackendKind, Session, SessionBackend};
use crate::Result;

/// Sealed cookie contents: the session plus its absolute expiry
#[derive(Debug, Serialize, Deserialize)]
struct CookiePayload {
    /// Unix seconds after which the payload is rejected
    expires_at: u64,
    #[serde(flatten)]
    session: Session,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CookieSessionBackend;

impl CookieSessionBackend {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn seal_at(session: &Session, ttl: Duration, now: u64) -> Result<String> {
        let payload = CookiePayload {
            expires_at: now.saturating_add(ttl.as_secs()),
            session: session.clone(),
        };
        Ok(serde_json::to_string(&payload)?)
    }

    fn open_at(payload: &str, now: u64) -> Result<Option<Session>> {
        let payload: CookiePayload = serde_json::from_str(payload)?;
        if now >= payload.expires_at {
            debug!(expires_at = payload.expires_at, "Session cookie expired");
            return Ok(None);
        }
        Ok(Some(payload.session))
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}

#[async_trait]
impl SessionBackend for CookieSessionBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Cookie
    }

    fn describe(&self) -> String {
        "encrypted cookie".to_string()
    }

    async fn load(&self, payload: &str) -> Result<Option<Session>> {
        Self::open_at(payload, unix_now())
    }

    async fn save(&self, session: &Session, ttl: Duration) -> Result<String> {
        Self::seal_at(session, ttl, unix_now())
    }

    // Nothing server side; the handle expires the cookie.
    async fn delete(&self, _session: &Session) -> Result<()> {
        Ok(())
    }
}
