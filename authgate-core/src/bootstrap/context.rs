use std::sync::Arc;

use crate::provider::{CommonClient, Provider};
use crate::session::SessionStoreHandle;
use crate::Config;

/// Everything request handling needs, built once by `bootstrap()`
///
/// Cheap to clone; every clone shares the same provider and session store.
#[derive(Clone)]
pub struct AppContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    config: Config,
    provider: Arc<dyn Provider>,
    sessions: SessionStoreHandle,
    common: Arc<CommonClient>,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("provider", &self.inner.provider.kind())
            .field("sessions", &self.inner.sessions)
            .finish_non_exhaustive()
    }
}

impl AppContext {
    pub(crate) fn new(
        config: Config,
        provider: Arc<dyn Provider>,
        sessions: SessionStoreHandle,
        common: Arc<CommonClient>,
    ) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                config,
                provider,
                sessions,
                common,
            }),
        }
    }

    /// The configured identity provider
    #[must_use]
    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.inner.provider
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionStoreHandle {
        &self.inner.sessions
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Provider and shared transport both configured
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.inner.provider.is_configured() && self.inner.common.is_configured()
    }
}
