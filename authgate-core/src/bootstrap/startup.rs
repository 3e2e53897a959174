use std::sync::Arc;

use tracing::info;

use super::{AppContext, StartupError};
use crate::provider::{registry, CommonClient};
use crate::session::{init_session_store, SessionStoreConfig};
use crate::Config;

/// Build the application context.
///
/// Runs once per process, before any request is served:
/// 1. Session store
/// 2. Provider selection
/// 3. Provider configuration
/// 4. Shared cross-provider configuration
///
/// Any failure is fatal; nothing is retried.
pub async fn bootstrap(config: Config) -> Result<AppContext, StartupError> {
    let store_config =
        SessionStoreConfig::from_config(&config).map_err(StartupError::SessionStore)?;
    let sessions = init_session_store(&store_config)
        .await
        .map_err(StartupError::SessionStore)?;

    let kind = registry::resolve(&config.oauth.provider)?;
    let common = Arc::new(CommonClient::new());
    let mut provider = registry::select(kind, Arc::clone(&common));

    provider
        .configure(&config.oauth)
        .map_err(|source| StartupError::ProviderConfig { kind, source })?;
    common
        .configure(&config, provider.as_ref())
        .map_err(StartupError::CommonConfig)?;

    info!(
        provider = %kind,
        sessions = %sessions.kind(),
        "Bootstrap complete"
    );

    Ok(AppContext::new(config, Arc::from(provider), sessions, common))
}
