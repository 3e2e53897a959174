use thiserror::Error;

use crate::provider::{ProviderKind, UnknownProvider};

/// Fatal startup failure. The process must not start serving.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration validation failed with {} error(s): {}", .0.len(), .0.join("; "))]
    InvalidConfig(Vec<String>),

    #[error(transparent)]
    UnknownProvider(#[from] UnknownProvider),

    #[error("Session store setup failed: {0}")]
    SessionStore(#[source] crate::Error),

    #[error("{kind} provider configuration failed: {source}")]
    ProviderConfig {
        kind: ProviderKind,
        #[source]
        source: crate::Error,
    },

    #[error("Shared provider configuration failed: {0}")]
    CommonConfig(#[source] crate::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_lists_every_problem() {
        let err = StartupError::InvalidConfig(vec![
            "session.key must be set".to_string(),
            "oauth.client_id must be set".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "Configuration validation failed with 2 error(s): session.key must be set; oauth.client_id must be set"
        );
    }

    #[test]
    fn test_unknown_provider_message() {
        let err = StartupError::from(UnknownProvider("okta".to_string()));
        assert_eq!(err.to_string(), "oauth.provider 'okta' is not a supported provider");
    }
}
