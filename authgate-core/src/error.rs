use thiserror::Error;

use crate::provider::ProviderKind;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session store initialization failed: {0}")]
    StoreInit(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Memcached error: {0}")]
    Memcached(#[from] memcache::MemcacheError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Session codec error: {0}")]
    Codec(String),

    #[error("Request carries no authorization code")]
    MissingCode,

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("User info request failed: {0}")]
    UserInfo(String),

    #[error("{0} provider used before configure()")]
    NotConfigured(ProviderKind),

    #[error("{0} provider configured twice")]
    AlreadyConfigured(ProviderKind),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Per-request failures that leave the process able to serve other requests.
    #[must_use]
    pub const fn is_request_error(&self) -> bool {
        matches!(
            self,
            Self::MissingCode | Self::TokenExchange(_) | Self::UserInfo(_) | Self::Codec(_)
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::UserInfo(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
