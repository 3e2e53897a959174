//! Identity provider contract and adapters
//!
//! # Architecture
//!
//! 1. **Provider trait**: the capability set every adapter implements
//! 2. **Registry**: maps the configured identifier to exactly one adapter
//! 3. **Common client**: shared HTTP/`OAuth2` machinery configured after the
//!    selected adapter, handed to every adapter at construction
//!
//! Adapters are immutable once `configure()` returns, so a single instance
//! serves every request concurrently.

pub mod adapters;
pub mod claims;
pub mod common;
pub mod registry;

pub use common::CommonClient;
pub use registry::{resolve, select};

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::OAuthConfig;
use crate::{Error, Result};

// ============================================================================
// Provider identifiers
// ============================================================================

/// The closed set of supported identity providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    IndieAuth,
    Adfs,
    Azure,
    HomeAssistant,
    OpenStax,
    Google,
    GitHub,
    Nextcloud,
    Oidc,
    Alibaba,
}

impl ProviderKind {
    pub const ALL: [Self; 10] = [
        Self::IndieAuth,
        Self::Adfs,
        Self::Azure,
        Self::HomeAssistant,
        Self::OpenStax,
        Self::Google,
        Self::GitHub,
        Self::Nextcloud,
        Self::Oidc,
        Self::Alibaba,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IndieAuth => "indieauth",
            Self::Adfs => "adfs",
            Self::Azure => "azure",
            Self::HomeAssistant => "homeassistant",
            Self::OpenStax => "openstax",
            Self::Google => "google",
            Self::GitHub => "github",
            Self::Nextcloud => "nextcloud",
            Self::Oidc => "oidc",
            Self::Alibaba => "alibaba",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The configured identifier matches no supported provider
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("oauth.provider '{0}' is not a supported provider")]
pub struct UnknownProvider(pub String);

impl FromStr for ProviderKind {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| UnknownProvider(s.to_string()))
    }
}

// ============================================================================
// Exchange inputs and outputs
// ============================================================================

/// Extra parameter sent along with the authorization code exchange
/// (for example the PKCE `code_verifier`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCodeOption {
    pub key: String,
    pub value: String,
}

impl AuthCodeOption {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Identity resolved from the provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub name: String,
    pub email: String,
    /// Provider-side subject identifier
    pub sub: String,
}

/// Claims copied verbatim from the provider's user info, limited to the
/// names listed under `headers.claims`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomClaims {
    pub claims: BTreeMap<String, serde_json::Value>,
}

impl CustomClaims {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.claims.get(name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

/// Tokens issued by the provider during the exchange
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderTokens {
    pub access_token: String,
    pub id_token: Option<String>,
}

/// Everything a successful `get_user_info` call resolves
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserInfo {
    pub user: User,
    pub custom_claims: CustomClaims,
    pub provider_tokens: ProviderTokens,
}

/// Endpoints an adapter talks to, resolved during `configure()`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Endpoints {
    pub auth_url: String,
    /// Absent for providers that redeem the code at the authorization endpoint
    pub token_url: Option<String>,
    pub user_info_url: Option<String>,
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Identity provider adapter
///
/// # Contract
///
/// - `configure()` is called exactly once, before the adapter is shared
/// - `get_user_info()` never mutates the adapter; failures are per request
///   and leave the adapter usable
#[async_trait]
pub trait Provider: Send + Sync {
    /// Which provider this adapter speaks to
    fn kind(&self) -> ProviderKind;

    /// One-time adapter setup: resolve endpoints and check the settings this
    /// provider requires. A second call fails with `AlreadyConfigured`.
    fn configure(&mut self, config: &OAuthConfig) -> Result<()>;

    fn is_configured(&self) -> bool;

    /// Endpoints resolved by `configure()`
    fn endpoints(&self) -> Option<&Endpoints>;

    /// Redeem the authorization code carried by `request` and resolve the
    /// user, custom claims and provider tokens.
    async fn get_user_info(
        &self,
        request: &http::request::Parts,
        opts: &[AuthCodeOption],
    ) -> Result<UserInfo>;
}

/// Pick the configured endpoint, falling back to the provider default.
pub(crate) fn resolve_endpoint(
    kind: ProviderKind,
    name: &'static str,
    configured: &str,
    default: Option<&str>,
) -> Result<String> {
    let configured = configured.trim();
    if !configured.is_empty() {
        return Ok(configured.to_string());
    }
    default.map(ToString::to_string).ok_or_else(|| {
        Error::Config(format!("oauth.{name} is required for the {kind} provider"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_its_name() {
        for kind in ProviderKind::ALL {
            assert_eq!(kind.as_str().parse::<ProviderKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_kind_parse_is_case_insensitive() {
        assert_eq!("GitHub".parse::<ProviderKind>().unwrap(), ProviderKind::GitHub);
        assert_eq!(" OIDC ".parse::<ProviderKind>().unwrap(), ProviderKind::Oidc);
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let err = "okta".parse::<ProviderKind>().unwrap_err();
        assert_eq!(err, UnknownProvider("okta".to_string()));
        assert!("".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_kind_serde_names_match_display() {
        let json = serde_json::to_string(&ProviderKind::HomeAssistant).unwrap();
        assert_eq!(json, "\"homeassistant\"");
    }

    #[test]
    fn test_resolve_endpoint_prefers_configured() {
        let url = resolve_endpoint(
            ProviderKind::Google,
            "auth_url",
            "https://override.example.com/auth",
            Some("https://accounts.google.com/o/oauth2/auth"),
        )
        .unwrap();
        assert_eq!(url, "https://override.example.com/auth");
    }

    #[test]
    fn test_resolve_endpoint_requires_value_without_default() {
        let err = resolve_endpoint(ProviderKind::Oidc, "user_info_url", "  ", None).unwrap_err();
        assert!(err.to_string().contains("oauth.user_info_url"));
        assert!(err.to_string().contains("oidc"));
    }

    #[test]
    fn test_provider_trait_is_object_safe_and_send_sync() {
        fn _assert_trait_object(_: &dyn Provider) {}
        fn _assert_send_sync<T: Send + Sync + ?Sized>() {}
        _assert_send_sync::<std::sync::Arc<dyn Provider>>();
    }
}
