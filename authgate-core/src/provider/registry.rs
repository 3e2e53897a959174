//! Provider selection
//!
//! One configured identifier maps to exactly one adapter. The match below is
//! exhaustive over `ProviderKind`, so adding a variant without an adapter is a
//! compile error; unknown identifiers are rejected while parsing.

use std::sync::Arc;

use super::adapters::{
    AdfsProvider, AlibabaProvider, AzureProvider, GitHubProvider, GoogleProvider,
    HomeAssistantProvider, IndieAuthProvider, NextcloudProvider, OidcProvider, OpenStaxProvider,
};
use super::{CommonClient, Provider, ProviderKind, UnknownProvider};

/// Parse the configured identifier into a provider kind.
pub fn resolve(identifier: &str) -> Result<ProviderKind, UnknownProvider> {
    identifier.parse()
}

/// Construct the adapter for `kind`. `configure()` is left to the caller.
#[must_use]
pub fn select(kind: ProviderKind, common: Arc<CommonClient>) -> Box<dyn Provider> {
    match kind {
        ProviderKind::IndieAuth => Box::new(IndieAuthProvider::new(common)),
        ProviderKind::Adfs => Box::new(AdfsProvider::new(common)),
        ProviderKind::Azure => Box::new(AzureProvider::new(common)),
        ProviderKind::HomeAssistant => Box::new(HomeAssistantProvider::new(common)),
        ProviderKind::OpenStax => Box::new(OpenStaxProvider::new(common)),
        ProviderKind::Google => Box::new(GoogleProvider::new(common)),
        ProviderKind::GitHub => Box::new(GitHubProvider::new(common)),
        ProviderKind::Nextcloud => Box::new(NextcloudProvider::new(common)),
        ProviderKind::Oidc => Box::new(OidcProvider::new(common)),
        ProviderKind::Alibaba => Box::new(AlibabaProvider::new(common)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_selects_matching_adapter() {
        let common = Arc::new(CommonClient::new());
        for kind in ProviderKind::ALL {
            let provider = select(kind, common.clone());
            assert_eq!(provider.kind(), kind);
            assert!(!provider.is_configured());
            assert!(provider.endpoints().is_none());
        }
    }

    #[test]
    fn test_distinct_kinds_get_distinct_instances() {
        let common = Arc::new(CommonClient::new());
        let github = select(ProviderKind::GitHub, common.clone());
        let google = select(ProviderKind::Google, common);

        assert_ne!(github.kind(), google.kind());
        let github_ptr = std::ptr::from_ref(github.as_ref()).cast::<()>();
        let google_ptr = std::ptr::from_ref(google.as_ref()).cast::<()>();
        assert_ne!(github_ptr, google_ptr);
    }

    #[test]
    fn test_resolve_known_and_unknown() {
        assert_eq!(resolve("adfs").unwrap(), ProviderKind::Adfs);
        assert_eq!(
            resolve("keycloak").unwrap_err(),
            UnknownProvider("keycloak".to_string())
        );
    }
}
