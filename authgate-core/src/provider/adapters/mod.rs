//! Concrete provider adapters
//!
//! Each adapter:
//! 1. Resolves its endpoints in `configure()` (configured value, else the
//!    provider's well-known default, else a configuration error)
//! 2. Redeems the code through the shared `CommonClient`
//! 3. Maps the provider's user document onto `User`

pub mod adfs;
pub mod alibaba;
pub mod azure;
pub mod github;
pub mod google;
pub mod homeassistant;
pub mod indieauth;
pub mod nextcloud;
pub mod oidc;
pub mod openstax;

pub use adfs::AdfsProvider;
pub use alibaba::AlibabaProvider;
pub use azure::AzureProvider;
pub use github::GitHubProvider;
pub use google::GoogleProvider;
pub use homeassistant::HomeAssistantProvider;
pub use indieauth::IndieAuthProvider;
pub use nextcloud::NextcloudProvider;
pub use oidc::OidcProvider;
pub use openstax::OpenStaxProvider;

use super::{Endpoints, ProviderKind};
use crate::{Error, Result};

/// Guard shared by every `configure()` implementation.
fn ensure_unconfigured(kind: ProviderKind, endpoints: Option<&Endpoints>) -> Result<()> {
    if endpoints.is_some() {
        return Err(Error::AlreadyConfigured(kind));
    }
    Ok(())
}

/// Endpoints or `NotConfigured`, for use inside `get_user_info()`.
fn configured(kind: ProviderKind, endpoints: Option<&Endpoints>) -> Result<&Endpoints> {
    endpoints.ok_or(Error::NotConfigured(kind))
}

/// User-info URL or `NotConfigured`.
fn user_info_url(kind: ProviderKind, endpoints: Option<&Endpoints>) -> Result<&str> {
    configured(kind, endpoints)?
        .user_info_url
        .as_deref()
        .ok_or(Error::NotConfigured(kind))
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Wiremock-backed fixtures shared by the adapter tests

    use std::sync::Arc;

    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::config::{Config, HeadersConfig, OAuthConfig};
    use crate::provider::{registry, CommonClient, Provider, ProviderKind};

    pub fn parts(uri: &str) -> http::request::Parts {
        http::Request::builder().uri(uri).body(()).unwrap().into_parts().0
    }

    pub fn config_for(server: &MockServer, provider: ProviderKind) -> Config {
        Config {
            oauth: OAuthConfig {
                provider: provider.to_string(),
                client_id: "gate-client".to_string(),
                client_secret: "gate-secret".to_string(),
                auth_url: format!("{}/authorize", server.uri()),
                token_url: format!("{}/token", server.uri()),
                user_info_url: format!("{}/userinfo", server.uri()),
                callback_url: "https://gate.example.com/auth".to_string(),
                ..Default::default()
            },
            headers: HeadersConfig {
                claims: vec!["groups".to_string()],
            },
            ..Default::default()
        }
    }

    /// Select, configure and wire up the adapter the way the bootstrap does.
    pub fn configured_provider(config: &Config, kind: ProviderKind) -> Arc<dyn Provider> {
        let common = Arc::new(CommonClient::new());
        let mut provider = registry::select(kind, common.clone());
        provider.configure(&config.oauth).unwrap();
        common.configure(config, provider.as_ref()).unwrap();
        Arc::from(provider)
    }

    /// Token endpoint answering `code` with `access_token` (and an optional id token).
    pub async fn mount_token(
        server: &MockServer,
        code: &str,
        access_token: &str,
        id_token: Option<&str>,
    ) {
        let mut body = json!({
            "access_token": access_token,
            "token_type": "bearer",
            "expires_in": 3600,
        });
        if let Some(id_token) = id_token {
            body["id_token"] = json!(id_token);
        }

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains(format!("code={code}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }
}
