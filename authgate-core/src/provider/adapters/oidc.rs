//! Generic OIDC provider

use std::sync::Arc;

use async_trait::async_trait;

use super::{ensure_unconfigured, user_info_url};
use crate::config::OAuthConfig;
use crate::provider::claims::first_string;
use crate::provider::{
    resolve_endpoint, AuthCodeOption, CommonClient, Endpoints, Provider, ProviderKind, User,
    UserInfo,
};
use crate::Result;

/// Generic OIDC provider
///
/// Every endpoint is deployment specific, so all three must be configured.
pub struct OidcProvider {
    common: Arc<CommonClient>,
    endpoints: Option<Endpoints>,
}

impl OidcProvider {
    #[must_use]
    pub const fn new(common: Arc<CommonClient>) -> Self {
        Self {
            common,
            endpoints: None,
        }
    }
}

#[async_trait]
impl Provider for OidcProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Oidc
    }

    fn configure(&mut self, config: &OAuthConfig) -> Result<()> {
        let kind = self.kind();
        ensure_unconfigured(kind, self.endpoints.as_ref())?;

        self.endpoints = Some(Endpoints {
            auth_url: resolve_endpoint(kind, "auth_url", &config.auth_url, None)?,
            token_url: Some(resolve_endpoint(kind, "token_url", &config.token_url, None)?),
            user_info_url: Some(resolve_endpoint(
                kind,
                "user_info_url",
                &config.user_info_url,
                None,
            )?),
        });
        Ok(())
    }

    fn is_configured(&self) -> bool {
        self.endpoints.is_some()
    }

    fn endpoints(&self) -> Option<&Endpoints> {
        self.endpoints.as_ref()
    }

    async fn get_user_info(
        &self,
        request: &http::request::Parts,
        opts: &[AuthCodeOption],
    ) -> Result<UserInfo> {
        let url = user_info_url(self.kind(), self.endpoints.as_ref())?;
        let provider_tokens = self.common.prepare_tokens(request, true, opts).await?;
        let raw = self
            .common
            .fetch_json(url, &provider_tokens.access_token, &[])
            .await?;

        let user = User {
            username: first_string(&raw, &["preferred_username", "email", "sub"]),
            name: first_string(&raw, &["name"]),
            email: first_string(&raw, &["email"]),
            sub: first_string(&raw, &["sub"]),
        };

        Ok(UserInfo {
            user,
            custom_claims: self.common.map_claims(&raw)?,
            provider_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::adapters::test_support::{
        config_for, configured_provider, mount_token, parts,
    };
    use crate::Error;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_configure_requires_every_endpoint() {
        let mut provider = OidcProvider::new(Arc::new(CommonClient::new()));
        let config = OAuthConfig {
            auth_url: "https://idp.example.com/authorize".to_string(),
            token_url: "https://idp.example.com/token".to_string(),
            ..Default::default()
        };
        let err = provider.configure(&config).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(!provider.is_configured());
    }

    #[tokio::test]
    async fn test_get_user_info_maps_claims() {
        let server = MockServer::start().await;
        mount_token(&server, "abc", "at-1", Some("idt-1")).await;
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sub": "248289761001",
                "preferred_username": "jdoe",
                "name": "Jane Doe",
                "email": "jdoe@example.com",
                "groups": ["admins", "dev"],
            })))
            .mount(&server)
            .await;

        let config = config_for(&server, ProviderKind::Oidc);
        let provider = configured_provider(&config, ProviderKind::Oidc);

        let info = provider.get_user_info(&parts("/auth?code=abc"), &[]).await.unwrap();
        assert_eq!(info.user.username, "jdoe");
        assert_eq!(info.user.sub, "248289761001");
        assert_eq!(info.provider_tokens.access_token, "at-1");
        assert_eq!(info.provider_tokens.id_token.as_deref(), Some("idt-1"));
        assert_eq!(info.custom_claims.get("groups"), Some(&json!(["admins", "dev"])));
    }

    #[tokio::test]
    async fn test_auth_code_options_reach_token_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("code_verifier=pkce-verifier"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "at-pkce",
                "token_type": "bearer",
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sub": "s1"})))
            .mount(&server)
            .await;

        let config = config_for(&server, ProviderKind::Oidc);
        let provider = configured_provider(&config, ProviderKind::Oidc);

        let opts = [AuthCodeOption::new("code_verifier", "pkce-verifier")];
        let info = provider.get_user_info(&parts("/auth?code=abc"), &opts).await.unwrap();
        // falls back to the subject when no friendlier name is present
        assert_eq!(info.user.username, "s1");
        assert_eq!(info.provider_tokens.access_token, "at-pkce");
    }

    #[tokio::test]
    async fn test_missing_code() {
        let server = MockServer::start().await;
        let config = config_for(&server, ProviderKind::Oidc);
        let provider = configured_provider(&config, ProviderKind::Oidc);

        let result = provider.get_user_info(&parts("/auth?error=access_denied"), &[]).await;
        assert!(matches!(result, Err(Error::MissingCode)));
    }
}
