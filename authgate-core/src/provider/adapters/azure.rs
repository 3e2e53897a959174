//! Microsoft Entra ID (Azure AD) provider
//!
//! User claims are read straight out of a token issued by the v2.0 endpoint;
//! `oauth.azure_token` picks which one.

use std::sync::Arc;

use async_trait::async_trait;

use super::ensure_unconfigured;
use crate::config::OAuthConfig;
use crate::provider::claims::{decode_jwt_claims, first_string};
use crate::provider::{
    resolve_endpoint, AuthCodeOption, CommonClient, Endpoints, Provider, ProviderKind, User,
    UserInfo,
};
use crate::{Error, Result};

const AUTH_URL: &str = "https://login.microsoftonline.com/common/oauth2/v2.0/authorize";
const TOKEN_URL: &str = "https://login.microsoftonline.com/common/oauth2/v2.0/token";

/// Token the claims are decoded from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClaimsSource {
    IdToken,
    AccessToken,
}

impl ClaimsSource {
    fn parse(value: &str) -> Result<Self> {
        match value.trim() {
            "" | "id_token" => Ok(Self::IdToken),
            "access_token" => Ok(Self::AccessToken),
            other => Err(Error::Config(format!(
                "oauth.azure_token must be id_token or access_token, got '{other}'"
            ))),
        }
    }
}

/// Microsoft Entra ID provider
pub struct AzureProvider {
    common: Arc<CommonClient>,
    endpoints: Option<Endpoints>,
    source: ClaimsSource,
}

impl AzureProvider {
    #[must_use]
    pub const fn new(common: Arc<CommonClient>) -> Self {
        Self {
            common,
            endpoints: None,
            source: ClaimsSource::IdToken,
        }
    }
}

#[async_trait]
impl Provider for AzureProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Azure
    }

    fn configure(&mut self, config: &OAuthConfig) -> Result<()> {
        let kind = self.kind();
        ensure_unconfigured(kind, self.endpoints.as_ref())?;

        let source = ClaimsSource::parse(&config.azure_token)?;
        self.endpoints = Some(Endpoints {
            auth_url: resolve_endpoint(kind, "auth_url", &config.auth_url, Some(AUTH_URL))?,
            token_url: Some(resolve_endpoint(kind, "token_url", &config.token_url, Some(TOKEN_URL))?),
            user_info_url: None,
        });
        self.source = source;
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
        if self.endpoints.is_none() {
            return Err(Error::NotConfigured(self.kind()));
        }

        let provider_tokens = self.common.prepare_tokens(request, true, opts).await?;
        let token = match self.source {
            ClaimsSource::IdToken => provider_tokens.id_token.as_deref().ok_or_else(|| {
                Error::UserInfo("token response carries no id_token".to_string())
            })?,
            ClaimsSource::AccessToken => provider_tokens.access_token.as_str(),
        };
        let raw = decode_jwt_claims(token)?;

        let user = User {
            username: first_string(&raw, &["upn", "preferred_username", "email"]),
            name: first_string(&raw, &["name"]),
            email: first_string(&raw, &["email", "upn"]),
            sub: first_string(&raw, &["oid", "sub"]),
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
    use base64::Engine;
    use serde_json::json;
    use wiremock::MockServer;

    fn jwt(payload: &serde_json::Value) -> String {
        let body = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .encode(serde_json::to_vec(payload).unwrap());
        format!("eyJ0eXAiOiJKV1QifQ.{body}.signature")
    }

    #[test]
    fn test_defaults_to_common_tenant() {
        let mut provider = AzureProvider::new(Arc::new(CommonClient::new()));
        provider.configure(&OAuthConfig::default()).unwrap();
        let endpoints = provider.endpoints().unwrap();
        assert_eq!(endpoints.auth_url, AUTH_URL);
        assert_eq!(endpoints.token_url.as_deref(), Some(TOKEN_URL));
        assert!(endpoints.user_info_url.is_none());
    }

    #[test]
    fn test_rejects_unknown_token_choice() {
        let mut provider = AzureProvider::new(Arc::new(CommonClient::new()));
        let config = OAuthConfig {
            azure_token: "refresh_token".to_string(),
            ..Default::default()
        };
        assert!(matches!(provider.configure(&config), Err(Error::Config(_))));
        assert!(!provider.is_configured());
    }

    #[tokio::test]
    async fn test_claims_from_id_token() {
        let server = MockServer::start().await;
        let id_token = jwt(&json!({
            "oid": "00000000-0000-0000-66f3-3332eca7ea81",
            "upn": "jdoe@contoso.com",
            "name": "Jane Doe",
            "groups": ["g1"],
        }));
        mount_token(&server, "az", "opaque-access", Some(&id_token)).await;

        let config = config_for(&server, ProviderKind::Azure);
        let provider = configured_provider(&config, ProviderKind::Azure);

        let info = provider.get_user_info(&parts("/auth?code=az"), &[]).await.unwrap();
        assert_eq!(info.user.username, "jdoe@contoso.com");
        assert_eq!(info.user.email, "jdoe@contoso.com");
        assert_eq!(info.user.sub, "00000000-0000-0000-66f3-3332eca7ea81");
        assert_eq!(info.custom_claims.get("groups"), Some(&json!(["g1"])));
        assert_eq!(info.provider_tokens.id_token.as_deref(), Some(id_token.as_str()));
    }

    #[tokio::test]
    async fn test_claims_from_access_token() {
        let server = MockServer::start().await;
        let access_token = jwt(&json!({"preferred_username": "guest@contoso.com", "sub": "s"}));
        mount_token(&server, "az", &access_token, None).await;

        let mut config = config_for(&server, ProviderKind::Azure);
        config.oauth.azure_token = "access_token".to_string();
        let provider = configured_provider(&config, ProviderKind::Azure);

        let info = provider.get_user_info(&parts("/auth?code=az"), &[]).await.unwrap();
        assert_eq!(info.user.username, "guest@contoso.com");
    }

    #[tokio::test]
    async fn test_missing_id_token_is_request_error() {
        let server = MockServer::start().await;
        mount_token(&server, "az", "opaque-access", None).await;

        let config = config_for(&server, ProviderKind::Azure);
        let provider = configured_provider(&config, ProviderKind::Azure);

        let err = provider.get_user_info(&parts("/auth?code=az"), &[]).await.unwrap_err();
        assert!(err.is_request_error());
    }
}
