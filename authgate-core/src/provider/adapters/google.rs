//! Google `OAuth2` provider

use std::sync::Arc;

use async_trait::async_trait;

use super::{ensure_unconfigured, user_info_url};
use crate::config::OAuthConfig;
use crate::provider::claims::first_string;
use crate::provider::{
    resolve_endpoint, AuthCodeOption, CommonClient, Endpoints, Provider, ProviderKind, User,
    UserInfo,
};
use crate::{Error, Result};

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const TOKEN_URL: &str = "https://accounts.google.com/o/oauth2/token";
const USER_INFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

/// Google `OAuth2` provider
pub struct GoogleProvider {
    common: Arc<CommonClient>,
    endpoints: Option<Endpoints>,
    /// Hosted domain the account must belong to, when set
    preferred_domain: Option<String>,
}

impl GoogleProvider {
    #[must_use]
    pub const fn new(common: Arc<CommonClient>) -> Self {
        Self {
            common,
            endpoints: None,
            preferred_domain: None,
        }
    }
}

#[async_trait]
impl Provider for GoogleProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    fn configure(&mut self, config: &OAuthConfig) -> Result<()> {
        let kind = self.kind();
        ensure_unconfigured(kind, self.endpoints.as_ref())?;

        self.endpoints = Some(Endpoints {
            auth_url: resolve_endpoint(kind, "auth_url", &config.auth_url, Some(AUTH_URL))?,
            token_url: Some(resolve_endpoint(kind, "token_url", &config.token_url, Some(TOKEN_URL))?),
            user_info_url: Some(resolve_endpoint(
                kind,
                "user_info_url",
                &config.user_info_url,
                Some(USER_INFO_URL),
            )?),
        });
        self.preferred_domain = Some(config.preferred_domain.trim().to_string())
            .filter(|domain| !domain.is_empty());
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

        if let Some(domain) = &self.preferred_domain {
            let hd = first_string(&raw, &["hd"]);
            if &hd != domain {
                return Err(Error::UserInfo(format!(
                    "account domain '{hd}' does not match preferred domain '{domain}'"
                )));
            }
        }

        let email = first_string(&raw, &["email"]);
        let user = User {
            username: email.clone(),
            name: first_string(&raw, &["name"]),
            email,
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
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_google_user(server: &MockServer, hd: &str) {
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sub": "1098",
                "name": "Jane Doe",
                "email": "jane@corp.example.com",
                "hd": hd,
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_username_is_email_and_id_token_kept() {
        let server = MockServer::start().await;
        mount_token(&server, "c1", "ya29.token", Some("id.jwt.token")).await;
        mount_google_user(&server, "corp.example.com").await;

        let config = config_for(&server, ProviderKind::Google);
        let provider = configured_provider(&config, ProviderKind::Google);

        let info = provider.get_user_info(&parts("/auth?code=c1"), &[]).await.unwrap();
        assert_eq!(info.user.username, "jane@corp.example.com");
        assert_eq!(info.user.sub, "1098");
        assert_eq!(info.provider_tokens.id_token.as_deref(), Some("id.jwt.token"));
    }

    #[tokio::test]
    async fn test_preferred_domain_mismatch_is_rejected() {
        let server = MockServer::start().await;
        mount_token(&server, "c1", "ya29.token", None).await;
        mount_google_user(&server, "other.example.com").await;

        let mut config = config_for(&server, ProviderKind::Google);
        config.oauth.preferred_domain = "corp.example.com".to_string();
        let provider = configured_provider(&config, ProviderKind::Google);

        let result = provider.get_user_info(&parts("/auth?code=c1"), &[]).await;
        assert!(matches!(result, Err(Error::UserInfo(_))));
    }
}
