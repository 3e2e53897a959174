//! Alibaba Cloud provider

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

const AUTH_URL: &str = "https://signin.aliyun.com/oauth2/v1/auth";
const TOKEN_URL: &str = "https://oauth.aliyun.com/v1/token";
const USER_INFO_URL: &str = "https://oauth.aliyun.com/v1/userinfo";

pub struct AlibabaProvider {
    common: Arc<CommonClient>,
    endpoints: Option<Endpoints>,
}

impl AlibabaProvider {
    #[must_use]
    pub const fn new(common: Arc<CommonClient>) -> Self {
        Self {
            common,
            endpoints: None,
        }
    }
}

#[async_trait]
impl Provider for AlibabaProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Alibaba
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
            username: first_string(&raw, &["login_name", "upn", "sub"]),
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
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_defaults_to_aliyun_endpoints() {
        let mut provider = AlibabaProvider::new(Arc::new(CommonClient::new()));
        provider.configure(&OAuthConfig::default()).unwrap();
        let endpoints = provider.endpoints().unwrap();
        assert_eq!(endpoints.auth_url, AUTH_URL);
        assert_eq!(endpoints.user_info_url.as_deref(), Some(USER_INFO_URL));
    }

    #[tokio::test]
    async fn test_get_user_info() {
        let server = MockServer::start().await;
        mount_token(&server, "ali", "ali-token", None).await;
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sub": "1234567890",
                "login_name": "jane@1234.onaliyun.com",
                "upn": "jane@1234.onaliyun.com",
                "aid": "1234",
            })))
            .mount(&server)
            .await;

        let config = config_for(&server, ProviderKind::Alibaba);
        let provider = configured_provider(&config, ProviderKind::Alibaba);

        let info = provider.get_user_info(&parts("/auth?code=ali"), &[]).await.unwrap();
        assert_eq!(info.user.username, "jane@1234.onaliyun.com");
        assert_eq!(info.user.sub, "1234567890");
    }
}
