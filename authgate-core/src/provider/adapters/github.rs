//! GitHub `OAuth2` provider

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

const AUTH_URL: &str = "https://github.com/login/oauth/authorize";
const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const USER_INFO_URL: &str = "https://api.github.com/user";

/// GitHub `OAuth2` provider
pub struct GitHubProvider {
    common: Arc<CommonClient>,
    endpoints: Option<Endpoints>,
}

impl GitHubProvider {
    #[must_use]
    pub const fn new(common: Arc<CommonClient>) -> Self {
        Self {
            common,
            endpoints: None,
        }
    }
}

#[async_trait]
impl Provider for GitHubProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GitHub
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

        let provider_tokens = self.common.prepare_tokens(request, false, opts).await?;

        let raw = self
            .common
            .fetch_json(
                url,
                &provider_tokens.access_token,
                &[("Accept", "application/vnd.github+json")],
            )
            .await?;

        let user = User {
            username: first_string(&raw, &["login"]),
            name: first_string(&raw, &["name"]),
            email: first_string(&raw, &["email"]),
            sub: first_string(&raw, &["id"]),
        };

        Ok(UserInfo {
            user,
            custom_claims: self.common.map_claims(&raw)?,
            provider_tokens,
        })
    }
}
