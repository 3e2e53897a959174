//! Home Assistant provider
//!
//! Home Assistant exposes no user-info endpoint to `OAuth2` clients. A
//! successful code exchange proves the login, and every user maps to the
//! same static identity.

use std::sync::Arc;

use async_trait::async_trait;

use super::ensure_unconfigured;
use crate::config::OAuthConfig;
use crate::provider::{
    resolve_endpoint, AuthCodeOption, CommonClient, Endpoints, Provider, ProviderKind, User,
    UserInfo,
};
use crate::{Error, Result};

const USERNAME: &str = "homeassistant";

pub struct HomeAssistantProvider {
    common: Arc<CommonClient>,
    endpoints: Option<Endpoints>,
}

impl HomeAssistantProvider {
    #[must_use]
    pub const fn new(common: Arc<CommonClient>) -> Self {
        Self {
            common,
            endpoints: None,
        }
    }
}

#[async_trait]
impl Provider for HomeAssistantProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::HomeAssistant
    }

    fn configure(&mut self, config: &OAuthConfig) -> Result<()> {
        let kind = self.kind();
        ensure_unconfigured(kind, self.endpoints.as_ref())?;

        self.endpoints = Some(Endpoints {
            auth_url: resolve_endpoint(kind, "auth_url", &config.auth_url, None)?,
            token_url: Some(resolve_endpoint(kind, "token_url", &config.token_url, None)?),
            user_info_url: None,
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
        if self.endpoints.is_none() {
            return Err(Error::NotConfigured(self.kind()));
        }

        let provider_tokens = self.common.prepare_tokens(request, false, opts).await?;

        Ok(UserInfo {
            user: User {
                username: USERNAME.to_string(),
                ..Default::default()
            },
            custom_claims: Default::default(),
            provider_tokens,
        })
    }
}
