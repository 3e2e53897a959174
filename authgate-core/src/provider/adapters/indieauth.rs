//! IndieAuth provider
//!
//! The authorization code is verified at the authorization endpoint itself,
//! which answers with the user's profile URL (`me`). No access token is
//! issued.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use super::ensure_unconfigured;
use crate::config::OAuthConfig;
use crate::provider::common::authorization_code;
use crate::provider::{
    resolve_endpoint, AuthCodeOption, CommonClient, Endpoints, Provider, ProviderKind,
    ProviderTokens, User, UserInfo,
};
use crate::{Error, Result};

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    #[serde(default)]
    me: String,
}

pub struct IndieAuthProvider {
    common: Arc<CommonClient>,
    endpoints: Option<Endpoints>,
}

impl IndieAuthProvider {
    #[must_use]
    pub const fn new(common: Arc<CommonClient>) -> Self {
        Self {
            common,
            endpoints: None,
        }
    }
}

#[async_trait]
impl Provider for IndieAuthProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::IndieAuth
    }

    fn configure(&mut self, config: &OAuthConfig) -> Result<()> {
        let kind = self.kind();
        ensure_unconfigured(kind, self.endpoints.as_ref())?;

        self.endpoints = Some(Endpoints {
            auth_url: resolve_endpoint(kind, "auth_url", &config.auth_url, None)?,
            token_url: None,
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
        let endpoints = self
            .endpoints
            .as_ref()
            .ok_or(Error::NotConfigured(self.kind()))?;
        let code = authorization_code(request)?;

        let mut form = vec![
            ("code", code.as_str()),
            ("redirect_uri", self.common.callback_url()?),
            ("client_id", self.common.client_id()?),
        ];
        form.extend(opts.iter().map(|opt| (opt.key.as_str(), opt.value.as_str())));

        let verified: VerifyResponse = self
            .common
            .http()?
            .post(&endpoints.auth_url)
            .header("Accept", "application/json")
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::TokenExchange(format!("IndieAuth verification failed: {e}")))?
            .error_for_status()
            .map_err(|e| Error::TokenExchange(format!("IndieAuth rejected the code: {e}")))?
            .json()
            .await
            .map_err(|e| Error::TokenExchange(format!("Invalid IndieAuth response: {e}")))?;

        if verified.me.is_empty() {
            return Err(Error::UserInfo("IndieAuth response has no 'me'".to_string()));
        }

        Ok(UserInfo {
            user: User {
                username: verified.me.clone(),
                sub: verified.me,
                ..Default::default()
            },
            custom_claims: Default::default(),
            provider_tokens: ProviderTokens::default(),
        })
    }
}
