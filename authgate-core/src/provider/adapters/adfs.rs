//! Active Directory Federation Services provider
//!
//! ADFS has no user-info endpoint; identity comes from the `id_token`.

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

pub struct AdfsProvider {
    common: Arc<CommonClient>,
    endpoints: Option<Endpoints>,
}

impl AdfsProvider {
    #[must_use]
    pub const fn new(common: Arc<CommonClient>) -> Self {
        Self {
            common,
            endpoints: None,
        }
    }
}

#[async_trait]
impl Provider for AdfsProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Adfs
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

        let provider_tokens = self.common.prepare_tokens(request, true, opts).await?;
        let id_token = provider_tokens
            .id_token
            .as_deref()
            .ok_or_else(|| Error::UserInfo("ADFS returned no id_token".to_string()))?;
        let raw = decode_jwt_claims(id_token)?;

        let user = User {
            username: first_string(&raw, &["upn", "email", "sub"]),
            name: first_string(&raw, &["unique_name", "name"]),
            email: first_string(&raw, &["email", "upn"]),
            sub: first_string(&raw, &["sub"]),
        };

        Ok(UserInfo {
            user,
            custom_claims: self.common.map_claims(&raw)?,
            provider_tokens,
        })
    }
}
