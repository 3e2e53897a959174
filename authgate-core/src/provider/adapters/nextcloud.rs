//! Nextcloud provider
//!
//! User info comes from the OCS provisioning API, wrapped in the usual
//! `{"ocs": {"data": ...}}` envelope.

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

pub struct NextcloudProvider {
    common: Arc<CommonClient>,
    endpoints: Option<Endpoints>,
}

impl NextcloudProvider {
    #[must_use]
    pub const fn new(common: Arc<CommonClient>) -> Self {
        Self {
            common,
            endpoints: None,
        }
    }
}

#[async_trait]
impl Provider for NextcloudProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Nextcloud
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
        let provider_tokens = self.common.prepare_tokens(request, false, opts).await?;
        let raw = self
            .common
            .fetch_json(
                url,
                &provider_tokens.access_token,
                &[("OCS-APIRequest", "true"), ("Accept", "application/json")],
            )
            .await?;

        let data = raw
            .pointer("/ocs/data")
            .ok_or_else(|| Error::UserInfo("Nextcloud response has no ocs.data".to_string()))?;

        let user = User {
            username: first_string(data, &["id"]),
            name: first_string(data, &["display-name", "displayname"]),
            email: first_string(data, &["email"]),
            sub: first_string(data, &["id"]),
        };

        Ok(UserInfo {
            user,
            custom_claims: self.common.map_claims(data)?,
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
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_get_user_info_unwraps_ocs_envelope() {
        let server = MockServer::start().await;
        mount_token(&server, "nc", "nc-token", None).await;
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .and(header("ocs-apirequest", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ocs": {
                    "meta": {"status": "ok"},
                    "data": {
                        "id": "jane",
                        "display-name": "Jane Doe",
                        "email": "jane@cloud.example.com",
                        "groups": ["admin"],
                    },
                },
            })))
            .mount(&server)
            .await;

        let config = config_for(&server, ProviderKind::Nextcloud);
        let provider = configured_provider(&config, ProviderKind::Nextcloud);

        let info = provider.get_user_info(&parts("/auth?code=nc"), &[]).await.unwrap();
        assert_eq!(info.user.username, "jane");
        assert_eq!(info.user.name, "Jane Doe");
        assert_eq!(info.custom_claims.get("groups"), Some(&json!(["admin"])));
    }

    #[tokio::test]
    async fn test_missing_envelope() {
        let server = MockServer::start().await;
        mount_token(&server, "nc", "nc-token", None).await;
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "jane"})))
            .mount(&server)
            .await;

        let config = config_for(&server, ProviderKind::Nextcloud);
        let provider = configured_provider(&config, ProviderKind::Nextcloud);

        let result = provider.get_user_info(&parts("/auth?code=nc"), &[]).await;
        assert!(matches!(result, Err(Error::UserInfo(_))));
    }
}
