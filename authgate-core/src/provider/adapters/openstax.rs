//! OpenStax Accounts provider

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use super::{ensure_unconfigured, user_info_url};
use crate::config::OAuthConfig;
use crate::provider::{
    resolve_endpoint, AuthCodeOption, CommonClient, Endpoints, Provider, ProviderKind, User,
    UserInfo,
};
use crate::Result;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OpenStaxUser {
    uuid: String,
    name: String,
    contact_infos: Vec<ContactInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ContactInfo {
    #[serde(rename = "type")]
    kind: String,
    value: String,
    is_verified: bool,
}

impl OpenStaxUser {
    /// First verified e-mail address on the account
    fn verified_email(&self) -> Option<&str> {
        self.contact_infos
            .iter()
            .find(|info| info.kind == "EmailAddress" && info.is_verified)
            .map(|info| info.value.as_str())
    }
}

pub struct OpenStaxProvider {
    common: Arc<CommonClient>,
    endpoints: Option<Endpoints>,
}

impl OpenStaxProvider {
    #[must_use]
    pub const fn new(common: Arc<CommonClient>) -> Self {
        Self {
            common,
            endpoints: None,
        }
    }
}

#[async_trait]
impl Provider for OpenStaxProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenStax
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
            .fetch_json(url, &provider_tokens.access_token, &[])
            .await?;

        let account: OpenStaxUser = serde_json::from_value(raw.clone())?;
        let user = User {
            username: account.uuid.clone(),
            name: account.name.clone(),
            email: account.verified_email().unwrap_or_default().to_string(),
            sub: account.uuid,
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
    fn test_verified_email_skips_unverified_entries() {
        let account: OpenStaxUser = serde_json::from_value(json!({
            "uuid": "u",
            "contact_infos": [
                {"type": "EmailAddress", "value": "old@example.com", "is_verified": false},
                {"type": "Phone", "value": "555", "is_verified": true},
                {"type": "EmailAddress", "value": "jane@example.com", "is_verified": true},
            ],
        }))
        .unwrap();
        assert_eq!(account.verified_email(), Some("jane@example.com"));
    }

    #[tokio::test]
    async fn test_get_user_info() {
        let server = MockServer::start().await;
        mount_token(&server, "os", "os-token", None).await;
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "uuid": "d8cb1a16-6b79-4a6c-9d1c-0b8b56bd9c34",
                "name": "Jane Doe",
                "contact_infos": [
                    {"type": "EmailAddress", "value": "jane@example.com", "is_verified": true},
                ],
            })))
            .mount(&server)
            .await;

        let config = config_for(&server, ProviderKind::OpenStax);
        let provider = configured_provider(&config, ProviderKind::OpenStax);

        let info = provider.get_user_info(&parts("/auth?code=os"), &[]).await.unwrap();
        assert_eq!(info.user.username, "d8cb1a16-6b79-4a6c-9d1c-0b8b56bd9c34");
        assert_eq!(info.user.email, "jane@example.com");
        assert_eq!(info.user.name, "Jane Doe");
    }
}
