//! Cross-provider `OAuth2` machinery
//!
//! The registry hands the same `CommonClient` to whichever adapter it builds.
//! The bootstrap configures it once, after the adapter's own `configure()`,
//! because the `OAuth2` client is built from the adapter's resolved endpoints.

use std::collections::HashMap;
use std::time::Duration;

use once_cell::sync::OnceCell;
use oauth2::basic::{
    BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
    BasicTokenType,
};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
    ExtraTokenFields, RedirectUrl, StandardRevocableToken, StandardTokenResponse, TokenResponse,
    TokenUrl,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::{claims, AuthCodeOption, CustomClaims, Provider, ProviderTokens};
use crate::config::{Config, OAuthConfig};
use crate::{Error, Result};

/// Token endpoint fields beyond the `OAuth2` basics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdTokenFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}

impl ExtraTokenFields for IdTokenFields {}

pub type GatewayTokenResponse = StandardTokenResponse<IdTokenFields, BasicTokenType>;

/// `OAuth2` client with authorization and token endpoints set
type OAuthClient = oauth2::Client<
    BasicErrorResponse,
    GatewayTokenResponse,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

struct CommonState {
    http: reqwest::Client,
    oauth: Option<OAuthClient>,
    client_id: String,
    callback_url: String,
    claim_names: Vec<String>,
}

/// Shared HTTP transport and code-exchange helpers
#[derive(Default)]
pub struct CommonClient {
    state: OnceCell<CommonState>,
}

impl std::fmt::Debug for CommonClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommonClient")
            .field("configured", &self.is_configured())
            .finish()
    }
}

impl CommonClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the shared transport for the already-configured `provider`.
    ///
    /// Repeated calls within one bootstrap keep the first result.
    pub fn configure(&self, config: &Config, provider: &dyn Provider) -> Result<()> {
        let kind = provider.kind();
        let endpoints = provider.endpoints().ok_or(Error::NotConfigured(kind))?;

        self.state.get_or_try_init(|| {
            let http = build_http_client(&config.oauth)?;
            let oauth = endpoints
                .token_url
                .as_deref()
                .map(|token_url| build_oauth_client(&config.oauth, &endpoints.auth_url, token_url))
                .transpose()?;

            info!(
                provider = %kind,
                auth_url = %endpoints.auth_url,
                token_url = endpoints.token_url.as_deref().unwrap_or("-"),
                "Shared provider transport configured"
            );

            Ok::<_, Error>(CommonState {
                http,
                oauth,
                client_id: config.oauth.client_id.clone(),
                callback_url: config.oauth.callback_url.clone(),
                claim_names: config.headers.claims.clone(),
            })
        })?;

        Ok(())
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.state.get().is_some()
    }

    fn state(&self) -> Result<&CommonState> {
        self.state
            .get()
            .ok_or_else(|| Error::Internal("shared provider transport not configured".to_string()))
    }

    /// Shared HTTP client (timeouts and user agent applied)
    pub fn http(&self) -> Result<&reqwest::Client> {
        Ok(&self.state()?.http)
    }

    pub fn client_id(&self) -> Result<&str> {
        Ok(&self.state()?.client_id)
    }

    pub fn callback_url(&self) -> Result<&str> {
        Ok(&self.state()?.callback_url)
    }

    /// Redeem the request's authorization code at the token endpoint.
    ///
    /// `keep_id_token` controls whether the `id_token` (if any) is reported
    /// in the returned provider tokens.
    pub async fn prepare_tokens(
        &self,
        request: &http::request::Parts,
        keep_id_token: bool,
        opts: &[AuthCodeOption],
    ) -> Result<ProviderTokens> {
        let state = self.state()?;
        let oauth = state
            .oauth
            .as_ref()
            .ok_or_else(|| Error::TokenExchange("provider has no token endpoint".to_string()))?;
        let code = authorization_code(request)?;

        let mut exchange = oauth.exchange_code(AuthorizationCode::new(code));
        for opt in opts {
            exchange = exchange.add_extra_param(opt.key.clone(), opt.value.clone());
        }

        let token = exchange
            .request_async(&state.http)
            .await
            .map_err(|e| Error::TokenExchange(e.to_string()))?;

        debug!(id_token = token.extra_fields().id_token.is_some(), "Authorization code redeemed");

        Ok(ProviderTokens {
            access_token: token.access_token().secret().clone(),
            id_token: if keep_id_token {
                token.extra_fields().id_token.clone()
            } else {
                None
            },
        })
    }

    /// GET a JSON document with the provider access token as bearer.
    pub async fn fetch_json(
        &self,
        url: &str,
        access_token: &str,
        headers: &[(&str, &str)],
    ) -> Result<Value> {
        let mut request = self.http()?.get(url).bearer_auth(access_token);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| Error::UserInfo(format!("Failed to fetch user info: {e}")))?
            .error_for_status()
            .map_err(|e| Error::UserInfo(format!("Provider API error: {e}")))?;

        resp.json()
            .await
            .map_err(|e| Error::UserInfo(format!("Failed to parse user info: {e}")))
    }

    /// Custom claims listed under `headers.claims`
    pub fn map_claims(&self, raw: &Value) -> Result<CustomClaims> {
        Ok(claims::map_claims(raw, &self.state()?.claim_names))
    }
}

/// Pull the `code` query parameter off the callback request.
pub fn authorization_code(request: &http::request::Parts) -> Result<String> {
    let query = request.uri.query().unwrap_or_default();
    let params: HashMap<_, _> = url::form_urlencoded::parse(query.as_bytes()).collect();
    params
        .get("code")
        .filter(|code| !code.is_empty())
        .map(|code| code.to_string())
        .ok_or(Error::MissingCode)
}

fn build_http_client(config: &OAuthConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .user_agent(concat!("authgate/", env!("CARGO_PKG_VERSION")))
        // token endpoints must not bounce credentials elsewhere
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))
}

fn build_oauth_client(config: &OAuthConfig, auth_url: &str, token_url: &str) -> Result<OAuthClient> {
    let auth_url = AuthUrl::new(auth_url.to_string())
        .map_err(|e| Error::Config(format!("Invalid oauth.auth_url: {e}")))?;
    let token_url = TokenUrl::new(token_url.to_string())
        .map_err(|e| Error::Config(format!("Invalid oauth.token_url: {e}")))?;
    let redirect_url = RedirectUrl::new(config.callback_url.clone())
        .map_err(|e| Error::Config(format!("Invalid oauth.callback_url: {e}")))?;

    let client: OAuthClient = oauth2::Client::new(ClientId::new(config.client_id.clone()))
        .set_auth_uri(auth_url)
        .set_token_uri(token_url)
        .set_redirect_uri(redirect_url);

    Ok(if config.client_secret.is_empty() {
        client
    } else {
        client.set_client_secret(ClientSecret::new(config.client_secret.clone()))
    })
}
