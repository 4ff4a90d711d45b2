//! Google OAuth 2.0 client.

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::auth::provider::{
    AccessToken, Endpoint, ExternalIdentity, IdentityProvider, ProviderError,
};
use crate::auth::state::OAuthState;
use crate::config::OAuthConfig;

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// `oauth2/v2/userinfo` response.
#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    verified_email: bool,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

/// Authorization-code client for Google.
pub struct GoogleProvider {
    http: reqwest::Client,
    config: OAuthConfig,
}

impl GoogleProvider {
    pub fn new(config: OAuthConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .user_agent(concat!("trego-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::Config(e.to_string()))?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn name(&self) -> &'static str {
        "google"
    }

    fn authorization_url(&self, state: &OAuthState) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&self.config.auth_url)
            .map_err(|e| ProviderError::Config(format!("auth_url: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("access_type", "offline")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("state", state.as_str());
        Ok(url)
    }

    async fn exchange_code(&self, code: &str) -> Result<AccessToken, ProviderError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let response = self
            .http
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(Endpoint::Token, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                endpoint: Endpoint::Token,
                status: status.as_u16(),
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::from_reqwest(Endpoint::Token, e))?;
        if token.access_token.is_empty() {
            return Err(ProviderError::Malformed {
                endpoint: Endpoint::Token,
                message: "missing access_token".into(),
            });
        }

        tracing::debug!(
            token_type = token.token_type.as_deref().unwrap_or("unknown"),
            expires_in = token.expires_in,
            "Exchanged authorization code"
        );
        Ok(AccessToken::new(token.access_token))
    }

    async fn fetch_identity(&self, token: &AccessToken) -> Result<ExternalIdentity, ProviderError> {
        let response = self
            .http
            .get(&self.config.userinfo_url)
            .bearer_auth(token.secret())
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(Endpoint::UserInfo, e))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(ProviderError::Status {
                endpoint: Endpoint::UserInfo,
                status: status.as_u16(),
            });
        }

        let info: GoogleUserInfo = response
            .json()
            .await
            .map_err(|e| ProviderError::from_reqwest(Endpoint::UserInfo, e))?;

        let email = info
            .email
            .filter(|e| !e.is_empty())
            .ok_or_else(|| ProviderError::Malformed {
                endpoint: Endpoint::UserInfo,
                message: "missing email".into(),
            })?;

        Ok(ExternalIdentity {
            subject: info.id,
            name: info.name.unwrap_or_else(|| email.clone()),
            email,
            email_verified: info.verified_email,
            picture_url: info.picture,
        })
    }
}
