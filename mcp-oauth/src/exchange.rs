//! Authorization code exchange against an external authorization server
//!
//! Handlers only see the [`TokenExchanger`] trait. [`HttpTokenExchanger`] is
//! the production implementation: an RFC 6749 Section 4.1.3 form POST to
//! `{auth_url}/token` with the PKCE verifier.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::oauth::models::{GRANT_TYPE_AUTHORIZATION_CODE, TOKEN_LIFETIME_SECS};
use crate::oauth::url_builder::{UrlBuildError, join_path};
use crate::validation::AuthServerRegistry;

/// Inputs for one code exchange. `auth_url` is already resolved and
/// whitelisted by the caller.
#[derive(Clone)]
pub struct ExchangeRequest {
    pub code: String,
    pub code_verifier: String,
    pub redirect_uri: String,
    pub client_id: String,
    pub auth_url: String,
}

impl fmt::Debug for ExchangeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeRequest")
            .field("code", &"<redacted>")
            .field("code_verifier", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .field("client_id", &self.client_id)
            .field("auth_url", &self.auth_url)
            .finish()
    }
}

/// Issued credential
#[derive(Clone, PartialEq, Eq)]
pub struct TokenExchangeResult {
    pub access_token: String,
    pub expires_in: u64,
}

impl fmt::Debug for TokenExchangeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenExchangeResult")
            .field("access_token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ExchangeError {
    /// The authorization server is not trusted by the exchanger
    #[error("authorization server is not allowed")]
    InvalidAuthUrl,

    #[error("no authorization server configured")]
    NotConfigured,

    #[error("token request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("token request timed out")]
    Timeout,

    #[error("token endpoint returned {status}: {body}")]
    Upstream { status: StatusCode, body: String },

    #[error("malformed token response: {0}")]
    Malformed(String),

    #[error(transparent)]
    Url(#[from] UrlBuildError),
}

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExchangeError::Timeout
        } else {
            ExchangeError::Transport(err)
        }
    }
}

/// Exchanges an authorization code and PKCE verifier for an access token
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    async fn exchange(&self, request: ExchangeRequest) -> Result<TokenExchangeResult, ExchangeError>;
}

#[derive(Deserialize)]
struct UpstreamTokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// `reqwest` backed exchanger
#[derive(Debug, Clone)]
pub struct HttpTokenExchanger {
    http: reqwest::Client,
    registry: Arc<AuthServerRegistry>,
}

impl HttpTokenExchanger {
    pub fn new(registry: Arc<AuthServerRegistry>, timeout: Duration) -> Result<Self, ExchangeError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(ExchangeError::Transport)?;
        Ok(Self { http, registry })
    }
}

#[async_trait]
impl TokenExchanger for HttpTokenExchanger {
    async fn exchange(&self, request: ExchangeRequest) -> Result<TokenExchangeResult, ExchangeError> {
        if request.auth_url.is_empty() {
            return Err(ExchangeError::NotConfigured);
        }
        if !self.registry.is_allowed(&request.auth_url) {
            return Err(ExchangeError::InvalidAuthUrl);
        }

        let token_endpoint = join_path(&request.auth_url, &["token"])?;

        let mut params: HashMap<&str, &str> = HashMap::new();
        params.insert("grant_type", GRANT_TYPE_AUTHORIZATION_CODE);
        params.insert("code", &request.code);
        params.insert("redirect_uri", &request.redirect_uri);
        params.insert("client_id", &request.client_id);
        params.insert("code_verifier", &request.code_verifier);

        debug!(token_endpoint = %token_endpoint, client_id = %request.client_id, "exchanging authorization code");

        let resp = self.http.post(&token_endpoint).form(&params).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ExchangeError::Upstream { status, body });
        }

        let raw: UpstreamTokenResponse = resp
            .json()
            .await
            .map_err(|e| ExchangeError::Malformed(e.to_string()))?;

        if raw.access_token.is_empty() {
            return Err(ExchangeError::Malformed("empty access_token".to_string()));
        }

        Ok(TokenExchangeResult {
            access_token: raw.access_token,
            expires_in: raw.expires_in.unwrap_or(TOKEN_LIFETIME_SECS),
        })
    }
}
