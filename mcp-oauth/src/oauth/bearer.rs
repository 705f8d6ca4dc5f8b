//! RFC 6750: Bearer credential extraction
//!
//! MCP and API clients present the token in the `Authorization` header;
//! browsers present the `ekaya_jwt` cookie. The header wins when both are
//! present. Token verification belongs to the resource handlers.

use std::fmt;

use axum::{
    Json,
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, HeaderValue, header, request::Parts},
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::oauth::OAuthState;
use crate::oauth::cookie::{TOKEN_COOKIE_NAME, read_cookie};
use crate::oauth::url_builder::{base_url, join_path};

/// Where the credential was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    AuthorizationHeader,
    Cookie,
}

/// Raw access token presented by the caller
#[derive(Clone, PartialEq, Eq)]
pub struct BearerCredential {
    pub token: String,
    pub source: CredentialSource,
}

impl fmt::Debug for BearerCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerCredential")
            .field("token", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

impl BearerCredential {
    /// Find the caller's credential, header first
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let from_header = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| {
                let (scheme, token) = value.trim().split_once(' ')?;
                scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
            })
            .filter(|token| !token.is_empty())
            .map(|token| BearerCredential {
                token: token.to_string(),
                source: CredentialSource::AuthorizationHeader,
            });

        from_header.or_else(|| {
            read_cookie(headers, TOKEN_COOKIE_NAME).map(|token| BearerCredential {
                token: token.to_string(),
                source: CredentialSource::Cookie,
            })
        })
    }
}

/// 401 challenge pointing the client at protected resource discovery
#[derive(Debug)]
pub struct BearerChallenge {
    pub resource_metadata: Option<String>,
}

impl BearerChallenge {
    /// `WWW-Authenticate` value per RFC 6750 Section 3 and RFC 9728 Section 5.1
    pub fn header_value(&self) -> HeaderValue {
        let mut value = "Bearer realm=\"mcp\"".to_string();
        if let Some(ref url) = self.resource_metadata {
            value.push_str(&format!(", resource_metadata=\"{}\"", url));
        }
        HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("Bearer realm=\"mcp\""))
    }
}

impl IntoResponse for BearerChallenge {
    fn into_response(self) -> Response {
        let error = ApiError::Unauthorized("No access token provided".to_string());
        (
            error.status(),
            [(header::WWW_AUTHENTICATE, self.header_value())],
            Json(error.body()),
        )
            .into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for BearerCredential
where
    OAuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = BearerChallenge;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(credential) = BearerCredential::from_headers(&parts.headers) {
            return Ok(credential);
        }

        let state = OAuthState::from_ref(state);
        let resource_metadata = base_url(&parts.headers, &parts.uri, state.config.tls_enabled)
            .ok()
            .and_then(|base| join_path(&base, &[".well-known", "oauth-protected-resource"]).ok());

        Err(BearerChallenge { resource_metadata })
    }
}
