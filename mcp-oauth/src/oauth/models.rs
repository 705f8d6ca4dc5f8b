//! Discovery documents and request/response bodies

use serde::{Deserialize, Serialize};

/// Scope granting access to one project
pub const SCOPE_PROJECT_ACCESS: &str = "project:access";

/// Lifetime of issued credentials, for both the cookie and `expires_in`
pub const TOKEN_LIFETIME_SECS: u64 = 86_400;

pub const GRANT_TYPE_AUTHORIZATION_CODE: &str = "authorization_code";

/// RFC 8414: Authorization Server Metadata
///
/// Only `authorization_endpoint` and `jwks_uri` point at the external
/// authorization server; token and registration requests go through this
/// server's `/mcp/oauth/*` routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationServerMetadata {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub registration_endpoint: String,
    pub jwks_uri: String,
    pub scopes_supported: Vec<String>,
    pub response_types_supported: Vec<String>,
    pub grant_types_supported: Vec<String>,
    pub code_challenge_methods_supported: Vec<String>,
    pub token_endpoint_auth_methods_supported: Vec<String>,
}

/// RFC 9728: Protected Resource Metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedResourceMetadata {
    pub resource: String,
    pub authorization_servers: Vec<String>,
    pub bearer_methods_supported: Vec<String>,
    pub scopes_supported: Vec<String>,
}

/// Query parameters accepted by the discovery endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscoveryQuery {
    pub auth_url: Option<String>,
    pub project_id: Option<String>,
}

/// Token request (RFC 6749 Section 4.1.3)
///
/// Every field is optional at the parsing layer so that each missing
/// parameter can be reported individually.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenRequest {
    pub grant_type: Option<String>,
    pub code: Option<String>,
    pub code_verifier: Option<String>,
    pub redirect_uri: Option<String>,
    pub client_id: Option<String>,
    pub auth_url: Option<String>,
}

/// Token response (RFC 6749 Section 5.1)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String, // Always "Bearer"
    pub expires_in: u64,
}

/// Browser PKCE completion body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CompleteOAuthRequest {
    pub code: String,
    pub state: String,
    pub code_verifier: String,
    pub auth_url: Option<String>,
    pub redirect_uri: Option<String>,
}

/// Body returned by browser completion and logout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRedirectResponse {
    pub success: bool,
    pub redirect_url: String,
}

impl AuthRedirectResponse {
    pub fn to(redirect_url: impl Into<String>) -> Self {
        Self {
            success: true,
            redirect_url: redirect_url.into(),
        }
    }
}
