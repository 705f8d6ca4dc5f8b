//! Multi-tenant OAuth discovery and token exchange
//!
//! - RFC 8414: Authorization Server Metadata, resolved per request from a
//!   whitelist of authorization servers
//! - RFC 9728: Protected Resource Metadata with project scoped chaining
//! - RFC 6749 Section 4.1.3 + RFC 7636: authorization code exchange with PKCE,
//!   for browsers (httpOnly cookie) and programmatic clients (JSON body)

pub mod bearer;
pub mod cache;
pub mod complete;
pub mod cookie;
pub mod discovery;
pub mod logout;
pub mod metadata;
pub mod models;
pub mod resource;
pub mod resource_path;
pub mod token;
pub mod url_builder;

pub use bearer::{BearerChallenge, BearerCredential, CredentialSource};
pub use complete::complete_oauth;
pub use logout::logout;
pub use metadata::{authorization_server_metadata, authorization_server_metadata_for_path};
pub use resource::{protected_resource_metadata, protected_resource_metadata_for_path};
pub use token::token_endpoint;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::ConnectInfo,
    http::HeaderMap,
    routing::{get, post},
};

use crate::config::OAuthConfig;
use crate::exchange::TokenExchanger;
use crate::projects::ProjectLookup;
use crate::session::SessionStore;
use crate::validation::AuthServerRegistry;
use self::cookie::CookieSettings;
use self::url_builder::is_secure_deployment;

/// Shared, read-mostly state for every OAuth handler
#[derive(Clone)]
pub struct OAuthState {
    pub config: Arc<OAuthConfig>,
    pub registry: Arc<AuthServerRegistry>,
    pub exchanger: Arc<dyn TokenExchanger>,
    pub sessions: Arc<dyn SessionStore>,
    pub projects: Arc<dyn ProjectLookup>,
}

impl OAuthState {
    /// Build the state, deriving the registry from `config`
    pub fn new(
        config: OAuthConfig,
        exchanger: Arc<dyn TokenExchanger>,
        sessions: Arc<dyn SessionStore>,
        projects: Arc<dyn ProjectLookup>,
    ) -> Self {
        let registry = Arc::new(config.registry());
        Self {
            config: Arc::new(config),
            registry,
            exchanger,
            sessions,
            projects,
        }
    }

    /// Cookie attributes for this deployment. `Secure` is dropped for plain
    /// HTTP and loopback base URLs.
    pub fn cookie_settings(&self) -> CookieSettings {
        CookieSettings {
            secure: is_secure_deployment(&self.config.base_url),
            domain: self.config.cookie_domain.clone(),
        }
    }
}

/// Caller address for audit logs: first `X-Forwarded-For` hop, `X-Real-IP`,
/// then the socket peer
pub fn client_addr(headers: &HeaderMap, connect_info: Option<&ConnectInfo<SocketAddr>>) -> String {
    for header_name in ["x-forwarded-for", "x-real-ip"] {
        if let Some(value) = headers.get(header_name).and_then(|v| v.to_str().ok()) {
            let ip = value.split(',').next().unwrap_or(value).trim();
            if !ip.is_empty() {
                return ip.to_string();
            }
        }
    }

    connect_info
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Create the OAuth router with all discovery and exchange endpoints
pub fn oauth_router() -> Router<OAuthState> {
    Router::new()
        // RFC 8414: Authorization Server Metadata
        .route(
            "/.well-known/oauth-authorization-server",
            get(authorization_server_metadata),
        )
        .route(
            "/.well-known/oauth-authorization-server/*path",
            get(authorization_server_metadata_for_path),
        )
        // RFC 9728: Protected Resource Metadata
        .route(
            "/.well-known/oauth-protected-resource",
            get(protected_resource_metadata),
        )
        .route(
            "/.well-known/oauth-protected-resource/*path",
            get(protected_resource_metadata_for_path),
        )
        // Browser PKCE completion (cookie)
        .route("/api/auth/complete-oauth", post(complete_oauth))
        // Programmatic exchange (JSON)
        .route("/mcp/oauth/token", post(token_endpoint))
        .route("/api/projects/:pid/auth/logout", post(logout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_addr_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        let peer = ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 5555)));
        assert_eq!(client_addr(&headers, Some(&peer)), "203.0.113.7");
    }

    #[test]
    fn test_client_addr_falls_back_to_peer() {
        let peer = ConnectInfo(SocketAddr::from(([192, 168, 1, 2], 5555)));
        assert_eq!(client_addr(&HeaderMap::new(), Some(&peer)), "192.168.1.2");
        assert_eq!(client_addr(&HeaderMap::new(), None), "unknown");
    }
}
