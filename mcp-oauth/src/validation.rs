//! Authorization server whitelist
//!
//! A deployment may trust several authorization servers. Callers can pick one
//! with the `auth_url` parameter, but only exact registry keys are accepted.

use std::collections::BTreeMap;

use tracing::warn;

use crate::error::ApiError;

/// Allowed authorization servers, keyed by base URL with the JWKS endpoint as
/// value. Built once at startup and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthServerRegistry {
    servers: BTreeMap<String, String>,
}

impl AuthServerRegistry {
    /// Registry keyed by authorization server base URL, valued by JWKS endpoint
    pub fn new(servers: BTreeMap<String, String>) -> Self {
        Self { servers }
    }

    /// Whether `auth_url` is an exact key of the registry
    pub fn is_allowed(&self, auth_url: &str) -> bool {
        self.servers.contains_key(auth_url)
    }

    pub fn jwks_endpoint(&self, auth_url: &str) -> Option<&str> {
        self.servers.get(auth_url).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.servers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for AuthServerRegistry {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Resolve the authorization server for a request.
///
/// An empty `requested` value selects `configured_default`, which may itself be
/// empty; callers treat that as a configuration error. Any other value must be
/// an exact registry key. Rejections are audit-logged with the caller address.
///
/// # Errors
///
/// Returns [`ApiError::InvalidAuthUrl`] for every value that is not a registry
/// key, whether malformed or merely unlisted.
pub fn validate_auth_url<'a>(
    requested: &'a str,
    configured_default: &'a str,
    registry: &AuthServerRegistry,
    client_addr: &str,
) -> Result<&'a str, ApiError> {
    if requested.is_empty() {
        return Ok(configured_default);
    }

    if registry.is_allowed(requested) {
        return Ok(requested);
    }

    warn!(
        target: "audit",
        event = "invalid_auth_url",
        auth_url = %requested,
        client_addr = %client_addr,
        "rejected authorization server not in whitelist"
    );
    Err(ApiError::InvalidAuthUrl)
}

/// Refuse an empty resolved authorization server before anything is derived
/// from it or sent to it.
///
/// # Errors
///
/// Returns [`ApiError::Server`] when `auth_server` is empty.
pub fn require_configured(auth_server: &str) -> Result<&str, ApiError> {
    if auth_server.is_empty() {
        return Err(ApiError::Server(
            "no default authorization server configured".to_string(),
        ));
    }
    Ok(auth_server)
}
