//! Per-request resolution shared by both discovery endpoints

use axum::{
    Json,
    http::{HeaderMap, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::debug;

use crate::error::ApiError;
use crate::oauth::OAuthState;
use crate::oauth::cache::CacheDirective;
use crate::oauth::models::DiscoveryQuery;
use crate::oauth::resource_path::{ProjectScope, ResourcePath};
use crate::oauth::url_builder::base_url;
use crate::validation::{require_configured, validate_auth_url};

/// Everything a discovery document depends on for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDiscoveryRequest {
    /// Whitelisted authorization server base URL
    pub auth_server_base: String,
    pub project: Option<ProjectScope>,
    /// `scheme://host` of this server as seen by the caller
    pub request_base_url: String,
    /// Wildcard path segments after the well-known prefix
    pub resource_segments: Vec<String>,
    pub is_default_auth_server: bool,
    pub is_project_scoped: bool,
}

impl ResolvedDiscoveryRequest {
    /// Validate caller input and resolve the authorization server.
    ///
    /// Caller mistakes surface as 400 errors; only an empty configured
    /// authorization server is a 500.
    ///
    /// # Errors
    ///
    /// - [`ApiError::InvalidRequest`] for a malformed path suffix or Host
    /// - [`ApiError::InvalidAuthUrl`] for a non-whitelisted `auth_url`
    /// - [`ApiError::Server`] when no authorization server is configured
    pub fn resolve(
        state: &OAuthState,
        headers: &HeaderMap,
        uri: &Uri,
        query: &DiscoveryQuery,
        wildcard_suffix: &str,
        client_addr: &str,
    ) -> Result<Self, ApiError> {
        let path = ResourcePath::parse(query.project_id.as_deref(), wildcard_suffix)?;

        let requested = query.auth_url.as_deref().unwrap_or_default();
        let auth_server_base = require_configured(validate_auth_url(
            requested,
            &state.config.auth_server_url,
            &state.registry,
            client_addr,
        )?)?;

        let request_base_url = base_url(headers, uri, state.config.tls_enabled)?;

        let resolved = Self {
            auth_server_base: auth_server_base.to_string(),
            is_default_auth_server: requested.is_empty(),
            is_project_scoped: path.project.is_some(),
            project: path.project,
            request_base_url,
            resource_segments: path.segments,
        };
        debug!(
            auth_server = %resolved.auth_server_base,
            project_scoped = resolved.is_project_scoped,
            "resolved discovery request"
        );
        Ok(resolved)
    }

    pub fn has_suffix(&self) -> bool {
        !self.resource_segments.is_empty()
    }
}

/// Serialize a discovery document with its Cache-Control header
pub(crate) fn discovery_response<T: Serialize>(directive: CacheDirective, document: T) -> Response {
    (
        StatusCode::OK,
        [(header::CACHE_CONTROL, directive.header_value())],
        Json(document),
    )
        .into_response()
}

/// Render a discovery failure. Error bodies depend on the caller's input, so
/// they are never shared between callers.
pub(crate) fn discovery_error(err: ApiError) -> Response {
    let mut response = err.into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, CacheDirective::Private.header_value());
    response
}
