//! RFC 9728: OAuth 2.0 Protected Resource Metadata
//!
//! Endpoints:
//! - GET /.well-known/oauth-protected-resource
//! - GET /.well-known/oauth-protected-resource/{path...}
//!
//! For a project scoped resource, `authorization_servers[0]` is
//! `{base}/mcp/{project}`. Per RFC 8414 Section 3.1 a client inserts
//! `/.well-known/oauth-authorization-server` between host and path, which
//! lands on the path variant of the authorization server endpoint for the
//! same project.

use std::net::SocketAddr;

use axum::{
    extract::{
        ConnectInfo, Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
    http::{HeaderMap, Uri},
    response::Response,
};

use crate::error::ApiError;
use crate::oauth::cache::CacheDirective;
use crate::oauth::discovery::{ResolvedDiscoveryRequest, discovery_error, discovery_response};
use crate::oauth::models::{DiscoveryQuery, ProtectedResourceMetadata, SCOPE_PROJECT_ACCESS};
use crate::oauth::resource_path::{MCP_PATH_PREFIX, ProjectScope};
use crate::oauth::url_builder::{UrlBuildError, join_path};
use crate::oauth::{OAuthState, client_addr};

/// Build the RFC 9728 document for this server.
///
/// # Errors
///
/// Returns [`UrlBuildError`] when the request base URL cannot be joined.
pub fn compose_protected_resource_metadata(
    request_base_url: &str,
    resource_segments: &[String],
    project: Option<&ProjectScope>,
) -> Result<ProtectedResourceMetadata, UrlBuildError> {
    let resource = if resource_segments.is_empty() {
        request_base_url.to_string()
    } else {
        let segments: Vec<&str> = resource_segments.iter().map(String::as_str).collect();
        join_path(request_base_url, &segments)?
    };

    let authorization_server = match project {
        Some(project) => {
            let project_id = project.to_string();
            join_path(request_base_url, &[MCP_PATH_PREFIX, project_id.as_str()])?
        }
        None => request_base_url.to_string(),
    };

    Ok(ProtectedResourceMetadata {
        resource,
        authorization_servers: vec![authorization_server],
        bearer_methods_supported: vec!["header".to_string()],
        scopes_supported: vec![SCOPE_PROJECT_ACCESS.to_string()],
    })
}

/// GET /.well-known/oauth-protected-resource
pub async fn protected_resource_metadata(
    State(state): State<OAuthState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    uri: Uri,
    query: Result<Query<DiscoveryQuery>, QueryRejection>,
) -> Response {
    let client = client_addr(&headers, connect_info.as_ref());
    query
        .map_err(|e| ApiError::InvalidRequest(e.body_text()))
        .and_then(|Query(query)| serve(&state, &headers, &uri, &query, "", &client))
        .unwrap_or_else(discovery_error)
}

/// GET /.well-known/oauth-protected-resource/{path...}
pub async fn protected_resource_metadata_for_path(
    State(state): State<OAuthState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    uri: Uri,
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<DiscoveryQuery>, QueryRejection>,
) -> Response {
    let client = client_addr(&headers, connect_info.as_ref());
    let result = path
        .map_err(|e| ApiError::InvalidRequest(e.body_text()))
        .and_then(|Path(suffix)| {
            let Query(query) = query.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
            serve(&state, &headers, &uri, &query, &suffix, &client)
        });
    result.unwrap_or_else(discovery_error)
}

fn serve(
    state: &OAuthState,
    headers: &HeaderMap,
    uri: &Uri,
    query: &DiscoveryQuery,
    suffix: &str,
    client: &str,
) -> Result<Response, ApiError> {
    // Resolving the authorization server here surfaces an unconfigured
    // deployment as a 500 even though the document only names this server.
    let resolved = ResolvedDiscoveryRequest::resolve(state, headers, uri, query, suffix, client)?;

    let metadata = compose_protected_resource_metadata(
        &resolved.request_base_url,
        &resolved.resource_segments,
        resolved.project.as_ref(),
    )?;

    let directive = CacheDirective::for_inputs(
        !resolved.is_default_auth_server,
        resolved.is_project_scoped,
        resolved.has_suffix(),
    );
    Ok(discovery_response(directive, metadata))
}
