//! RFC 8414: Authorization Server Metadata
//!
//! Endpoints:
//! - GET /.well-known/oauth-authorization-server
//! - GET /.well-known/oauth-authorization-server/{path...}
//!
//! The issuer is always a whitelisted authorization server. A project scope
//! (query or `mcp/{uuid}` path) is forwarded to the authorization UI through
//! `authorization_endpoint?project_id=...` so it can skip project selection.

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
use crate::oauth::models::{
    AuthorizationServerMetadata, DiscoveryQuery, GRANT_TYPE_AUTHORIZATION_CODE,
    SCOPE_PROJECT_ACCESS,
};
use crate::oauth::resource_path::ProjectScope;
use crate::oauth::url_builder::{UrlBuildError, join_path, with_query_param};
use crate::oauth::{OAuthState, client_addr};

/// Build the RFC 8414 document.
///
/// # Errors
///
/// Returns [`UrlBuildError`] when either base URL cannot be joined, which
/// indicates a configuration defect.
pub fn compose_authorization_server_metadata(
    auth_server_base: &str,
    request_base_url: &str,
    project: Option<&ProjectScope>,
) -> Result<AuthorizationServerMetadata, UrlBuildError> {
    let mut authorization_endpoint = join_path(auth_server_base, &["authorize"])?;
    if let Some(project) = project {
        authorization_endpoint =
            with_query_param(&authorization_endpoint, "project_id", &project.to_string())?;
    }

    Ok(AuthorizationServerMetadata {
        issuer: auth_server_base.to_string(),
        authorization_endpoint,
        token_endpoint: join_path(request_base_url, &["mcp", "oauth", "token"])?,
        registration_endpoint: join_path(request_base_url, &["mcp", "oauth", "register"])?,
        jwks_uri: join_path(auth_server_base, &[".well-known", "jwks.json"])?,
        scopes_supported: vec![SCOPE_PROJECT_ACCESS.to_string()],
        response_types_supported: vec!["code".to_string()],
        grant_types_supported: vec![GRANT_TYPE_AUTHORIZATION_CODE.to_string()],
        code_challenge_methods_supported: vec!["S256".to_string()],
        // Public clients only: PKCE replaces the client secret
        token_endpoint_auth_methods_supported: vec!["none".to_string()],
    })
}

/// GET /.well-known/oauth-authorization-server
pub async fn authorization_server_metadata(
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

/// GET /.well-known/oauth-authorization-server/{path...}
pub async fn authorization_server_metadata_for_path(
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
    let resolved = ResolvedDiscoveryRequest::resolve(state, headers, uri, query, suffix, client)?;

    let metadata = compose_authorization_server_metadata(
        &resolved.auth_server_base,
        &resolved.request_base_url,
        resolved.project.as_ref(),
    )?;

    let directive = CacheDirective::for_inputs(
        !resolved.is_default_auth_server,
        resolved.is_project_scoped,
        false,
    );
    Ok(discovery_response(directive, metadata))
}
