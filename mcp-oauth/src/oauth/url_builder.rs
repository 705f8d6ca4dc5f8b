//! Externally visible URLs for this server and safe path joining

use std::net::IpAddr;

use axum::http::{HeaderMap, Uri, header};
use thiserror::Error;
use url::Url;

use crate::error::ApiError;

/// Header set by a trusted TLS-terminating reverse proxy
pub const FORWARDED_PROTO_HEADER: &str = "x-forwarded-proto";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlBuildError {
    #[error("invalid base url '{0}'")]
    InvalidBase(String),

    #[error("base url '{0}' cannot carry path segments")]
    CannotBeABase(String),

    #[error("empty path segment while joining onto '{0}'")]
    EmptySegment(String),

    #[error("dot path segment while joining onto '{0}'")]
    DotSegment(String),
}

impl From<UrlBuildError> for ApiError {
    fn from(err: UrlBuildError) -> Self {
        ApiError::Server(err.to_string())
    }
}

/// Derive `scheme://host[:port]` for the inbound request.
///
/// The scheme is `https` when this process terminates TLS or a proxy sent
/// `X-Forwarded-Proto: https`, otherwise `http`. The host comes from the
/// `Host` header, falling back to the request URI authority.
///
/// # Errors
///
/// Returns [`ApiError::InvalidRequest`] when no usable host is present or the
/// host would alter the URL structure (userinfo, path, query).
pub fn base_url(headers: &HeaderMap, uri: &Uri, tls_enabled: bool) -> Result<String, ApiError> {
    let scheme = if tls_enabled || forwarded_https(headers) {
        "https"
    } else {
        "http"
    };

    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .or_else(|| uri.authority().map(|authority| authority.as_str()))
        .ok_or_else(|| ApiError::InvalidRequest("missing Host header".to_string()))?;

    let parsed = Url::parse(&format!("{}://{}", scheme, host))
        .map_err(|_| ApiError::InvalidRequest("invalid Host header".to_string()))?;

    let well_formed = parsed.host_str().is_some()
        && parsed.username().is_empty()
        && parsed.password().is_none()
        && parsed.path() == "/"
        && parsed.query().is_none()
        && parsed.fragment().is_none();
    if !well_formed {
        return Err(ApiError::InvalidRequest("invalid Host header".to_string()));
    }

    Ok(parsed.origin().ascii_serialization())
}

fn forwarded_https(headers: &HeaderMap) -> bool {
    headers
        .get(FORWARDED_PROTO_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"))
}

/// Append path segments to `base`.
///
/// Each segment becomes exactly one path segment; characters such as `/`, `?`
/// and `%` inside a segment are percent-encoded. A trailing slash on the base
/// does not produce a double slash.
///
/// # Errors
///
/// Fails on an unparsable base, empty segments and `.`/`..` segments instead
/// of producing a URL that differs from the one requested.
pub fn join_path(base: &str, segments: &[&str]) -> Result<String, UrlBuildError> {
    let mut url = Url::parse(base).map_err(|_| UrlBuildError::InvalidBase(base.to_string()))?;

    for segment in segments {
        if segment.is_empty() {
            return Err(UrlBuildError::EmptySegment(base.to_string()));
        }
        if *segment == "." || *segment == ".." {
            return Err(UrlBuildError::DotSegment(base.to_string()));
        }
    }

    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| UrlBuildError::CannotBeABase(base.to_string()))?;
        path.pop_if_empty();
        path.extend(segments);
    }

    Ok(url.into())
}

/// Add a single query parameter to an already built URL
pub fn with_query_param(url: &str, key: &str, value: &str) -> Result<String, UrlBuildError> {
    let mut parsed = Url::parse(url).map_err(|_| UrlBuildError::InvalidBase(url.to_string()))?;
    parsed.query_pairs_mut().append_pair(key, value);
    Ok(parsed.into())
}

/// Whether `host` names the local machine
pub fn is_loopback_host(host: &str) -> bool {
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    host.parse::<IpAddr>().is_ok_and(|ip| ip.is_loopback())
}

/// Whether a deployment reached through `base_url` is served over real HTTPS.
///
/// Plain HTTP and loopback hosts count as development deployments. Anything
/// unparsable is treated as secure.
pub fn is_secure_deployment(base_url: &str) -> bool {
    match Url::parse(base_url) {
        Ok(url) => {
            url.scheme() == "https" && !url.host_str().is_some_and(is_loopback_host)
        }
        Err(_) => true,
    }
}
