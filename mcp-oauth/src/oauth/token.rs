//! Programmatic token endpoint
//!
//! MCP and API clients exchange their authorization code here and receive the
//! token in the JSON body. This endpoint never sets a cookie.

use std::net::SocketAddr;

use axum::{
    Form, Json,
    extract::{ConnectInfo, State, rejection::FormRejection},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{error, info};

use crate::error::ApiError;
use crate::exchange::{ExchangeError, ExchangeRequest};
use crate::oauth::models::{
    GRANT_TYPE_AUTHORIZATION_CODE, TOKEN_LIFETIME_SECS, TokenRequest, TokenResponse,
};
use crate::oauth::{OAuthState, client_addr};
use crate::validation::{require_configured, validate_auth_url};

/// POST /mcp/oauth/token
///
/// # Request (application/x-www-form-urlencoded)
/// ```text
/// grant_type=authorization_code
/// &code=...
/// &code_verifier=...
/// &redirect_uri=http://localhost:8080/callback
/// &client_id=...
/// &auth_url=https://auth.example.com   (optional)
/// ```
///
/// # Response
/// ```json
/// {
///   "access_token": "jwt_token_here",
///   "token_type": "Bearer",
///   "expires_in": 86400
/// }
/// ```
pub async fn token_endpoint(
    State(state): State<OAuthState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    form: Result<Form<TokenRequest>, FormRejection>,
) -> Result<Response, ApiError> {
    let Form(request) = form.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;

    let grant_type = required(request.grant_type.as_deref(), "grant_type")?;
    if grant_type != GRANT_TYPE_AUTHORIZATION_CODE {
        return Err(ApiError::UnsupportedGrantType(grant_type.to_string()));
    }

    let code = required(request.code.as_deref(), "code")?;
    let code_verifier = required(request.code_verifier.as_deref(), "code_verifier")?;
    let redirect_uri = required(request.redirect_uri.as_deref(), "redirect_uri")?;
    let client_id = required(request.client_id.as_deref(), "client_id")?;

    let client = client_addr(&headers, connect_info.as_ref());
    let auth_url = require_configured(validate_auth_url(
        request.auth_url.as_deref().unwrap_or_default(),
        &state.config.auth_server_url,
        &state.registry,
        &client,
    )?)?;

    let result = state
        .exchanger
        .exchange(ExchangeRequest {
            code: code.to_string(),
            code_verifier: code_verifier.to_string(),
            redirect_uri: redirect_uri.to_string(),
            client_id: client_id.to_string(),
            auth_url: auth_url.to_string(),
        })
        .await
        .map_err(|e| exchange_failure(e, auth_url))?;

    info!(client_id = %client_id, auth_server = %auth_url, "issued token via token endpoint");

    let body = TokenResponse {
        access_token: result.access_token,
        token_type: "Bearer".to_string(),
        expires_in: TOKEN_LIFETIME_SECS,
    };
    Ok((
        StatusCode::OK,
        [(header::CACHE_CONTROL, "no-store"), (header::PRAGMA, "no-cache")],
        Json(body),
    )
        .into_response())
}

fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, ApiError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::InvalidRequest(format!("{name} is required")))
}

/// Map an exchanger failure to the client facing error, logging the detail
pub(crate) fn exchange_failure(err: ExchangeError, auth_url: &str) -> ApiError {
    match err {
        ExchangeError::InvalidAuthUrl => ApiError::InvalidAuthUrl,
        other => {
            error!(error = %other, auth_server = %auth_url, "token exchange failed");
            ApiError::Server("token exchange failed".to_string())
        }
    }
}
