//! Browser PKCE completion
//!
//! The browser callback page posts the authorization code here. The token is
//! delivered only as an httpOnly cookie and the body carries the page to
//! return to.

use std::net::SocketAddr;

use axum::{
    Json,
    extract::{ConnectInfo, State, rejection::JsonRejection},
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::exchange::ExchangeRequest;
use crate::oauth::cookie::{SESSION_COOKIE_NAME, read_cookie};
use crate::oauth::models::{AuthRedirectResponse, CompleteOAuthRequest};
use crate::oauth::token::exchange_failure;
use crate::oauth::url_builder::join_path;
use crate::oauth::{OAuthState, client_addr};
use crate::session::{DEFAULT_REDIRECT, PendingAuthorization, SessionStore};
use crate::validation::{require_configured, validate_auth_url};

/// POST /api/auth/complete-oauth
///
/// # Request
/// ```json
/// {
///   "code": "authorization_code_here",
///   "state": "opaque_state",
///   "code_verifier": "pkce_verifier_here",
///   "auth_url": "https://auth.example.com",
///   "redirect_uri": "https://app.example.com/oauth/callback"
/// }
/// ```
///
/// `auth_url` and `redirect_uri` are optional.
pub async fn complete_oauth(
    State(state): State<OAuthState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Result<Json<CompleteOAuthRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;

    if request.code.is_empty() || request.state.is_empty() || request.code_verifier.is_empty() {
        return Err(ApiError::MissingParameters);
    }

    let client = client_addr(&headers, connect_info.as_ref());
    let auth_url = require_configured(validate_auth_url(
        request.auth_url.as_deref().unwrap_or_default(),
        &state.config.auth_server_url,
        &state.registry,
        &client,
    )?)?;

    let redirect_uri = match request.redirect_uri.filter(|uri| !uri.is_empty()) {
        Some(uri) => uri,
        None => join_path(&state.config.base_url, &["oauth", "callback"])?,
    };

    let result = state
        .exchanger
        .exchange(ExchangeRequest {
            code: request.code,
            code_verifier: request.code_verifier,
            redirect_uri,
            client_id: state.config.client_id.clone(),
            auth_url: auth_url.to_string(),
        })
        .await
        .map_err(|e| exchange_failure(e, auth_url))?;

    let cookie = state.cookie_settings().token_cookie(&result.access_token)?;
    let redirect_url = restore_original_url(state.sessions.as_ref(), &headers).await;

    info!(auth_server = %auth_url, client_addr = %client, "completed browser authorization");

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(AuthRedirectResponse::to(redirect_url)),
    )
        .into_response())
}

/// Consume the pending authorization session and return the stashed
/// pre-authorization URL. Session failures never fail the completion; the
/// browser is sent to `/` instead.
async fn restore_original_url(sessions: &dyn SessionStore, headers: &HeaderMap) -> String {
    let session_id = read_cookie(headers, SESSION_COOKIE_NAME);
    match sessions.consume(session_id).await {
        Ok(Some(mut session)) => PendingAuthorization::take_original_url(&mut session),
        Ok(None) => DEFAULT_REDIRECT.to_string(),
        Err(e) => {
            warn!(error = %e, "failed to consume pending authorization session");
            DEFAULT_REDIRECT.to_string()
        }
    }
}
