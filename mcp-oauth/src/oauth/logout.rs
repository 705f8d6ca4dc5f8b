//! Project logout

use axum::{
    Json,
    extract::{Path, State, rejection::PathRejection},
    http::header,
    response::{IntoResponse, Response},
};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::oauth::OAuthState;
use crate::oauth::models::AuthRedirectResponse;

/// POST /api/projects/{pid}/auth/logout
///
/// Always succeeds: the token cookie is cleared and the browser is pointed at
/// the project page, or `/` when the project cannot be resolved.
pub async fn logout(
    State(state): State<OAuthState>,
    pid: Result<Path<String>, PathRejection>,
) -> Response {
    let pid = pid.map(|Path(pid)| pid).unwrap_or_default();
    let redirect_url = match Uuid::parse_str(&pid) {
        Ok(project_id) => match state.projects.page_url(project_id).await {
            Ok(url) => url,
            Err(e) => {
                warn!(project_id = %project_id, error = %e, "project lookup failed during logout");
                "/".to_string()
            }
        },
        Err(_) => {
            debug!(project_id = %pid, "logout with malformed project id");
            "/".to_string()
        }
    };

    let body = Json(AuthRedirectResponse::to(redirect_url));
    match state.cookie_settings().cleared_token_cookie() {
        Ok(cookie) => ([(header::SET_COOKIE, cookie)], body).into_response(),
        Err(e) => {
            error!(error = %e, "failed to build logout cookie");
            body.into_response()
        }
    }
}
