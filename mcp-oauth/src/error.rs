//! Error types for the discovery and token exchange endpoints
//!
//! Every handler error renders the RFC 6749 Section 5.2 body shape
//! `{"error": ..., "error_description": ...}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// Error response body (RFC 6749 Section 5.2)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthErrorBody {
    pub error: String,
    pub error_description: String,
}

/// Errors surfaced to HTTP clients
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Malformed or missing body, form or query fields
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Browser completion request without `code`, `state` or `code_verifier`
    #[error("missing required parameters")]
    MissingParameters,

    /// Caller-supplied authorization server is not whitelisted.
    ///
    /// Carries no detail so malformed and unlisted URLs are indistinguishable.
    #[error("invalid auth_url")]
    InvalidAuthUrl,

    #[error("unsupported grant type: {0}")]
    UnsupportedGrantType(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Deployment misconfiguration or unexpected upstream failure.
    ///
    /// The message is logged, never sent to the client.
    #[error("server error: {0}")]
    Server(String),
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_)
            | ApiError::MissingParameters
            | ApiError::InvalidAuthUrl
            | ApiError::UnsupportedGrantType(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::InvalidRequest(_) => "invalid_request",
            ApiError::MissingParameters => "missing_parameters",
            ApiError::InvalidAuthUrl => "invalid_auth_url",
            ApiError::UnsupportedGrantType(_) => "unsupported_grant_type",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Server(_) => "server_error",
        }
    }

    /// Client facing description
    pub fn error_description(&self) -> String {
        match self {
            ApiError::InvalidRequest(msg) => msg.clone(),
            ApiError::MissingParameters => {
                "code, state and code_verifier are required".to_string()
            }
            ApiError::InvalidAuthUrl => {
                "auth_url is not an allowed authorization server".to_string()
            }
            ApiError::UnsupportedGrantType(grant_type) => {
                format!("grant_type '{}' is not supported", grant_type)
            }
            ApiError::Unauthorized(msg) => msg.clone(),
            ApiError::Server(_) => "An internal error occurred".to_string(),
        }
    }

    /// RFC 6749 Section 5.2 style JSON body
    pub fn body(&self) -> OAuthErrorBody {
        OAuthErrorBody {
            error: self.error_code().to_string(),
            error_description: self.error_description(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Server(ref detail) = self {
            error!(detail = %detail, "request failed with server error");
        }
        (self.status(), Json(self.body())).into_response()
    }
}
