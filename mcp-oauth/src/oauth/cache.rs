//! Cache-Control policy for discovery documents

use axum::http::HeaderValue;

pub const PUBLIC_MAX_AGE: &str = "public, max-age=3600";
pub const PRIVATE_NO_CACHE: &str = "private, no-cache";

/// Only the unparameterized default document may be cached by intermediaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheDirective {
    Public,
    Private,
}

impl CacheDirective {
    /// Pick the directive from the caller-variable inputs that shaped a response
    pub fn for_inputs(had_custom_auth_url: bool, had_project_id: bool, had_path_suffix: bool) -> Self {
        if had_custom_auth_url || had_project_id || had_path_suffix {
            CacheDirective::Private
        } else {
            CacheDirective::Public
        }
    }

    /// Header text for this directive
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheDirective::Public => PUBLIC_MAX_AGE,
            CacheDirective::Private => PRIVATE_NO_CACHE,
        }
    }

    pub fn header_value(&self) -> HeaderValue {
        HeaderValue::from_static(self.as_str())
    }
}
