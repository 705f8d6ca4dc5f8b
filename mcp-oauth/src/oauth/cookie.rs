//! Token and session cookies for browser clients

use axum::http::{HeaderMap, HeaderValue, header};

use crate::error::ApiError;
use crate::oauth::models::TOKEN_LIFETIME_SECS;

/// Cookie carrying the access token for browser clients
pub const TOKEN_COOKIE_NAME: &str = "ekaya_jwt";

/// Cookie identifying the server side session
pub const SESSION_COOKIE_NAME: &str = "ekaya_session";

/// Attributes shared by every cookie this server sets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieSettings {
    /// Set the `Secure` attribute
    pub secure: bool,
    pub domain: Option<String>,
}

impl CookieSettings {
    /// `Set-Cookie` value holding an access token
    pub fn token_cookie(&self, token: &str) -> Result<HeaderValue, ApiError> {
        if token.is_empty() || !token.bytes().all(is_cookie_octet) {
            return Err(ApiError::Server(
                "access token is not a valid cookie value".to_string(),
            ));
        }
        self.render(token, TOKEN_LIFETIME_SECS as i64)
    }

    /// `Set-Cookie` value that expires the token cookie immediately
    pub fn cleared_token_cookie(&self) -> Result<HeaderValue, ApiError> {
        self.render("", 0)
    }

    fn render(&self, value: &str, max_age: i64) -> Result<HeaderValue, ApiError> {
        let mut cookie = format!(
            "{TOKEN_COOKIE_NAME}={value}; Path=/; Max-Age={max_age}; HttpOnly; SameSite=Strict"
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        if let Some(domain) = self.domain.as_deref().filter(|d| !d.is_empty()) {
            cookie.push_str("; Domain=");
            cookie.push_str(domain);
        }
        HeaderValue::from_str(&cookie)
            .map_err(|e| ApiError::Server(format!("invalid Set-Cookie header: {e}")))
    }
}

/// Read a cookie from the request `Cookie` headers
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"'))
        .filter(|value| !value.is_empty())
}

// RFC 6265 Section 4.1.1 cookie-octet
fn is_cookie_octet(b: u8) -> bool {
    matches!(b, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E)
}
