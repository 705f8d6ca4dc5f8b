//! OAuth deployment configuration
//!
//! Loaded from a TOML file and then overridden by `EKAYA_*` environment
//! variables. The authorization server registry is built once from the
//! validated configuration and never changes afterwards.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::oauth::url_builder::is_loopback_host;
use crate::validation::AuthServerRegistry;

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "EKAYA_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid authorization server url '{url}': {reason}")]
    InvalidAuthServer { url: String, reason: String },

    #[error("default authorization server '{0}' is not in auth_servers")]
    DefaultNotRegistered(String),

    #[error("invalid base_url '{0}'")]
    InvalidBaseUrl(String),

    #[error("invalid project id '{0}' in projects table")]
    InvalidProjectId(String),

    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

/// OAuth discovery and token exchange configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthConfig {
    /// Public URL of this deployment
    pub base_url: String,
    /// Default authorization server used when a request names none
    pub auth_server_url: String,
    /// Whitelisted authorization servers: base URL to JWKS endpoint
    pub auth_servers: BTreeMap<String, String>,
    /// Client id used by the browser completion flow
    pub client_id: String,
    /// Domain attribute for the token cookie
    pub cookie_domain: Option<String>,
    /// Whether this process terminates TLS itself
    pub tls_enabled: bool,
    /// Timeout for calls to the authorization server token endpoint
    pub exchange_timeout_secs: u64,
    /// Lifetime of pending authorization sessions
    pub pending_session_ttl_secs: u64,
    pub bind_address: String,
    /// Static project id to project page URL table
    pub projects: BTreeMap<String, String>,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3443".to_string(),
            auth_server_url: String::new(),
            auth_servers: BTreeMap::new(),
            client_id: "ekaya-engine".to_string(),
            cookie_domain: None,
            tls_enabled: false,
            exchange_timeout_secs: 10,
            pending_session_ttl_secs: 600, // 10 minutes
            bind_address: "127.0.0.1:3443".to_string(),
            projects: BTreeMap::new(),
        }
    }
}

impl OAuthConfig {
    /// Load a TOML file and apply `EKAYA_*` overrides from the process environment
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&raw)?;
        config.apply_overrides_from(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Defaults plus `EKAYA_*` overrides, without a file
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_overrides_from(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply overrides from `lookup`, which maps full variable names to values.
    ///
    /// `EKAYA_AUTH_SERVER_URL` also registers the server when it is missing
    /// from the registry, with the conventional JWKS location.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(value) = var("BASE_URL") {
            self.base_url = value;
        }
        if let Some(value) = var("AUTH_SERVER_URL") {
            if !value.is_empty() && !self.auth_servers.contains_key(&value) {
                let jwks = format!("{}/.well-known/jwks.json", value.trim_end_matches('/'));
                self.auth_servers.insert(value.clone(), jwks);
            }
            self.auth_server_url = value;
        }
        if let Some(value) = var("CLIENT_ID") {
            self.client_id = value;
        }
        if let Some(value) = var("COOKIE_DOMAIN") {
            self.cookie_domain = Some(value).filter(|domain| !domain.is_empty());
        }
        if let Some(value) = var("BIND_ADDRESS") {
            self.bind_address = value;
        }
        if let Some(value) = var("TLS_ENABLED") {
            self.tls_enabled = value.parse().map_err(|_| ConfigError::InvalidValue {
                name: format!("{ENV_PREFIX}TLS_ENABLED"),
                reason: format!("expected true or false, got '{value}'"),
            })?;
        }
        Ok(())
    }

    /// Check the registry and the default authorization server.
    ///
    /// Registry keys and JWKS values must be absolute HTTPS URLs, or plain
    /// HTTP on a loopback host.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (base, jwks) in &self.auth_servers {
            check_server_url(base)?;
            check_server_url(jwks)?;
        }

        if !self.auth_server_url.is_empty() && !self.auth_servers.contains_key(&self.auth_server_url)
        {
            return Err(ConfigError::DefaultNotRegistered(
                self.auth_server_url.clone(),
            ));
        }

        match Url::parse(&self.base_url) {
            Ok(url) if url.has_host() && matches!(url.scheme(), "http" | "https") => {}
            _ => return Err(ConfigError::InvalidBaseUrl(self.base_url.clone())),
        }

        if self.exchange_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                name: "exchange_timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        self.project_pages().map(|_| ())
    }

    pub fn registry(&self) -> AuthServerRegistry {
        AuthServerRegistry::new(self.auth_servers.clone())
    }

    /// Parsed `projects` table
    pub fn project_pages(&self) -> Result<HashMap<Uuid, String>, ConfigError> {
        self.projects
            .iter()
            .map(|(id, page)| {
                Uuid::parse_str(id)
                    .map(|uuid| (uuid, page.clone()))
                    .map_err(|_| ConfigError::InvalidProjectId(id.clone()))
            })
            .collect()
    }
}

fn check_server_url(raw: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidAuthServer {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(raw).map_err(|_| invalid("not an absolute url"))?;
    let host = url.host_str().ok_or_else(|| invalid("missing host"))?;

    match url.scheme() {
        "https" => Ok(()),
        "http" if is_loopback_host(host) => Ok(()),
        "http" => Err(invalid("plain http is only allowed for loopback hosts")),
        _ => Err(invalid("scheme must be https")),
    }
}
