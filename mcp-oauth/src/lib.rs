//! # Ekaya MCP OAuth
//!
//! OAuth 2.0 discovery and token exchange for a multi-tenant MCP resource
//! server. One deployment trusts several authorization servers; callers pick
//! one per request and anything outside the whitelist is refused.
//!
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::new_without_default)]
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use ekaya_mcp_oauth::{
//!     HttpTokenExchanger, MemorySessionStore, OAuthConfig, OAuthState, StaticProjectLookup,
//!     oauth_router,
//! };
//!
//! let config = OAuthConfig::from_file("ekaya-oauth.toml")?;
//! config.validate()?;
//!
//! let exchanger = HttpTokenExchanger::new(
//!     Arc::new(config.registry()),
//!     Duration::from_secs(config.exchange_timeout_secs),
//! )?;
//! let sessions = MemorySessionStore::new(Duration::from_secs(config.pending_session_ttl_secs));
//! let projects = StaticProjectLookup::new(config.project_pages()?);
//!
//! let state = OAuthState::new(config, Arc::new(exchanger), Arc::new(sessions), Arc::new(projects));
//! let app = oauth_router().with_state(state);
//! ```
//!
//! ## Endpoints
//!
//! | Method | Path | |
//! |---|---|---|
//! | GET | `/.well-known/oauth-authorization-server[/{path}]` | RFC 8414 |
//! | GET | `/.well-known/oauth-protected-resource[/{path}]` | RFC 9728 |
//! | POST | `/api/auth/complete-oauth` | browser completion, sets `ekaya_jwt` |
//! | POST | `/mcp/oauth/token` | programmatic exchange |
//! | POST | `/api/projects/{pid}/auth/logout` | clears `ekaya_jwt` |

pub mod config;
pub mod error;
pub mod exchange;
pub mod oauth;
pub mod projects;
pub mod session;
pub mod validation;

pub use config::{ConfigError, OAuthConfig};
pub use error::{ApiError, OAuthErrorBody};
pub use exchange::{
    ExchangeError, ExchangeRequest, HttpTokenExchanger, TokenExchangeResult, TokenExchanger,
};
pub use oauth::{BearerCredential, OAuthState, oauth_router};
pub use projects::{ProjectLookup, ProjectLookupError, StaticProjectLookup};
pub use session::{MemorySessionStore, PendingAuthorization, Session, SessionError, SessionStore};
pub use validation::{AuthServerRegistry, require_configured, validate_auth_url};
