//! Browser session state for the authorization round trip
//!
//! Before sending a browser to the authorization server, the application
//! stashes the page the user was on. Completion consumes it exactly once.

pub mod session_store;

pub use session_store::{
    DEFAULT_REDIRECT, MemorySessionStore, ORIGINAL_URL_KEY, PendingAuthorization, Session,
    SessionError, SessionStore,
};
