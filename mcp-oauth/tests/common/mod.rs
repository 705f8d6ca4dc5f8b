//! Shared fixtures for the HTTP integration tests
#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode},
};
use ekaya_mcp_oauth::{
    ExchangeError, ExchangeRequest, MemorySessionStore, OAuthConfig, OAuthState,
    StaticProjectLookup, TokenExchangeResult, TokenExchanger, oauth_router,
};
use serde_json::{Value, json};
use tower::util::ServiceExt; // for `oneshot`
use uuid::Uuid;

pub const DEFAULT_AUTH: &str = "https://auth.example.com";
pub const DEV_AUTH: &str = "http://localhost:5002";
pub const PROJECT: &str = "6089f231-1ccb-4ab8-bba1-7e7a03893939";
pub const ISSUED_TOKEN: &str = "eyJhbGciOiJSUzI1NiJ9.eyJzdWIiOiJ1c2VyIn0.c2ln";

/// What the fake exchanger answers
#[derive(Debug, Clone, Copy)]
pub enum Outcome {
    Issue,
    /// Issue a token the authorization server says lives this many seconds
    IssueExpiringIn(u64),
    RejectAuthUrl,
    Timeout,
}

/// Records every exchange and answers with a fixed outcome
pub struct FakeExchanger {
    outcome: Outcome,
    calls: Mutex<Vec<ExchangeRequest>>,
}

impl FakeExchanger {
    pub fn new(outcome: Outcome) -> Self {
        Self {
            outcome,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<ExchangeRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenExchanger for FakeExchanger {
    async fn exchange(&self, request: ExchangeRequest) -> Result<TokenExchangeResult, ExchangeError> {
        self.calls.lock().unwrap().push(request);
        match self.outcome {
            Outcome::Issue => Ok(TokenExchangeResult {
                access_token: ISSUED_TOKEN.to_string(),
                expires_in: 86400,
            }),
            Outcome::IssueExpiringIn(expires_in) => Ok(TokenExchangeResult {
                access_token: ISSUED_TOKEN.to_string(),
                expires_in,
            }),
            Outcome::RejectAuthUrl => Err(ExchangeError::InvalidAuthUrl),
            Outcome::Timeout => Err(ExchangeError::Timeout),
        }
    }
}

pub fn test_config() -> OAuthConfig {
    let auth_servers: BTreeMap<String, String> = [DEFAULT_AUTH, DEV_AUTH]
        .into_iter()
        .map(|base| (base.to_string(), format!("{base}/.well-known/jwks.json")))
        .collect();

    OAuthConfig {
        base_url: "http://localhost:3443".to_string(),
        auth_server_url: DEFAULT_AUTH.to_string(),
        auth_servers,
        projects: BTreeMap::from([(PROJECT.to_string(), format!("/projects/{PROJECT}"))]),
        ..Default::default()
    }
}

pub struct TestApp {
    pub router: Router,
    pub exchanger: Arc<FakeExchanger>,
    pub sessions: Arc<MemorySessionStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with(test_config(), Outcome::Issue)
    }

    pub fn with(config: OAuthConfig, outcome: Outcome) -> Self {
        let exchanger = Arc::new(FakeExchanger::new(outcome));
        let sessions = Arc::new(MemorySessionStore::new(Duration::from_secs(600)));
        let projects: HashMap<Uuid, String> = config.project_pages().unwrap();

        let state = OAuthState::new(
            config,
            exchanger.clone(),
            sessions.clone(),
            Arc::new(StaticProjectLookup::new(projects)),
        );

        Self {
            router: oauth_router().with_state(state),
            exchanger,
            sessions,
        }
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub raw: Vec<u8>,
    pub json: Value,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap_or(json!({}));

    TestResponse {
        status,
        headers,
        raw: body.to_vec(),
        json,
    }
}

/// GET with `Host: localhost:3443` plus extra headers
pub async fn get(app: &Router, uri: &str, headers: &[(&str, &str)]) -> TestResponse {
    let mut builder = Request::builder().uri(uri).method("GET");
    if !headers.iter().any(|(k, _)| k.eq_ignore_ascii_case("host")) {
        builder = builder.header("host", "localhost:3443");
    }
    for (k, v) in headers {
        builder = builder.header(*k, *v);
    }
    send(app, builder.body(Body::empty()).unwrap()).await
}

pub async fn post_json(
    app: &Router,
    uri: &str,
    body: Value,
    headers: &[(&str, &str)],
) -> TestResponse {
    let mut builder = Request::builder()
        .uri(uri)
        .method("POST")
        .header("host", "localhost:3443")
        .header("content-type", "application/json");
    for (k, v) in headers {
        builder = builder.header(*k, *v);
    }
    send(
        app,
        builder
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
    )
    .await
}

pub async fn post_form(app: &Router, uri: &str, params: &[(&str, &str)]) -> TestResponse {
    let body = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let request = Request::builder()
        .uri(uri)
        .method("POST")
        .header("host", "localhost:3443")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

pub async fn post_empty(app: &Router, uri: &str) -> TestResponse {
    let request = Request::builder()
        .uri(uri)
        .method("POST")
        .header("host", "localhost:3443")
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}
