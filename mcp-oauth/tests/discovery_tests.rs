//! HTTP tests for the RFC 8414 and RFC 9728 discovery endpoints

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::*;
use ekaya_mcp_oauth::OAuthConfig;
use url::Url;

const AS_PATH: &str = "/.well-known/oauth-authorization-server";
const PR_PATH: &str = "/.well-known/oauth-protected-resource";

#[tokio::test]
async fn test_default_issuer_for_localhost() {
    let app = TestApp::new();
    let resp = get(&app.router, AS_PATH, &[]).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json["issuer"], DEFAULT_AUTH);
    assert_eq!(
        resp.json["authorization_endpoint"],
        "https://auth.example.com/authorize"
    );
    assert_eq!(
        resp.json["token_endpoint"],
        "http://localhost:3443/mcp/oauth/token"
    );
    assert_eq!(
        resp.json["registration_endpoint"],
        "http://localhost:3443/mcp/oauth/register"
    );
    assert_eq!(
        resp.json["jwks_uri"],
        "https://auth.example.com/.well-known/jwks.json"
    );
    assert_eq!(resp.json["code_challenge_methods_supported"][0], "S256");
    assert_eq!(resp.json["token_endpoint_auth_methods_supported"][0], "none");
    assert_eq!(resp.header("cache-control"), Some("public, max-age=3600"));
}

#[tokio::test]
async fn test_unlisted_auth_url_is_rejected() {
    let app = TestApp::new();

    let mut bodies = Vec::new();
    for auth_url in [
        "https%3A%2F%2Fevil.example.com",
        "https%3A%2F%2Fauth.example.com%2F",
        "not%20a%20url",
    ] {
        let resp = get(&app.router, &format!("{AS_PATH}?auth_url={auth_url}"), &[]).await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST, "auth_url {auth_url}");
        assert_eq!(resp.json["error"], "invalid_auth_url");
        assert_eq!(resp.header("cache-control"), Some("private, no-cache"));
        bodies.push(resp.raw);
    }
    assert!(bodies.windows(2).all(|pair| pair[0] == pair[1]));

    let resp = get(
        &app.router,
        &format!("{PR_PATH}?auth_url=https%3A%2F%2Fevil.example.com"),
        &[],
    )
    .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.json["error"], "invalid_auth_url");
    assert_eq!(resp.header("cache-control"), Some("private, no-cache"));
}

#[tokio::test]
async fn test_whitelisted_auth_url_is_private() {
    let app = TestApp::new();
    let resp = get(
        &app.router,
        &format!("{AS_PATH}?auth_url=http%3A%2F%2Flocalhost%3A5002"),
        &[],
    )
    .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json["issuer"], DEV_AUTH);
    assert_eq!(
        resp.json["authorization_endpoint"],
        "http://localhost:5002/authorize"
    );
    assert_eq!(resp.header("cache-control"), Some("private, no-cache"));
}

#[tokio::test]
async fn test_query_project_scopes_authorization_endpoint() {
    let app = TestApp::new();
    let resp = get(&app.router, &format!("{AS_PATH}?project_id={PROJECT}"), &[]).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(
        resp.json["authorization_endpoint"],
        format!("https://auth.example.com/authorize?project_id={PROJECT}")
    );
    assert_eq!(resp.header("cache-control"), Some("private, no-cache"));
}

#[tokio::test]
async fn test_path_project_scopes_authorization_endpoint() {
    let app = TestApp::new();
    let resp = get(&app.router, &format!("{AS_PATH}/mcp/{PROJECT}"), &[]).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(
        resp.json["authorization_endpoint"],
        format!("https://auth.example.com/authorize?project_id={PROJECT}")
    );
    assert_eq!(
        resp.json["token_endpoint"],
        "http://localhost:3443/mcp/oauth/token"
    );
    assert_eq!(resp.header("cache-control"), Some("private, no-cache"));
}

#[tokio::test]
async fn test_malformed_path_project_is_bad_request() {
    let app = TestApp::new();
    for suffix in ["mcp/not-a-uuid", "mcp/6089f2311ccb4ab8bba17e7a03893939"] {
        for prefix in [AS_PATH, PR_PATH] {
            let resp = get(&app.router, &format!("{prefix}/{suffix}"), &[]).await;
            assert_eq!(resp.status, StatusCode::BAD_REQUEST, "{prefix}/{suffix}");
            assert_eq!(resp.json["error"], "invalid_request");
        }
    }
}

#[tokio::test]
async fn test_query_project_wins_over_path() {
    let app = TestApp::new();
    let resp = get(
        &app.router,
        &format!("{AS_PATH}/mcp/not-a-uuid?project_id={PROJECT}"),
        &[],
    )
    .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(
        resp.json["authorization_endpoint"],
        format!("https://auth.example.com/authorize?project_id={PROJECT}")
    );
}

#[tokio::test]
async fn test_forwarded_proto_https() {
    let app = TestApp::new();
    let resp = get(
        &app.router,
        AS_PATH,
        &[("host", "api.example.com"), ("x-forwarded-proto", "https")],
    )
    .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(
        resp.json["token_endpoint"],
        "https://api.example.com/mcp/oauth/token"
    );
}

#[tokio::test]
async fn test_missing_host_is_bad_request() {
    let app = TestApp::new();
    let request = Request::builder()
        .uri(AS_PATH)
        .method("GET")
        .body(Body::empty())
        .unwrap();
    let resp = send(&app.router, request).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_identical_requests_are_byte_identical() {
    let app = TestApp::new();
    for uri in [
        AS_PATH.to_string(),
        format!("{AS_PATH}/mcp/{PROJECT}"),
        format!("{PR_PATH}/mcp/{PROJECT}"),
        format!("{PR_PATH}?project_id={PROJECT}"),
    ] {
        let first = get(&app.router, &uri, &[]).await;
        let second = get(&app.router, &uri, &[]).await;
        assert_eq!(first.status, StatusCode::OK);
        assert_eq!(first.raw, second.raw, "{uri}");
        assert_eq!(
            first.header("cache-control"),
            second.header("cache-control")
        );
    }
}

#[tokio::test]
async fn test_unconfigured_default_is_server_error() {
    let config = OAuthConfig {
        auth_server_url: String::new(),
        ..test_config()
    };
    let app = TestApp::with(config, Outcome::Issue);

    for uri in [AS_PATH, PR_PATH] {
        let resp = get(&app.router, uri, &[]).await;
        assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        assert_eq!(resp.json["error"], "server_error");
        assert_eq!(resp.header("cache-control"), Some("private, no-cache"));
    }

    // A whitelisted explicit choice still works
    let resp = get(
        &app.router,
        &format!("{AS_PATH}?auth_url=https%3A%2F%2Fauth.example.com"),
        &[],
    )
    .await;
    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn test_protected_resource_default() {
    let app = TestApp::new();
    let resp = get(&app.router, PR_PATH, &[]).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json["resource"], "http://localhost:3443");
    assert_eq!(
        resp.json["authorization_servers"][0],
        "http://localhost:3443"
    );
    assert_eq!(resp.json["bearer_methods_supported"][0], "header");
    assert_eq!(resp.json["scopes_supported"][0], "project:access");
    assert_eq!(resp.header("cache-control"), Some("public, max-age=3600"));
}

#[tokio::test]
async fn test_protected_resource_with_auth_url_is_private() {
    let app = TestApp::new();
    let resp = get(
        &app.router,
        &format!("{PR_PATH}?auth_url=http%3A%2F%2Flocalhost%3A5002"),
        &[],
    )
    .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json["resource"], "http://localhost:3443");
    assert_eq!(resp.header("cache-control"), Some("private, no-cache"));
}

#[tokio::test]
async fn test_malformed_requests_are_not_cacheable() {
    let app = TestApp::new();

    for uri in [
        format!("{AS_PATH}/mcp/not-a-uuid"),
        format!("{PR_PATH}/mcp/not-a-uuid"),
        format!("{PR_PATH}?project_id=.."),
    ] {
        let resp = get(&app.router, &uri, &[]).await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(resp.json["error"], "invalid_request");
        assert_eq!(resp.header("cache-control"), Some("private, no-cache"), "{uri}");
    }
}

#[tokio::test]
async fn test_protected_resource_with_suffix() {
    let app = TestApp::new();
    let resp = get(&app.router, &format!("{PR_PATH}/mcp/{PROJECT}"), &[]).await;

    let expected = format!("http://localhost:3443/mcp/{PROJECT}");
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json["resource"], expected);
    assert_eq!(resp.json["authorization_servers"][0], expected);
    assert_eq!(resp.header("cache-control"), Some("private, no-cache"));

    let resp = get(&app.router, &format!("{PR_PATH}/api/v1"), &[]).await;
    assert_eq!(resp.json["resource"], "http://localhost:3443/api/v1");
    assert_eq!(
        resp.json["authorization_servers"][0],
        "http://localhost:3443"
    );
    assert_eq!(resp.header("cache-control"), Some("private, no-cache"));
}

/// Follow `authorization_servers[0]` the way an RFC 8414 client does and land
/// on a document scoped to the same project
#[tokio::test]
async fn test_protected_resource_chains_to_scoped_authorization_server() {
    let app = TestApp::new();

    for start in [
        format!("{PR_PATH}/mcp/{PROJECT}"),
        format!("{PR_PATH}?project_id={PROJECT}"),
    ] {
        let resource = get(&app.router, &start, &[]).await;
        let issuer = resource.json["authorization_servers"][0]
            .as_str()
            .unwrap()
            .to_string();

        let issuer = Url::parse(&issuer).unwrap();
        let discovery = format!("{AS_PATH}{}", issuer.path());

        let metadata = get(&app.router, &discovery, &[]).await;
        assert_eq!(metadata.status, StatusCode::OK, "{discovery}");
        assert_eq!(
            metadata.json["authorization_endpoint"],
            format!("https://auth.example.com/authorize?project_id={PROJECT}")
        );
    }
}
