mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn protected_route_rejects_missing_token() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/servers", server.base_url))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["code"], 401);
    assert_eq!(body["message"], "Token not provided");
    assert!(body["data"].is_null());
    Ok(())
}

#[tokio::test]
async fn protected_route_rejects_malformed_header() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/dashboard/stats", server.base_url))
        .header("Authorization", "Basic dXNlcjpwYXNz")
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["message"], "Token not provided");
    Ok(())
}

#[tokio::test]
async fn protected_route_rejects_garbage_token() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/alerts/rules", server.base_url))
        .bearer_auth("definitely-not-a-jwt")
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["code"], 401);
    assert_eq!(body["message"], "Invalid token");
    Ok(())
}

#[tokio::test]
async fn refresh_without_token_is_unauthorized() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/auth/refresh", server.base_url))
        .json(&json!({}))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["message"], "Refresh token not provided");
    Ok(())
}

#[tokio::test]
async fn refresh_with_garbage_token_is_unauthorized() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/auth/refresh", server.base_url))
        .json(&json!({ "refreshToken": "garbage" }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["message"], "Invalid refresh token");
    Ok(())
}

#[tokio::test]
async fn login_returns_envelope_even_on_failure() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/auth/login", server.base_url))
        .json(&json!({ "username": "alice", "password": "secret1" }))
        .send()
        .await?;

    // Without a seeded database this is 401 (unknown user) or 500 (store
    // unreachable); either way the envelope contract holds
    assert!(
        res.status() == StatusCode::UNAUTHORIZED
            || res.status() == StatusCode::INTERNAL_SERVER_ERROR,
        "unexpected status: {}",
        res.status()
    );

    let status = res.status();
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["code"], status.as_u16());
    assert!(body["message"].is_string());
    assert!(body["data"].is_null());
    Ok(())
}

#[tokio::test]
async fn malformed_json_body_is_bad_request() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/auth/login", server.base_url))
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["code"], 400);
    Ok(())
}
