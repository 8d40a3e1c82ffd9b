mod common;

use std::sync::Arc;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{send, test_app, FakeProvider};

#[tokio::test]
async fn password_login_returns_verified_credential() -> Result<()> {
    let (app, _) = test_app(Arc::new(FakeProvider::new()));

    let credential = common::login(&app).await?;

    assert_eq!(credential["token_type"], "Bearer");
    assert_eq!(credential["user"]["username"], common::USERNAME);
    assert_eq!(credential["user"]["roles"], json!(["edc-admin"]));
    assert!(credential["expires_in"].as_i64().unwrap() > 0);
    assert!(credential["refresh_token"].is_string());
    Ok(())
}

#[tokio::test]
async fn wrong_password_is_unauthorized() -> Result<()> {
    let (app, _) = test_app(Arc::new(FakeProvider::new()));

    let res = send(
        &app,
        Method::POST,
        "/auth/token",
        None,
        Some(json!({ "username": common::USERNAME, "password": "nope" })),
    )
    .await?;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["message"], "Invalid credentials");
    Ok(())
}

#[tokio::test]
async fn missing_login_fields_are_validation_errors() -> Result<()> {
    let (app, _) = test_app(Arc::new(FakeProvider::new()));

    let res = send(&app, Method::POST, "/auth/token", None, Some(json!({ "username": "  " }))).await?;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
    assert!(res.body["field_errors"]["username"].is_string());
    assert!(res.body["field_errors"]["password"].is_string());
    Ok(())
}

#[tokio::test]
async fn malformed_login_body_is_invalid_json() -> Result<()> {
    let (app, _) = test_app(Arc::new(FakeProvider::new()));
    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/auth/token")
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from("{not json"))?;

    use tower::ServiceExt;
    let response = app.oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn session_and_user_info_describe_the_caller() -> Result<()> {
    let (app, _) = test_app(Arc::new(FakeProvider::new()));
    let credential = common::login(&app).await?;
    let token = credential["access_token"].as_str().unwrap();

    let me = send(&app, Method::GET, "/api/auth/me", Some(token), None).await?;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["user"]["email"], "admin@example.com");
    assert_eq!(me.body["expires_at"], credential["expires_at"]);

    let info = send(&app, Method::GET, "/api/auth/userinfo", Some(token), None).await?;
    assert_eq!(info.status, StatusCode::OK);
    assert_eq!(info.body["sub"], common::SUBJECT);
    Ok(())
}
