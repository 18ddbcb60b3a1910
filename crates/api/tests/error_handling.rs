//! Tests for `AppError` to HTTP response mapping.
//!
//! These call `IntoResponse` directly on `AppError` values; no server is
//! involved.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use reelq_api::error::AppError;
use reelq_core::error::CoreError;
use reelq_core::messages;
use reelq_pipeline::{AdminError, SubmitError};

/// Convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn not_found_error_returns_404() {
    let err = AppError::Core(CoreError::NotFound {
        entity: "Job",
        id: 42,
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Job with id 42 not found");
}

#[tokio::test]
async fn invalid_locator_returns_400_with_user_text() {
    let err = AppError::Submit(SubmitError::InvalidLocator("nope".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_LOCATOR");
    assert_eq!(json["error"], messages::MSG_INVALID_LINK);
}

#[tokio::test]
async fn rate_limited_returns_429() {
    let err = AppError::Submit(SubmitError::RateLimited("U1".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["code"], "RATE_LIMITED");
    assert_eq!(json["error"], messages::MSG_RATE_LIMITED);
}

#[tokio::test]
async fn admin_forbidden_returns_403() {
    let err = AppError::Admin(AdminError::Forbidden("U1".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "FORBIDDEN");
}

#[tokio::test]
async fn store_failures_are_sanitized() {
    let err = AppError::Submit(SubmitError::Store(sqlx::Error::PoolTimedOut));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

#[tokio::test]
async fn config_error_returns_500_and_sanitizes_message() {
    let err = AppError::Core(CoreError::Config("secret path /var/lib/reelq leaked".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert!(!json["error"].as_str().unwrap().contains("secret"));
}

#[tokio::test]
async fn unauthorized_returns_401() {
    let err = AppError::Core(CoreError::Unauthorized("Missing x-requester-id header".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");
}
