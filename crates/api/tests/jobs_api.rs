//! Integration tests for `/api/v1/jobs` and `/api/v1/admin/stats`.

mod common;

use std::collections::HashSet;

use axum::http::StatusCode;
use common::{body_json, get, post_json, ADMIN};
use reelq_core::messages;
use reelq_db::repositories::JobRepo;
use reelq_pipeline::DispatcherConfig;
use serde_json::json;
use sqlx::SqlitePool;

const JOBS: &str = "/api/v1/jobs";

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn submit_valid_link_returns_201_and_queues_job(pool: SqlitePool) {
    let app = common::build_test_app(pool.clone());
    let response = post_json(
        app,
        JOBS,
        Some("U1"),
        json!({ "link": "https://instagram.com/reel/ABC123/" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "pending");
    assert_eq!(json["data"]["message"], messages::MSG_QUEUED);

    let job_id = json["data"]["job_id"].as_i64().unwrap();
    let job = JobRepo::find_by_id(&pool, job_id).await.unwrap().unwrap();
    assert_eq!(job.requester_id, "U1");
    assert_eq!(job.locator, "ABC123");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn malformed_link_returns_400_and_creates_nothing(pool: SqlitePool) {
    let app = common::build_test_app(pool.clone());
    let response = post_json(
        app,
        JOBS,
        Some("U1"),
        json!({ "link": "https://example.com/p/X" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_LOCATOR");
    assert_eq!(json["error"], messages::MSG_INVALID_LINK);
    assert_eq!(JobRepo::count_all(&pool).await.unwrap(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn empty_link_fails_validation(pool: SqlitePool) {
    let app = common::build_test_app(pool.clone());
    let response = post_json(app, JOBS, Some("U1"), json!({ "link": "" })).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn second_submission_inside_cooldown_returns_429(pool: SqlitePool) {
    let app = common::build_test_app_with(pool.clone(), common::short_cooldown());
    let link = json!({ "link": "https://www.instagram.com/p/FIRST/" });

    let first = post_json(app.clone(), JOBS, Some("U1"), link.clone()).await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = post_json(app.clone(), JOBS, Some("U1"), link.clone()).await;
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_json(second).await["code"], "RATE_LIMITED");

    // Another requester is unaffected.
    let other = post_json(app, JOBS, Some("U2"), link).await;
    assert_eq!(other.status(), StatusCode::CREATED);

    assert_eq!(JobRepo::count_all(&pool).await.unwrap(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn requester_outside_allowlist_returns_403(pool: SqlitePool) {
    let config = DispatcherConfig {
        allowed_requesters: Some(HashSet::from(["U1".to_string()])),
        ..DispatcherConfig::default()
    };
    let app = common::build_test_app_with(pool.clone(), config);
    let link = json!({ "link": "https://instagram.com/p/OK/" });

    let refused = post_json(app.clone(), JOBS, Some("U9"), link.clone()).await;
    assert_eq!(refused.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(refused).await["error"], messages::MSG_NOT_AUTHORIZED);

    let accepted = post_json(app, JOBS, Some("U1"), link).await;
    assert_eq!(accepted.status(), StatusCode::CREATED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_identity_header_returns_401(pool: SqlitePool) {
    let app = common::build_test_app(pool.clone());
    let response = post_json(
        app,
        JOBS,
        None,
        json!({ "link": "https://instagram.com/p/X/" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
    assert_eq!(JobRepo::count_all(&pool).await.unwrap(), 0);
}

// ---------------------------------------------------------------------------
// Read
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_returns_only_own_jobs_newest_first(pool: SqlitePool) {
    let older = JobRepo::enqueue(&pool, "U1", "https://instagram.com/p/A/", "A")
        .await
        .unwrap();
    JobRepo::enqueue(&pool, "U2", "https://instagram.com/p/B/", "B")
        .await
        .unwrap();
    let newer = JobRepo::enqueue(&pool, "U1", "https://instagram.com/p/C/", "C")
        .await
        .unwrap();

    let app = common::build_test_app(pool);
    let response = get(app, JOBS, Some("U1")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let ids: Vec<i64> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|job| job["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![newer.id, older.id]);
    assert_eq!(json["data"][0]["status_name"], "pending");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn get_job_is_limited_to_owner_or_admin(pool: SqlitePool) {
    let job = JobRepo::enqueue(&pool, "U1", "https://instagram.com/p/A/", "A")
        .await
        .unwrap();
    let app = common::build_test_app(pool);
    let uri = format!("{JOBS}/{}", job.id);

    let own = get(app.clone(), &uri, Some("U1")).await;
    assert_eq!(own.status(), StatusCode::OK);
    assert_eq!(body_json(own).await["data"]["locator"], "A");

    let stranger = get(app.clone(), &uri, Some("U2")).await;
    assert_eq!(stranger.status(), StatusCode::FORBIDDEN);

    let admin = get(app.clone(), &uri, Some(ADMIN)).await;
    assert_eq!(admin.status(), StatusCode::OK);

    let missing = get(app, &format!("{JOBS}/999999"), Some("U1")).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn stats_report_completed_total_for_admins(pool: SqlitePool) {
    for locator in ["A", "B", "C"] {
        let link = format!("https://instagram.com/p/{locator}/");
        JobRepo::enqueue(&pool, "U1", &link, locator).await.unwrap();
    }
    let first = JobRepo::claim_next(&pool, "w").await.unwrap().unwrap();
    let second = JobRepo::claim_next(&pool, "w").await.unwrap().unwrap();
    JobRepo::mark_completed(&pool, first.id, "w").await.unwrap();
    JobRepo::mark_failed(&pool, second.id, "w", "fetch: boom").await.unwrap();

    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/admin/stats", Some(ADMIN)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["completed"], 1);
    assert_eq!(json["data"]["by_status"]["pending"], 1);
    assert_eq!(json["data"]["by_status"]["failed"], 1);
    assert_eq!(json["data"]["message"], messages::stats(1));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn stats_are_forbidden_to_non_admins(pool: SqlitePool) {
    let app = common::build_test_app(pool);

    let response = get(app.clone(), "/api/v1/admin/stats", Some("U1")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"], messages::MSG_NOT_ADMIN);

    let anonymous = get(app, "/api/v1/admin/stats", None).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
}
