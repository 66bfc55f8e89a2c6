//! HTTP surface tests, driven through the router with `tower::ServiceExt`.

mod support;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::Value;
use tower::ServiceExt;

use reminders::config::ReminderSettings;
use reminders::server::{build_router, AppState, Database, REMINDERS_PATH};
use reminders::subscription::ProviderKind;

use support::{
    add_account, count_notifications, pool, setup_db, setup_empty_db, RecordingMailer,
};

fn app(db: std::sync::Arc<Database>) -> Router {
    build_router(AppState {
        db,
        mailer: None,
        settings: ReminderSettings::default(),
    })
}

async fn send(app: Router, method: Method, uri: &str) -> (StatusCode, axum::http::HeaderMap, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, json)
}

#[tokio::test]
async fn preflight_returns_cors_headers() {
    let db = setup_db().await;

    let response = app(db)
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri(REMINDERS_PATH)
                .header("Origin", "https://admin.example.com")
                .header("Access-Control-Request-Method", "POST")
                .header("Access-Control-Request-Headers", "authorization, content-type")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert!(headers.contains_key("access-control-allow-headers"));
    assert!(headers.contains_key("access-control-allow-methods"));
}

#[tokio::test]
async fn bare_options_is_answered() {
    let db = setup_db().await;

    let (status, _, _) = send(app(db.clone()), Method::OPTIONS, REMINDERS_PATH).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(count_notifications(&db).await, 0);
}

#[tokio::test]
async fn trigger_with_nothing_expiring() {
    let db = setup_db().await;

    let (status, headers, body) = send(app(db), Method::POST, REMINDERS_PATH).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(body["success"], true);
    assert_eq!(body["sent"], 0);
    assert_eq!(body["message"], "No expiring subscriptions found");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn trigger_sends_once_per_day() {
    let db = setup_db().await;
    add_account(
        &db,
        ProviderKind::Cook,
        "cook-http",
        "Karim",
        "active",
        Some(Utc::now() + Duration::days(1)),
    )
    .await;
    add_account(
        &db,
        ProviderKind::Worker,
        "worker-http",
        "Lina",
        "trial",
        Some(Utc::now() + Duration::days(2)),
    )
    .await;

    let (status, _, first) = send(app(db.clone()), Method::POST, REMINDERS_PATH).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["success"], true);
    assert_eq!(first["sent"], 2);
    assert_eq!(first["message"], "Sent 2 subscription reminders");
    assert_eq!(first["details"]["cooks"], 1);
    assert_eq!(first["details"]["workers"], 1);
    assert_eq!(first["details"]["skipped"], 0);

    // GET triggers the same job
    let (status, _, second) = send(app(db.clone()), Method::GET, REMINDERS_PATH).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["sent"], 0);
    assert_eq!(second["details"]["skipped"], 2);

    assert_eq!(count_notifications(&db).await, 2);
}

#[tokio::test]
async fn trigger_uses_configured_mailer() {
    let db = setup_db().await;
    add_account(
        &db,
        ProviderKind::Worker,
        "worker-mail",
        "Ines",
        "active",
        Some(Utc::now() + Duration::hours(30)),
    )
    .await;
    let mailer = std::sync::Arc::new(RecordingMailer::failing_for(&["worker-mail@example.com"]));

    let app = build_router(AppState {
        db: db.clone(),
        mailer: Some(mailer.clone()),
        settings: ReminderSettings::default(),
    });
    let (status, _, body) = send(app, Method::POST, REMINDERS_PATH).await;

    // Email failures never surface as HTTP errors
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sent"], 1);
    assert_eq!(mailer.attempted().len(), 1);
}

#[tokio::test]
async fn storage_failure_returns_500() {
    let db = setup_empty_db().await;

    let (status, headers, body) = send(app(db), Method::POST, REMINDERS_PATH).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(headers["access-control-allow-origin"], "*");
    let error = body["error"].as_str().expect("error must be a string");
    assert!(error.starts_with("Failed to fetch cook subscriptions"));
    assert!(body.get("success").is_none());
}

#[tokio::test]
async fn reminder_lookup_failure_returns_500() {
    let db = setup_db().await;
    add_account(
        &db,
        ProviderKind::Cook,
        "cook-lookup",
        "Yasmine",
        "active",
        Some(Utc::now() + Duration::days(1)),
    )
    .await;
    sqlx::query("DROP TABLE notifications")
        .execute(pool(&db))
        .await
        .unwrap();

    let (status, _, body) = send(app(db), Method::POST, REMINDERS_PATH).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error = body["error"].as_str().expect("error must be a string");
    assert!(error.starts_with("Failed to check existing reminders"));
}

#[tokio::test]
async fn health_reports_database() {
    let db = setup_db().await;

    let (status, _, body) = send(app(db), Method::GET, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"]["connected"], true);
    assert_eq!(body["database"]["db_type"], "sqlite");
}

#[tokio::test]
async fn responses_carry_request_id() {
    let db = setup_db().await;

    let (_, first, _) = send(app(db.clone()), Method::GET, "/health").await;
    let (_, second, _) = send(app(db), Method::GET, "/health").await;

    let first = first["x-request-id"].to_str().unwrap().to_string();
    let second = second["x-request-id"].to_str().unwrap().to_string();
    assert!(uuid::Uuid::parse_str(&first).is_ok());
    assert_ne!(first, second);
}

#[tokio::test]
async fn unknown_route_is_404() {
    let db = setup_db().await;

    let (status, _, _) = send(app(db), Method::POST, "/subscription-reminder").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
