//! Integration tests: read-only device API

use crate::support::directory::{app_state, insert_device, test_pool, DASHBOARD_ORIGIN};
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use netmon::api::create_app;
use netmon::db::status_logs::append_status_log;
use netmon::events::SnapshotHub;
use netmon::types::{DeviceStatus, StatusTransitionLogEntry};
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;

async fn build_app() -> (Router, SqlitePool) {
    let pool = test_pool().await;
    let hub = SnapshotHub::new(4);
    let app = create_app(app_state(&pool, &hub), DASHBOARD_ORIGIN);
    (app, pool)
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn list_devices_returns_directory_rows() {
    let (app, pool) = build_app().await;
    insert_device(&pool, "router", "192.168.1.1", Some("online")).await;
    insert_device(&pool, "nas", "http://10.0.0.5", None).await;

    let (status, body) = get_json(app, "/devices").await;

    assert_eq!(status, StatusCode::OK);
    let devices = body.as_array().unwrap();
    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0]["name"], "router");
    assert_eq!(devices[0]["status"], "online");
    assert_eq!(devices[1]["status"], Value::Null);
}

#[tokio::test]
async fn get_device_by_id_and_unknown_id() {
    let (app, pool) = build_app().await;
    let id = insert_device(&pool, "switch", "10.0.0.2", Some("offline")).await;

    let (status, body) = get_json(app.clone(), &format!("/devices/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);
    assert_eq!(body["address"], "10.0.0.2");

    let (status, body) = get_json(app, "/devices/9999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Device not found");
}

#[tokio::test]
async fn live_returns_aggregated_snapshot() {
    let (app, pool) = build_app().await;
    insert_device(&pool, "a", "10.0.0.1", Some("online")).await;
    insert_device(&pool, "b", "10.0.0.2", Some("offline")).await;
    insert_device(&pool, "c", "10.0.0.3", None).await;

    let (status, body) = get_json(app, "/live").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    assert_eq!(body["online"], 1);
    assert_eq!(body["offline"], 2);
    assert_eq!(body["devices"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn device_logs_are_newest_first_and_limited() {
    let (app, pool) = build_app().await;
    let id = insert_device(&pool, "ap", "10.0.0.9", Some("online")).await;

    let base = Utc::now();
    for (offset, (old, new)) in [
        (None, DeviceStatus::Offline),
        (Some(DeviceStatus::Offline), DeviceStatus::Online),
        (Some(DeviceStatus::Online), DeviceStatus::Offline),
    ]
    .into_iter()
    .enumerate()
    {
        let entry = StatusTransitionLogEntry {
            id: 0,
            device_id: id,
            old_status: old,
            new_status: new,
            logged_at: base + chrono::Duration::seconds(offset as i64),
        };
        append_status_log(&pool, &entry).await.unwrap();
    }

    let (status, body) = get_json(app.clone(), &format!("/devices/{id}/logs")).await;
    assert_eq!(status, StatusCode::OK);
    let logs = body.as_array().unwrap();
    assert_eq!(logs.len(), 3);
    assert_eq!(logs[0]["old_status"], "online");
    assert_eq!(logs[0]["new_status"], "offline");
    assert_eq!(logs[2]["old_status"], Value::Null);

    let (_, body) = get_json(app.clone(), &format!("/devices/{id}/logs?limit=1")).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = get_json(app, "/devices/424242/logs").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cors_allows_dashboard_origin() {
    let (app, _pool) = build_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/devices")
                .header(header::ORIGIN, DASHBOARD_ORIGIN)
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some(DASHBOARD_ORIGIN)
    );
}
