use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use dental_api::{build_app, ApiConfig};
use dental_catalog::{CatalogSource, HttpCatalogSource};
use dental_core::CatalogError;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn spawn_backend(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn clinic_payload() -> Value {
    json!({
        "data": [
            {"id": 10, "name": "Tẩy trắng", "description": "tẩy trắng răng", "price": 1500000, "durationMinutes": 60},
            {"id": 11, "name": "Nhổ răng", "description": null, "price": 500000, "durationMinutes": 30},
            {"id": "broken"}
        ]
    })
}

#[tokio::test]
async fn http_source_decodes_wrapped_payload() {
    let backend = spawn_backend(Router::new().route(
        "/api/services",
        get(|| async { Json(clinic_payload()) }),
    ))
    .await;

    let source = HttpCatalogSource::new(&backend, Duration::from_secs(5)).unwrap();
    let records = source.fetch_services().await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, 10);
    assert_eq!(records[1].description, "");
    assert_eq!(records[0].duration_minutes, Some(60));
}

#[tokio::test]
async fn http_source_maps_error_status() {
    let backend = spawn_backend(Router::new().route(
        "/api/services",
        get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    ))
    .await;

    let source = HttpCatalogSource::new(&backend, Duration::from_secs(5)).unwrap();
    let err = source.fetch_services().await.unwrap_err();
    assert!(matches!(err, CatalogError::Http { .. }));
}

#[tokio::test]
async fn http_source_rejects_unexpected_shape() {
    let backend = spawn_backend(Router::new().route(
        "/api/services",
        get(|| async { Json(json!({ "services": [] })) }),
    ))
    .await;

    let source = HttpCatalogSource::new(&backend, Duration::from_secs(5)).unwrap();
    let err = source.fetch_services().await.unwrap_err();
    assert!(matches!(err, CatalogError::Malformed(_)));
}

#[tokio::test]
async fn http_source_times_out() {
    let backend = spawn_backend(Router::new().route(
        "/api/services",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!([]))
        }),
    ))
    .await;

    let source = HttpCatalogSource::new(&backend, Duration::from_millis(200)).unwrap();
    let err = source.fetch_services().await.unwrap_err();
    assert!(matches!(err, CatalogError::Timeout { .. }));
}

#[tokio::test]
async fn app_serves_catalog_fetched_from_backend() {
    let backend = spawn_backend(Router::new().route(
        "/api/services",
        get(|| async { Json(clinic_payload()) }),
    ))
    .await;

    let config = ApiConfig {
        backend_url: backend.clone(),
        ..ApiConfig::default()
    };
    let app = build_app(config).await.expect("app should build");

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/services").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["count"], 2);

    let refresh = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/refresh")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(refresh.status(), StatusCode::OK);
    let body = to_bytes(refresh.into_body(), usize::MAX).await.unwrap();
    let parsed: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["services_count"], 2);
    assert_eq!(parsed["backend_url"], backend);
}
