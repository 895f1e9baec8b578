use std::path::PathBuf;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use dental_api::{build_app_with_source, ApiConfig};
use dental_catalog::CatalogBackend;
use serde_json::{json, Value};
use tower::ServiceExt;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/services.json")
}

async fn fixture_app() -> Router {
    let backend = CatalogBackend::from_json_file(fixture_path())
        .await
        .expect("fixture catalog should load");
    build_app_with_source(ApiConfig::default(), backend).await
}

async fn unreachable_backend_app() -> Router {
    let backend = CatalogBackend::http("http://127.0.0.1:1", Duration::from_secs(1))
        .expect("client should build");
    build_app_with_source(ApiConfig::default(), backend).await
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn health_reports_loaded_services() {
    let app = fixture_app().await;

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = body_json(response).await;
    assert_eq!(parsed["success"], true);
    assert_eq!(parsed["status"], "healthy");
    assert_eq!(parsed["services_loaded"], 5);
    assert_eq!(parsed["backend_url"], "static");
    assert!(parsed["metrics"].get("refresh_total").is_some());
    assert!(parsed["catalog_loaded_at"].is_string());
}

#[tokio::test]
async fn index_describes_endpoints() {
    let app = fixture_app().await;

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = body_json(response).await;
    assert!(parsed["endpoints"].get("POST /recommend").is_some());
}

#[tokio::test]
async fn recommend_ranks_matching_service_first() {
    let app = fixture_app().await;

    let response = app
        .oneshot(post_json(
            "/recommend",
            json!({ "query": "tôi muốn tẩy trắng răng", "top_k": 3 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = body_json(response).await;
    assert_eq!(parsed["success"], true);
    assert_eq!(parsed["count"], 3);
    assert_eq!(parsed["results"][0]["id"], 1);
    assert!(parsed["results"][0]["score"].as_f64().unwrap() > 0.0);
    assert_eq!(
        parsed["analysis"],
        "AI analyzed your query and found 3 matching services"
    );
}

#[tokio::test]
async fn blank_recommend_returns_cheapest_services() {
    let app = fixture_app().await;

    let response = app
        .oneshot(post_json("/recommend", json!({ "top_k": 3 })))
        .await
        .unwrap();
    let parsed = body_json(response).await;

    let ids = parsed["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![4, 3, 2]);
    assert!(parsed["results"]
        .as_array()
        .unwrap()
        .iter()
        .all(|item| item["score"] == 0.0));
    assert_eq!(
        parsed["analysis"],
        "AI analyzed your query and returned default recommendations"
    );
}

#[tokio::test]
async fn chat_greeting_has_no_suggestions() {
    let app = fixture_app().await;

    let response = app
        .oneshot(post_json("/chat", json!({ "message": "chào bạn" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = body_json(response).await;
    assert_eq!(parsed["intent"], "greeting");
    assert_eq!(parsed["query"], "chào bạn");
    assert_eq!(parsed["suggestions"], json!([]));
    assert_eq!(parsed["entities"]["services"], json!([]));
    assert_eq!(
        parsed["reply"],
        dental_core::dialog::GREETING_REPLY
    );
}

#[tokio::test]
async fn chat_price_question_quotes_prices() {
    let app = fixture_app().await;

    let response = app
        .oneshot(post_json(
            "/chat",
            json!({ "message": "Giá nhổ răng bao nhiêu?", "top_k": 2 }),
        ))
        .await
        .unwrap();
    let parsed = body_json(response).await;

    assert_eq!(parsed["intent"], "ask_price");
    assert_eq!(parsed["entities"]["services"], json!(["nhổ"]));
    assert_eq!(parsed["suggestions"].as_array().unwrap().len(), 2);
    assert_eq!(parsed["suggestions"][0]["id"], 2);
    assert!(parsed["reply"]
        .as_str()
        .unwrap()
        .contains("- Nhổ răng: 500,000 VND"));
}

#[tokio::test]
async fn analyze_services_reports_stats() {
    let app = fixture_app().await;

    let response = app.oneshot(get("/analyze/services")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stats = body_json(response).await["stats"].clone();
    assert_eq!(stats["count"], 5);
    assert_eq!(stats["price_min"].as_f64(), Some(250_000.0));
    assert_eq!(stats["price_max"].as_f64(), Some(1_500_000.0));
    assert_eq!(stats["price_mean"].as_f64(), Some(637_500.0));
    assert_eq!(stats["avg_duration_minutes"].as_f64(), Some(56.25));
    assert_eq!(stats["top_affordable"][0]["name"], "Cạo vôi");
    assert_eq!(stats["backend_url"], "static");
}

#[tokio::test]
async fn services_lists_catalog_in_order() {
    let app = fixture_app().await;

    let response = app.oneshot(get("/services")).await.unwrap();
    let parsed = body_json(response).await;

    assert_eq!(parsed["count"], 5);
    assert_eq!(parsed["services"][4]["name"], "Bọc răng sứ");
    assert_eq!(parsed["services"][4]["price"], Value::Null);
}

#[tokio::test]
async fn unreachable_backend_degrades_to_empty_catalog() {
    let app = unreachable_backend_app().await;

    let refresh = app
        .clone()
        .oneshot(post_json("/refresh", json!({})))
        .await
        .unwrap();
    assert_eq!(refresh.status(), StatusCode::BAD_GATEWAY);
    let parsed = body_json(refresh).await;
    assert_eq!(parsed["success"], false);
    assert_eq!(parsed["services_count"], 0);

    let analyze = app.clone().oneshot(get("/analyze/services")).await.unwrap();
    assert_eq!(analyze.status(), StatusCode::NOT_FOUND);

    let recommend = app
        .clone()
        .oneshot(post_json("/recommend", json!({ "query": "nhổ răng" })))
        .await
        .unwrap();
    assert_eq!(recommend.status(), StatusCode::OK);
    assert_eq!(body_json(recommend).await["results"], json!([]));

    let health = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);
    let health = body_json(health).await;
    assert_eq!(health["services_loaded"], 0);
    assert!(health["catalog_loaded_at"].is_null());
}

#[tokio::test]
async fn responses_carry_request_id() {
    let app = fixture_app().await;

    let response = app.clone().oneshot(get("/health")).await.unwrap();
    let generated = response
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .expect("generated request id should be returned");
    assert!(!generated.is_empty());

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "clinic-req-42")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|value| value.to_str().ok()),
        Some("clinic-req-42")
    );
}

#[tokio::test]
async fn recommend_accepts_numeric_string_top_k() {
    let app = fixture_app().await;

    let response = app
        .oneshot(post_json(
            "/recommend",
            json!({ "query": "nhổ răng khôn", "top_k": "2" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = body_json(response).await;
    assert_eq!(parsed["query"], "nhổ răng khôn");
    assert_eq!(parsed["count"], 2);
    assert_eq!(parsed["results"][0]["id"], 2);
}

#[tokio::test]
async fn recommend_rejects_undecodable_body() {
    let app = fixture_app().await;

    let wrong_type = app
        .clone()
        .oneshot(post_json(
            "/recommend",
            json!({ "query": "nhổ răng khôn", "top_k": "two" }),
        ))
        .await
        .unwrap();
    assert_eq!(wrong_type.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(wrong_type).await["success"], false);

    let broken_json = Request::builder()
        .method("POST")
        .uri("/recommend")
        .header("content-type", "application/json")
        .body(Body::from("{\"query\": "))
        .unwrap();
    let response = app.oneshot(broken_json).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn recommend_without_body_uses_defaults() {
    let app = fixture_app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/recommend")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = body_json(response).await;
    assert_eq!(parsed["count"], 5);
    assert_eq!(
        parsed["analysis"],
        "AI analyzed your query and returned default recommendations"
    );
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let app = fixture_app().await;
    let message = "răng ".repeat(20_000);

    let response = app
        .oneshot(post_json("/chat", json!({ "message": message })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
