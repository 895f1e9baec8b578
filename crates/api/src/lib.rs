mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use dental_agents::DentalConcierge;
use dental_catalog::CatalogBackend;
use dental_core::{CatalogStats, Intent, ScoredService, ServiceRecord};
use dental_observability::{AppMetrics, MetricsSnapshot};
use dental_retrieval::ServiceCatalog;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use config::ApiConfig;

pub const SERVICE_NAME: &str = "Dental AI ML Service";

pub type Concierge = DentalConcierge<CatalogBackend>;

#[derive(Clone)]
pub struct ApiState {
    pub concierge: Arc<Concierge>,
    pub metrics: Arc<AppMetrics>,
    pub config: Arc<ApiConfig>,
    pub backend_label: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    success: bool,
    status: &'static str,
    timestamp_utc: String,
    backend_url: String,
    services_loaded: usize,
    catalog_loaded_at: Option<String>,
    metrics: MetricsSnapshot,
}

#[derive(Debug, Deserialize, Default)]
struct RecommendRequest {
    #[serde(default)]
    query: Option<String>,
    #[serde(default, deserialize_with = "lenient_top_k")]
    top_k: Option<usize>,
    #[serde(default)]
    refresh: bool,
}

#[derive(Debug, Serialize)]
struct RecommendResponse {
    success: bool,
    query: String,
    results: Vec<ScoredService>,
    count: usize,
    analysis: String,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default, deserialize_with = "lenient_top_k")]
    top_k: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CountOrText {
    Count(usize),
    Text(String),
}

/// Accepts `3` or `"3"`; anything else is a decode error.
fn lenient_top_k<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<CountOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(CountOrText::Count(value)) => Ok(Some(value)),
        Some(CountOrText::Text(text)) => text.trim().parse::<usize>().map(Some).map_err(|_| {
            de::Error::custom(format!("top_k must be a non-negative integer, got {text:?}"))
        }),
    }
}

#[derive(Debug, Serialize)]
struct ChatEntities {
    services: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    success: bool,
    query: String,
    intent: Intent,
    confidence: f32,
    entities: ChatEntities,
    suggestions: Vec<ScoredService>,
    reply: String,
}

#[derive(Debug, Serialize)]
struct ServiceStats {
    #[serde(flatten)]
    stats: CatalogStats,
    backend_url: String,
}

#[derive(Debug, Serialize)]
struct ServicesResponse {
    success: bool,
    count: usize,
    services: Vec<ServiceRecord>,
}

/// Builds the app against the HTTP backend named in `config` and attempts
/// one initial catalog load. A failed load is logged; the app still starts.
pub async fn build_app(config: ApiConfig) -> Result<Router> {
    let backend = CatalogBackend::http(&config.backend_url, config.fetch_timeout)
        .context("failed to build catalog HTTP client")?;
    Ok(build_app_with_source(config, backend).await)
}

pub async fn build_app_with_source(config: ApiConfig, source: CatalogBackend) -> Router {
    let metrics = AppMetrics::shared();
    let backend_label = match &source {
        CatalogBackend::Http(_) => config.backend_url.clone(),
        CatalogBackend::Static(_) => source.describe(),
    };

    let concierge = Arc::new(DentalConcierge::new(
        Arc::new(ServiceCatalog::new()),
        Arc::new(source),
        metrics.clone(),
    ));

    let outcome = concierge.refresh().await;
    if outcome.refreshed {
        info!(records = outcome.count, backend = %backend_label, "initial catalog loaded");
    } else {
        warn!(
            backend = %backend_label,
            error = outcome.error.as_deref().unwrap_or("unknown"),
            "initial catalog load failed; serving empty catalog until a refresh succeeds"
        );
    }

    build_router(ApiState {
        concierge,
        metrics,
        config: Arc::new(config),
        backend_label,
    })
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/recommend", post(recommend))
        .route("/refresh", post(refresh))
        .route("/analyze/services", get(analyze_services))
        .route("/services", get(services))
        .route("/chat", post(chat))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(RequestBodyLimitLayer::new(64 * 1024))
        .with_state(state)
}

async fn index(State(state): State<ApiState>) -> impl IntoResponse {
    Json(json!({
        "service": SERVICE_NAME,
        "description": "Service recommender and rule-based chat over the clinic catalog",
        "version": env!("CARGO_PKG_VERSION"),
        "backend_url": state.backend_label,
        "endpoints": {
            "POST /recommend": "Rank catalog services for a free-text query",
            "POST /chat": "Classify a message and reply with matching services",
            "POST /refresh": "Reload services from the backend",
            "GET /services": "List the services currently loaded",
            "GET /analyze/services": "Price and duration statistics for loaded services",
            "GET /health": "Service health and counters"
        }
    }))
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let services_loaded = state.concierge.ensure_loaded(false).await;
    let catalog_loaded_at = state
        .concierge
        .catalog()
        .snapshot()
        .loaded_at()
        .map(|at| at.to_rfc3339());
    let payload = HealthResponse {
        success: true,
        status: "healthy",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        backend_url: state.backend_label.clone(),
        services_loaded,
        catalog_loaded_at,
        metrics: state.metrics.snapshot(),
    };
    (StatusCode::OK, Json(payload))
}

async fn recommend(State(state): State<ApiState>, body: Bytes) -> Response {
    let request = match decode_optional_body::<RecommendRequest>(&body) {
        Ok(request) => request,
        Err(rejection) => return rejection,
    };
    let query = request.query.unwrap_or_default();
    let top_k = state.config.recommend_top_k(request.top_k);

    let results = state
        .concierge
        .rank(&query, top_k, request.refresh)
        .await;

    let analysis = if query.trim().is_empty() {
        "AI analyzed your query and returned default recommendations".to_string()
    } else {
        format!(
            "AI analyzed your query and found {} matching services",
            results.len()
        )
    };

    Json(RecommendResponse {
        success: true,
        count: results.len(),
        query,
        results,
        analysis,
    })
    .into_response()
}

/// An empty body means "all defaults"; a body that does not decode is a 400.
fn decode_optional_body<T>(body: &[u8]) -> Result<T, Response>
where
    T: for<'de> Deserialize<'de> + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    serde_json::from_slice(body).map_err(|err| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "success": false,
                "message": format!("Invalid request body: {err}"),
            })),
        )
            .into_response()
    })
}

async fn refresh(State(state): State<ApiState>) -> Response {
    let outcome = state.concierge.refresh().await;

    match outcome.error {
        None => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Successfully refreshed services from backend",
                "services_count": outcome.count,
                "backend_url": state.backend_label,
            })),
        )
            .into_response(),
        Some(error) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({
                "success": false,
                "message": format!("Refresh failed: {error}"),
                "services_count": outcome.count,
                "backend_url": state.backend_label,
            })),
        )
            .into_response(),
    }
}

async fn analyze_services(State(state): State<ApiState>) -> Response {
    let stats = state.concierge.snapshot_stats();
    if stats.count == 0 {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({
                "success": false,
                "message": "No services data available"
            })),
        )
            .into_response();
    }

    let stats = ServiceStats {
        stats,
        backend_url: state.backend_label.clone(),
    };
    Json(json!({ "success": true, "stats": stats })).into_response()
}

async fn services(State(state): State<ApiState>) -> impl IntoResponse {
    let services = state.concierge.list_services().await;
    Json(ServicesResponse {
        success: true,
        count: services.len(),
        services,
    })
}

async fn chat(State(state): State<ApiState>, Json(request): Json<ChatRequest>) -> impl IntoResponse {
    let top_k = state.config.chat_top_k(request.top_k);
    let response = state.concierge.respond(&request.message, top_k).await;

    Json(ChatResponse {
        success: true,
        query: response.query,
        intent: response.intent,
        confidence: response.confidence,
        entities: ChatEntities {
            services: response.entities,
        },
        suggestions: response.suggestions,
        reply: response.reply,
    })
}
