use anyhow::{Context, Result};
use dental_api::{build_app, ApiConfig};
use dental_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("dental_api");

    let config = ApiConfig::from_env();
    let bind = config.bind.clone();
    let backend_url = config.backend_url.clone();

    let app = build_app(config).await?;

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    tracing::info!(bind = %bind, backend_url = %backend_url, "dental concierge api started");

    axum::serve(listener, app).await?;
    Ok(())
}
