mod payload;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use dental_core::{CatalogError, ServiceRecord};
use reqwest::header::ACCEPT;
use serde_json::Value;
use tracing::{debug, info};

pub use payload::parse_services_payload;

pub const SERVICES_PATH: &str = "/api/services";

/// Where the concierge gets its service catalog from.
pub trait CatalogSource: Send + Sync {
    async fn fetch_services(&self) -> Result<Vec<ServiceRecord>, CatalogError>;
}

/// Pulls `<base>/api/services` from the clinic backend.
#[derive(Clone)]
pub struct HttpCatalogSource {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpCatalogSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CatalogError> {
        let endpoint = format!("{}{SERVICES_PATH}", base_url.trim_end_matches('/'));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| CatalogError::Http {
                endpoint: endpoint.clone(),
                message: format!("http client build: {err}"),
            })?;

        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn map_error(&self, err: reqwest::Error) -> CatalogError {
        if err.is_timeout() {
            CatalogError::Timeout {
                endpoint: self.endpoint.clone(),
                seconds: self.timeout.as_secs(),
            }
        } else if err.is_decode() {
            CatalogError::Malformed(err.to_string())
        } else {
            CatalogError::Http {
                endpoint: self.endpoint.clone(),
                message: err.to_string(),
            }
        }
    }
}

impl CatalogSource for HttpCatalogSource {
    async fn fetch_services(&self) -> Result<Vec<ServiceRecord>, CatalogError> {
        debug!(endpoint = %self.endpoint, "fetching service catalog");

        let payload = self
            .client
            .get(&self.endpoint)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| self.map_error(err))?
            .json::<Value>()
            .await
            .map_err(|err| self.map_error(err))?;

        let records = parse_services_payload(payload)?;
        info!(endpoint = %self.endpoint, records = records.len(), "fetched service catalog");
        Ok(records)
    }
}

/// Fixed catalog, used offline by the CLI and by tests.
#[derive(Clone, Default)]
pub struct StaticCatalogSource {
    records: Arc<Vec<ServiceRecord>>,
}

impl StaticCatalogSource {
    pub fn new(records: Vec<ServiceRecord>) -> Self {
        Self {
            records: Arc::new(records),
        }
    }

    /// Reads a JSON file in the same shape the backend serves.
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|err| CatalogError::Io {
                path: path.display().to_string(),
                message: err.to_string(),
            })?;
        let payload = serde_json::from_str::<Value>(&raw)
            .map_err(|err| CatalogError::Malformed(format!("{}: {err}", path.display())))?;

        Ok(Self::new(parse_services_payload(payload)?))
    }
}

impl CatalogSource for StaticCatalogSource {
    async fn fetch_services(&self) -> Result<Vec<ServiceRecord>, CatalogError> {
        if self.records.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(self.records.as_ref().clone())
    }
}

#[derive(Clone)]
pub enum CatalogBackend {
    Http(HttpCatalogSource),
    Static(StaticCatalogSource),
}

impl CatalogBackend {
    pub fn http(base_url: &str, timeout: Duration) -> Result<Self, CatalogError> {
        Ok(Self::Http(HttpCatalogSource::new(base_url, timeout)?))
    }

    pub fn fixed(records: Vec<ServiceRecord>) -> Self {
        Self::Static(StaticCatalogSource::new(records))
    }

    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        Ok(Self::Static(StaticCatalogSource::from_json_file(path).await?))
    }

    /// Human-readable origin, reported by health checks.
    pub fn describe(&self) -> String {
        match self {
            CatalogBackend::Http(source) => source.endpoint().to_string(),
            CatalogBackend::Static(_) => "static".to_string(),
        }
    }
}

impl CatalogSource for CatalogBackend {
    async fn fetch_services(&self) -> Result<Vec<ServiceRecord>, CatalogError> {
        match self {
            CatalogBackend::Http(source) => source.fetch_services().await,
            CatalogBackend::Static(source) => source.fetch_services().await,
        }
    }
}
