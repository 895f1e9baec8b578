mod snapshot;
mod tfidf;
mod tokenize;

use std::future::Future;
use std::sync::Arc;

use dental_core::{CatalogError, CatalogStats, ScoredService, ServiceRecord};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{info, warn};

pub use snapshot::CatalogSnapshot;
pub use tfidf::{cosine_similarity, SparseVector, TfidfConfig, TfidfIndex};
pub use tokenize::{ngrams, tokenize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshOutcome {
    /// True when a new snapshot was swapped in.
    pub refreshed: bool,
    /// Records in the snapshot now in effect.
    pub count: usize,
    pub error: Option<String>,
}

/// Holds the live catalog snapshot. Readers clone the `Arc` and keep a
/// consistent (records, index) pair even while a refresh swaps in a new one.
pub struct ServiceCatalog {
    current: RwLock<Arc<CatalogSnapshot>>,
    config: TfidfConfig,
}

impl Default for ServiceCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceCatalog {
    pub fn new() -> Self {
        Self::with_config(TfidfConfig::default())
    }

    pub fn with_config(config: TfidfConfig) -> Self {
        Self {
            current: RwLock::new(Arc::new(CatalogSnapshot::empty())),
            config,
        }
    }

    pub fn with_records(records: Vec<ServiceRecord>) -> Self {
        let catalog = Self::new();
        catalog.replace(records);
        catalog
    }

    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.current.read().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.current.read().is_empty()
    }

    pub fn len(&self) -> usize {
        self.current.read().len()
    }

    /// Fits a new index outside the lock, then swaps it in.
    pub fn replace(&self, records: Vec<ServiceRecord>) -> Arc<CatalogSnapshot> {
        let next = Arc::new(CatalogSnapshot::build_with(records, self.config));
        *self.current.write() = next.clone();
        next
    }

    /// Runs one fetch and swaps in its result. On failure the snapshot in
    /// effect (last-known-good, or empty on first load) is kept.
    pub async fn refresh_with<F, Fut>(&self, fetch: F) -> RefreshOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<ServiceRecord>, CatalogError>>,
    {
        match fetch().await {
            Ok(records) if records.is_empty() => self.keep_current(CatalogError::Empty),
            Ok(records) => {
                let snapshot = self.replace(records);
                info!(
                    records = snapshot.len(),
                    vocabulary = snapshot.index().vocabulary_len(),
                    "catalog refreshed"
                );
                RefreshOutcome {
                    refreshed: true,
                    count: snapshot.len(),
                    error: None,
                }
            }
            Err(err) => self.keep_current(err),
        }
    }

    pub fn query(&self, text: &str, top_k: usize) -> Vec<ScoredService> {
        self.snapshot().query(text, top_k)
    }

    pub fn stats(&self, cheapest_n: usize) -> CatalogStats {
        self.snapshot().stats(cheapest_n)
    }

    fn keep_current(&self, err: CatalogError) -> RefreshOutcome {
        let count = self.len();
        warn!(
            error = %err,
            kept_records = count,
            last_known_good = count > 0,
            "catalog refresh failed; keeping current snapshot"
        );
        RefreshOutcome {
            refreshed: false,
            count,
            error: Some(err.to_string()),
        }
    }
}
