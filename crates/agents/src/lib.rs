use std::sync::Arc;
use std::time::Instant;

use dental_catalog::CatalogSource;
use dental_core::{
    compose_reply, expand_abbreviations, normalize_text, CatalogStats, DialogResponse, Intent,
    IntentClassifier, IntentResult, KeywordDetector, ScoredService, ServiceRecord,
};
use dental_observability::AppMetrics;
use dental_retrieval::{RefreshOutcome, ServiceCatalog};
use tracing::{info, instrument};

/// Records listed under `top_affordable` in catalog stats.
pub const AFFORDABLE_LISTED: usize = 3;

/// Ties the catalog, its source and the rule-based text components into
/// the operations the API and CLI expose.
#[derive(Clone)]
pub struct DentalConcierge<S>
where
    S: CatalogSource,
{
    catalog: Arc<ServiceCatalog>,
    source: Arc<S>,
    classifier: IntentClassifier,
    keywords: KeywordDetector,
    metrics: Arc<AppMetrics>,
}

impl<S> DentalConcierge<S>
where
    S: CatalogSource,
{
    pub fn new(catalog: Arc<ServiceCatalog>, source: Arc<S>, metrics: Arc<AppMetrics>) -> Self {
        Self {
            catalog,
            source,
            classifier: IntentClassifier::default(),
            keywords: KeywordDetector::default(),
            metrics,
        }
    }

    pub fn catalog(&self) -> &ServiceCatalog {
        &self.catalog
    }

    pub fn metrics(&self) -> &AppMetrics {
        &self.metrics
    }

    /// One fetch from the source; the current snapshot survives a failure.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> RefreshOutcome {
        let source = self.source.clone();
        let outcome = self
            .catalog
            .refresh_with(|| async move { source.fetch_services().await })
            .await;
        self.metrics.record_refresh(outcome.refreshed);
        outcome
    }

    /// Ranked services for `query`. Refreshes first when asked to, or when
    /// nothing has been loaded yet.
    #[instrument(skip(self))]
    pub async fn rank(&self, query: &str, top_k: usize, refresh: bool) -> Vec<ScoredService> {
        let started = Instant::now();
        self.metrics.inc_request();
        self.ensure_loaded(refresh).await;

        let results = self.catalog.query(query, top_k);
        self.metrics.add_suggestions(results.len());
        self.metrics.observe_latency(started.elapsed());
        results
    }

    pub fn classify(&self, message: &str) -> IntentResult {
        let text = expand_abbreviations(&normalize_text(message));
        self.classifier.predict(&text)
    }

    #[instrument(skip(self, message))]
    pub async fn respond(&self, message: &str, top_k: usize) -> DialogResponse {
        let started = Instant::now();
        self.metrics.inc_request();

        let text = expand_abbreviations(&normalize_text(message));
        let IntentResult { intent, confidence } = self.classifier.predict(&text);
        let keywords = self.keywords.find_keywords(&text);

        let suggestions = if intent.wants_suggestions() || !keywords.is_empty() {
            let query = if keywords.is_empty() {
                text.clone()
            } else {
                format!("{} {}", keywords.join(" "), text)
            };
            self.ensure_loaded(false).await;
            self.catalog.query(&query, top_k)
        } else {
            Vec::new()
        };

        let response = compose_reply(intent, confidence, &keywords, &suggestions, message);

        self.metrics.add_suggestions(suggestions.len());
        if intent == Intent::Unknown || (intent.wants_suggestions() && suggestions.is_empty()) {
            self.metrics.inc_fallback();
        }
        self.metrics.observe_latency(started.elapsed());
        info!(
            intent = intent.as_str(),
            confidence,
            entities = keywords.len(),
            suggestions = suggestions.len(),
            "chat handled"
        );

        response
    }

    /// Aggregates over the catalog in effect right now. Never refreshes.
    pub fn snapshot_stats(&self) -> CatalogStats {
        self.catalog.stats(AFFORDABLE_LISTED)
    }

    pub async fn list_services(&self) -> Vec<ServiceRecord> {
        self.ensure_loaded(false).await;
        self.catalog.snapshot().records().to_vec()
    }

    /// Runs the auto-refresh rule; returns the record count now in effect.
    pub async fn ensure_loaded(&self, force: bool) -> usize {
        if force || self.catalog.is_empty() {
            self.refresh().await.count
        } else {
            self.catalog.len()
        }
    }
}
