use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

/// Process-wide counters, exposed through `/health` and `dental stats`.
#[derive(Debug, Default)]
pub struct AppMetrics {
    requests_total: AtomicU64,
    refresh_total: AtomicU64,
    refresh_failures_total: AtomicU64,
    suggestions_served_total: AtomicU64,
    fallback_replies_total: AtomicU64,
    total_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub refresh_total: u64,
    pub refresh_failures_total: u64,
    pub suggestions_served_total: u64,
    pub fallback_replies_total: u64,
    pub avg_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts one refresh attempt, and a failure when it did not swap.
    pub fn record_refresh(&self, refreshed: bool) {
        self.refresh_total.fetch_add(1, Ordering::Relaxed);
        if !refreshed {
            self.refresh_failures_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn add_suggestions(&self, served: usize) {
        self.suggestions_served_total
            .fetch_add(served as u64, Ordering::Relaxed);
    }

    pub fn inc_fallback(&self) {
        self.fallback_replies_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests = self.requests_total.load(Ordering::Relaxed);
        let latency = self.total_latency_millis.load(Ordering::Relaxed);

        MetricsSnapshot {
            requests_total: requests,
            refresh_total: self.refresh_total.load(Ordering::Relaxed),
            refresh_failures_total: self.refresh_failures_total.load(Ordering::Relaxed),
            suggestions_served_total: self.suggestions_served_total.load(Ordering::Relaxed),
            fallback_replies_total: self.fallback_replies_total.load(Ordering::Relaxed),
            avg_latency_millis: if requests == 0 {
                0.0
            } else {
                latency as f64 / requests as f64
            },
        }
    }
}

/// JSON logs filtered by `RUST_LOG`, or info for the dental crates.
/// Safe to call more than once.
pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,dental_api=info,dental_agents=info,dental_retrieval=info,dental_catalog=info",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .init();
    });
}
