use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use dental_core::{AffordableService, CatalogStats, ScoredService, ServiceRecord};
use tracing::warn;

use crate::tfidf::{TfidfConfig, TfidfIndex};

/// Records plus the index fitted on exactly those records. Never mutated.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    records: Vec<ServiceRecord>,
    index: TfidfIndex,
    loaded_at: Option<DateTime<Utc>>,
}

impl CatalogSnapshot {
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            index: TfidfIndex::fit(&[String::new()], TfidfConfig::default()),
            loaded_at: None,
        }
    }

    pub fn build(records: Vec<ServiceRecord>) -> Self {
        Self::build_with(records, TfidfConfig::default())
    }

    pub fn build_with(records: Vec<ServiceRecord>, config: TfidfConfig) -> Self {
        let mut documents = records.iter().map(ServiceRecord::text).collect::<Vec<_>>();
        if documents.is_empty() {
            documents.push(String::new());
        }

        Self {
            index: TfidfIndex::fit(&documents, config),
            records,
            loaded_at: Some(Utc::now()),
        }
    }

    pub fn records(&self) -> &[ServiceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn index(&self) -> &TfidfIndex {
        &self.index
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    /// Top `top_k` records by cosine similarity, ties in catalog order.
    /// A blank query returns the cheapest records with score 0.
    pub fn query(&self, text: &str, top_k: usize) -> Vec<ScoredService> {
        if self.records.is_empty() || top_k == 0 {
            return Vec::new();
        }

        let query = text.trim().to_lowercase();
        if query.is_empty() {
            return self.cheapest(top_k);
        }

        let similarities = self.index.similarities(&query).unwrap_or_else(|err| {
            warn!(error = %err, "query vectorization failed; scoring all services as zero");
            vec![0.0; self.records.len()]
        });

        let mut order = (0..self.records.len()).collect::<Vec<_>>();
        order.sort_by(|a, b| {
            let lhs = similarities.get(*a).copied().unwrap_or(0.0);
            let rhs = similarities.get(*b).copied().unwrap_or(0.0);
            rhs.partial_cmp(&lhs).unwrap_or(Ordering::Equal)
        });

        order
            .into_iter()
            .take(top_k)
            .map(|idx| ScoredService {
                service: self.records[idx].clone(),
                score: similarities.get(idx).copied().unwrap_or(0.0),
            })
            .collect()
    }

    /// Cheapest first; unpriced records last; ties in catalog order.
    pub fn cheapest(&self, top_k: usize) -> Vec<ScoredService> {
        let mut sorted = self.records.iter().collect::<Vec<_>>();
        sorted.sort_by(|a, b| compare_price(a.price, b.price));

        sorted
            .into_iter()
            .take(top_k)
            .map(|record| ScoredService {
                service: record.clone(),
                score: 0.0,
            })
            .collect()
    }

    pub fn stats(&self, cheapest_n: usize) -> CatalogStats {
        if self.records.is_empty() {
            return CatalogStats::default();
        }

        let prices = self
            .records
            .iter()
            .filter_map(|record| record.price)
            .collect::<Vec<_>>();
        let durations = self
            .records
            .iter()
            .filter_map(|record| record.duration_minutes)
            .map(f64::from)
            .collect::<Vec<_>>();

        let top_affordable = self
            .cheapest(cheapest_n)
            .into_iter()
            .filter_map(|scored| {
                scored.service.price.map(|price| AffordableService {
                    name: scored.service.name,
                    price,
                })
            })
            .collect();

        CatalogStats {
            count: self.records.len(),
            price_min: prices.iter().copied().reduce(f64::min).unwrap_or(0.0),
            price_max: prices.iter().copied().reduce(f64::max).unwrap_or(0.0),
            price_mean: mean(&prices),
            avg_duration_minutes: mean(&durations),
            top_affordable,
        }
    }
}

fn compare_price(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(lhs), Some(rhs)) => lhs.partial_cmp(&rhs).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
