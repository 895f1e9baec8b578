use std::collections::{BTreeMap, HashMap, HashSet};

use dental_core::VectorizeError;

use crate::tokenize::{ngrams, tokenize};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TfidfConfig {
    pub min_n: usize,
    pub max_n: usize,
    /// Terms seen in fewer documents are dropped.
    pub min_df: usize,
    /// Terms seen in a larger share of documents are dropped.
    pub max_df_ratio: f64,
}

impl Default for TfidfConfig {
    fn default() -> Self {
        Self {
            min_n: 1,
            max_n: 3,
            min_df: 1,
            max_df_ratio: 0.9,
        }
    }
}

/// L2-normalised sparse vector, entries sorted by term index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f32)>,
}

impl SparseVector {
    fn from_weights(weights: BTreeMap<usize, f32>) -> Self {
        let norm = weights.values().map(|w| w * w).sum::<f32>().sqrt();
        if norm == 0.0 {
            return Self::default();
        }

        Self {
            entries: weights
                .into_iter()
                .filter(|(_, w)| *w != 0.0)
                .map(|(idx, w)| (idx, w / norm))
                .collect(),
        }
    }

    pub fn get(&self, index: usize) -> f32 {
        self.entries
            .binary_search_by_key(&index, |(idx, _)| *idx)
            .map(|pos| self.entries[pos].1)
            .unwrap_or(0.0)
    }

    fn norm(&self) -> f32 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt()
    }

    fn dot(&self, other: &Self) -> f32 {
        let (mut i, mut j) = (0, 0);
        let mut dot = 0.0;
        while i < self.entries.len() && j < other.entries.len() {
            let (a_idx, a_w) = self.entries[i];
            let (b_idx, b_w) = other.entries[j];
            if a_idx == b_idx {
                dot += a_w * b_w;
                i += 1;
                j += 1;
            } else if a_idx < b_idx {
                i += 1;
            } else {
                j += 1;
            }
        }
        dot
    }
}

pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f32 {
    let denom = a.norm() * b.norm();
    if denom == 0.0 {
        0.0
    } else {
        (a.dot(b) / denom).clamp(0.0, 1.0)
    }
}

/// Term-weighting model fitted on a fixed corpus, plus one vector per document.
#[derive(Debug, Clone)]
pub struct TfidfIndex {
    config: TfidfConfig,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    doc_vectors: Vec<SparseVector>,
}

impl TfidfIndex {
    pub fn fit(documents: &[String], config: TfidfConfig) -> Self {
        let analyzed = documents
            .iter()
            .map(|doc| ngrams(&tokenize(doc), config.min_n, config.max_n))
            .collect::<Vec<_>>();

        let mut document_frequency: BTreeMap<&str, usize> = BTreeMap::new();
        for terms in &analyzed {
            let unique = terms.iter().map(String::as_str).collect::<HashSet<_>>();
            for term in unique {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        let n_docs = documents.len();
        let max_doc_count = config.max_df_ratio * n_docs as f64;

        // BTreeMap order gives a stable, sorted vocabulary.
        let kept = document_frequency
            .into_iter()
            .filter(|(_, df)| *df >= config.min_df && (*df as f64) <= max_doc_count)
            .collect::<Vec<_>>();

        let mut vocabulary = HashMap::with_capacity(kept.len());
        let mut idf = Vec::with_capacity(kept.len());
        for (idx, (term, df)) in kept.into_iter().enumerate() {
            vocabulary.insert(term.to_string(), idx);
            idf.push(smoothed_idf(n_docs, df));
        }

        let doc_vectors = analyzed
            .iter()
            .map(|terms| weigh(&vocabulary, &idf, terms))
            .collect();

        Self {
            config,
            vocabulary,
            idf,
            doc_vectors,
        }
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    pub fn document_count(&self) -> usize {
        self.doc_vectors.len()
    }

    pub fn document_vector(&self, doc: usize) -> Option<&SparseVector> {
        self.doc_vectors.get(doc)
    }

    /// Projects `text` onto the fitted vocabulary. Unknown terms are ignored.
    pub fn transform(&self, text: &str) -> Result<SparseVector, VectorizeError> {
        if self.vocabulary.is_empty() {
            return Err(VectorizeError::EmptyVocabulary);
        }

        let terms = ngrams(&tokenize(text), self.config.min_n, self.config.max_n);
        Ok(weigh(&self.vocabulary, &self.idf, &terms))
    }

    /// Cosine similarity of `text` against every fitted document, in corpus order.
    pub fn similarities(&self, text: &str) -> Result<Vec<f32>, VectorizeError> {
        let query = self.transform(text)?;
        Ok(self
            .doc_vectors
            .iter()
            .map(|doc| cosine_similarity(&query, doc))
            .collect())
    }
}

/// Raw counts of in-vocabulary terms scaled by idf.
fn weigh(vocabulary: &HashMap<String, usize>, idf: &[f32], terms: &[String]) -> SparseVector {
    let mut weights: BTreeMap<usize, f32> = BTreeMap::new();
    for term in terms {
        if let Some(&idx) = vocabulary.get(term) {
            *weights.entry(idx).or_insert(0.0) += 1.0;
        }
    }
    for (idx, weight) in weights.iter_mut() {
        *weight *= idf[*idx];
    }
    SparseVector::from_weights(weights)
}

fn smoothed_idf(n_docs: usize, df: usize) -> f32 {
    (((1 + n_docs) as f32) / ((1 + df) as f32)).ln() + 1.0
}
