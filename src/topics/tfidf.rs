// TF-IDF feature extraction over a bounded vocabulary.
//
// Each review is a separate document for IDF computation: words that appear
// in nearly every review get pruned or downweighted, while words distinctive
// to a subset of reviews are boosted. That is exactly the signal the clusterer
// needs to separate topics.

use std::collections::{HashMap, HashSet};

use indexmap::IndexSet;
use rayon::prelude::*;
use stop_words::{get, LANGUAGE};
use tracing::{debug, warn};

use crate::error::AnalysisError;
use crate::text::tokenize;

/// Ordered set of retained terms. Term ids are positions in this set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vocabulary {
    terms: IndexSet<String>,
}

impl Vocabulary {
    pub fn from_terms<I: IntoIterator<Item = String>>(terms: I) -> Self {
        Self {
            terms: terms.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn term(&self, id: usize) -> Option<&str> {
        self.terms.get_index(id).map(String::as_str)
    }

    pub fn id(&self, term: &str) -> Option<usize> {
        self.terms.get_index_of(term)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(String::as_str)
    }
}

/// A sparse feature vector: `(term id, weight)` pairs sorted by term id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    pub entries: Vec<(usize, f64)>,
}

impl SparseVector {
    pub fn is_zero(&self) -> bool {
        self.entries.iter().all(|(_, w)| *w == 0.0)
    }

    pub fn norm(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt()
    }

    /// Weight for a term id, zero if absent.
    pub fn get(&self, id: usize) -> f64 {
        self.entries
            .binary_search_by_key(&id, |(i, _)| *i)
            .map(|pos| self.entries[pos].1)
            .unwrap_or(0.0)
    }
}

/// The vectorizer's output: one row per input document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureMatrix {
    pub vocabulary: Vocabulary,
    pub rows: Vec<SparseVector>,
}

impl FeatureMatrix {
    pub fn dims(&self) -> usize {
        self.vocabulary.len()
    }
}

/// TF-IDF vectorizer with document-frequency pruning and a vocabulary cap.
pub struct TfIdfVectorizer {
    /// Maximum vocabulary size, keeping the most frequent terms
    pub max_features: usize,
    /// Minimum number of documents a term must appear in
    pub min_df: usize,
    /// Maximum fraction of documents a term may appear in
    pub max_df: f64,
    /// Terms excluded regardless of frequency
    pub stop_words: HashSet<String>,
}

impl Default for TfIdfVectorizer {
    fn default() -> Self {
        Self::new(2000, 2, 0.95)
    }
}

impl TfIdfVectorizer {
    /// Vectorizer using the NLTK English stop words from the `stop-words`
    /// crate. That list holds function words only; sentiment and product
    /// words ("great", "good", "value") are kept.
    pub fn new(max_features: usize, min_df: usize, max_df: f64) -> Self {
        let stop_words: Vec<String> = get(LANGUAGE::English);
        Self {
            max_features,
            min_df,
            max_df,
            stop_words: stop_words.into_iter().collect(),
        }
    }

    /// Build the vocabulary from `docs` and return their weighted vectors.
    ///
    /// `docs` must already be normalized. An empty vocabulary is not an error:
    /// every row comes back as a zero vector.
    pub fn fit_transform(&self, docs: &[String]) -> Result<FeatureMatrix, AnalysisError> {
        if docs.is_empty() {
            return Err(AnalysisError::EmptyDocuments);
        }
        let n_docs = docs.len();

        let term_counts: Vec<HashMap<&str, u32>> = docs
            .par_iter()
            .map(|doc| {
                let mut counts = HashMap::new();
                for token in tokenize(doc).filter(|t| !self.stop_words.contains(*t)) {
                    *counts.entry(token).or_insert(0) += 1;
                }
                counts
            })
            .collect();

        // Document frequency and total corpus frequency per term
        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        let mut corpus_freq: HashMap<&str, u64> = HashMap::new();
        for counts in &term_counts {
            for (&term, &count) in counts {
                *doc_freq.entry(term).or_insert(0) += 1;
                *corpus_freq.entry(term).or_insert(0) += count as u64;
            }
        }

        let max_doc_count = self.max_df * n_docs as f64;
        let mut kept: Vec<&str> = doc_freq
            .iter()
            .filter(|(_, &df)| df >= self.min_df && df as f64 <= max_doc_count)
            .map(|(&term, _)| term)
            .collect();

        if kept.len() > self.max_features {
            kept.sort_by(|a, b| corpus_freq[b].cmp(&corpus_freq[a]).then_with(|| a.cmp(b)));
            kept.truncate(self.max_features);
        }
        kept.sort_unstable();

        let vocabulary = Vocabulary::from_terms(kept.iter().map(|t| t.to_string()));
        if vocabulary.is_empty() {
            warn!(
                documents = n_docs,
                distinct_terms = doc_freq.len(),
                "Vocabulary is empty after frequency filtering"
            );
        } else {
            debug!(
                documents = n_docs,
                vocabulary = vocabulary.len(),
                distinct_terms = doc_freq.len(),
                "Built TF-IDF vocabulary"
            );
        }

        let idf: Vec<f64> = kept
            .iter()
            .map(|term| ((1.0 + n_docs as f64) / (1.0 + doc_freq[term] as f64)).ln())
            .collect();

        let rows = term_counts
            .par_iter()
            .map(|counts| {
                let mut entries: Vec<(usize, f64)> = counts
                    .iter()
                    .filter_map(|(term, &count)| {
                        vocabulary.id(term).map(|id| (id, count as f64 * idf[id]))
                    })
                    .collect();
                entries.sort_unstable_by_key(|(id, _)| *id);
                let mut row = SparseVector { entries };
                let norm = row.norm();
                if norm > 0.0 {
                    for (_, w) in &mut row.entries {
                        *w /= norm;
                    }
                }
                row
            })
            .collect();

        Ok(FeatureMatrix { vocabulary, rows })
    }
}
