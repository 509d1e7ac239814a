// Static dataset loading with an explicit memoized cache.
//
// A dataset is a directory holding the two tables a previous analysis wrote:
// `topic_summaries.csv` and `reviews_with_topics.csv`. The first request for
// a directory loads and aggregates it; every later request for the same
// canonical path shares the same `Arc`. Entries are never invalidated.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use tracing::{debug, info};

use super::analysis::{PREVIEW_COLUMN, SCORE_COLUMN, TEXT_COLUMN, TOPIC_COLUMN};
use crate::error::DatasetError;
use crate::table::schema::{parse_number, NEUTRAL_SCORE};
use crate::table::Table;
use crate::topics::stats::{self, TopicSummary};

pub const SUMMARIES_FILE: &str = "topic_summaries.csv";
pub const REVIEWS_FILE: &str = "reviews_with_topics.csv";

/// Topic id used for outlier rows, which are excluded from a dataset.
const OUTLIER_TOPIC: i64 = -1;

/// A precomputed analysis loaded from disk.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub topics: Vec<TopicSummary>,
    pub reviews: Table,
}

impl Dataset {
    /// Load both tables from `dir`, drop outlier rows, and recompute
    /// per-topic counts and mean scores from the review rows.
    ///
    /// When the reviews carry a `Score` column, `review_count` counts only
    /// rows with a numeric score; without one, every row of the topic counts.
    /// Rows whose topic cell is not a number stay in `reviews` but belong to
    /// no topic.
    pub fn load(dir: &Path) -> Result<Self, DatasetError> {
        let summaries = read_table(&dir.join(SUMMARIES_FILE))?;
        let mut reviews = read_table(&dir.join(REVIEWS_FILE))?;

        let topic_idx = require_column(&reviews, TOPIC_COLUMN, &dir.join(REVIEWS_FILE))?;
        reviews.retain_rows(|row| parse_topic(&row[topic_idx]) != Some(OUTLIER_TOPIC));

        let summaries_path = dir.join(SUMMARIES_FILE);
        let id_idx = require_column(&summaries, "topic_id", &summaries_path)?;
        let name_idx = require_column(&summaries, "topic_name", &summaries_path)?;
        let summary_idx = summaries.column_index("summary");

        let mut topics: Vec<TopicSummary> = summaries
            .rows()
            .iter()
            .filter_map(|row| {
                let topic_id = parse_topic(&row[id_idx])?;
                (topic_id != OUTLIER_TOPIC).then(|| TopicSummary {
                    topic_id,
                    topic_name: row[name_idx].clone(),
                    summary: summary_idx
                        .map(|i| row[i].clone())
                        .filter(|s| !s.trim().is_empty())
                        .unwrap_or_else(|| crate::topics::label::NO_SUMMARY.to_string()),
                    review_count: 0,
                    avg_score: NEUTRAL_SCORE,
                })
            })
            .collect();

        let score_idx = reviews.column_index(SCORE_COLUMN);
        let pairs: Vec<(i64, Option<f64>)> = reviews
            .rows()
            .iter()
            .filter_map(|row| {
                let topic = parse_topic(&row[topic_idx])?;
                match score_idx {
                    Some(i) => Some((topic, Some(parse_number(&row[i])?))),
                    None => Some((topic, None)),
                }
            })
            .collect();
        stats::aggregate(&mut topics, &pairs);

        info!(
            dir = %dir.display(),
            topics = topics.len(),
            reviews = reviews.len(),
            "Loaded static dataset"
        );

        Ok(Self { topics, reviews })
    }

    pub fn topic(&self, topic_id: i64) -> Option<&TopicSummary> {
        self.topics.iter().find(|t| t.topic_id == topic_id)
    }
}

fn read_table(path: &Path) -> Result<Table, DatasetError> {
    if !path.exists() {
        return Err(DatasetError::Missing(path.to_path_buf()));
    }
    let read_err = |source| DatasetError::Read {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(read_err)?;
    Table::from_reader(&mut reader).map_err(read_err)
}

fn require_column(table: &Table, column: &str, path: &Path) -> Result<usize, DatasetError> {
    table
        .column_index(column)
        .ok_or_else(|| DatasetError::MissingColumn {
            path: path.to_path_buf(),
            column: column.to_string(),
        })
}

/// Topic ids may have been written as floats ("3.0") by other tools.
fn parse_topic(cell: &str) -> Option<i64> {
    let value = parse_number(cell)?;
    (value.fract() == 0.0).then_some(value as i64)
}

/// Process-wide memo of loaded datasets, keyed by canonical directory path.
#[derive(Default)]
pub struct DatasetCache {
    entries: RwLock<HashMap<PathBuf, Arc<Dataset>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached dataset for `dir`, loading it on first access.
    pub fn get_or_load(&self, dir: &Path) -> Result<Arc<Dataset>, DatasetError> {
        let key = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());

        if let Some(hit) = self
            .entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&key)
        {
            debug!(dir = %key.display(), "Dataset cache hit");
            return Ok(Arc::clone(hit));
        }

        let loaded = Arc::new(Dataset::load(&key)?);
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        // Another thread may have loaded it while we were reading from disk
        let entry = entries.entry(key).or_insert(loaded);
        Ok(Arc::clone(entry))
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One review as shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewView {
    pub title: String,
    pub text: String,
    pub score: f64,
}

/// Reviews chosen for display from one topic.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewSelection {
    pub reviews: Vec<ReviewView>,
    /// Matching reviews before the display limit was applied
    pub matched: usize,
    pub search_active: bool,
}

/// Pick up to `limit` reviews of `topic_id` from an annotated table.
///
/// With a non-blank `query`, keeps reviews whose title or text contains it
/// (case-insensitive) in table order. Without one, draws a seeded random
/// sample so repeated views show the same reviews.
pub fn select_reviews(
    documents: &Table,
    topic_id: i64,
    query: Option<&str>,
    limit: usize,
) -> ReviewSelection {
    let topic_idx = documents.column_index(TOPIC_COLUMN);
    let text_idx = documents.column_index(TEXT_COLUMN);
    let title_idx = documents.column_index(PREVIEW_COLUMN);
    let score_idx = documents.column_index(SCORE_COLUMN);

    let cell = |row: &[String], idx: Option<usize>| -> String {
        idx.map(|i| row[i].clone()).unwrap_or_default()
    };

    let in_topic: Vec<&Vec<String>> = documents
        .rows()
        .iter()
        .filter(|row| topic_idx.and_then(|i| parse_topic(&row[i])) == Some(topic_id))
        .collect();

    let query = query.map(str::trim).filter(|q| !q.is_empty());
    let (picked, matched): (Vec<&Vec<String>>, usize) = match query {
        Some(q) => {
            let needle = q.to_lowercase();
            let hits: Vec<&Vec<String>> = in_topic
                .into_iter()
                .filter(|row| {
                    [title_idx, text_idx]
                        .into_iter()
                        .any(|idx| cell(row.as_slice(), idx).to_lowercase().contains(&needle))
                })
                .collect();
            let matched = hits.len();
            (hits.into_iter().take(limit).collect(), matched)
        }
        None => {
            let total = in_topic.len();
            let mut rng = StdRng::seed_from_u64(42);
            let sample = index::sample(&mut rng, total, limit.min(total));
            (sample.into_iter().map(|i| in_topic[i]).collect(), total)
        }
    };

    let reviews = picked
        .into_iter()
        .map(|row| ReviewView {
            title: cell(row.as_slice(), title_idx),
            text: cell(row.as_slice(), text_idx),
            score: score_idx
                .and_then(|i| parse_number(&row[i]))
                .unwrap_or(NEUTRAL_SCORE),
        })
        .collect();

    ReviewSelection {
        reviews,
        matched,
        search_active: query.is_some(),
    }
}
