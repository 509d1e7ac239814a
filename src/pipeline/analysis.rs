// Review analysis pipeline: clean → vectorize → cluster → label → aggregate.
//
// One call processes one table start to finish and returns either a complete
// `Analysis` or an input error raised before any work begins. Nothing is
// shared between runs except the read-only configuration.

use rayon::prelude::*;
use tracing::{info, warn};

use crate::error::AnalysisError;
use crate::progress::{Phase, ProgressSink};
use crate::table::schema::{self, ScoreColumn, NEUTRAL_SCORE};
use crate::table::Table;
use crate::text::normalize;
use crate::topics::kmeans::{clamp_topic_count, KMeans};
use crate::topics::label::{extractive_summary, top_terms, topic_name, LABEL_TERMS};
use crate::topics::stats::{self, format_score, TopicSummary};
use crate::topics::tfidf::TfIdfVectorizer;
use crate::topics::traits::Clusterer;

/// Column names added to the annotated document table.
pub const TOPIC_COLUMN: &str = "topic";
pub const SCORE_COLUMN: &str = "Score";
pub const PREVIEW_COLUMN: &str = "Summary";
pub const TEXT_COLUMN: &str = "Text";

/// Characters of review text kept in the per-row preview column.
pub const PREVIEW_CHARS: usize = 80;

/// Tunables for one analysis run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub max_features: usize,
    pub min_df: usize,
    pub max_df: f64,
    pub seed: u64,
    pub max_iter: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_features: 2000,
            min_df: 2,
            max_df: 0.95,
            seed: 42,
            max_iter: 300,
        }
    }
}

/// Complete output of a pipeline run.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// One row per topic, ids `0..effective_topics`
    pub topics: Vec<TopicSummary>,
    /// The input rows plus topic, Score, Summary and Text columns
    pub documents: Table,
    /// Topic id per input row, in row order
    pub assignments: Vec<usize>,
    pub requested_topics: usize,
    pub effective_topics: usize,
    pub vocabulary_size: usize,
    /// True when frequency filtering left no vocabulary
    pub degenerate: bool,
    pub score_column: ScoreColumn,
}

/// Pick the text column to analyze: the requested one if present, otherwise
/// the first column holding free text.
pub fn choose_text_column(table: &Table, requested: Option<&str>) -> Result<String, AnalysisError> {
    match requested {
        Some(name) if table.column_index(name).is_some() => Ok(name.to_string()),
        Some(name) => Err(AnalysisError::MissingColumn(name.to_string())),
        None => schema::text_columns(table)
            .into_iter()
            .next()
            .ok_or(AnalysisError::NoTextColumns),
    }
}

/// Discover topics in `table[text_column]`.
pub fn run_analysis(
    table: &Table,
    text_column: &str,
    topic_count: usize,
    config: &AnalysisConfig,
    progress: &dyn ProgressSink,
) -> Result<Analysis, AnalysisError> {
    let texts: Vec<String> = table
        .column(text_column)
        .ok_or_else(|| AnalysisError::MissingColumn(text_column.to_string()))?
        .into_iter()
        .map(str::to_string)
        .collect();
    if texts.is_empty() {
        return Err(AnalysisError::EmptyDocuments);
    }
    if topic_count == 0 {
        return Err(AnalysisError::InvalidTopicCount(topic_count));
    }

    info!(
        documents = texts.len(),
        column = text_column,
        requested_topics = topic_count,
        "Starting review analysis"
    );

    // Step 1: normalize
    let cleaned: Vec<String> = texts.par_iter().map(|t| normalize(t)).collect();
    progress.phase_done(Phase::Cleaning);

    // Step 2: vectorize
    let vectorizer = TfIdfVectorizer::new(config.max_features, config.min_df, config.max_df);
    let matrix = vectorizer.fit_transform(&cleaned)?;
    let degenerate = matrix.vocabulary.is_empty();
    if degenerate {
        warn!("No terms survived frequency filtering; all reviews land in topic 0");
    }
    progress.phase_done(Phase::Vectorizing);

    // Step 3: cluster
    let effective_topics = clamp_topic_count(topic_count, texts.len());
    if effective_topics != topic_count {
        info!(
            requested = topic_count,
            effective = effective_topics,
            "Topic count clamped to what the document volume supports"
        );
    }
    let clusterer = KMeans {
        seed: config.seed,
        max_iter: config.max_iter,
    };
    let clustering = clusterer.fit(&matrix, effective_topics);
    progress.phase_done(Phase::Clustering);

    // Step 4: label and summarize
    let mut topics: Vec<TopicSummary> = (0..effective_topics)
        .map(|id| {
            let terms = top_terms(&clustering.centroids[id], &matrix.vocabulary, LABEL_TERMS);
            let member_texts: Vec<&str> = clustering
                .members(id)
                .into_iter()
                .map(|i| texts[i].as_str())
                .collect();
            TopicSummary {
                topic_id: id as i64,
                topic_name: topic_name(id, &terms),
                summary: extractive_summary(&member_texts),
                review_count: 0,
                avg_score: NEUTRAL_SCORE,
            }
        })
        .collect();

    // Step 5: ratings and per-topic statistics
    let score_column = schema::resolve_score_column(table);
    let ratings: Vec<Option<f64>> = match &score_column {
        ScoreColumn::Resolved(name) => table
            .column(name)
            .unwrap_or_default()
            .into_iter()
            .map(schema::parse_number)
            .collect(),
        ScoreColumn::Default(_) => vec![None; texts.len()],
    };

    let pairs: Vec<(i64, Option<f64>)> = clustering
        .assignments
        .iter()
        .zip(&ratings)
        .map(|(&topic, &rating)| (topic as i64, rating))
        .collect();
    stats::aggregate(&mut topics, &pairs);

    let mut documents = table.clone();
    documents.set_column(
        TOPIC_COLUMN,
        clustering.assignments.iter().map(|t| t.to_string()).collect(),
    );
    documents.set_column(
        SCORE_COLUMN,
        ratings
            .iter()
            .map(|r| format_score(r.unwrap_or(NEUTRAL_SCORE)))
            .collect(),
    );
    documents.set_column(
        PREVIEW_COLUMN,
        texts.iter().map(|t| t.chars().take(PREVIEW_CHARS).collect()).collect(),
    );
    documents.set_column(TEXT_COLUMN, texts);
    progress.phase_done(Phase::Summarizing);

    info!(
        topics = effective_topics,
        vocabulary = matrix.vocabulary.len(),
        iterations = clustering.iterations,
        "Review analysis complete"
    );

    Ok(Analysis {
        topics,
        documents,
        assignments: clustering.assignments,
        requested_topics: topic_count,
        effective_topics,
        vocabulary_size: matrix.vocabulary.len(),
        degenerate,
        score_column,
    })
}
