// Error types for the analysis pipeline and the static dataset loader.
//
// Input validation happens before any work starts, so callers either get a
// complete analysis or one of these errors. Degenerate data (empty vocabulary)
// and topic-count clamping are not errors; they are reported on `Analysis`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("column '{0}' not found in table")]
    MissingColumn(String),

    #[error("no documents to analyze")]
    EmptyDocuments,

    #[error("no text columns found in this table")]
    NoTextColumns,

    #[error("topic count must be at least 1 (got {0})")]
    InvalidTopicCount(usize),
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error(
        "dataset file not found: {}\nRun `review-intel analyze <file>` to produce one, \
         or point REVIEW_INTEL_DATA_DIR at an existing dataset.",
        .0.display()
    )]
    Missing(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("column '{column}' missing from {}", path.display())]
    MissingColumn { path: PathBuf, column: String },
}
