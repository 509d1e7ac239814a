// Schema negotiation — deciding which columns mean what.
//
// Review exports name their rating column inconsistently ("Score", "rating",
// "stars"...). Rather than guessing silently, resolution returns an explicit
// result the caller can log or display.

use serde::Serialize;

use super::Table;

/// Column names (compared case-insensitively) accepted as the rating column.
pub const SCORE_COLUMN_NAMES: [&str; 4] = ["score", "rating", "stars", "rating_score"];

/// Rating used when a document has no usable score.
pub const NEUTRAL_SCORE: f64 = 3.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ScoreColumn {
    /// A rating column was found under this header name.
    Resolved(String),
    /// No rating column; every document gets the neutral default.
    Default(f64),
}

/// Find the first header matching one of [`SCORE_COLUMN_NAMES`].
pub fn resolve_score_column(table: &Table) -> ScoreColumn {
    table
        .headers()
        .iter()
        .find(|h| SCORE_COLUMN_NAMES.contains(&h.to_lowercase().as_str()))
        .map(|h| ScoreColumn::Resolved(h.clone()))
        .unwrap_or(ScoreColumn::Default(NEUTRAL_SCORE))
}

/// Parse a cell as a finite number. Blank, non-numeric, NaN and infinite
/// cells are `None`.
pub fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Columns that hold free text: at least one non-empty cell that isn't a number.
pub fn text_columns(table: &Table) -> Vec<String> {
    table
        .headers()
        .iter()
        .enumerate()
        .filter(|(idx, _)| {
            table.rows().iter().any(|row| {
                let cell = row[*idx].trim();
                !cell.is_empty() && parse_number(cell).is_none()
            })
        })
        .map(|(_, h)| h.clone())
        .collect()
}

/// Bounds and default for the topic-count choice, scaled to corpus size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TopicRange {
    pub min: usize,
    pub max: usize,
    pub default: usize,
}

pub fn suggested_topic_range(row_count: usize) -> TopicRange {
    let scaled = (row_count / 10).max(3);
    TopicRange {
        min: 3,
        max: scaled.min(20),
        default: scaled.min(8),
    }
}
