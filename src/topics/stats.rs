// Per-topic review statistics.
//
// A left join from topic rows onto per-document (topic, rating) pairs: every
// topic row appears exactly once in the output, even with no documents.
// Missing ratings still count toward review_count but not toward the mean.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::table::schema::NEUTRAL_SCORE;
use crate::table::Table;

/// One row of the topic summary table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicSummary {
    pub topic_id: i64,
    pub topic_name: String,
    pub summary: String,
    pub review_count: usize,
    pub avg_score: f64,
}

pub const SUMMARY_COLUMNS: [&str; 5] =
    ["topic_id", "topic_name", "summary", "review_count", "avg_score"];

#[derive(Default)]
struct Tally {
    count: usize,
    rating_sum: f64,
    rated: usize,
}

/// Fill `review_count` and `avg_score` on each topic row from the documents'
/// `(topic id, rating)` pairs. Topics without documents get 0 and the
/// neutral score; topics with documents but no usable ratings also get the
/// neutral score.
pub fn aggregate(topics: &mut [TopicSummary], documents: &[(i64, Option<f64>)]) {
    let mut tallies: BTreeMap<i64, Tally> = BTreeMap::new();
    for &(topic, rating) in documents {
        let tally = tallies.entry(topic).or_default();
        tally.count += 1;
        if let Some(r) = rating {
            tally.rating_sum += r;
            tally.rated += 1;
        }
    }

    for topic in topics.iter_mut() {
        match tallies.get(&topic.topic_id) {
            Some(t) => {
                topic.review_count = t.count;
                topic.avg_score = if t.rated > 0 {
                    t.rating_sum / t.rated as f64
                } else {
                    NEUTRAL_SCORE
                };
            }
            None => {
                topic.review_count = 0;
                topic.avg_score = NEUTRAL_SCORE;
            }
        }
    }
}

/// Render topic rows as a table with the standard summary columns.
pub fn summary_table(topics: &[TopicSummary]) -> Table {
    let mut table = Table::new(SUMMARY_COLUMNS.iter().map(|c| c.to_string()).collect());
    for t in topics {
        table.push_row(vec![
            t.topic_id.to_string(),
            t.topic_name.clone(),
            t.summary.clone(),
            t.review_count.to_string(),
            format_score(t.avg_score),
        ]);
    }
    table
}

/// Format a rating so whole numbers keep one decimal ("4.0", not "4").
pub fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{score:.1}")
    } else {
        score.to_string()
    }
}
