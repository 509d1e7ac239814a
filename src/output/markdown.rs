// Markdown report generation for a finished analysis.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;

use super::fmt_count;
use crate::pipeline::analysis::Analysis;
use crate::table::schema::ScoreColumn;
use crate::topics::label::{keywords, stars, topic_title};

/// Render the analysis as a markdown document.
pub fn render_report(analysis: &Analysis, source: &str) -> String {
    let mut md = String::new();
    let total: usize = analysis.topics.iter().map(|t| t.review_count).sum();

    let _ = writeln!(md, "# Review Topics Report\n");
    let _ = writeln!(
        md,
        "Generated {} from `{source}`.\n",
        Utc::now().format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(md, "- Reviews analyzed: {}", fmt_count(total));
    let _ = writeln!(
        md,
        "- Topics: {} (requested {})",
        analysis.effective_topics, analysis.requested_topics
    );
    let _ = writeln!(md, "- Vocabulary size: {}", fmt_count(analysis.vocabulary_size));
    match &analysis.score_column {
        ScoreColumn::Resolved(col) => {
            let _ = writeln!(md, "- Rating column: `{col}`");
        }
        ScoreColumn::Default(v) => {
            let _ = writeln!(md, "- Rating column: none (all reviews rated {v:.1})");
        }
    }
    if analysis.degenerate {
        let _ = writeln!(
            md,
            "\n> No terms survived frequency filtering; all reviews were placed in topic 0."
        );
    }

    let _ = writeln!(md, "\n## Topics\n");
    let _ = writeln!(md, "| Id | Topic | Reviews | Avg rating |");
    let _ = writeln!(md, "|---:|---|---:|---|");
    for t in &analysis.topics {
        let _ = writeln!(
            md,
            "| {} | {} | {} | {} {:.2} |",
            t.topic_id,
            topic_title(&t.topic_name),
            fmt_count(t.review_count),
            stars(t.avg_score),
            t.avg_score
        );
    }

    for t in &analysis.topics {
        let _ = writeln!(md, "\n### {} · {}\n", t.topic_id, topic_title(&t.topic_name));
        let kws = keywords(&t.topic_name);
        if !kws.is_empty() {
            let _ = writeln!(md, "Keywords: {}\n", kws.join(", "));
        }
        let _ = writeln!(md, "> {}", t.summary.replace('\n', " "));
    }

    md
}

/// Write the markdown report to `path`, creating parent directories.
pub fn generate_report(analysis: &Analysis, source: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }
    std::fs::write(path, render_report(analysis, source))
        .with_context(|| format!("Failed to write report: {}", path.display()))
}
