// Colored terminal output for topic tables and review samples.

use colored::Colorize;

use super::{fmt_count, truncate_chars};
use crate::pipeline::dataset::ReviewSelection;
use crate::table::schema::TopicRange;
use crate::text::strip_html;
use crate::topics::label::{keywords, stars, topic_title};
use crate::topics::stats::TopicSummary;

/// Display the topic summary table, largest topics first.
pub fn display_topics(topics: &[TopicSummary], total_reviews: usize) {
    println!(
        "\n{}",
        format!(
            "=== {} topics across {} reviews ===",
            topics.len(),
            fmt_count(total_reviews)
        )
        .bold()
    );
    println!();

    println!(
        "  {:>3}  {:<40} {:>8}  {:<6} {}",
        "Id".dimmed(),
        "Topic".dimmed(),
        "Reviews".dimmed(),
        "Avg".dimmed(),
        "Rating".dimmed(),
    );
    println!("  {}", "-".repeat(72).dimmed());

    let mut ordered: Vec<&TopicSummary> = topics.iter().collect();
    ordered.sort_by(|a, b| b.review_count.cmp(&a.review_count).then(a.topic_id.cmp(&b.topic_id)));

    for topic in ordered {
        let title = truncate_chars(&topic_title(&topic.topic_name), 38);
        println!(
            "  {:>3}  {:<40} {:>8}  {:<6.2} {}",
            topic.topic_id,
            title.bold(),
            fmt_count(topic.review_count),
            topic.avg_score,
            colorize_stars(topic.avg_score),
        );
    }
    println!();
}

/// Display one topic's insight card and a selection of its reviews.
pub fn display_topic_detail(topic: &TopicSummary, selection: &ReviewSelection) {
    println!(
        "\n{}",
        format!("=== {} ===", topic_title(&topic.topic_name)).bold()
    );
    println!(
        "  {}  {:.2} avg rating  ·  {} reviews",
        colorize_stars(topic.avg_score),
        topic.avg_score,
        fmt_count(topic.review_count)
    );
    println!("\n  {}", topic.summary);

    let kws = keywords(&topic.topic_name);
    if !kws.is_empty() {
        println!("\n  Keywords: {}", kws.join(", ").dimmed());
    }

    let (label, suffix) = if selection.search_active {
        ("Search results", "matched")
    } else {
        ("Sample reviews", "total")
    };
    println!(
        "\n{}",
        format!("--- {label} · {} {suffix} ---", fmt_count(selection.matched)).bold()
    );

    if selection.reviews.is_empty() {
        let msg = if selection.search_active {
            "No reviews matched the search."
        } else {
            "No reviews for this topic."
        };
        println!("  {}", msg.dimmed());
        return;
    }

    for review in &selection.reviews {
        let title = strip_html(&review.title);
        let title = if title.is_empty() { "—".to_string() } else { title };
        println!("\n  {}  {}", colorize_stars(review.score), title.bold());
        println!("    {}", truncate_chars(&strip_html(&review.text), 300).dimmed());
    }
    println!();
}

/// Display the column survey for a CSV before analysis.
pub fn display_columns(
    row_count: usize,
    headers: &[String],
    text_columns: &[String],
    score_column: Option<&str>,
    range: &TopicRange,
) {
    println!(
        "{} rows detected · {} columns",
        fmt_count(row_count),
        headers.len()
    );
    if text_columns.is_empty() {
        println!("  {}", "No text columns found in this CSV.".red());
    } else {
        println!("  Text columns: {}", text_columns.join(", ").bold());
    }
    match score_column {
        Some(col) => println!("  Rating column: {}", col.bold()),
        None => println!("  Rating column: {}", "none (every review rated 3.0)".dimmed()),
    }
    println!(
        "  Suggested topics: {} (range {}–{})",
        range.default, range.min, range.max
    );
}

fn colorize_stars(score: f64) -> colored::ColoredString {
    let s = stars(score);
    if score >= 4.0 {
        s.bright_green()
    } else if score >= 3.0 {
        s.yellow()
    } else {
        s.red()
    }
}
