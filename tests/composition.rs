// Composition tests — the full pipeline and the dataset round trip.
//
// These tests exercise the data flow between modules:
//   Table -> normalize -> TF-IDF -> k-means -> labels -> stats -> tables
// without network access. Dataset tests write CSV fixtures under the system
// temp directory.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use review_intel::pipeline::analysis::{run_analysis, AnalysisConfig};
use review_intel::pipeline::dataset::{select_reviews, DatasetCache, REVIEWS_FILE, SUMMARIES_FILE};
use review_intel::progress::{NoopProgress, Phase, ProgressSink};
use review_intel::table::schema::ScoreColumn;
use review_intel::table::Table;
use review_intel::topics::label::{keywords, NO_SUMMARY};
use review_intel::topics::stats::summary_table;

const LATE: &str = "Delivery arrived late and the courier lost the package";
const TASTY: &str = "Great taste, crunchy texture and fresh flavor";

/// 60 delivery complaints (rated 1) followed by 40 taste compliments (rated 5).
fn two_theme_table() -> Table {
    let mut table = Table::new(vec!["Id".into(), "Review".into(), "Rating".into()]);
    for i in 0..100 {
        let (text, rating) = if i < 60 { (LATE, "1") } else { (TASTY, "5") };
        table.push_row(vec![i.to_string(), text.to_string(), rating.to_string()]);
    }
    table
}

fn words(text: &str) -> HashSet<String> {
    review_intel::text::normalize(text)
        .split(' ')
        .map(str::to_string)
        .collect()
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("review-intel-{}-{name}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

// ============================================================
// End-to-end analysis
// ============================================================

#[test]
fn two_themes_become_two_topics() {
    let table = two_theme_table();
    let result = run_analysis(&table, "Review", 2, &AnalysisConfig::default(), &NoopProgress)
        .unwrap();

    assert_eq!(result.effective_topics, 2);
    assert_eq!(result.topics.len(), 2);
    assert!(!result.degenerate);

    let mut counts: Vec<usize> = result.topics.iter().map(|t| t.review_count).collect();
    counts.sort();
    assert_eq!(counts, vec![40, 60]);

    let late_topic = result.assignments[0];
    assert!(result.assignments[..60].iter().all(|&t| t == late_topic));
    assert!(result.assignments[60..].iter().all(|&t| t != late_topic));

    let late_words = words(LATE);
    let tasty_words = words(TASTY);
    for topic in &result.topics {
        let kws = keywords(&topic.topic_name);
        assert!(!kws.is_empty(), "topic {} has no label terms", topic.topic_id);
        let expected = if topic.topic_id as usize == late_topic {
            &late_words
        } else {
            &tasty_words
        };
        assert!(
            kws.iter().all(|k| expected.contains(k)),
            "label {} mixes themes",
            topic.topic_name
        );
    }

    let late = &result.topics[late_topic];
    assert_eq!(late.avg_score, 1.0);
    assert!(late.topic_name.starts_with(&format!("{late_topic}_")));
    assert!(late.summary.starts_with(LATE));
    assert_eq!(result.topics[1 - late_topic].avg_score, 5.0);
    assert_eq!(result.score_column, ScoreColumn::Resolved("Rating".to_string()));
}

#[test]
fn short_two_theme_reviews_keep_every_word() {
    let mut table = Table::new(vec!["Text".into(), "Score".into()]);
    for i in 0..100 {
        let (text, score) = if i < 60 { ("delivery late", "1") } else { ("great taste", "5") };
        table.push_row(vec![text.to_string(), score.to_string()]);
    }
    let result = run_analysis(&table, "Text", 2, &AnalysisConfig::default(), &NoopProgress)
        .unwrap();

    assert_eq!(result.vocabulary_size, 4);
    let late = result.assignments[0];
    let tasty = result.assignments[60];
    assert_ne!(late, tasty);
    assert_eq!(result.topics[late].review_count, 60);
    assert_eq!(result.topics[tasty].review_count, 40);

    // Each label leads with its own theme, then fills with zero-weight terms
    assert_eq!(
        result.topics[late].topic_name,
        format!("{late}_delivery_late_great_taste")
    );
    assert_eq!(
        result.topics[tasty].topic_name,
        format!("{tasty}_great_taste_delivery_late")
    );
    assert_eq!(&keywords(&result.topics[tasty].topic_name)[..2], ["great", "taste"]);
}

#[test]
fn labels_always_carry_four_terms() {
    let mut table = Table::new(vec!["Text".into()]);
    for i in 0..40 {
        let text = if i < 20 { "soup cold" } else { "bread stale crust hard" };
        table.push_row(vec![text.to_string()]);
    }
    let result = run_analysis(&table, "Text", 2, &AnalysisConfig::default(), &NoopProgress)
        .unwrap();

    assert_eq!(result.vocabulary_size, 6);
    for topic in &result.topics {
        assert_eq!(keywords(&topic.topic_name).len(), 4, "{}", topic.topic_name);
    }
    let soup = result.assignments[0];
    assert_eq!(
        result.topics[soup].topic_name,
        format!("{soup}_cold_soup_bread_crust")
    );
}

#[test]
fn analysis_is_deterministic() {
    let table = two_theme_table();
    let config = AnalysisConfig::default();
    let a = run_analysis(&table, "Review", 2, &config, &NoopProgress).unwrap();
    let b = run_analysis(&table, "Review", 2, &config, &NoopProgress).unwrap();
    assert_eq!(a.assignments, b.assignments);
    assert_eq!(a.topics, b.topics);
    assert_eq!(a.documents, b.documents);
}

#[test]
fn every_document_in_exactly_one_topic() {
    let mut table = Table::new(vec!["Text".into()]);
    let themes = [
        "battery drains fast overnight",
        "screen cracked after drop",
        "battery life excellent all day",
        "screen bright and sharp",
        "charger stopped working",
    ];
    for i in 0..57 {
        table.push_row(vec![format!("{} {}", themes[i % themes.len()], themes[(i / 5) % 5])]);
    }
    let result = run_analysis(&table, "Text", 4, &AnalysisConfig::default(), &NoopProgress)
        .unwrap();

    assert_eq!(result.assignments.len(), 57);
    assert!(result.assignments.iter().all(|&t| t < result.effective_topics));
    let total: usize = result.topics.iter().map(|t| t.review_count).sum();
    assert_eq!(total, 57);
    let ids: Vec<i64> = result.topics.iter().map(|t| t.topic_id).collect();
    assert_eq!(ids, (0..result.effective_topics as i64).collect::<Vec<_>>());
}

#[test]
fn topic_count_is_clamped() {
    let mut table = Table::new(vec!["Text".into()]);
    for i in 0..25 {
        table.push_row(vec![if i % 2 == 0 { "cold soup bland" } else { "warm bread soft" }.into()]);
    }
    let result = run_analysis(&table, "Text", 20, &AnalysisConfig::default(), &NoopProgress)
        .unwrap();
    assert_eq!(result.requested_topics, 20);
    assert_eq!(result.effective_topics, 2);
    assert_eq!(result.topics.len(), 2);
}

#[test]
fn empty_vocabulary_degrades_to_topic_zero() {
    let mut table = Table::new(vec!["Text".into()]);
    let unique = [
        "apple", "banana", "cherry", "damson", "elder", "fig", "grape", "huckleberry",
        "imbe", "jujube", "kiwi", "lime", "",
    ];
    for word in unique {
        table.push_row(vec![word.to_string()]);
    }
    let result = run_analysis(&table, "Text", 5, &AnalysisConfig::default(), &NoopProgress)
        .unwrap();

    assert!(result.degenerate);
    assert_eq!(result.vocabulary_size, 0);
    assert!(result.assignments.iter().all(|&t| t == 0));
    assert_eq!(result.topics[0].review_count, unique.len());
    assert_eq!(result.topics[0].topic_name, "0_");
    for topic in &result.topics[1..] {
        assert_eq!(topic.review_count, 0);
        assert_eq!(topic.avg_score, 3.0);
        assert_eq!(topic.summary, NO_SUMMARY);
    }
}

#[test]
fn annotated_table_adds_columns() {
    let long_text = format!("{} the end", "very long review text ".repeat(10));
    let table = Table::from_rows(
        &["Score", "Body"],
        &[
            &["4", long_text.as_str()],
            &["n/a", "short one"],
            &["2", "short two"],
        ],
    );
    let result = run_analysis(&table, "Body", 2, &AnalysisConfig::default(), &NoopProgress)
        .unwrap();
    let docs = &result.documents;

    assert_eq!(docs.headers(), &["Score", "Body", "topic", "Summary", "Text"]);
    assert_eq!(docs.column("Score").unwrap(), vec!["4.0", "3.0", "2.0"]);
    let preview = docs.column("Summary").unwrap();
    assert_eq!(preview[0].chars().count(), 80);
    assert_eq!(preview[1], "short one");
    assert_eq!(docs.column("Text").unwrap()[0], long_text);

    // Unparseable rating counts toward review_count but not the mean
    let total: usize = result.topics.iter().map(|t| t.review_count).sum();
    assert_eq!(total, 3);
}

#[test]
fn missing_rating_column_defaults_to_neutral() {
    let table = Table::from_rows(&["Text"], &[&["good soup"], &["good soup"], &["bad"]]);
    let result = run_analysis(&table, "Text", 2, &AnalysisConfig::default(), &NoopProgress)
        .unwrap();
    assert_eq!(result.score_column, ScoreColumn::Default(3.0));
    assert!(result.topics.iter().all(|t| t.avg_score == 3.0));
    assert!(result.documents.column("Score").unwrap().iter().all(|s| *s == "3.0"));
}

// ============================================================
// Progress reporting
// ============================================================

struct Recorder(Mutex<Vec<Phase>>);

impl ProgressSink for Recorder {
    fn phase_done(&self, phase: Phase) {
        self.0.lock().unwrap().push(phase);
    }
}

#[test]
fn progress_reports_every_phase_in_order() {
    let recorder = Recorder(Mutex::new(Vec::new()));
    let table = two_theme_table();
    let with_progress =
        run_analysis(&table, "Review", 2, &AnalysisConfig::default(), &recorder).unwrap();
    let without = run_analysis(&table, "Review", 2, &AnalysisConfig::default(), &NoopProgress)
        .unwrap();

    assert_eq!(*recorder.0.lock().unwrap(), Phase::ALL.to_vec());
    assert_eq!(with_progress.assignments, without.assignments);
}

// ============================================================
// Output tables -> DatasetCache
// ============================================================

#[test]
fn written_tables_load_back_through_cache() {
    let dir = temp_dir("roundtrip");
    let result = run_analysis(
        &two_theme_table(),
        "Review",
        2,
        &AnalysisConfig::default(),
        &NoopProgress,
    )
    .unwrap();
    summary_table(&result.topics)
        .write_csv(&dir.join(SUMMARIES_FILE))
        .unwrap();
    result.documents.write_csv(&dir.join(REVIEWS_FILE)).unwrap();

    let cache = DatasetCache::new();
    let first = cache.get_or_load(&dir).unwrap();
    let second = cache.get_or_load(&dir).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.len(), 1);

    assert_eq!(first.topics.len(), 2);
    for (loaded, fresh) in first.topics.iter().zip(&result.topics) {
        assert_eq!(loaded.topic_id, fresh.topic_id);
        assert_eq!(loaded.topic_name, fresh.topic_name);
        assert_eq!(loaded.review_count, fresh.review_count);
        assert!((loaded.avg_score - fresh.avg_score).abs() < 1e-9);
    }

    let late_topic = result.assignments[0] as i64;
    let selection = select_reviews(&first.reviews, late_topic, Some("COURIER"), 15);
    assert_eq!(selection.matched, 60);
    assert_eq!(selection.reviews.len(), 15);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn dataset_drops_outlier_topic() {
    let dir = temp_dir("outliers");
    Table::from_rows(
        &[" topic_id ", "topic_name", "summary"],
        &[&["-1", "-1_noise", "x"], &["0", "0_tea", "tea"], &["1", "1_mugs", ""]],
    )
    .write_csv(&dir.join(SUMMARIES_FILE))
    .unwrap();
    Table::from_rows(
        &["topic", "Score", "Text"],
        &[&["-1", "1", "noise"], &["0", "5", "tea"], &["0", "4", "tea too"]],
    )
    .write_csv(&dir.join(REVIEWS_FILE))
    .unwrap();

    let data = DatasetCache::new().get_or_load(&dir).unwrap();
    assert_eq!(data.topics.len(), 2);
    assert_eq!(data.reviews.len(), 2);
    let tea = data.topic(0).unwrap();
    assert_eq!(tea.review_count, 2);
    assert!((tea.avg_score - 4.5).abs() < 1e-9);
    let mugs = data.topic(1).unwrap();
    assert_eq!(mugs.review_count, 0);
    assert_eq!(mugs.avg_score, 3.0);
    assert_eq!(mugs.summary, NO_SUMMARY);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn dataset_counts_scored_rows_and_keeps_unlabeled_ones() {
    let dir = temp_dir("unscored");
    Table::from_rows(
        &["topic_id", "topic_name", "summary"],
        &[&["0", "0_tea", "tea"], &["1", "1_mugs", "mugs"]],
    )
    .write_csv(&dir.join(SUMMARIES_FILE))
    .unwrap();
    Table::from_rows(
        &["topic", "Score", "Text"],
        &[
            &["0", "5", "tea"],
            &["0", "", "tea, unrated"],
            &["0.0", "3", "tea again"],
            &["", "4", "no topic"],
            &["-1.0", "2", "noise"],
            &["1", "oops", "mug"],
        ],
    )
    .write_csv(&dir.join(REVIEWS_FILE))
    .unwrap();

    let data = DatasetCache::new().get_or_load(&dir).unwrap();
    assert_eq!(data.reviews.len(), 5);
    assert!(data.reviews.column("Text").unwrap().contains(&"no topic"));

    let tea = data.topic(0).unwrap();
    assert_eq!(tea.review_count, 2);
    assert!((tea.avg_score - 4.0).abs() < 1e-9);
    let mugs = data.topic(1).unwrap();
    assert_eq!(mugs.review_count, 0);
    assert_eq!(mugs.avg_score, 3.0);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_dataset_is_reported() {
    let dir = std::env::temp_dir().join(format!("review-intel-{}-absent", std::process::id()));
    let err = DatasetCache::new().get_or_load(&dir).unwrap_err();
    assert!(err.to_string().contains(SUMMARIES_FILE));
}
