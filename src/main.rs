use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use tracing::info;

use review_intel::config::Config;
use review_intel::output::{fmt_count, markdown, terminal};
use review_intel::pipeline::analysis::{self, Analysis};
use review_intel::pipeline::dataset::{self, DatasetCache};
use review_intel::progress::BarProgress;
use review_intel::table::schema::{self, ScoreColumn};
use review_intel::table::Table;
use review_intel::topics::stats::{self, TopicSummary};

/// Review Intel: automatic topic discovery for customer reviews.
///
/// Groups free-text reviews into topics, each with a label, a representative
/// summary, and rating statistics.
#[derive(Parser)]
#[command(name = "review-intel", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover topics in a CSV of reviews
    Analyze {
        /// CSV file with a header row
        file: PathBuf,

        /// Column holding the review text (default: first text column)
        #[arg(long)]
        column: Option<String>,

        /// How many topics to discover (default: scaled to the row count)
        #[arg(long)]
        topics: Option<usize>,

        /// Where to write the output tables (default: REVIEW_INTEL_OUTPUT_DIR)
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Print the topic summary as JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Also write a markdown report
        #[arg(long)]
        report: bool,
    },

    /// Inspect a CSV's columns before analysis
    Columns {
        /// CSV file with a header row
        file: PathBuf,
    },

    /// Browse the precomputed dataset in REVIEW_INTEL_DATA_DIR
    Demo {
        /// Show one topic's reviews
        #[arg(long)]
        topic: Option<i64>,

        /// Only show reviews containing this text (case-insensitive)
        #[arg(long)]
        search: Option<String>,

        /// Max reviews to show (default: 15)
        #[arg(long, default_value = "15")]
        limit: usize,
    },
}

#[derive(Serialize)]
struct AnalysisSummary<'a> {
    requested_topics: usize,
    effective_topics: usize,
    vocabulary_size: usize,
    degenerate: bool,
    score_column: &'a ScoreColumn,
    topics: &'a [TopicSummary],
}

fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("review_intel=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Analyze {
            file,
            column,
            topics,
            out_dir,
            json,
            report,
        } => {
            let table = Table::read_csv(&file)?;
            let text_column = analysis::choose_text_column(&table, column.as_deref())?;
            let topic_count =
                topics.unwrap_or_else(|| schema::suggested_topic_range(table.len()).default);

            if !json {
                println!(
                    "Analyzing {} reviews from column '{}'...",
                    fmt_count(table.len()),
                    text_column
                );
            }

            let progress = BarProgress::new();
            let result = analysis::run_analysis(
                &table,
                &text_column,
                topic_count,
                &config.analysis(),
                &progress,
            );
            progress.finish();
            let result = result?;

            let out_dir = out_dir.unwrap_or_else(|| config.output_dir.clone());
            write_outputs(&result, &out_dir)?;

            if report {
                let path = out_dir.join("review-topics-report.md");
                markdown::generate_report(&result, &file.display().to_string(), &path)?;
                if !json {
                    println!("Markdown report saved to: {}", path.display());
                }
            }

            if json {
                let summary = AnalysisSummary {
                    requested_topics: result.requested_topics,
                    effective_topics: result.effective_topics,
                    vocabulary_size: result.vocabulary_size,
                    degenerate: result.degenerate,
                    score_column: &result.score_column,
                    topics: &result.topics,
                };
                println!("{}", serde_json::to_string_pretty(&summary)?);
                return Ok(());
            }

            if result.effective_topics != result.requested_topics {
                println!(
                    "{}",
                    format!(
                        "Requested {} topics; {} reviews support {}.",
                        result.requested_topics,
                        fmt_count(table.len()),
                        result.effective_topics
                    )
                    .yellow()
                );
            }
            if result.degenerate {
                println!(
                    "{}",
                    "Reviews share too few words to separate topics; all were placed in topic 0."
                        .yellow()
                );
            }

            terminal::display_topics(&result.topics, table.len());
            println!("Tables written to: {}", out_dir.display());
        }

        Commands::Columns { file } => {
            let table = Table::read_csv(&file)?;
            let text_columns = schema::text_columns(&table);
            let score = match schema::resolve_score_column(&table) {
                ScoreColumn::Resolved(col) => Some(col),
                ScoreColumn::Default(_) => None,
            };
            terminal::display_columns(
                table.len(),
                table.headers(),
                &text_columns,
                score.as_deref(),
                &schema::suggested_topic_range(table.len()),
            );
        }

        Commands::Demo {
            topic,
            search,
            limit,
        } => {
            let cache = DatasetCache::new();
            let data = cache.get_or_load(&config.data_dir)?;

            match topic {
                None => {
                    let total: usize = data.topics.iter().map(|t| t.review_count).sum();
                    terminal::display_topics(&data.topics, total);
                    println!(
                        "{}",
                        "To browse a topic, run: review-intel demo --topic <id>".dimmed()
                    );
                }
                Some(id) => {
                    let Some(summary) = data.topic(id) else {
                        anyhow::bail!("No topic {id} in {}", config.data_dir.display());
                    };
                    let selection =
                        dataset::select_reviews(&data.reviews, id, search.as_deref(), limit);
                    terminal::display_topic_detail(summary, &selection);
                }
            }
        }
    }

    Ok(())
}

/// Write the summary and annotated tables under `out_dir`, using the file
/// names the demo loader expects.
fn write_outputs(result: &Analysis, out_dir: &std::path::Path) -> Result<()> {
    let summaries = out_dir.join(dataset::SUMMARIES_FILE);
    let reviews = out_dir.join(dataset::REVIEWS_FILE);
    stats::summary_table(&result.topics).write_csv(&summaries)?;
    result.documents.write_csv(&reviews)?;
    info!(
        summaries = %summaries.display(),
        reviews = %reviews.display(),
        "Wrote analysis tables"
    );
    Ok(())
}
