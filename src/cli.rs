//! Command-line interface definitions for the pandemic news sentiment tool.
//!
//! Global options can be provided via flags or environment variables; each
//! subcommand maps to one pipeline operation. Results are printed to stdout
//! as JSON, logs go to stderr.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the pandemic news sentiment tool.
///
/// # Examples
///
/// ```sh
/// # Score a headline without touching the store or the model
/// pandemic_news_sentiment score --title "Vaccine breakthrough"
///
/// # Import a batch with model classification
/// GEMINI_API_KEY=... pandemic_news_sentiment --store ./news.json import --file batch.json
///
/// # Trend report for May, also written to disk
/// pandemic_news_sentiment trends --start-date 2025-05-01 --end-date 2025-05-31 -o ./reports
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path of the JSON article store
    #[arg(short, long, env = "NEWS_STORE", default_value = "data/news.json", global = true)]
    pub store: PathBuf,

    /// Optional path to config.yaml file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Generative Language API key; heuristic scoring only when absent
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, global = true)]
    pub gemini_api_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate, analyze and store one article
    Analyze(ArticleArgs),

    /// Analyze and store every article in a JSON array file
    Import {
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Re-run analysis for every stored article
    Reanalyze(ReanalyzeArgs),

    /// Report sentiment trends over a date range
    Trends(TrendArgs),

    /// Print one stored article with its decoded analysis
    Show {
        #[arg(long)]
        id: u64,
    },

    /// Heuristic-only scoring of a title and description; nothing is stored
    Score {
        #[arg(short, long)]
        title: String,

        #[arg(short, long, default_value = "")]
        description: String,
    },
}

#[derive(Args, Debug)]
pub struct ArticleArgs {
    #[arg(long)]
    pub title: String,

    #[arg(long)]
    pub description: String,

    #[arg(long)]
    pub image_url: String,

    /// Publication date, YYYY-MM-DD
    #[arg(long)]
    pub date: String,

    #[arg(long)]
    pub time: String,

    #[arg(long)]
    pub read_more: String,
}

#[derive(Args, Debug)]
pub struct ReanalyzeArgs {
    /// Pause between articles, in milliseconds
    #[arg(long, default_value_t = 100)]
    pub delay_ms: u64,

    /// Perturb heuristic results slightly, as the legacy re-scorer did
    #[arg(long)]
    pub jitter: bool,

    /// Seed for the jitter generator
    #[arg(long, requires = "jitter")]
    pub seed: Option<u64>,
}

#[derive(Args, Debug)]
pub struct TrendArgs {
    /// First day of the range, YYYY-MM-DD
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Last day of the range, YYYY-MM-DD
    #[arg(long)]
    pub end_date: Option<NaiveDate>,

    /// Also write the report below this directory
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}
