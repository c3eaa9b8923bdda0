//! # Pandemic News Sentiment
//!
//! Sentiment analysis for pandemic and public-health news. Articles are
//! classified by a hosted language model when an API key is configured and
//! by a deterministic keyword heuristic otherwise, then stored with their
//! keywords and aggregated into daily sentiment trends.
//!
//! ## Usage
//!
//! ```sh
//! pandemic_news_sentiment import --file articles.json
//! pandemic_news_sentiment trends --output-dir ./reports
//! ```
//!
//! ## Architecture
//!
//! 1. **Validation**: required article fields are checked before analysis
//! 2. **Classification**: model call with heuristic fallback on any failure
//! 3. **Keywords**: frequency-ranked extraction with a health-term allow-list
//! 4. **Persistence**: JSON store with atomic rewrites
//! 5. **Trends**: daily buckets, overall distribution, direction and risk

use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod error;
mod heuristic;
mod keywords;
mod lexicon;
mod models;
mod outputs;
mod pipeline;
mod store;
mod trends;
mod utils;

use api::{GeminiClient, SentimentClassifier};
use cli::{Cli, Command};
use config::AppConfig;
use keywords::KeywordExtractor;
use models::NewArticle;
use outputs::json;
use pipeline::{Pipeline, score_offline};
use store::ArticleStore;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    debug!(store = %args.store.display(), command = ?args.command, "Parsed CLI arguments");

    let config = AppConfig::load(args.config.as_deref()).await?;

    let dashboard_keywords = KeywordExtractor::new(config.keywords.dashboard);

    let backend = match args.gemini_api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => {
            let http = reqwest::Client::builder()
                .timeout(Duration::from_secs(config.classifier.timeout_secs))
                .build()?;
            let client = GeminiClient::new(http, &config.classifier, key.to_string())?;
            info!(model = %config.classifier.model, "Model classification enabled");
            Some(client)
        }
        _ => {
            info!("No GEMINI_API_KEY configured; using heuristic scoring only");
            None
        }
    };

    let pipeline = Pipeline::new(
        SentimentClassifier::new(backend),
        ArticleStore::new(&args.store),
        config,
    );
    debug!(store = %pipeline.store().path().display(), "Pipeline ready");

    match args.command {
        Command::Analyze(article) => {
            let response = pipeline
                .ingest(NewArticle {
                    title: article.title,
                    description: article.description,
                    image_url: article.image_url,
                    date: article.date,
                    time: article.time,
                    read_more: article.read_more,
                })
                .await?;
            print_json(&response)?;
        }
        Command::Import { file } => {
            let raw = tokio::fs::read_to_string(&file).await?;
            let articles: Vec<NewArticle> = serde_json::from_str(&raw)?;
            info!(path = %file.display(), count = articles.len(), "Loaded import file");
            print_json(&pipeline.import(articles).await?)?;
        }
        Command::Reanalyze(opts) => {
            let delay = Duration::from_millis(opts.delay_ms);
            let summary = if opts.jitter {
                let mut rng = match opts.seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_os_rng(),
                };
                pipeline.reanalyze(delay, Some(&mut rng)).await?
            } else {
                pipeline.reanalyze(delay, None::<&mut StdRng>).await?
            };
            print_json(&summary)?;
        }
        Command::Trends(opts) => {
            if let Some(dir) = &opts.output_dir {
                if let Err(e) = ensure_writable_dir(dir).await {
                    error!(
                        path = %dir.display(),
                        error = %e,
                        "Report directory is not writable (fix perms or choose a different path)"
                    );
                    return Err(e);
                }
            }

            let today = chrono::Local::now().date_naive();
            let range = pipeline.date_range(opts.start_date, opts.end_date, today)?;
            let report = pipeline.trend_report(range).await?;
            if let Some(dir) = &opts.output_dir {
                json::write_report(&report, dir).await?;
            }
            print_json(&report)?;
        }
        Command::Show { id } => {
            print_json(&pipeline.show(id).await?)?;
        }
        Command::Score { title, description } => {
            print_json(&score_offline(&title, &description, &dashboard_keywords))?;
        }
    }

    let elapsed = start_time.elapsed();
    info!(elapsed_ms = elapsed.as_millis() as u64, "Done");
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
