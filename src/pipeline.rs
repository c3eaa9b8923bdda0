//! Article analysis pipeline: classify, extract keywords, persist, report.
//!
//! A [`Pipeline`] owns the classifier, the keyword extractors and the store
//! and exposes one method per CLI operation. Classification never fails:
//! model errors are absorbed by [`SentimentClassifier`], so the only
//! errors surfaced here are bad input and storage problems.

use crate::api::{AskAsync, Classification, SentimentClassifier};
use crate::config::AppConfig;
use crate::error::{PipelineError, StoreError};
use crate::heuristic;
use crate::keywords::KeywordExtractor;
use crate::models::{KeywordCount, NewArticle, SentimentResult, StoredArticle, ValidArticle};
use crate::store::ArticleStore;
use crate::trends::{
    AnalysisMetadata, DateRange, TrendAggregator, TrendReport, TrendSample, assess_risk,
};
use chrono::{NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use rand::Rng;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Keywords echoed back in an ingestion response.
const RESPONSE_KEYWORDS: usize = 10;

/// Sentiment and keywords for one article.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleAnalysis {
    pub ai_powered: bool,
    pub sentiment_analysis: SentimentResult,
    pub keywords: Vec<KeywordCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestResponse {
    pub id: u64,
    pub sentiment: SentimentResult,
    pub keywords: Vec<KeywordCount>,
    /// Critical severity or a high concern level.
    pub alert: bool,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub inserted_ids: Vec<u64>,
    pub skipped: usize,
    pub alerts: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReanalysisSummary {
    pub total: usize,
    pub updated: usize,
    pub failed: usize,
    pub model_powered: usize,
}

/// Score an article with the heuristic scorer only; no model, no store.
pub fn score_offline(
    title: &str,
    description: &str,
    keywords: &KeywordExtractor,
) -> ArticleAnalysis {
    ArticleAnalysis {
        ai_powered: false,
        sentiment_analysis: heuristic::score(title, description),
        keywords: keywords.extract(&format!("{title} {description}")),
    }
}

pub struct Pipeline<A> {
    classifier: SentimentClassifier<A>,
    article_keywords: KeywordExtractor,
    trends: TrendAggregator,
    store: ArticleStore,
    config: AppConfig,
}

impl<A> Pipeline<A>
where
    A: AskAsync<Response = String>,
{
    pub fn new(classifier: SentimentClassifier<A>, store: ArticleStore, config: AppConfig) -> Self {
        let article_keywords = KeywordExtractor::new(config.keywords.article);
        let trends = TrendAggregator::new(
            KeywordExtractor::new(config.keywords.trends),
            config.trends.stable_band,
        );
        Self {
            classifier,
            article_keywords,
            trends,
            store,
            config,
        }
    }

    pub fn store(&self) -> &ArticleStore {
        &self.store
    }

    /// Classify one article and extract its keywords.
    pub async fn analyze(&self, title: &str, description: &str) -> ArticleAnalysis {
        let classification = self.classifier.classify(title, description).await;
        let text = format!("{title} {description}");
        self.finish_analysis(classification, &text, None::<&mut rand::rngs::ThreadRng>)
    }

    fn finish_analysis<R: Rng + ?Sized>(
        &self,
        classification: Classification,
        text: &str,
        jitter: Option<&mut R>,
    ) -> ArticleAnalysis {
        let ai_powered = classification.is_model();
        if let Classification::Fallback { reason, .. } = &classification {
            debug!(
                %reason,
                confidence = classification.result().confidence,
                "Using heuristic result"
            );
        }
        let mut sentiment_analysis = classification.into_result();
        if let (false, Some(rng)) = (ai_powered, jitter) {
            heuristic::apply_jitter(&mut sentiment_analysis, rng);
        }
        ArticleAnalysis {
            ai_powered,
            sentiment_analysis,
            keywords: self.article_keywords.extract(text),
        }
    }

    async fn analyze_valid(&self, article: ValidArticle) -> (ValidArticle, ArticleAnalysis) {
        let analysis = self.analyze(&article.title, &article.description).await;
        (article, analysis)
    }

    /// Validate, analyze and store one submitted article.
    #[instrument(level = "info", skip_all)]
    pub async fn ingest(&self, article: NewArticle) -> Result<IngestResponse, PipelineError> {
        let article = article.validate()?;
        let (article, analysis) = self.analyze_valid(article).await;
        let alert = report_alert(&article, &analysis.sentiment_analysis);

        let id = self.store.insert((article, analysis.clone()), build_record).await?;

        let method = if analysis.ai_powered { "AI" } else { "heuristic" };
        info!(id, sentiment = %analysis.sentiment_analysis.sentiment, method, "Stored article");

        Ok(IngestResponse {
            id,
            sentiment: analysis.sentiment_analysis,
            keywords: analysis.keywords.into_iter().take(RESPONSE_KEYWORDS).collect(),
            alert,
            message: format!("News article created with {method} sentiment analysis"),
        })
    }

    /// Analyze and store a batch; invalid entries are skipped.
    #[instrument(level = "info", skip_all, fields(count = articles.len()))]
    pub async fn import(&self, articles: Vec<NewArticle>) -> Result<ImportSummary, PipelineError> {
        let mut skipped = 0;
        let mut valid = Vec::with_capacity(articles.len());
        for (index, article) in articles.into_iter().enumerate() {
            match article.validate() {
                Ok(article) => valid.push(article),
                Err(e) => {
                    warn!(index, error = %e, "Skipping invalid article");
                    skipped += 1;
                }
            }
        }

        let concurrency = self.config.classifier.concurrency.max(1);
        info!(valid = valid.len(), skipped, concurrency, "Analyzing articles");

        let analyzed: Vec<(ValidArticle, ArticleAnalysis)> = stream::iter(valid)
            .map(|article| self.analyze_valid(article))
            .buffered(concurrency)
            .collect()
            .await;

        let alerts = analyzed
            .iter()
            .filter(|(article, analysis)| report_alert(article, &analysis.sentiment_analysis))
            .count();

        let inserted_ids = self.store.insert_all(analyzed, build_record).await?;
        info!(inserted = inserted_ids.len(), skipped, alerts, "Import finished");

        Ok(ImportSummary {
            inserted_ids,
            skipped,
            alerts,
        })
    }

    /// Re-run analysis for every stored article in id order.
    ///
    /// Each article is written back on its own as soon as it is analyzed,
    /// so articles added meanwhile survive and an interrupted run keeps the
    /// updates made so far. `jitter`, when given, perturbs heuristic results
    /// only.
    #[instrument(level = "info", skip_all, fields(delay_ms = delay.as_millis() as u64))]
    pub async fn reanalyze<R: Rng + ?Sized>(
        &self,
        delay: Duration,
        mut jitter: Option<&mut R>,
    ) -> Result<ReanalysisSummary, PipelineError> {
        let records = self.store.load().await?;
        let mut summary = ReanalysisSummary {
            total: records.len(),
            ..Default::default()
        };
        info!(total = summary.total, "Re-analyzing stored articles");

        for (index, record) in records.iter().enumerate() {
            if index > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let article = &record.article;
            let classification = self
                .classifier
                .classify(&article.title, &article.description)
                .await;
            let rng = jitter.as_mut().map(|rng| &mut **rng);
            let analysis = self.finish_analysis(classification, &article.analysis_text(), rng);

            let written = self
                .store
                .update(record.id, |stored| {
                    Ok(stored.record_analysis(&analysis.sentiment_analysis, &analysis.keywords)?)
                })
                .await;
            match written {
                Ok(()) => {
                    summary.updated += 1;
                    if analysis.ai_powered {
                        summary.model_powered += 1;
                    }
                    debug!(
                        id = record.id,
                        sentiment = %analysis.sentiment_analysis.sentiment,
                        "Updated article"
                    );
                }
                Err(e) => {
                    summary.failed += 1;
                    warn!(id = record.id, error = %e, "Failed to update article");
                }
            }
        }

        info!(
            updated = summary.updated,
            failed = summary.failed,
            model_powered = summary.model_powered,
            "Re-analysis complete"
        );
        Ok(summary)
    }

    /// Resolve the query range against the configured trailing window.
    pub fn date_range(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<DateRange, PipelineError> {
        Ok(DateRange::resolve(start, end, today, self.config.trends.window_days)?)
    }

    #[instrument(level = "info", skip_all, fields(start = %range.start, end = %range.end))]
    pub async fn trend_report(&self, range: DateRange) -> Result<TrendReport, PipelineError> {
        let records = self.store.load().await?;

        let samples: Vec<TrendSample<'_>> = records
            .iter()
            .filter(|r| range.contains(r.article.date))
            .map(|r| TrendSample {
                date: r.article.date,
                sentiment: r.classification(),
                title: &r.article.title,
                description: &r.article.description,
            })
            .collect();
        let unclassified_articles = samples.iter().filter(|s| s.sentiment.is_none()).count();
        if unclassified_articles > 0 {
            warn!(unclassified_articles, "Skipped articles without a stored classification");
        }

        let summary = self.trends.aggregate(&samples);
        let risk_assessment = assess_risk(&summary.overall_sentiment, &summary.top_keywords);
        info!(
            total = summary.overall_sentiment.total_news,
            risk = ?risk_assessment.level,
            "Built trend report"
        );

        Ok(TrendReport {
            summary,
            risk_assessment,
            analysis_metadata: AnalysisMetadata {
                ai_powered: self.classifier.is_model_powered(),
                confidence_threshold: self.config.trends.confidence_threshold,
                last_updated: Utc::now(),
                start_date: range.start,
                end_date: range.end,
                unclassified_articles,
            },
        })
    }

    /// One stored article with its analysis columns decoded.
    pub async fn show(&self, id: u64) -> Result<Value, PipelineError> {
        let record = self.store.find(id).await?;
        let analysis = match record.analysis() {
            Some(analysis) => serde_json::to_value(analysis)?,
            None => Value::Null,
        };
        let keywords = record
            .keywords
            .as_deref()
            .and_then(|raw| serde_json::from_str::<Value>(raw).ok())
            .unwrap_or(Value::Null);

        let mut value = serde_json::to_value(&record)?;
        if let Value::Object(fields) = &mut value {
            fields.insert("sentiment_analysis".to_string(), analysis);
            fields.insert("keywords".to_string(), keywords);
        }
        Ok(value)
    }
}

fn build_record(
    id: u64,
    (article, analysis): (ValidArticle, ArticleAnalysis),
) -> Result<StoredArticle, StoreError> {
    let mut record = StoredArticle::new(id, article);
    record.record_analysis(&analysis.sentiment_analysis, &analysis.keywords)?;
    Ok(record)
}

fn report_alert(article: &ValidArticle, result: &SentimentResult) -> bool {
    let alert = result.warrants_alert();
    if alert {
        warn!(
            title = %article.title,
            severity = %result.severity_level,
            concern = result.public_concern_level,
            "Article warrants an outbreak alert"
        );
    }
    alert
}
