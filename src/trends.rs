//! Daily sentiment trends, overall distribution, and keyword ranking.
//!
//! Aggregation is pure: callers load the scored articles for a date range
//! and hand them over as [`TrendSample`]s.
//!
//! # Trend direction
//!
//! Each day gets a net positivity, `positive% - negative%`. The direction
//! compares the latest day against the earliest: a rise larger than the
//! stable band is `improving`, a fall larger than the band is `worsening`,
//! anything in between is `stable`. Fewer than two days is
//! `insufficient-data`.

use crate::error::InputError;
use crate::keywords::KeywordExtractor;
use crate::lexicon::RISK_KEYWORDS;
use crate::models::{KeywordCount, Sentiment};
use crate::utils::round2;
use chrono::{DateTime, Days, NaiveDate, Utc};
use itertools::Itertools;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// One article in range as seen by the aggregator.
///
/// Articles without a classification still feed the keyword ranking but
/// are left out of the sentiment counts.
#[derive(Debug, Clone, Copy)]
pub struct TrendSample<'a> {
    pub date: NaiveDate,
    pub sentiment: Option<Sentiment>,
    pub title: &'a str,
    pub description: &'a str,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SentimentCounts {
    pub positive_count: u32,
    pub neutral_count: u32,
    pub negative_count: u32,
    pub mixed_count: u32,
}

impl SentimentCounts {
    pub fn get(&self, sentiment: Sentiment) -> u32 {
        match sentiment {
            Sentiment::Positive => self.positive_count,
            Sentiment::Neutral => self.neutral_count,
            Sentiment::Negative => self.negative_count,
            Sentiment::Mixed => self.mixed_count,
        }
    }

    pub fn total(&self) -> u32 {
        self.positive_count + self.neutral_count + self.negative_count + self.mixed_count
    }

    fn record(&mut self, sentiment: Sentiment) {
        match sentiment {
            Sentiment::Positive => self.positive_count += 1,
            Sentiment::Neutral => self.neutral_count += 1,
            Sentiment::Negative => self.negative_count += 1,
            Sentiment::Mixed => self.mixed_count += 1,
        }
    }

    fn merge(mut self, other: &SentimentCounts) -> Self {
        self.positive_count += other.positive_count;
        self.neutral_count += other.neutral_count;
        self.negative_count += other.negative_count;
        self.mixed_count += other.mixed_count;
        self
    }

    fn percentage(&self, sentiment: Sentiment) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            f64::from(self.get(sentiment)) * 100.0 / f64::from(total)
        }
    }
}

/// Sentiment counts for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTrend {
    pub date: NaiveDate,
    pub total_count: u32,
    #[serde(flatten)]
    pub counts: SentimentCounts,
}

impl DailyTrend {
    fn net_positivity(&self) -> f64 {
        self.counts.percentage(Sentiment::Positive) - self.counts.percentage(Sentiment::Negative)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrendDirection {
    Improving,
    Worsening,
    Stable,
    InsufficientData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallSentiment {
    pub total_news: u32,
    pub positive_percentage: f64,
    pub negative_percentage: f64,
    pub neutral_percentage: f64,
    pub mixed_percentage: f64,
    pub trend_direction: TrendDirection,
}

impl OverallSentiment {
    fn from_counts(counts: &SentimentCounts, trend_direction: TrendDirection) -> Self {
        Self {
            total_news: counts.total(),
            positive_percentage: round2(counts.percentage(Sentiment::Positive)),
            negative_percentage: round2(counts.percentage(Sentiment::Negative)),
            neutral_percentage: round2(counts.percentage(Sentiment::Neutral)),
            mixed_percentage: round2(counts.percentage(Sentiment::Mixed)),
            trend_direction,
        }
    }

    pub fn percentage(&self, sentiment: Sentiment) -> f64 {
        match sentiment {
            Sentiment::Positive => self.positive_percentage,
            Sentiment::Negative => self.negative_percentage,
            Sentiment::Neutral => self.neutral_percentage,
            Sentiment::Mixed => self.mixed_percentage,
        }
    }
}

/// Output of [`TrendAggregator::aggregate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSummary {
    /// Newest day first.
    pub daily_trends: Vec<DailyTrend>,
    pub overall_sentiment: OverallSentiment,
    pub top_keywords: Vec<KeywordCount>,
}

#[derive(Debug, Clone)]
pub struct TrendAggregator {
    keywords: KeywordExtractor,
    stable_band: f64,
}

impl TrendAggregator {
    pub fn new(keywords: KeywordExtractor, stable_band: f64) -> Self {
        Self {
            keywords,
            stable_band,
        }
    }

    pub fn aggregate(&self, samples: &[TrendSample<'_>]) -> TrendSummary {
        let mut days: BTreeMap<NaiveDate, SentimentCounts> = BTreeMap::new();
        for sample in samples {
            if let Some(sentiment) = sample.sentiment {
                days.entry(sample.date).or_default().record(sentiment);
            }
        }

        let oldest_first: Vec<DailyTrend> = days
            .into_iter()
            .map(|(date, counts)| DailyTrend {
                date,
                total_count: counts.total(),
                counts,
            })
            .collect();

        let direction = trend_direction(&oldest_first, self.stable_band);
        let totals = oldest_first
            .iter()
            .fold(SentimentCounts::default(), |acc, day| acc.merge(&day.counts));
        let overall_sentiment = OverallSentiment::from_counts(&totals, direction);

        let corpus = samples
            .iter()
            .map(|s| format!("{} {}", s.title, s.description))
            .join(" ");
        let top_keywords = self.keywords.extract(&corpus);

        debug!(
            days = oldest_first.len(),
            total = overall_sentiment.total_news,
            ?direction,
            "Aggregated sentiment trends"
        );

        TrendSummary {
            daily_trends: oldest_first.into_iter().rev().collect(),
            overall_sentiment,
            top_keywords,
        }
    }
}

/// Compare net positivity of the last day against the first.
///
/// `oldest_first` must be sorted by date ascending.
pub fn trend_direction(oldest_first: &[DailyTrend], stable_band: f64) -> TrendDirection {
    match oldest_first {
        [first, .., last] => {
            let delta = last.net_positivity() - first.net_positivity();
            if delta > stable_band {
                TrendDirection::Improving
            } else if delta < -stable_band {
                TrendDirection::Worsening
            } else {
                TrendDirection::Stable
            }
        }
        _ => TrendDirection::InsufficientData,
    }
}

/// Inclusive calendar date range of a trend query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// An explicit range when both ends are given, otherwise the trailing
    /// `window_days` ending `today`.
    pub fn resolve(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        today: NaiveDate,
        window_days: u32,
    ) -> Result<Self, InputError> {
        match (start, end) {
            (Some(start), Some(end)) if start > end => {
                Err(InputError::InvertedRange { start, end })
            }
            (Some(start), Some(end)) => Ok(Self { start, end }),
            (start, end) => {
                if start.is_some() || end.is_some() {
                    warn!("Custom ranges need both start and end dates; using the trailing window");
                }
                let start = today
                    .checked_sub_days(Days::new(u64::from(window_days)))
                    .unwrap_or(NaiveDate::MIN);
                Ok(Self { start, end: today })
            }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Dashboard risk summary derived from the overall distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub risk_score: f64,
    pub risk_keyword_count: usize,
    /// 0-100 estimate of harmful coverage volume.
    pub health_impact_score: u32,
}

pub fn assess_risk(overall: &OverallSentiment, top_keywords: &[KeywordCount]) -> RiskAssessment {
    let negative = overall.percentage(Sentiment::Negative);
    let mixed = overall.percentage(Sentiment::Mixed);

    let risk_keyword_count = top_keywords
        .iter()
        .filter(|k| RISK_KEYWORDS.iter().any(|risk| k.keyword.contains(risk)))
        .count();
    let risk_score = negative * 0.6 + mixed * 0.3 + risk_keyword_count as f64 * 5.0;

    let level = if risk_score >= 50.0 {
        RiskLevel::High
    } else if risk_score >= 25.0 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    let impact = (negative * 0.7 + mixed * 0.3) * f64::from(overall.total_news) / 100.0;
    let health_impact_score = impact.round().clamp(0.0, 100.0) as u32;

    RiskAssessment {
        level,
        risk_score: round2(risk_score),
        risk_keyword_count,
        health_impact_score,
    }
}

/// Context reported next to the trend figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisMetadata {
    pub ai_powered: bool,
    pub confidence_threshold: f64,
    pub last_updated: DateTime<Utc>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Articles in range that have no stored classification yet.
    pub unclassified_articles: usize,
}

/// Full response of a trend query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendReport {
    #[serde(flatten)]
    pub summary: TrendSummary,
    pub risk_assessment: RiskAssessment,
    pub analysis_metadata: AnalysisMetadata,
}
