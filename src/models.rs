//! Data models for news articles and their sentiment analysis.
//!
//! This module defines the core data structures used throughout the application:
//! - [`NewArticle`] / [`ValidArticle`]: submitted article fields before and after validation
//! - [`StoredArticle`]: the persisted record with its three analysis columns
//! - [`SentimentResult`]: the bounded classification produced for each article
//! - [`KeywordCount`]: one ranked keyword and its frequency
//!
//! Field names of [`SentimentResult`] use snake_case because the serialized
//! form is what gets persisted and what the model service is asked to return.

use crate::error::InputError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Concern level at or above which an article is flagged for an outbreak alert.
pub const ALERT_CONCERN_LEVEL: u8 = 8;

/// Declares a closed set of lowercase labels with case-insensitive parsing.
macro_rules! labeled_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            /// Parse a label, ignoring ASCII case and surrounding whitespace.
            pub fn from_label(label: &str) -> Option<Self> {
                let label = label.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(label))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

labeled_enum!(
    /// Categorical sentiment label of a text.
    Sentiment {
        Positive => "positive",
        Negative => "negative",
        Neutral => "neutral",
        Mixed => "mixed",
    }
);

labeled_enum!(
    EmotionalTone {
        Hopeful => "hopeful",
        Concerning => "concerning",
        Alarming => "alarming",
        Informative => "informative",
        Reassuring => "reassuring",
        Urgent => "urgent",
    }
);

labeled_enum!(
    /// Heuristic urgency tier derived from score magnitude.
    SeverityLevel {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
);

labeled_enum!(
    HealthImpact {
        Beneficial => "beneficial",
        Neutral => "neutral",
        Harmful => "harmful",
        Unknown => "unknown",
    }
);

labeled_enum!(
    /// Recommended response tier.
    Actionability {
        Immediate => "immediate",
        Monitor => "monitor",
        Routine => "routine",
        None => "none",
    }
);

/// Sentiment analysis of one article.
///
/// Produced either by the model-backed classifier or by the heuristic
/// scorer. Bounded fields are always clamped into range, whatever the source:
/// `confidence` into `[0, 1]` and `public_concern_level` into `[1, 10]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub sentiment: Sentiment,
    pub confidence: f64,
    pub emotional_tone: EmotionalTone,
    pub severity_level: SeverityLevel,
    pub health_impact: HealthImpact,
    /// Integer 1-10 proxy for expected reader alarm.
    pub public_concern_level: u8,
    pub key_emotions: Vec<String>,
    pub reasoning: String,
    pub risk_indicators: Vec<String>,
    pub actionability: Actionability,
    #[serde(rename = "analysis_timestamp")]
    pub analyzed_at: DateTime<Utc>,
}

impl SentimentResult {
    /// Whether this result should trigger an outbreak notification.
    pub fn warrants_alert(&self) -> bool {
        self.severity_level == SeverityLevel::Critical
            || self.public_concern_level >= ALERT_CONCERN_LEVEL
    }
}

/// One keyword and how many times it occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: u32,
}

/// An article as submitted, before required-field validation.
///
/// Every field defaults to empty so that partially filled JSON imports
/// deserialize and get rejected by [`NewArticle::validate`] instead.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct NewArticle {
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub date: String,
    pub time: String,
    pub read_more: String,
}

impl NewArticle {
    /// Check that every required field is present and the date parses.
    pub fn validate(self) -> Result<ValidArticle, InputError> {
        let required = [
            ("title", &self.title),
            ("description", &self.description),
            ("image_url", &self.image_url),
            ("date", &self.date),
            ("time", &self.time),
            ("read_more", &self.read_more),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(InputError::MissingField(field));
            }
        }

        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").map_err(|_| {
            InputError::InvalidDate {
                value: self.date.clone(),
            }
        })?;

        Ok(ValidArticle {
            title: self.title,
            description: self.description,
            image_url: self.image_url,
            date,
            time: self.time,
            read_more: self.read_more,
        })
    }
}

/// An article whose required fields have been checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidArticle {
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub date: NaiveDate,
    pub time: String,
    pub read_more: String,
}

impl ValidArticle {
    /// The text analyzed for sentiment and keywords.
    pub fn analysis_text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }
}

/// A persisted article with its analysis columns.
///
/// `sentiment_analysis` and `keywords` hold JSON documents as strings, the
/// same way the columns are stored, and are decoded on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredArticle {
    pub id: u64,
    #[serde(flatten)]
    pub article: ValidArticle,
    #[serde(default)]
    pub sentiment_classification: Option<String>,
    #[serde(default)]
    pub sentiment_analysis: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
}

impl StoredArticle {
    pub fn new(id: u64, article: ValidArticle) -> Self {
        Self {
            id,
            article,
            sentiment_classification: None,
            sentiment_analysis: None,
            keywords: None,
        }
    }

    /// Overwrite the three analysis columns.
    pub fn record_analysis(
        &mut self,
        result: &SentimentResult,
        keywords: &[KeywordCount],
    ) -> Result<(), serde_json::Error> {
        let analysis = serde_json::to_string(result)?;
        let keywords = serde_json::to_string(keywords)?;
        self.sentiment_classification = Some(result.sentiment.as_str().to_string());
        self.sentiment_analysis = Some(analysis);
        self.keywords = Some(keywords);
        Ok(())
    }

    /// Stored classification label, if it is one we recognise.
    pub fn classification(&self) -> Option<Sentiment> {
        self.sentiment_classification
            .as_deref()
            .and_then(Sentiment::from_label)
    }

    /// Decode the stored analysis; unparsable documents read as `None`.
    pub fn analysis(&self) -> Option<SentimentResult> {
        let raw = self.sentiment_analysis.as_deref()?;
        match serde_json::from_str(raw) {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(id = self.id, error = %e, "Stored sentiment_analysis is not valid JSON");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_article() -> NewArticle {
        NewArticle {
            title: "Vaccine approved".to_string(),
            description: "Regulators approved the vaccine".to_string(),
            image_url: "https://example.com/a.png".to_string(),
            date: "2025-05-06".to_string(),
            time: "14:30:00".to_string(),
            read_more: "https://example.com/article".to_string(),
        }
    }

    fn sample_result() -> SentimentResult {
        SentimentResult {
            sentiment: Sentiment::Negative,
            confidence: 0.72,
            emotional_tone: EmotionalTone::Concerning,
            severity_level: SeverityLevel::High,
            health_impact: HealthImpact::Harmful,
            public_concern_level: 7,
            key_emotions: vec!["concern".to_string()],
            reasoning: "Test".to_string(),
            risk_indicators: vec![],
            actionability: Actionability::Monitor,
            analyzed_at: DateTime::parse_from_rfc3339("2025-05-06T14:30:00Z")
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    #[test]
    fn test_label_parsing_is_case_insensitive() {
        assert_eq!(Sentiment::from_label(" Positive "), Some(Sentiment::Positive));
        assert_eq!(SeverityLevel::from_label("CRITICAL"), Some(SeverityLevel::Critical));
        assert_eq!(Actionability::from_label("none"), Some(Actionability::None));
        assert_eq!(EmotionalTone::from_label("gloomy"), None);
    }

    #[test]
    fn test_sentiment_result_serialization() {
        let json = serde_json::to_value(sample_result()).unwrap();
        assert_eq!(json["sentiment"], "negative");
        assert_eq!(json["severity_level"], "high");
        assert_eq!(json["public_concern_level"], 7);
        assert!(json.get("analysis_timestamp").is_some());
        assert!(json.get("analyzed_at").is_none());
    }

    #[test]
    fn test_warrants_alert() {
        let mut result = sample_result();
        assert!(!result.warrants_alert());

        result.public_concern_level = 8;
        assert!(result.warrants_alert());

        result.public_concern_level = 3;
        result.severity_level = SeverityLevel::Critical;
        assert!(result.warrants_alert());
    }

    #[test]
    fn test_validate_accepts_complete_article() {
        let valid = sample_article().validate().unwrap();
        assert_eq!(valid.date, NaiveDate::from_ymd_opt(2025, 5, 6).unwrap());
        assert_eq!(
            valid.analysis_text(),
            "Vaccine approved Regulators approved the vaccine"
        );
    }

    #[test]
    fn test_validate_rejects_blank_fields() {
        let mut article = sample_article();
        article.read_more = "   ".to_string();
        assert_eq!(
            article.validate().unwrap_err(),
            InputError::MissingField("read_more")
        );
    }

    #[test]
    fn test_validate_rejects_bad_date() {
        let mut article = sample_article();
        article.date = "06/05/2025".to_string();
        assert!(matches!(
            article.validate(),
            Err(InputError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_new_article_deserializes_partial_json() {
        let article: NewArticle = serde_json::from_str(r#"{"title": "Only a title"}"#).unwrap();
        assert_eq!(article.title, "Only a title");
        assert_eq!(article.validate().unwrap_err(), InputError::MissingField("description"));
    }

    #[test]
    fn test_stored_article_round_trips_analysis_columns() {
        let mut stored = StoredArticle::new(1, sample_article().validate().unwrap());
        assert_eq!(stored.classification(), None);
        assert_eq!(stored.analysis(), None);

        let keywords = vec![KeywordCount {
            keyword: "vaccine".to_string(),
            count: 2,
        }];
        stored.record_analysis(&sample_result(), &keywords).unwrap();

        assert_eq!(stored.sentiment_classification.as_deref(), Some("negative"));
        assert_eq!(stored.classification(), Some(Sentiment::Negative));
        assert_eq!(stored.analysis(), Some(sample_result()));
        assert_eq!(
            stored.keywords.as_deref(),
            Some(r#"[{"keyword":"vaccine","count":2}]"#)
        );
    }

    #[test]
    fn test_stored_article_flattens_fields() {
        let stored = StoredArticle::new(3, sample_article().validate().unwrap());
        let json = serde_json::to_value(&stored).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["title"], "Vaccine approved");
        assert_eq!(json["date"], "2025-05-06");
    }

    #[test]
    fn test_corrupt_analysis_reads_as_none() {
        let mut stored = StoredArticle::new(9, sample_article().validate().unwrap());
        stored.sentiment_analysis = Some("{not json".to_string());
        stored.sentiment_classification = Some("ecstatic".to_string());
        assert_eq!(stored.analysis(), None);
        assert_eq!(stored.classification(), None);
    }
}
