//! Model-backed sentiment classification with heuristic fallback.
//!
//! This module asks a generative model to analyze an article and turns its
//! JSON reply into a [`SentimentResult`]. Any failure along the way (no API
//! key, transport error, bad status, malformed or off-schema JSON) is
//! recovered locally by running the heuristic scorer instead, so callers
//! always receive a well-formed result.
//!
//! # Architecture
//!
//! - [`AskAsync`]: core trait defining async model interaction
//! - [`GeminiClient`]: Generative Language API implementation of [`AskAsync`]
//! - [`SentimentClassifier`]: builds the prompt, validates the reply and
//!   returns a tagged [`Classification`]
//!
//! There is no retry loop: a failed call falls back once, immediately.

use crate::config::ClassifierConfig;
use crate::error::ClassifierError;
use crate::heuristic;
use crate::models::{
    Actionability, EmotionalTone, HealthImpact, SentimentResult, Sentiment, SeverityLevel,
};
use crate::utils::{strip_code_fences, truncate_for_log};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Trait for async model interaction.
///
/// Implementors send a prompt to a model and return its reply. The
/// abstraction lets tests substitute canned replies for the live service.
pub trait AskAsync {
    /// The type of response returned by the model.
    type Response;

    /// Send `text` to the model and receive a response.
    async fn ask(&self, text: &str) -> Result<Self::Response, ClassifierError>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

#[derive(Deserialize)]
struct ReplyPart {
    #[serde(default)]
    text: String,
}

/// Client for the Generative Language `generateContent` endpoint.
///
/// The HTTP client is injected so a single connection pool, built by the
/// application entry point, is shared by every classification.
pub struct GeminiClient {
    http: Client,
    endpoint: Url,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(
        http: Client,
        config: &ClassifierConfig,
        api_key: String,
    ) -> Result<Self, ClassifierError> {
        Ok(Self {
            http,
            endpoint: Url::parse(&config.endpoint)?,
            model: config.model.clone(),
            api_key,
        })
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.endpoint.as_str().trim_end_matches('/'),
            self.model,
            urlencoding::encode(&self.api_key)
        )
    }
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl AskAsync for GeminiClient {
    type Response = String;

    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn ask(&self, text: &str) -> Result<Self::Response, ClassifierError> {
        let t0 = Instant::now();
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text }],
            }],
        };

        let response = self.http.post(self.generate_url()).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Status {
                status: status.as_u16(),
                body: truncate_for_log(&body, 300),
            });
        }

        let reply: GenerateResponse = response.json().await?;
        let text: String = reply
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .map(|p| p.text)
            .collect();

        debug!(elapsed_ms = t0.elapsed().as_millis() as u64, bytes = text.len(), "Model replied");
        if text.trim().is_empty() {
            return Err(ClassifierError::EmptyResponse);
        }
        Ok(text)
    }
}

/// Why the heuristic scorer produced a result instead of the model.
#[derive(Debug)]
pub enum FallbackReason {
    /// No API key is configured.
    Disabled,
    Failed(ClassifierError),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::Disabled => f.write_str("model classification disabled"),
            FallbackReason::Failed(e) => write!(f, "model classification failed: {e}"),
        }
    }
}

/// Outcome of [`SentimentClassifier::classify`].
#[derive(Debug)]
pub enum Classification {
    Model(SentimentResult),
    Fallback {
        result: SentimentResult,
        reason: FallbackReason,
    },
}

impl Classification {
    pub fn result(&self) -> &SentimentResult {
        match self {
            Classification::Model(result) | Classification::Fallback { result, .. } => result,
        }
    }

    pub fn into_result(self) -> SentimentResult {
        match self {
            Classification::Model(result) | Classification::Fallback { result, .. } => result,
        }
    }

    pub fn is_model(&self) -> bool {
        matches!(self, Classification::Model(_))
    }
}

/// Classifies articles with a model backend when one is configured.
#[derive(Debug)]
pub struct SentimentClassifier<A> {
    backend: Option<A>,
}

impl<A> SentimentClassifier<A>
where
    A: AskAsync<Response = String>,
{
    /// `None` means heuristic-only mode.
    pub fn new(backend: Option<A>) -> Self {
        Self { backend }
    }

    pub fn is_model_powered(&self) -> bool {
        self.backend.is_some()
    }

    /// Classify one article; never fails.
    #[instrument(level = "info", skip_all, fields(title = %truncate_for_log(title, 50)))]
    pub async fn classify(&self, title: &str, description: &str) -> Classification {
        let Some(backend) = &self.backend else {
            debug!("No model backend configured; using heuristic scorer");
            return Classification::Fallback {
                result: heuristic::score(title, description),
                reason: FallbackReason::Disabled,
            };
        };

        let prompt = build_prompt(title, description);
        let outcome = match backend.ask(&prompt).await {
            Ok(reply) => normalize_reply(&reply, Utc::now()).map_err(|e| {
                warn!(
                    error = %e,
                    response_preview = %truncate_for_log(&reply, 300),
                    "Model returned non-conforming JSON"
                );
                e
            }),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(result) => {
                info!(
                    sentiment = %result.sentiment,
                    confidence = result.confidence,
                    "Model analysis succeeded"
                );
                Classification::Model(result)
            }
            Err(e) => {
                warn!(error = %e, "Model analysis failed; falling back to heuristic scorer");
                Classification::Fallback {
                    result: heuristic::score(title, description),
                    reason: FallbackReason::Failed(e),
                }
            }
        }
    }
}

/// Build the analysis prompt for one article.
pub fn build_prompt(title: &str, description: &str) -> String {
    format!(
        r#"As a professional sentiment analysis expert specializing in health and pandemic news,
analyze the following news article:

Title: "{title}"
Description: "{description}"

Provide a comprehensive sentiment analysis with the following JSON format:
{{
  "sentiment": "positive|negative|neutral|mixed",
  "confidence": 0.0-1.0,
  "emotional_tone": "hopeful|concerning|alarming|informative|reassuring|urgent",
  "severity_level": "low|medium|high|critical",
  "health_impact": "beneficial|neutral|harmful|unknown",
  "public_concern_level": 1-10,
  "key_emotions": ["emotion1", "emotion2"],
  "reasoning": "Brief explanation of the analysis",
  "risk_indicators": ["indicator1", "indicator2"],
  "actionability": "immediate|monitor|routine|none"
}}

Focus on:
- Health implications and public safety
- Emotional impact on readers
- Urgency and severity of the situation
- Potential for causing panic or reassurance
- Scientific accuracy and reliability indicators

Return only valid JSON without any markdown formatting."#
    )
}

/// Validate and normalize a raw model reply.
///
/// Missing or empty fields take defaults, as do numeric fields equal to
/// zero, and numbers are clamped into range. A field that is present with
/// the wrong JSON type, or a label outside its declared set, is a schema
/// violation.
pub fn normalize_reply(
    reply: &str,
    analyzed_at: DateTime<Utc>,
) -> Result<SentimentResult, ClassifierError> {
    let cleaned = strip_code_fences(reply);
    let value: Value = serde_json::from_str(&cleaned)?;
    let fields = match value {
        Value::Object(fields) => fields,
        other => {
            return Err(ClassifierError::SchemaValidation {
                field: "reply",
                reason: format!("expected a JSON object, found {}", json_kind(&other)),
            });
        }
    };

    let confidence = number_field(&fields, "confidence", 0.5)?.clamp(0.0, 1.0);
    let concern = number_field(&fields, "public_concern_level", 5.0)?
        .round()
        .clamp(1.0, 10.0);

    Ok(SentimentResult {
        sentiment: label_field(&fields, "sentiment", Sentiment::from_label, Sentiment::Neutral)?,
        confidence,
        emotional_tone: label_field(
            &fields,
            "emotional_tone",
            EmotionalTone::from_label,
            EmotionalTone::Informative,
        )?,
        severity_level: label_field(
            &fields,
            "severity_level",
            SeverityLevel::from_label,
            SeverityLevel::Medium,
        )?,
        health_impact: label_field(
            &fields,
            "health_impact",
            HealthImpact::from_label,
            HealthImpact::Neutral,
        )?,
        public_concern_level: concern as u8,
        key_emotions: string_list(&fields, "key_emotions"),
        reasoning: match fields.get("reasoning") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
            _ => "AI-powered sentiment analysis".to_string(),
        },
        risk_indicators: string_list(&fields, "risk_indicators"),
        actionability: label_field(
            &fields,
            "actionability",
            Actionability::from_label,
            Actionability::Routine,
        )?,
        analyzed_at,
    })
}

fn label_field<T>(
    fields: &Map<String, Value>,
    field: &'static str,
    parse: fn(&str) -> Option<T>,
    default: T,
) -> Result<T, ClassifierError> {
    match fields.get(field) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(default),
        Some(Value::String(s)) => parse(s).ok_or_else(|| ClassifierError::SchemaValidation {
            field,
            reason: format!("unknown label `{s}`"),
        }),
        Some(other) => Err(ClassifierError::SchemaValidation {
            field,
            reason: format!("expected a string, found {}", json_kind(other)),
        }),
    }
}

/// Read a numeric field. Absent, null and zero values all mean "unset"
/// and give `default`.
fn number_field(
    fields: &Map<String, Value>,
    field: &'static str,
    default: f64,
) -> Result<f64, ClassifierError> {
    let invalid = |found: &str| ClassifierError::SchemaValidation {
        field,
        reason: format!("expected a number, found {found}"),
    };
    let number = match fields.get(field) {
        None | Some(Value::Null) => return Ok(default),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| invalid("an unrepresentable number"))?,
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| invalid(&format!("string `{s}`")))?,
        Some(other) => return Err(invalid(json_kind(other))),
    };
    Ok(if number == 0.0 { default } else { number })
}

fn string_list(fields: &Map<String, Value>, field: &str) -> Vec<String> {
    match fields.get(field) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unique()
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend returning a canned reply and counting calls.
    struct CannedBackend {
        reply: Result<String, fn() -> ClassifierError>,
        calls: AtomicUsize,
    }

    impl CannedBackend {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(make: fn() -> ClassifierError) -> Self {
            Self {
                reply: Err(make),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl AskAsync for CannedBackend {
        type Response = String;

        async fn ask(&self, text: &str) -> Result<String, ClassifierError> {
            assert!(text.contains("Title: \""));
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(reply) => Ok(reply.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    fn fixed_time() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-05-06T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    const FULL_REPLY: &str = r#"```json
{
  "sentiment": "negative",
  "confidence": 0.83,
  "emotional_tone": "urgent",
  "severity_level": "critical",
  "health_impact": "harmful",
  "public_concern_level": 9,
  "key_emotions": ["fear", "urgency", "fear"],
  "reasoning": "Rapid spread of a lethal strain.",
  "risk_indicators": ["rapid-spread"],
  "actionability": "immediate"
}
```"#;

    #[test]
    fn test_normalize_full_reply() {
        let result = normalize_reply(FULL_REPLY, fixed_time()).unwrap();
        assert_eq!(result.sentiment, Sentiment::Negative);
        assert_eq!(result.confidence, 0.83);
        assert_eq!(result.emotional_tone, EmotionalTone::Urgent);
        assert_eq!(result.severity_level, SeverityLevel::Critical);
        assert_eq!(result.public_concern_level, 9);
        assert_eq!(result.key_emotions, vec!["fear", "urgency"]);
        assert_eq!(result.risk_indicators, vec!["rapid-spread"]);
        assert_eq!(result.actionability, Actionability::Immediate);
        assert_eq!(result.analyzed_at, fixed_time());
    }

    #[test]
    fn test_normalize_fills_defaults_for_missing_fields() {
        let result = normalize_reply("{}", fixed_time()).unwrap();
        assert_eq!(result.sentiment, Sentiment::Neutral);
        assert_eq!(result.confidence, 0.5);
        assert_eq!(result.emotional_tone, EmotionalTone::Informative);
        assert_eq!(result.severity_level, SeverityLevel::Medium);
        assert_eq!(result.health_impact, HealthImpact::Neutral);
        assert_eq!(result.public_concern_level, 5);
        assert!(result.key_emotions.is_empty());
        assert_eq!(result.reasoning, "AI-powered sentiment analysis");
        assert!(result.risk_indicators.is_empty());
        assert_eq!(result.actionability, Actionability::Routine);
    }

    #[test]
    fn test_normalize_clamps_out_of_range_numbers() {
        let result = normalize_reply(
            r#"{"sentiment": "Positive", "confidence": 1.7, "public_concern_level": 42}"#,
            fixed_time(),
        )
        .unwrap();
        assert_eq!(result.sentiment, Sentiment::Positive);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.public_concern_level, 10);

        let result = normalize_reply(
            r#"{"confidence": -0.2, "public_concern_level": "-3"}"#,
            fixed_time(),
        )
        .unwrap();
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.public_concern_level, 1);
    }

    #[test]
    fn test_normalize_treats_zero_numbers_as_unset() {
        let result = normalize_reply(
            r#"{"sentiment": "negative", "confidence": 0, "public_concern_level": 0}"#,
            fixed_time(),
        )
        .unwrap();
        assert_eq!(result.confidence, 0.5);
        assert_eq!(result.public_concern_level, 5);

        let result = normalize_reply(
            r#"{"confidence": "0.0", "public_concern_level": "0"}"#,
            fixed_time(),
        )
        .unwrap();
        assert_eq!(result.confidence, 0.5);
        assert_eq!(result.public_concern_level, 5);
    }

    #[test]
    fn test_normalize_coerces_non_list_fields_to_empty() {
        let result = normalize_reply(
            r#"{"key_emotions": "fear", "risk_indicators": {"a": 1}}"#,
            fixed_time(),
        )
        .unwrap();
        assert!(result.key_emotions.is_empty());
        assert!(result.risk_indicators.is_empty());
    }

    #[test]
    fn test_normalize_rejects_unknown_label() {
        let err = normalize_reply(r#"{"sentiment": "ecstatic"}"#, fixed_time()).unwrap_err();
        assert!(matches!(
            err,
            ClassifierError::SchemaValidation { field: "sentiment", .. }
        ));
    }

    #[test]
    fn test_normalize_rejects_wrong_types() {
        let err = normalize_reply(r#"{"confidence": [0.9]}"#, fixed_time()).unwrap_err();
        assert!(matches!(
            err,
            ClassifierError::SchemaValidation { field: "confidence", .. }
        ));

        let err = normalize_reply(r#"{"severity_level": 3}"#, fixed_time()).unwrap_err();
        assert!(matches!(
            err,
            ClassifierError::SchemaValidation { field: "severity_level", .. }
        ));

        let err = normalize_reply(r#"["negative"]"#, fixed_time()).unwrap_err();
        assert!(matches!(err, ClassifierError::SchemaValidation { field: "reply", .. }));
    }

    #[test]
    fn test_normalize_rejects_malformed_json() {
        let err = normalize_reply("The article is negative.", fixed_time()).unwrap_err();
        assert!(matches!(err, ClassifierError::MalformedJson(_)));
    }

    #[test]
    fn test_prompt_embeds_article_and_schema() {
        let prompt = build_prompt("Variant found", "Scientists track a new variant");
        assert!(prompt.contains(r#"Title: "Variant found""#));
        assert!(prompt.contains(r#"Description: "Scientists track a new variant""#));
        for field in [
            "sentiment",
            "confidence",
            "emotional_tone",
            "severity_level",
            "health_impact",
            "public_concern_level",
            "key_emotions",
            "reasoning",
            "risk_indicators",
            "actionability",
        ] {
            assert!(prompt.contains(&format!("\"{field}\"")), "missing {field}");
        }
    }

    #[tokio::test]
    async fn test_classify_without_backend_uses_heuristic() {
        let classifier: SentimentClassifier<CannedBackend> = SentimentClassifier::new(None);
        assert!(!classifier.is_model_powered());

        let outcome = classifier.classify("vaccine breakthrough cure", "").await;
        assert!(matches!(
            outcome,
            Classification::Fallback { reason: FallbackReason::Disabled, .. }
        ));
        assert_eq!(outcome.result().sentiment, Sentiment::Positive);
    }

    #[tokio::test]
    async fn test_classify_uses_model_reply() {
        let classifier = SentimentClassifier::new(Some(CannedBackend::replying(FULL_REPLY)));
        let outcome = classifier.classify("Lethal strain spreads", "Officials warn").await;
        assert!(outcome.is_model());
        assert_eq!(outcome.result().severity_level, SeverityLevel::Critical);
    }

    #[tokio::test]
    async fn test_classify_falls_back_on_transport_error() {
        let backend = CannedBackend::failing(|| ClassifierError::EmptyResponse);
        let classifier = SentimentClassifier::new(Some(backend));
        let outcome = classifier.classify("outbreak death pandemic", "").await;

        match &outcome {
            Classification::Fallback {
                reason: FallbackReason::Failed(ClassifierError::EmptyResponse),
                result,
            } => {
                assert_eq!(result.sentiment, Sentiment::Negative);
                assert_eq!(result.severity_level, SeverityLevel::High);
            }
            other => panic!("expected fallback, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_classify_falls_back_on_schema_violation() {
        let backend = CannedBackend::replying(r#"{"sentiment": 1}"#);
        let classifier = SentimentClassifier::new(Some(backend));
        let outcome = classifier.classify("", "").await;

        assert!(!outcome.is_model());
        let result = outcome.into_result();
        assert_eq!(result.sentiment, Sentiment::Neutral);
        assert_eq!(result.confidence, 0.6);
    }

    #[tokio::test]
    async fn test_classify_calls_backend_once_without_retry() {
        let classifier = SentimentClassifier::new(Some(CannedBackend::replying("not json")));
        let _ = classifier.classify("title", "description").await;
        let backend = classifier.backend.as_ref().unwrap();
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_gemini_client_builds_url_and_redacts_key() {
        let config = ClassifierConfig {
            endpoint: "https://example.test/v1beta/".to_string(),
            ..ClassifierConfig::default()
        };
        let client = GeminiClient::new(Client::new(), &config, "k&y".to_string()).unwrap();
        assert_eq!(
            client.generate_url(),
            "https://example.test/v1beta/models/gemini-1.5-flash:generateContent?key=k%26y"
        );
        let debug = format!("{client:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("k&y"));
    }

    #[test]
    fn test_gemini_client_rejects_bad_endpoint() {
        let config = ClassifierConfig {
            endpoint: "not a url".to_string(),
            ..ClassifierConfig::default()
        };
        let err = GeminiClient::new(Client::new(), &config, "key".to_string()).unwrap_err();
        assert!(matches!(err, ClassifierError::Endpoint(_)));
    }
}
