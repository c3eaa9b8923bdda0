//! Deterministic keyword-weighted sentiment scoring.
//!
//! The scorer sums weighted lexicon hits into positive, negative and critical
//! signals, derives an intensity from their balance and the text length, and
//! classifies with an ordered policy where the first matching rule wins:
//!
//! 1. clearly positive balance
//! 2. clearly negative balance, or any critical term present
//! 3. both kinds of signal present (mixed)
//! 4. neutral defaults
//!
//! It is also the fallback for every failure of the model-backed classifier,
//! so it must never fail: empty input yields the neutral defaults.

use crate::lexicon::{CRITICAL_INCREMENT, CRITICAL_TERMS, NEGATIVE_TERMS, POSITIVE_TERMS};
use crate::models::{
    Actionability, EmotionalTone, HealthImpact, SentimentResult, Sentiment, SeverityLevel,
};
use crate::utils::round2;
use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::debug;

/// Raw lexicon totals for a lowercased text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Signals {
    pub positive: u32,
    pub negative: u32,
    pub critical: u32,
}

impl Signals {
    pub fn total(&self) -> i64 {
        i64::from(self.positive) - i64::from(self.negative) - i64::from(self.critical)
    }
}

/// Count weighted lexicon hits in `text`, which must already be lowercase.
///
/// Weighted terms count every non-overlapping occurrence; critical terms
/// count once each, on presence.
pub fn signals(text: &str) -> Signals {
    let weighted = |terms: &[(&str, u32)]| -> u32 {
        terms
            .iter()
            .map(|(term, weight)| text.matches(term).count() as u32 * weight)
            .sum()
    };

    let critical = CRITICAL_TERMS
        .iter()
        .filter(|term| text.contains(*term))
        .count() as u32
        * CRITICAL_INCREMENT;

    Signals {
        positive: weighted(POSITIVE_TERMS),
        negative: weighted(NEGATIVE_TERMS),
        critical,
    }
}

/// Score an article, stamped with the current time.
pub fn score(title: &str, description: &str) -> SentimentResult {
    score_at(title, description, Utc::now())
}

/// Score an article with an explicit analysis timestamp.
///
/// Identical inputs always produce identical outputs.
pub fn score_at(title: &str, description: &str, analyzed_at: DateTime<Utc>) -> SentimentResult {
    let text = format!("{title} {description}").to_lowercase();
    let signals = signals(&text);

    let length_factor = (text.chars().count() as f64 / 1000.0).min(1.5);
    let total = signals.total();
    let intensity = total.abs() as f64 * length_factor;

    let mut sentiment = Sentiment::Neutral;
    let mut severity_level = SeverityLevel::Medium;
    let mut concern: i64 = 5;
    let mut confidence = 0.6;
    let mut emotional_tone = EmotionalTone::Informative;
    let mut health_impact = HealthImpact::Neutral;
    let mut actionability = Actionability::Routine;

    if total > 2 {
        sentiment = Sentiment::Positive;
        severity_level = SeverityLevel::Low;
        concern = (5 - floor(intensity / 2.0)).max(1);
        confidence = (0.6 + intensity / 20.0).min(0.9);
        emotional_tone = if intensity > 5.0 {
            EmotionalTone::Hopeful
        } else {
            EmotionalTone::Reassuring
        };
        health_impact = HealthImpact::Beneficial;
    } else if total < -2 || signals.critical > 0 {
        sentiment = Sentiment::Negative;
        if signals.critical > 5 || signals.negative > 15 {
            severity_level = SeverityLevel::Critical;
            concern = (7 + floor(intensity / 3.0)).min(10);
            emotional_tone = EmotionalTone::Alarming;
            actionability = Actionability::Immediate;
        } else if signals.negative > 8 {
            severity_level = SeverityLevel::High;
            concern = (6 + floor(intensity / 4.0)).min(9);
            emotional_tone = EmotionalTone::Concerning;
            actionability = Actionability::Monitor;
        } else {
            severity_level = SeverityLevel::Medium;
            concern = (5 + floor(intensity / 5.0)).min(8);
            emotional_tone = EmotionalTone::Concerning;
            actionability = Actionability::Monitor;
        }
        confidence = (0.6 + intensity / 15.0).min(0.9);
        health_impact = HealthImpact::Harmful;
    } else if signals.positive > 0 && signals.negative > 0 {
        sentiment = Sentiment::Mixed;
        let imbalance = i64::from(signals.negative) - i64::from(signals.positive);
        concern = 5 + floor(imbalance as f64 / 3.0);
        confidence = (0.5 + intensity / 25.0).min(0.8);
        actionability = Actionability::Monitor;
    }

    let public_concern_level = concern.clamp(1, 10) as u8;
    let confidence = round2(confidence.clamp(0.3, 0.95));

    debug!(
        %sentiment,
        confidence,
        public_concern_level,
        positive = signals.positive,
        negative = signals.negative,
        critical = signals.critical,
        "Heuristic sentiment scored"
    );

    SentimentResult {
        sentiment,
        confidence,
        emotional_tone,
        severity_level,
        health_impact,
        public_concern_level,
        key_emotions: key_emotions(sentiment),
        reasoning: format!(
            "Enhanced keyword analysis: {} positive signals, {} negative signals, \
             {} critical terms. Confidence based on signal strength.",
            signals.positive, signals.negative, signals.critical
        ),
        risk_indicators: risk_indicators(&signals),
        actionability,
        analyzed_at,
    }
}

/// Perturb a heuristic result the way the legacy bulk re-scorer did.
///
/// Confidence moves by up to ±0.05 and, for non-positive results, the
/// concern level by -1 or 0. Bounds are re-applied afterwards.
pub fn apply_jitter<R: Rng + ?Sized>(result: &mut SentimentResult, rng: &mut R) {
    let shift = (rng.random::<f64>() - 0.5) * 0.1;
    result.confidence = round2((result.confidence + shift).clamp(0.3, 0.95));

    if result.sentiment != Sentiment::Positive {
        let step = ((rng.random::<f64>() - 0.5) * 2.0).floor() as i64;
        let concern = i64::from(result.public_concern_level) + step;
        result.public_concern_level = concern.clamp(1, 10) as u8;
    }
}

fn floor(value: f64) -> i64 {
    value.floor() as i64
}

fn key_emotions(sentiment: Sentiment) -> Vec<String> {
    let emotions: &[&str] = match sentiment {
        Sentiment::Positive => &["hope", "relief", "optimism"],
        Sentiment::Negative => &["concern", "anxiety", "worry"],
        Sentiment::Neutral | Sentiment::Mixed => &["awareness", "attention"],
    };
    emotions.iter().map(|e| e.to_string()).collect()
}

fn risk_indicators(signals: &Signals) -> Vec<String> {
    let indicators: &[&str] = if signals.negative > 5 {
        &["high-negative-sentiment", "health-concern-keywords"]
    } else if signals.critical > 0 {
        &["critical-health-terms"]
    } else {
        &[]
    };
    indicators.iter().map(|i| i.to_string()).collect()
}
