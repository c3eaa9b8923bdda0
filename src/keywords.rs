//! Frequency-ranked keyword extraction with a health-term allow-list.

use crate::lexicon::{HEALTH_TERMS, STOPWORDS};
use crate::models::KeywordCount;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

static TOKEN_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]+").expect("token separator pattern is valid"));

static STOPWORD_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| STOPWORDS.iter().copied().collect());

static HEALTH_TERM_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| HEALTH_TERMS.iter().copied().collect());

/// Token length threshold and result size for one extraction context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordConfig {
    /// Tokens must be strictly longer than this.
    pub min_token_len: usize,
    /// Maximum number of keywords returned.
    pub limit: usize,
}

impl KeywordConfig {
    /// Keywords stored with each ingested article.
    pub const ARTICLE: KeywordConfig = KeywordConfig {
        min_token_len: 2,
        limit: 50,
    };

    /// Top keywords reported alongside sentiment trends.
    pub const TRENDS: KeywordConfig = KeywordConfig {
        min_token_len: 2,
        limit: 20,
    };

    /// Interactive scoring view; skips three-letter tokens.
    pub const DASHBOARD: KeywordConfig = KeywordConfig {
        min_token_len: 3,
        limit: 30,
    };
}

#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    config: KeywordConfig,
}

impl KeywordExtractor {
    pub fn new(config: KeywordConfig) -> Self {
        Self { config }
    }

    /// Rank the keywords of `text` by frequency, most frequent first.
    ///
    /// Ties keep the order in which the keywords first appeared.
    pub fn extract(&self, text: &str) -> Vec<KeywordCount> {
        let lowered = text.to_lowercase();

        let mut counts: HashMap<&str, (u32, usize)> = HashMap::new();
        for (position, token) in TOKEN_SEPARATOR
            .split(&lowered)
            .filter(|token| self.keep(token))
            .enumerate()
        {
            counts.entry(token).or_insert((0, position)).0 += 1;
        }

        counts
            .into_iter()
            .sorted_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
                count_b.cmp(count_a).then(first_a.cmp(first_b))
            })
            .take(self.config.limit)
            .map(|(keyword, (count, _))| KeywordCount {
                keyword: keyword.to_string(),
                count,
            })
            .collect()
    }

    fn keep(&self, token: &str) -> bool {
        token.len() > self.config.min_token_len
            && token.chars().all(|c| c.is_ascii_alphabetic())
            && (!STOPWORD_SET.contains(token) || HEALTH_TERM_SET.contains(token))
    }
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::new(KeywordConfig::ARTICLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords(result: &[KeywordCount]) -> Vec<&str> {
        result.iter().map(|k| k.keyword.as_str()).collect()
    }

    #[test]
    fn test_drops_stopwords_and_keeps_domain_terms() {
        let result = KeywordExtractor::default().extract("the covid vaccine trial");
        assert_eq!(keywords(&result), vec!["covid", "vaccine", "trial"]);
        assert!(result.iter().all(|k| k.count == 1));
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        assert!(KeywordExtractor::default().extract("").is_empty());
        assert!(KeywordExtractor::default().extract("  ,;  ").is_empty());
    }

    #[test]
    fn test_filters_short_and_non_alphabetic_tokens() {
        let result = KeywordExtractor::default().extract("UK covid-19 cases at 2000 in h5n1 wave");
        assert_eq!(keywords(&result), vec!["covid", "cases", "wave"]);
    }

    #[test]
    fn test_dashboard_preset_drops_short_words() {
        let extractor = KeywordExtractor::new(KeywordConfig::DASHBOARD);
        let result = extractor.extract("new flu wave hits city");
        assert_eq!(keywords(&result), vec!["wave", "hits", "city"]);
    }

    #[test]
    fn test_ranks_by_frequency_then_first_appearance() {
        let result = KeywordExtractor::default()
            .extract("Masks work. Vaccines work. Testing helps; vaccines help. Vaccines!");
        assert_eq!(result[0], KeywordCount { keyword: "vaccines".to_string(), count: 3 });
        assert_eq!(result[1], KeywordCount { keyword: "work".to_string(), count: 2 });
        assert_eq!(keywords(&result[2..]), vec!["masks", "testing", "helps", "help"]);
    }

    #[test]
    fn test_truncates_to_limit() {
        let extractor = KeywordExtractor::new(KeywordConfig {
            min_token_len: 2,
            limit: 2,
        });
        let result = extractor.extract("alpha beta gamma delta alpha");
        assert_eq!(keywords(&result), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_lowercases_before_counting() {
        let result = KeywordExtractor::default().extract("Outbreak OUTBREAK outbreak");
        assert_eq!(result, vec![KeywordCount { keyword: "outbreak".to_string(), count: 3 }]);
    }
}
