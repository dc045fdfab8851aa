use crate::settings::settings;
use regex::Regex;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::LazyLock;
use strum::{Display, EnumString};

static WORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-z0-9']+|!").unwrap());

/// Normalization constant for the compound score (sum / sqrt(sum^2 + alpha)).
const ALPHA: f32 = 15.0;
/// Valence multiplier when a hit is negated ("not good" flips and dampens).
const NEGATION_FACTOR: f32 = -0.74;
/// How many tokens before a hit are checked for negations and boosters.
const CONTEXT_WINDOW: usize = 3;
/// Emphasis added per trailing exclamation mark, capped at four.
const EXCLAMATION_BOOST: f32 = 0.292;
const MAX_EXCLAMATIONS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn from_score(score: f32) -> Self {
        let s = settings();
        if score >= s.scoring.positive_threshold {
            Sentiment::Positive
        } else if score <= s.scoring.negative_threshold {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }
}

/// A scored text: compound polarity in [-1, 1] plus the thresholded label.
#[derive(Debug, Clone)]
pub struct SentimentScore {
    pub label: Sentiment,
    pub score: f32,
    pub hits: Vec<LexiconHit>,
}

#[derive(Debug, Clone)]
pub struct LexiconHit {
    pub word: String,
    pub valence: f32,
}

pub trait Scorer {
    fn score(&self, text: &str) -> SentimentScore;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ScorerKind {
    Lexicon,
}

impl ScorerKind {
    pub fn build(self) -> Box<dyn Scorer + Send + Sync> {
        match self {
            ScorerKind::Lexicon => Box::new(LexiconScorer::new()),
        }
    }
}

/// Builds the scorer named in settings. Selecting a model is a configuration
/// choice, not a fallback chain.
pub fn scorer_from_settings() -> Result<Box<dyn Scorer + Send + Sync>, strum::ParseError> {
    let kind = ScorerKind::from_str(&settings().scoring.scorer)?;
    Ok(kind.build())
}

const LEXICON: &[(&str, f32)] = &[
    ("love", 3.2),
    ("loved", 2.9),
    ("loves", 2.9),
    ("adore", 3.0),
    ("amazing", 2.8),
    ("awesome", 3.1),
    ("excellent", 2.7),
    ("fantastic", 2.6),
    ("wonderful", 2.7),
    ("perfect", 2.7),
    ("brilliant", 2.8),
    ("best", 3.2),
    ("great", 3.1),
    ("good", 1.9),
    ("nice", 1.8),
    ("happy", 2.7),
    ("glad", 2.0),
    ("enjoy", 2.0),
    ("enjoyed", 2.0),
    ("like", 1.5),
    ("liked", 1.6),
    ("win", 2.8),
    ("won", 2.7),
    ("success", 2.4),
    ("beautiful", 2.9),
    ("fun", 2.3),
    ("cool", 1.3),
    ("thanks", 1.9),
    ("thank", 1.9),
    ("helpful", 1.8),
    ("impressive", 2.3),
    ("recommend", 1.7),
    ("hate", -2.7),
    ("hated", -2.9),
    ("hates", -2.7),
    ("awful", -2.0),
    ("terrible", -2.1),
    ("horrible", -2.5),
    ("worst", -3.1),
    ("bad", -2.5),
    ("sad", -2.1),
    ("angry", -2.3),
    ("mad", -2.2),
    ("annoying", -1.8),
    ("annoyed", -1.8),
    ("broken", -1.7),
    ("fail", -2.5),
    ("failed", -2.3),
    ("failure", -2.5),
    ("lose", -2.2),
    ("lost", -1.3),
    ("useless", -1.8),
    ("disappointing", -2.2),
    ("disappointed", -2.3),
    ("scam", -2.6),
    ("fraud", -2.8),
    ("crash", -1.4),
    ("ugly", -2.4),
    ("boring", -1.3),
    ("wrong", -2.1),
    ("problem", -1.7),
    ("problems", -1.7),
    ("bug", -1.3),
    ("bugs", -1.3),
];

const BOOSTERS: &[(&str, f32)] = &[
    ("absolutely", 0.293),
    ("completely", 0.293),
    ("extremely", 0.293),
    ("incredibly", 0.293),
    ("really", 0.267),
    ("so", 0.293),
    ("totally", 0.267),
    ("very", 0.267),
    ("barely", -0.293),
    ("hardly", -0.293),
    ("kinda", -0.293),
    ("slightly", -0.293),
    ("somewhat", -0.293),
];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "neither", "nor", "cannot", "can't", "won't", "don't", "doesn't",
    "didn't", "isn't", "aren't", "wasn't", "couldn't", "shouldn't", "wouldn't", "ain't",
];

/// Lexicon-based polarity scorer. Deterministic for a fixed lexicon; no I/O.
pub struct LexiconScorer {
    valences: HashMap<&'static str, f32>,
    boosters: HashMap<&'static str, f32>,
}

impl LexiconScorer {
    pub fn new() -> Self {
        Self {
            valences: LEXICON.iter().copied().collect(),
            boosters: BOOSTERS.iter().copied().collect(),
        }
    }

    fn token_valence(&self, tokens: &[String], idx: usize) -> Option<f32> {
        let mut valence = *self.valences.get(tokens[idx].as_str())?;

        let start = idx.saturating_sub(CONTEXT_WINDOW);
        for prior in &tokens[start..idx] {
            if let Some(boost) = self.boosters.get(prior.as_str()) {
                valence += boost * valence.signum();
            }
            if NEGATIONS.contains(&prior.as_str()) {
                valence *= NEGATION_FACTOR;
            }
        }

        Some(valence)
    }
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl Scorer for LexiconScorer {
    fn score(&self, text: &str) -> SentimentScore {
        let lowered = text.to_lowercase();
        let tokens: Vec<String> = WORD_PATTERN
            .find_iter(&lowered)
            .map(|m| m.as_str().to_string())
            .collect();

        let words: Vec<String> = tokens.iter().filter(|t| *t != "!").cloned().collect();
        if words.is_empty() {
            return SentimentScore {
                label: Sentiment::Neutral,
                score: 0.0,
                hits: Vec::new(),
            };
        }

        let mut sum = 0.0_f32;
        let mut hits = Vec::new();
        for idx in 0..words.len() {
            if let Some(valence) = self.token_valence(&words, idx) {
                sum += valence;
                hits.push(LexiconHit {
                    word: words[idx].clone(),
                    valence,
                });
            }
        }

        let exclamations = tokens.iter().filter(|t| *t == "!").count().min(MAX_EXCLAMATIONS);
        if sum != 0.0 {
            sum += exclamations as f32 * EXCLAMATION_BOOST * sum.signum();
        }

        let score = (sum / (sum * sum + ALPHA).sqrt()).clamp(-1.0, 1.0);
        SentimentScore {
            label: Sentiment::from_score(score),
            score,
            hits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_text() {
        let scorer = LexiconScorer::new();
        let result = scorer.score("I love this!");
        assert_eq!(result.label, Sentiment::Positive);
        assert!(result.score >= 0.05);
    }

    #[test]
    fn test_empty_text_is_neutral_zero() {
        let scorer = LexiconScorer::new();
        let result = scorer.score("");
        assert_eq!(result.label, Sentiment::Neutral);
        assert_eq!(result.score, 0.0);

        let whitespace = scorer.score("   \n\t ");
        assert_eq!(whitespace.label, Sentiment::Neutral);
        assert_eq!(whitespace.score, 0.0);
    }

    #[test]
    fn test_negative_text() {
        let scorer = LexiconScorer::new();
        let result = scorer.score("this is the worst, I hate it");
        assert_eq!(result.label, Sentiment::Negative);
        assert!(result.score <= -0.05);
    }

    #[test]
    fn test_negation_flips_polarity() {
        let scorer = LexiconScorer::new();
        let plain = scorer.score("this is good");
        let negated = scorer.score("this is not good");
        assert_eq!(plain.label, Sentiment::Positive);
        assert_eq!(negated.label, Sentiment::Negative);
    }

    #[test]
    fn test_booster_amplifies() {
        let scorer = LexiconScorer::new();
        let plain = scorer.score("this is good");
        let boosted = scorer.score("this is extremely good");
        assert!(boosted.score > plain.score);
    }

    #[test]
    fn test_no_lexicon_hits_is_neutral() {
        let scorer = LexiconScorer::new();
        let result = scorer.score("the quick brown fox jumps over the lazy dog");
        assert_eq!(result.label, Sentiment::Neutral);
        assert_eq!(result.score, 0.0);
        assert!(result.hits.is_empty());
    }

    #[test]
    fn test_deterministic() {
        let scorer = LexiconScorer::new();
        let a = scorer.score("great game but the ending was disappointing");
        let b = scorer.score("great game but the ending was disappointing");
        assert_eq!(a.score, b.score);
        assert_eq!(a.label, b.label);
    }

    #[test]
    fn test_score_bounds() {
        let scorer = LexiconScorer::new();
        let result =
            scorer.score("love love love amazing awesome best great perfect brilliant!!!!");
        assert!(result.score <= 1.0);
        assert!(result.score >= -1.0);
    }

    #[test]
    fn test_label_round_trip() {
        assert_eq!(Sentiment::Positive.to_string(), "positive");
        assert_eq!(
            Sentiment::from_str("neutral").unwrap(),
            Sentiment::Neutral
        );
    }

    #[test]
    fn test_scorer_kind_from_settings_name() {
        assert_eq!(ScorerKind::from_str("lexicon").unwrap(), ScorerKind::Lexicon);
        assert!(ScorerKind::from_str("transformer").is_err());
    }
}
