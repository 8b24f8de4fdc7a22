//! Three-way sentiment tagging on top of a lexical polarity score.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub const ALL: [SentimentLabel; 3] = [Self::Positive, Self::Neutral, Self::Negative];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "Positive",
            Self::Neutral => "Neutral",
            Self::Negative => "Negative",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a polarity score maps onto a label.
///
/// [DeadZone] treats anything in [-0.1, 0.1] as Neutral. [ZeroThreshold] only calls exactly 0.0
/// Neutral, so a faint 0.05 comes out Positive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThresholdPolicy {
    #[default]
    DeadZone,
    ZeroThreshold,
}

impl ThresholdPolicy {
    const DEAD_ZONE: f64 = 0.1;

    pub fn label(&self, polarity: f64) -> SentimentLabel {
        if !polarity.is_finite() {
            return SentimentLabel::Neutral;
        }
        let threshold = match self {
            Self::DeadZone => Self::DEAD_ZONE,
            Self::ZeroThreshold => 0.0,
        };
        if polarity > threshold {
            SentimentLabel::Positive
        } else if polarity < -threshold {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

impl FromStr for ThresholdPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dead-zone" | "deadzone" | "dead_zone" => Ok(Self::DeadZone),
            "zero" | "zero-threshold" | "zero_threshold" => Ok(Self::ZeroThreshold),
            other => Err(format!("unknown sentiment policy `{other}`")),
        }
    }
}

/// Given text, return a polarity in [-1.0, 1.0].
pub trait PolarityScorer: Send + Sync {
    fn polarity(&self, text: &str) -> f64;
}

/// Word-list scorer: mean polarity of the sentiment-bearing words, with simple negation and
/// intensifier handling on the preceding word.
pub struct LexiconScorer {
    words: HashMap<&'static str, f64>,
    intensifiers: HashMap<&'static str, f64>,
    re_word: Regex,
}

impl LexiconScorer {
    const NEGATION_FACTOR: f64 = -0.5;

    pub fn new() -> Self {
        Self {
            words: Self::build_lexicon(),
            intensifiers: Self::build_intensifiers(),
            re_word: Regex::new(r"[a-z]+(?:'[a-z]+)?").unwrap(),
        }
    }

    fn is_negator(word: &str) -> bool {
        matches!(word, "not" | "no" | "never" | "nothing" | "hardly") || word.ends_with("n't")
    }

    fn build_lexicon() -> HashMap<&'static str, f64> {
        [
            // Positive
            ("good", 0.7),
            ("great", 0.8),
            ("excellent", 1.0),
            ("amazing", 0.6),
            ("awesome", 1.0),
            ("best", 1.0),
            ("better", 0.5),
            ("love", 0.5),
            ("loved", 0.7),
            ("like", 0.2),
            ("happy", 0.8),
            ("nice", 0.6),
            ("strong", 0.4),
            ("stronger", 0.4),
            ("win", 0.8),
            ("wins", 0.8),
            ("winning", 0.5),
            ("gain", 0.4),
            ("gains", 0.4),
            ("growth", 0.3),
            ("profit", 0.4),
            ("profitable", 0.5),
            ("bullish", 0.6),
            ("rally", 0.4),
            ("record", 0.3),
            ("beat", 0.3),
            ("up", 0.1),
            ("success", 0.6),
            ("successful", 0.75),
            ("impressive", 1.0),
            ("positive", 0.2),
            ("optimistic", 0.5),
            ("wonderful", 1.0),
            ("fantastic", 0.4),
            ("perfect", 1.0),
            ("exciting", 0.3),
            ("solid", 0.3),
            ("upgrade", 0.4),
            // Negative
            ("bad", -0.7),
            ("worse", -0.4),
            ("worst", -1.0),
            ("terrible", -1.0),
            ("awful", -1.0),
            ("horrible", -1.0),
            ("poor", -0.4),
            ("hate", -0.8),
            ("sad", -0.5),
            ("angry", -0.5),
            ("weak", -0.375),
            ("loss", -0.3),
            ("losses", -0.3),
            ("lose", -0.3),
            ("crash", -0.6),
            ("crashes", -0.6),
            ("bearish", -0.6),
            ("drop", -0.3),
            ("fall", -0.3),
            ("down", -0.15),
            ("fail", -0.5),
            ("failed", -0.5),
            ("failure", -0.6),
            ("scam", -0.8),
            ("fraud", -0.8),
            ("disappointing", -0.6),
            ("negative", -0.3),
            ("risky", -0.3),
            ("overpriced", -0.4),
            ("downgrade", -0.4),
            ("problem", -0.3),
            ("problems", -0.3),
            ("wrong", -0.5),
            ("broken", -0.4),
            ("expensive", -0.5),
            ("slow", -0.3),
        ]
        .into_iter()
        .collect()
    }

    fn build_intensifiers() -> HashMap<&'static str, f64> {
        [
            ("very", 1.3),
            ("really", 1.2),
            ("extremely", 1.5),
            ("super", 1.3),
            ("so", 1.2),
            ("incredibly", 1.4),
            ("slightly", 0.6),
            ("somewhat", 0.7),
        ]
        .into_iter()
        .collect()
    }
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl PolarityScorer for LexiconScorer {
    fn polarity(&self, text: &str) -> f64 {
        let text = text.to_lowercase();
        let words: Vec<&str> = self.re_word.find_iter(&text).map(|m| m.as_str()).collect();

        let mut total = 0.0;
        let mut matched = 0usize;
        for (i, word) in words.iter().enumerate() {
            let Some(&base) = self.words.get(word) else {
                continue;
            };
            let mut score = base;
            // NB: look back at most two words, so "not very good" still reads as negated
            for prev in words[i.saturating_sub(2)..i].iter().rev() {
                if let Some(&factor) = self.intensifiers.get(prev) {
                    score *= factor;
                } else if Self::is_negator(prev) {
                    score *= Self::NEGATION_FACTOR;
                    break;
                }
            }
            total += score.clamp(-1.0, 1.0);
            matched += 1;
        }

        if matched == 0 {
            0.0
        } else {
            (total / matched as f64).clamp(-1.0, 1.0)
        }
    }
}

#[derive(Clone)]
pub struct SentimentClassifier {
    scorer: Arc<dyn PolarityScorer>,
    policy: ThresholdPolicy,
}

impl SentimentClassifier {
    pub fn new(policy: ThresholdPolicy) -> Self {
        Self::with_scorer(Arc::new(LexiconScorer::new()), policy)
    }

    pub fn with_scorer(scorer: Arc<dyn PolarityScorer>, policy: ThresholdPolicy) -> Self {
        Self { scorer, policy }
    }

    pub fn policy(&self) -> ThresholdPolicy {
        self.policy
    }

    pub fn classify(&self, text: &str) -> SentimentLabel {
        self.policy.label(self.scorer.polarity(text))
    }
}

impl Default for SentimentClassifier {
    fn default() -> Self {
        Self::new(ThresholdPolicy::default())
    }
}

impl fmt::Debug for SentimentClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SentimentClassifier")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
