use crate::sentiment::{SentimentClassifier, SentimentLabel};
use crate::twitter_client::api;
use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// A tagged tweet, in the column order it is persisted with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub text: String,
    pub sentiment: SentimentLabel,
    pub created_at: Option<DateTime<Utc>>,
    pub author_id: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ResultAssembler {
    classifier: SentimentClassifier,
}

impl ResultAssembler {
    pub fn new(classifier: SentimentClassifier) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &SentimentClassifier {
        &self.classifier
    }

    /// Tags each tweet, drops repeated texts (first one wins) and keeps at most [requested_max],
    /// preserving arrival order.
    pub fn assemble(&self, raw: &[api::Tweet], requested_max: usize) -> Vec<ResultRow> {
        raw.iter()
            .unique_by(|tweet| tweet.text.clone())
            .take(requested_max)
            .map(|tweet| ResultRow {
                text: tweet.text.clone(),
                sentiment: self.classifier.classify(&tweet.text),
                created_at: tweet.created_at,
                author_id: tweet.author_id.clone(),
            })
            .collect()
    }
}
