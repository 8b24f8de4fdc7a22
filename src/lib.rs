pub mod assembler;
pub mod clock;
pub mod config;
pub mod credential_pool;
pub mod error;
pub mod fetcher;
pub mod pipeline;
pub mod render;
pub mod sentiment;
pub mod session_gate;
pub mod store;
pub mod twitter_client;

#[cfg(test)]
mod testing;

pub use assembler::{ResultAssembler, ResultRow};
pub use error::{Error, Result};
pub use pipeline::{get_tweets, Burst, SentimentSession};
pub use sentiment::{SentimentClassifier, SentimentLabel, ThresholdPolicy};
pub use store::{distribution, save, Dataset};
