use thiserror::Error;

/// Errors surfaced to callers of the pipeline.
///
/// Operational trouble while fetching (rate limits, transport failures, upstream rejections) is
/// never reported through this type; it degrades into fewer or synthetic results instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
