use crate::error::{Error, Result};
use crate::sentiment::ThresholdPolicy;
use chrono::Duration;
use std::env;
use std::str::FromStr;
use std::time::Duration as StdDuration;

pub const DEFAULT_SEARCH_URL: &str = "https://api.twitter.com/2/tweets/search/recent";

/// Backoff after a 429 is never shorter than this, whatever the environment says.
const MIN_RATE_LIMIT_BACKOFF: StdDuration = StdDuration::from_secs(1);
/// Same for the gap between pages of one burst.
const MIN_PAGE_PACING: StdDuration = StdDuration::from_millis(400);

/// Timing knobs for [crate::fetcher::PaginatedFetcher].
///
/// NB: [credential_cooldown] and [crate::session_gate::SessionRateGate]'s window are separate
/// settings on purpose; one benches a single token, the other benches the whole session.
#[derive(Clone, Debug)]
pub struct FetchConfig {
    pub search_url: String,
    pub credential_cooldown: Duration,
    pub rate_limit_backoff: StdDuration,
    pub page_pacing: StdDuration,
    pub request_timeout: StdDuration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_SEARCH_URL.to_string(),
            credential_cooldown: Duration::minutes(15),
            rate_limit_backoff: StdDuration::from_secs(2),
            page_pacing: MIN_PAGE_PACING,
            request_timeout: StdDuration::from_secs(10),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub bearer_tokens: Vec<String>,
    pub fetch: FetchConfig,
    pub session_cooldown: Duration,
    pub sentiment_policy: ThresholdPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bearer_tokens: Vec::new(),
            fetch: FetchConfig::default(),
            session_cooldown: Duration::minutes(16),
            sentiment_policy: ThresholdPolicy::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup; anything missing keeps its default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(tokens) = lookup("TWITTER_BEARER_TOKENS") {
            config.bearer_tokens = parse_bearer_tokens(&tokens);
        }
        if let Some(url) = lookup("TWITTER_SEARCH_URL") {
            config.fetch.search_url = url;
        }
        if let Some(cooldown) = parse_cooldown(&lookup, "CREDENTIAL_COOLDOWN_SECS")? {
            config.fetch.credential_cooldown = cooldown;
        }
        if let Some(cooldown) = parse_cooldown(&lookup, "SESSION_COOLDOWN_SECS")? {
            config.session_cooldown = cooldown;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "RATE_LIMIT_BACKOFF_MS")? {
            config.fetch.rate_limit_backoff =
                StdDuration::from_millis(ms).max(MIN_RATE_LIMIT_BACKOFF);
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "PAGE_PACING_MS")? {
            config.fetch.page_pacing = StdDuration::from_millis(ms).max(MIN_PAGE_PACING);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "REQUEST_TIMEOUT_SECS")? {
            if secs == 0 {
                return Err(Error::Config("REQUEST_TIMEOUT_SECS must be at least 1".into()));
            }
            config.fetch.request_timeout = StdDuration::from_secs(secs);
        }
        if let Some(policy) = parse_var::<ThresholdPolicy>(&lookup, "SENTIMENT_POLICY")? {
            config.sentiment_policy = policy;
        }

        Ok(config)
    }
}

/// Splits a comma list of tokens, dropping blanks.
pub fn parse_bearer_tokens(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(String::from)
        .collect()
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("{key} has an invalid value: {value:?}"))),
    }
}

/// Whole seconds, zero or more, small enough to add to a timestamp.
fn parse_cooldown(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<Duration>> {
    let Some(secs) = parse_var::<i64>(lookup, key)? else {
        return Ok(None);
    };
    if secs < 0 {
        return Err(Error::Config(format!("{key} must not be negative, got {secs}")));
    }
    Duration::try_seconds(secs)
        .map(Some)
        .ok_or_else(|| Error::Config(format!("{key} is out of range: {secs}")))
}
