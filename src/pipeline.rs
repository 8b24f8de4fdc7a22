use crate::assembler::{ResultAssembler, ResultRow};
use crate::clock::{Clock, SystemClock};
use crate::config::{Config, FetchConfig};
use crate::credential_pool::CredentialPool;
use crate::error::Result;
use crate::fetcher::{FetchRequest, PaginatedFetcher};
use crate::sentiment::SentimentClassifier;
use crate::session_gate::{QuotaStatus, SessionRateGate};
use crate::twitter_client::{SearchApi, TwitterClient};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq)]
pub enum Burst {
    Completed(Vec<ResultRow>),
    /// The session gate refused to start a burst; nothing was fetched.
    Throttled(QuotaStatus),
}

/// Fetch, tag and trim in one go, with a throwaway pool.
///
/// Only bad arguments are errors; with no credentials (or none that work) the rows are synthetic.
pub async fn get_tweets<S: AsRef<str>>(
    keyword: &str,
    max_results: usize,
    credentials: &[S],
) -> Result<Vec<ResultRow>> {
    let request = FetchRequest::new(keyword, max_results)?;
    let fetch_config = FetchConfig::default();
    let pool = CredentialPool::new(credentials, fetch_config.credential_cooldown);
    let fetcher = PaginatedFetcher::new(
        TwitterClient::new(&fetch_config.search_url),
        pool,
        Arc::new(SystemClock),
        fetch_config,
    );
    let raw = fetcher.fetch(&request).await;
    Ok(ResultAssembler::default().assemble(&raw, request.max_results()))
}

/// Everything one interactive session owns: the credential pool (inside the fetcher), the
/// classifier, and the burst gate.
#[derive(Debug)]
pub struct SentimentSession<A> {
    fetcher: PaginatedFetcher<A>,
    assembler: ResultAssembler,
    gate: SessionRateGate,
}

impl SentimentSession<TwitterClient> {
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            TwitterClient::new(&config.fetch.search_url),
            config,
            Arc::new(SystemClock),
        )
    }
}

impl<A: SearchApi> SentimentSession<A> {
    pub fn new(api: A, config: &Config, clock: Arc<dyn Clock>) -> Self {
        let pool = CredentialPool::new(
            config.bearer_tokens.as_slice(),
            config.fetch.credential_cooldown,
        );
        let fetcher = PaginatedFetcher::new(api, pool, clock.clone(), config.fetch.clone());
        let assembler = ResultAssembler::new(SentimentClassifier::new(config.sentiment_policy));
        let gate = SessionRateGate::new(clock, config.session_cooldown);
        Self {
            fetcher,
            assembler,
            gate,
        }
    }

    pub fn fetcher(&self) -> &PaginatedFetcher<A> {
        &self.fetcher
    }

    pub fn classifier(&self) -> &SentimentClassifier {
        self.assembler.classifier()
    }

    pub fn pool_size(&self) -> usize {
        self.fetcher.pool_size()
    }

    pub fn quota(&mut self) -> QuotaStatus {
        let pool_size = self.pool_size();
        self.gate.quota(pool_size)
    }

    pub async fn analyze(&mut self, keyword: &str, max_results: usize) -> Result<Burst> {
        let request = FetchRequest::new(keyword, max_results)?;
        let pool_size = self.pool_size();

        self.gate.observe_reset();
        if !self.gate.may_proceed(pool_size) {
            let quota = self.gate.quota(pool_size);
            tracing::info!(keyword = request.keyword(), ?quota, "burst throttled");
            return Ok(Burst::Throttled(quota));
        }

        let raw = self.fetcher.fetch(&request).await;
        let rows = self.assembler.assemble(&raw, request.max_results());
        if !rows.is_empty() {
            self.gate.record_success(pool_size);
        }
        Ok(Burst::Completed(rows))
    }
}
