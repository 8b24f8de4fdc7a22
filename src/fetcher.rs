use crate::clock::Clock;
use crate::config::FetchConfig;
use crate::credential_pool::CredentialPool;
use crate::error::{Error, Result};
use crate::twitter_client::{api, PageOutcome, SearchApi, SearchQuery};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::time::{sleep, timeout};

/// A validated ask for up to [max_results] tweets about [keyword].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchRequest {
    keyword: String,
    max_results: usize,
}

impl FetchRequest {
    pub fn new(keyword: &str, max_results: usize) -> Result<Self> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(Error::InvalidInput("keyword must not be blank".to_string()));
        }
        if max_results == 0 {
            return Err(Error::InvalidInput(
                "max_results must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            keyword: keyword.to_string(),
            max_results,
        })
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    pub fn page_query(&self, remaining: usize, next_token: Option<String>) -> SearchQuery {
        SearchQuery::for_keyword(&self.keyword, remaining, next_token)
    }
}

/// Why a burst produced made-up tweets instead of live ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MockReason {
    NoCredentials,
    LiveDataUnavailable,
}

/// Deterministic stand-in tweets, numbered from 1.
pub fn synthetic_tweets(keyword: &str, count: usize, reason: MockReason) -> Vec<api::Tweet> {
    (1..=count)
        .map(|i| {
            let text = match reason {
                MockReason::NoCredentials => format!("Tweet about {keyword} #{i}"),
                MockReason::LiveDataUnavailable => format!("Tweet about {keyword} (mock) #{i}"),
            };
            api::Tweet::from_text(&text)
        })
        .collect()
}

/// Walks recent-search pages for a request, rotating bearer tokens on 429s.
///
/// [fetch] never fails: transport errors, upstream rejections and a fully rate-limited pool all
/// end the walk early, and an empty haul is replaced with synthetic tweets.
#[derive(Debug)]
pub struct PaginatedFetcher<A> {
    api: A,
    pool: Mutex<CredentialPool>,
    clock: Arc<dyn Clock>,
    config: FetchConfig,
}

impl<A: SearchApi> PaginatedFetcher<A> {
    pub fn new(api: A, pool: CredentialPool, clock: Arc<dyn Clock>, config: FetchConfig) -> Self {
        Self {
            api,
            pool: Mutex::new(pool),
            clock,
            config,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn pool(&self) -> MutexGuard<'_, CredentialPool> {
        self.pool.lock().unwrap()
    }

    pub fn pool_size(&self) -> usize {
        self.pool().len()
    }

    pub async fn fetch(&self, request: &FetchRequest) -> Vec<api::Tweet> {
        let keyword = request.keyword();
        let max_results = request.max_results();
        let pool_size = self.pool_size();

        if pool_size == 0 {
            tracing::debug!(keyword, "no credentials configured; using mock tweets");
            return synthetic_tweets(keyword, max_results, MockReason::NoCredentials);
        }

        let mut tweets: Vec<api::Tweet> = Vec::new();
        let mut next_token: Option<String> = None;
        let mut rate_limited = 0usize;

        while tweets.len() < max_results {
            let now = self.clock.now();
            let (index, token) = {
                let pool = self.pool();
                match pool.select_current(now) {
                    Some((index, credential)) if credential.is_available(now) => {
                        (index, credential.token().to_string())
                    }
                    Some((index, credential)) => {
                        tracing::warn!(
                            credential = index,
                            until = ?credential.cooldown_until(),
                            "every credential is cooling down"
                        );
                        break;
                    }
                    None => break,
                }
            };

            let query = request.page_query(max_results - tweets.len(), next_token.clone());
            let outcome = match timeout(
                self.config.request_timeout,
                self.api.search_recent(&token, &query),
            )
            .await
            {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(err)) => {
                    tracing::warn!(credential = index, error = %err, "search request failed");
                    break;
                }
                Err(_) => {
                    tracing::warn!(
                        credential = index,
                        timeout = ?self.config.request_timeout,
                        "search request timed out"
                    );
                    break;
                }
            };

            match outcome {
                PageOutcome::Page {
                    tweets: page,
                    next_token: page_next_token,
                } => {
                    tracing::debug!(credential = index, received = page.len(), "fetched page");
                    // NB: an empty page with a cursor would otherwise page forever
                    let page_was_empty = page.is_empty();
                    let wanted = max_results - tweets.len();
                    tweets.extend(page.into_iter().take(wanted));

                    match page_next_token {
                        Some(cursor) if !page_was_empty && tweets.len() < max_results => {
                            next_token = Some(cursor);
                            sleep(self.config.page_pacing).await;
                        }
                        _ => break,
                    }
                }
                PageOutcome::RateLimited => {
                    {
                        let mut pool = self.pool();
                        pool.mark_rate_limited(&token, self.clock.now());
                        pool.advance();
                    }
                    rate_limited += 1;
                    tracing::warn!(
                        credential = index,
                        rate_limited,
                        pool_size,
                        "credential rate limited; rotating"
                    );
                    if rate_limited >= pool_size {
                        tracing::warn!("every credential was rate limited during this fetch");
                        break;
                    }
                    sleep(self.config.rate_limit_backoff).await;
                }
                PageOutcome::Rejected { status } => {
                    tracing::warn!(credential = index, status, "search request rejected");
                    break;
                }
            }
        }

        if tweets.is_empty() {
            tracing::warn!(keyword, "no live tweets retrieved; using mock tweets");
            return synthetic_tweets(keyword, max_results, MockReason::LiveDataUnavailable);
        }

        tweets.truncate(max_results);
        tracing::info!(keyword, count = tweets.len(), "fetched live tweets");
        tweets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::testing::{page, page_of, ScriptedApi, Step};
    use chrono::Duration;
    use std::time::Duration as StdDuration;

    fn fetcher(tokens: &[&str], steps: Vec<Step>) -> (PaginatedFetcher<ScriptedApi>, ManualClock) {
        let clock = ManualClock::default();
        let config = FetchConfig::default();
        let pool = CredentialPool::new(tokens, config.credential_cooldown);
        let fetcher = PaginatedFetcher::new(
            ScriptedApi::new(steps),
            pool,
            Arc::new(clock.clone()),
            config,
        );
        (fetcher, clock)
    }

    fn texts(tweets: &[api::Tweet]) -> Vec<&str> {
        tweets.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_request_validation() {
        assert!(matches!(FetchRequest::new("  ", 10), Err(Error::InvalidInput(_))));
        assert!(matches!(FetchRequest::new("Tesla", 0), Err(Error::InvalidInput(_))));
        let request = FetchRequest::new("  Tesla ", 10).unwrap();
        assert_eq!(request.keyword(), "Tesla");
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_credentials_synthesizes() {
        let (fetcher, _) = fetcher(&[], vec![]);
        let tweets = fetcher.fetch(&FetchRequest::new("Tesla", 3).unwrap()).await;
        assert_eq!(
            texts(&tweets),
            vec!["Tweet about Tesla #1", "Tweet about Tesla #2", "Tweet about Tesla #3"]
        );
        assert!(fetcher.api().calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_page() {
        let (fetcher, _) = fetcher(&["t0"], vec![page(&["a", "b", "c"], None)]);
        let tweets = fetcher.fetch(&FetchRequest::new("Tesla", 5).unwrap()).await;
        assert_eq!(texts(&tweets), vec!["a", "b", "c"]);

        let calls = fetcher.api().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "t0");
        assert_eq!(calls[0].1.max_results, 5);
        assert_eq!(calls[0].1.query, "Tesla -is:retweet lang:en");
        assert_eq!(calls[0].1.next_token, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_paginates_with_cursor_and_pacing() {
        let (fetcher, _) = fetcher(
            &["t0"],
            vec![
                page_of("first", 100, Some("n1")),
                page_of("second", 100, None),
            ],
        );
        let started = tokio::time::Instant::now();
        let tweets = fetcher.fetch(&FetchRequest::new("Tesla", 150).unwrap()).await;
        assert_eq!(tweets.len(), 150);
        assert_eq!(tweets[100].text, "second 0");
        assert!(started.elapsed() >= StdDuration::from_millis(400));

        let calls = fetcher.api().calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].1.max_results, 100);
        assert_eq!(calls[1].1.max_results, 50);
        assert_eq!(calls[1].1.next_token.as_deref(), Some("n1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_enough_even_with_cursor() {
        let (fetcher, _) = fetcher(&["t0"], vec![page(&["a", "b", "c", "d"], Some("n1"))]);
        let tweets = fetcher.fetch(&FetchRequest::new("Tesla", 2).unwrap()).await;
        assert_eq!(texts(&tweets), vec!["a", "b"]);
        assert_eq!(fetcher.api().calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rotates_after_rate_limit() {
        let (fetcher, clock) = fetcher(
            &["t0", "t1", "t2"],
            vec![Step::Reply(Ok(PageOutcome::RateLimited)), page(&["a", "b"], None)],
        );
        let started = tokio::time::Instant::now();
        let tweets = fetcher.fetch(&FetchRequest::new("Tesla", 10).unwrap()).await;
        assert_eq!(texts(&tweets), vec!["a", "b"]);
        assert!(started.elapsed() >= StdDuration::from_secs(1));

        let calls = fetcher.api().calls();
        let tokens: Vec<&str> = calls.iter().map(|(token, _)| token.as_str()).collect();
        assert_eq!(tokens, vec!["t0", "t1"]);
        // same page retried
        assert_eq!(calls[0].1, calls[1].1);

        let pool = fetcher.pool();
        let cooldowns: Vec<_> = pool.credentials().iter().map(|c| c.cooldown_until()).collect();
        assert_eq!(
            cooldowns,
            vec![Some(clock.now() + Duration::minutes(15)), None, None]
        );
        assert_eq!(pool.current_index(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_rate_limited_falls_back_to_mock() {
        let (fetcher, clock) = fetcher(
            &["t0", "t1"],
            vec![
                Step::Reply(Ok(PageOutcome::RateLimited)),
                Step::Reply(Ok(PageOutcome::RateLimited)),
                page(&["never reached"], None),
            ],
        );
        let tweets = fetcher.fetch(&FetchRequest::new("Tesla", 2).unwrap()).await;
        assert_eq!(
            texts(&tweets),
            vec!["Tweet about Tesla (mock) #1", "Tweet about Tesla (mock) #2"]
        );
        assert_eq!(fetcher.api().calls().len(), 2);
        assert_eq!(fetcher.pool().available_count(clock.now()), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooling_pool_skips_network() {
        let (fetcher, clock) = fetcher(&["t0", "t1"], vec![page(&["a"], None)]);
        {
            let mut pool = fetcher.pool();
            pool.mark_rate_limited("t0", clock.now());
            pool.mark_rate_limited("t1", clock.now());
        }
        let tweets = fetcher.fetch(&FetchRequest::new("Tesla", 1).unwrap()).await;
        assert_eq!(texts(&tweets), vec!["Tweet about Tesla (mock) #1"]);
        assert!(fetcher.api().calls().is_empty());

        clock.advance(Duration::minutes(15));
        let tweets = fetcher.fetch(&FetchRequest::new("Tesla", 1).unwrap()).await;
        assert_eq!(texts(&tweets), vec!["a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_not_retried() {
        let (fetcher, _) = fetcher(
            &["t0", "t1"],
            vec![
                Step::Reply(Err(anyhow::anyhow!("connection reset"))),
                page(&["a"], None),
            ],
        );
        let tweets = fetcher.fetch(&FetchRequest::new("Tesla", 1).unwrap()).await;
        assert_eq!(texts(&tweets), vec!["Tweet about Tesla (mock) #1"]);
        assert_eq!(fetcher.api().calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_timeout() {
        let (fetcher, _) = fetcher(&["t0"], vec![Step::Hang, page(&["a"], None)]);
        let tweets = fetcher.fetch(&FetchRequest::new("Tesla", 1).unwrap()).await;
        assert_eq!(texts(&tweets), vec!["Tweet about Tesla (mock) #1"]);
        assert_eq!(fetcher.api().calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_upstream_rejection_keeps_partial_results() {
        let (fetcher, _) = fetcher(
            &["t0"],
            vec![
                page(&["a", "b"], Some("n1")),
                Step::Reply(Ok(PageOutcome::Rejected { status: 503 })),
            ],
        );
        let tweets = fetcher.fetch(&FetchRequest::new("Tesla", 10).unwrap()).await;
        assert_eq!(texts(&tweets), vec!["a", "b"]);
        assert_eq!(fetcher.api().calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_page_with_cursor_ends_pagination() {
        let (fetcher, _) = fetcher(
            &["t0"],
            vec![page(&[], Some("n1")), page(&["unreachable"], None)],
        );
        let tweets = fetcher.fetch(&FetchRequest::new("Tesla", 3).unwrap()).await;
        assert_eq!(tweets.len(), 3);
        assert!(tweets[0].text.contains("(mock)"));
        assert_eq!(fetcher.api().calls().len(), 1);
    }
}
