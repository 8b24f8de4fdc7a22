pub mod api;

use crate::config::DEFAULT_SEARCH_URL;
use anyhow::{Context, Result};
use async_trait::async_trait;
use hyper::client::HttpConnector;
use hyper::{Body, Client, Method, Request, StatusCode};
use hyper_tls::HttpsConnector;
use url::Url;

pub const TWEET_FIELDS: &str = "text,created_at,author_id";

/// The API refuses page sizes above this.
pub const MAX_PAGE_SIZE: usize = 100;

/// Query parameters for one page of recent search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchQuery {
    pub query: String,
    pub max_results: usize,
    pub tweet_fields: &'static str,
    pub next_token: Option<String>,
}

impl SearchQuery {
    /// English, non-retweet hits for [keyword].
    pub fn for_keyword(keyword: &str, max_results: usize, next_token: Option<String>) -> Self {
        Self {
            query: format!("{keyword} -is:retweet lang:en"),
            max_results: max_results.min(MAX_PAGE_SIZE),
            tweet_fields: TWEET_FIELDS,
            next_token,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PageOutcome {
    Page {
        tweets: Vec<api::Tweet>,
        next_token: Option<String>,
    },
    /// HTTP 429 for the token that was used.
    RateLimited,
    /// Any other non-200 status.
    Rejected { status: u16 },
}

/// One page of recent search, authorized by a single bearer token.
///
/// NB: [Err] is reserved for transport-level failures; HTTP statuses come back as [PageOutcome].
#[async_trait]
pub trait SearchApi: Send + Sync {
    async fn search_recent(&self, bearer_token: &str, query: &SearchQuery) -> Result<PageOutcome>;
}

#[derive(Debug, Clone)]
pub struct TwitterClient {
    https_client: Client<HttpsConnector<HttpConnector>>,
    search_url: String,
}

impl TwitterClient {
    pub fn new(search_url: &str) -> Self {
        let https = HttpsConnector::new();
        let https_client = Client::builder().build::<_, hyper::Body>(https);
        Self {
            https_client,
            search_url: search_url.to_string(),
        }
    }

    fn search_uri(&self, query: &SearchQuery) -> Result<Url> {
        let mut uri = Url::parse(&self.search_url)
            .with_context(|| format!("Bad search url {}", self.search_url))?;

        uri.query_pairs_mut()
            .append_pair("query", &query.query)
            .append_pair("max_results", &query.max_results.to_string())
            .append_pair("tweet.fields", query.tweet_fields);

        if let Some(next_token) = &query.next_token {
            uri.query_pairs_mut().append_pair("next_token", next_token);
        }

        Ok(uri)
    }
}

impl Default for TwitterClient {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_URL)
    }
}

#[async_trait]
impl SearchApi for TwitterClient {
    async fn search_recent(&self, bearer_token: &str, query: &SearchQuery) -> Result<PageOutcome> {
        let uri = self.search_uri(query)?;
        let req = Request::builder()
            .method(Method::GET)
            .uri(uri.to_string())
            .header("Authorization", format!("Bearer {bearer_token}"))
            .body(Body::empty())?;

        let resp = self.https_client.request(req).await?;
        match resp.status() {
            StatusCode::OK => {
                let body = hyper::body::to_bytes(resp.into_body()).await?;
                let resp: api::Response<Vec<api::Tweet>> =
                    serde_json::from_slice(&body).context("Malformed search response")?;
                Ok(PageOutcome::Page {
                    tweets: resp.data.unwrap_or_default(),
                    next_token: resp.meta.and_then(|meta| meta.next_token),
                })
            }
            StatusCode::TOO_MANY_REQUESTS => {
                if let Some(reset) = resp.headers().get("x-rate-limit-reset") {
                    tracing::debug!(reset = ?reset, "rate limit window reset");
                }
                Ok(PageOutcome::RateLimited)
            }
            status => Ok(PageOutcome::Rejected {
                status: status.as_u16(),
            }),
        }
    }
}
