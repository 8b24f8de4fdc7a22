//! In-memory stand-ins for the search API.

use crate::twitter_client::{api, PageOutcome, SearchApi, SearchQuery};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

pub enum Step {
    Reply(Result<PageOutcome>),
    /// Never answers in any reasonable time.
    Hang,
}

/// Plays back a fixed script of replies and records every call it receives.
pub struct ScriptedApi {
    steps: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<(String, SearchQuery)>>,
}

impl ScriptedApi {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, SearchQuery)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchApi for ScriptedApi {
    async fn search_recent(&self, bearer_token: &str, query: &SearchQuery) -> Result<PageOutcome> {
        self.calls
            .lock()
            .unwrap()
            .push((bearer_token.to_string(), query.clone()));
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Reply(reply)) => reply,
            Some(Step::Hang) => {
                tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
                Err(anyhow!("hung request finally gave up"))
            }
            None => Err(anyhow!("script exhausted")),
        }
    }
}

pub fn page(texts: &[&str], next_token: Option<&str>) -> Step {
    Step::Reply(Ok(PageOutcome::Page {
        tweets: texts.iter().map(|text| api::Tweet::from_text(text)).collect(),
        next_token: next_token.map(String::from),
    }))
}

/// A page of [count] tweets reading "{prefix} 0", "{prefix} 1", ...
pub fn page_of(prefix: &str, count: usize, next_token: Option<&str>) -> Step {
    let texts: Vec<String> = (0..count).map(|i| format!("{prefix} {i}")).collect();
    let texts: Vec<&str> = texts.iter().map(String::as_str).collect();
    page(&texts, next_token)
}
