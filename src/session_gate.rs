use crate::clock::Clock;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// What the session may still do, for display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuotaStatus {
    /// Tokenless mode; bursts are mock data and never throttled.
    Unlimited,
    Available { remaining: usize, total: usize },
    CoolingDown { minutes_left: i64 },
}

/// Session-wide burst throttle: once as many bursts have succeeded as there are credentials, no
/// new burst starts until the cooldown window has passed. Independent of per-credential
/// cooldowns.
#[derive(Debug)]
pub struct SessionRateGate {
    clock: Arc<dyn Clock>,
    cooldown: Duration,
    request_count: usize,
    /// When the window was last armed; [None] until the first time the quota is used up.
    last_request_time: Option<DateTime<Utc>>,
}

impl SessionRateGate {
    pub fn new(clock: Arc<dyn Clock>, cooldown: Duration) -> Self {
        Self {
            clock,
            cooldown,
            request_count: 0,
            last_request_time: None,
        }
    }

    pub fn request_count(&self) -> usize {
        self.request_count
    }

    pub fn last_request_time(&self) -> Option<DateTime<Utc>> {
        self.last_request_time
    }

    fn window_remaining(&self) -> Option<Duration> {
        let armed_at = self.last_request_time?;
        let elapsed = self.clock.now() - armed_at;
        (elapsed < self.cooldown).then(|| self.cooldown - elapsed)
    }

    pub fn may_proceed(&self, pool_size: usize) -> bool {
        if pool_size == 0 {
            return true;
        }
        !(self.window_remaining().is_some() && self.request_count >= pool_size)
    }

    pub fn record_success(&mut self, pool_size: usize) {
        self.request_count += 1;
        if pool_size > 0 && self.request_count >= pool_size {
            self.last_request_time = Some(self.clock.now());
            tracing::info!(
                requests = self.request_count,
                cooldown_secs = self.cooldown.num_seconds(),
                "session quota used up; cooldown started"
            );
        }
    }

    /// Clears the count once an armed window has run out. Call before showing quota so an expired
    /// cooldown doesn't linger as "exhausted".
    pub fn observe_reset(&mut self) {
        if self.last_request_time.is_some() && self.window_remaining().is_none() {
            tracing::debug!("session cooldown over; requests refreshed");
            self.request_count = 0;
            self.last_request_time = None;
        }
    }

    pub fn quota(&mut self, pool_size: usize) -> QuotaStatus {
        if pool_size == 0 {
            return QuotaStatus::Unlimited;
        }
        self.observe_reset();
        if self.request_count < pool_size {
            return QuotaStatus::Available {
                remaining: pool_size - self.request_count,
                total: pool_size,
            };
        }
        match self.window_remaining() {
            Some(remaining) => QuotaStatus::CoolingDown {
                minutes_left: remaining.num_seconds() / 60 + 1,
            },
            // exhausted but never armed, e.g. the pool shrank below the count
            None => QuotaStatus::Available {
                remaining: 0,
                total: pool_size,
            },
        }
    }
}
