use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// A bearer token and the instant it may be used again.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    cooldown_until: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
            cooldown_until: None,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn cooldown_until(&self) -> Option<DateTime<Utc>> {
        self.cooldown_until
    }

    pub fn is_available(&self, now: DateTime<Utc>) -> bool {
        self.cooldown_until.map_or(true, |until| until <= now)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("cooldown_until", &self.cooldown_until)
            .finish()
    }
}

/// Fixed set of credentials with a rotation cursor. Only cooldowns and the cursor change after
/// construction.
///
/// NB: no locking in here. Share a pool between concurrent fetches only behind a mutex, since
/// select-then-use is a check-then-act sequence.
#[derive(Clone, Debug)]
pub struct CredentialPool {
    credentials: Vec<Credential>,
    current_index: usize,
    cooldown: Duration,
}

impl CredentialPool {
    pub fn new<S: AsRef<str>>(tokens: &[S], cooldown: Duration) -> Self {
        let mut credentials: Vec<Credential> = Vec::with_capacity(tokens.len());
        for token in tokens {
            let token = token.as_ref().trim();
            if token.is_empty() || credentials.iter().any(|c| c.token == token) {
                continue;
            }
            credentials.push(Credential::new(token));
        }
        Self {
            credentials,
            current_index: 0,
            cooldown,
        }
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    /// Tokenless pools only ever produce mock data.
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    pub fn credentials(&self) -> &[Credential] {
        &self.credentials
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn available_count(&self, now: DateTime<Utc>) -> usize {
        self.credentials
            .iter()
            .filter(|c| c.is_available(now))
            .count()
    }

    /// Picks the credential to use next, as `(index, credential)`.
    ///
    /// Prefers the cursor, then the first usable credential scanning forward with wrap-around.
    /// When everything is cooling down, returns the one that frees up soonest; callers must check
    /// [Credential::is_available] before sending it. [None] only for an empty pool.
    pub fn select_current(&self, now: DateTime<Utc>) -> Option<(usize, &Credential)> {
        let len = self.credentials.len();
        if len == 0 {
            return None;
        }

        let scan = (0..len).map(|offset| (self.current_index + offset) % len);
        for index in scan {
            let credential = &self.credentials[index];
            if credential.is_available(now) {
                return Some((index, credential));
            }
        }

        self.credentials
            .iter()
            .enumerate()
            .min_by_key(|(_, c)| c.cooldown_until)
    }

    /// Benches the credential with this token for the configured cooldown, counted from `now`.
    /// A cooldown that runs past the end of representable time benches it for good.
    pub fn mark_rate_limited(&mut self, token: &str, now: DateTime<Utc>) {
        let until = now
            .checked_add_signed(self.cooldown)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        if let Some(credential) = self.credentials.iter_mut().find(|c| c.token == token) {
            credential.cooldown_until = Some(until);
        }
    }

    pub fn advance(&mut self) {
        if !self.credentials.is_empty() {
            self.current_index = (self.current_index + 1) % self.credentials.len();
        }
    }
}
