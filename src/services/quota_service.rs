use crate::error::{Error, Result};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Upstream limits for the generative model, plus the throttle cooldown.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct QuotaLimits {
    pub max_rpm: u32,
    pub max_rpd: u32,
    pub max_tpm: u64,
    #[serde(with = "secs")]
    pub cooldown: Duration,
    pub tokens_per_word: u64,
}

impl Default for QuotaLimits {
    fn default() -> Self {
        Self {
            max_rpm: 15,
            max_rpd: 1500,
            max_tpm: 1_000_000,
            cooldown: Duration::from_secs(60),
            tokens_per_word: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QuotaState {
    pub requests_this_minute: u32,
    pub requests_today: u32,
    pub tokens_this_minute: u64,
}

/// Outcome of a single locked admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Permit,
    Wait(Duration),
    Reject,
}

/// Process-wide counter of calls made to the generative model.
///
/// All three counters sit behind one mutex so admissions and the periodic
/// resets observe a single serialized view. The lock is never held across an
/// await point: waiting callers sleep unlocked and re-check afterwards.
#[derive(Debug)]
pub struct QuotaTracker {
    limits: QuotaLimits,
    state: Mutex<QuotaState>,
}

impl QuotaTracker {
    pub fn new(limits: QuotaLimits) -> Self {
        Self {
            limits,
            state: Mutex::new(QuotaState::default()),
        }
    }

    pub fn limits(&self) -> &QuotaLimits {
        &self.limits
    }

    /// Word count times a fixed factor. Not a tokenizer, only monotonic in prompt size.
    pub fn estimate_tokens(&self, prompt: &str) -> u64 {
        prompt.split_whitespace().count() as u64 * self.limits.tokens_per_word
    }

    pub fn admit(&self, cost: u64) -> Admission {
        let mut state = self.lock();

        if state.requests_today >= self.limits.max_rpd {
            return Admission::Reject;
        }
        if state.requests_this_minute >= self.limits.max_rpm {
            return Admission::Wait(self.limits.cooldown);
        }
        // An oversized prompt still goes through once the window is empty.
        if state.tokens_this_minute > 0
            && state.tokens_this_minute.saturating_add(cost) > self.limits.max_tpm
        {
            return Admission::Wait(self.limits.cooldown);
        }

        state.requests_this_minute += 1;
        state.requests_today += 1;
        state.tokens_this_minute = state.tokens_this_minute.saturating_add(cost);
        Admission::Permit
    }

    /// Blocks until the prompt is admitted, or fails once the daily cap is hit.
    pub async fn acquire(&self, prompt: &str) -> Result<()> {
        let cost = self.estimate_tokens(prompt);
        loop {
            match self.admit(cost) {
                Admission::Permit => return Ok(()),
                Admission::Wait(cooldown) => {
                    let snapshot = self.snapshot();
                    tracing::warn!(
                        requests_this_minute = snapshot.requests_this_minute,
                        tokens_this_minute = snapshot.tokens_this_minute,
                        estimated_tokens = cost,
                        cooldown_secs = cooldown.as_secs(),
                        "Per-minute model quota reached, waiting"
                    );
                    tokio::time::sleep(cooldown).await;
                }
                Admission::Reject => {
                    tracing::error!(
                        requests_today = self.snapshot().requests_today,
                        max_rpd = self.limits.max_rpd,
                        "Daily model quota reached"
                    );
                    return Err(Error::DailyQuotaExceeded);
                }
            }
        }
    }

    pub fn reset_minute_window(&self) {
        let mut state = self.lock();
        state.requests_this_minute = 0;
        state.tokens_this_minute = 0;
    }

    pub fn reset_day_window(&self) {
        self.lock().requests_today = 0;
    }

    pub fn snapshot(&self) -> QuotaState {
        *self.lock()
    }

    fn lock(&self) -> MutexGuard<'_, QuotaState> {
        // Counters stay meaningful even if a holder panicked mid-update.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

mod secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }
}
