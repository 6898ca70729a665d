//! Bounded backoff for upstream rate-limit signals.
//!
//! The controller wraps one outbound call. A rate-limit failure waits for the
//! next entry of a fixed schedule and tries again; any other failure is returned
//! at once. Once the schedule is used up the call fails with
//! [`RetryError::Exhausted`].

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use console::style;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::domain::ports::GenerationError;

/// Distinguishes throttling from ordinary failures.
pub trait RateLimitSignal {
    fn is_rate_limit(&self) -> bool;
}

impl RateLimitSignal for GenerationError {
    fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

/// Terminal failure of a retried call.
#[derive(Debug, Error)]
pub enum RetryError<E>
where
    E: std::error::Error + 'static,
{
    #[error("Retries exhausted after {waits} waits: {last}")]
    Exhausted {
        waits: usize,
        #[source]
        last: E,
    },

    #[error(transparent)]
    Failed(E),
}

impl<E> RetryError<E>
where
    E: std::error::Error + 'static,
{
    pub const fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    pub fn into_inner(self) -> E {
        match self {
            Self::Exhausted { last, .. } | Self::Failed(last) => last,
        }
    }
}

/// Per-call bookkeeping; discarded when the call ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    pub attempt_count: usize,
    pub max_attempts: usize,
}

impl RetryState {
    const fn new(retries: usize) -> Self {
        Self {
            attempt_count: 0,
            max_attempts: retries + 1,
        }
    }
}

/// Emitted before every wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffNotice {
    /// 1-based number of the retry about to happen.
    pub retry: usize,
    pub max_retries: usize,
    pub wait: Duration,
    pub reason: String,
}

impl fmt::Display for BackoffNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rate limit reached. Waiting {}s before retry {}/{}...",
            self.wait.as_secs(),
            self.retry,
            self.max_retries
        )
    }
}

pub type BackoffNotifier = Arc<dyn Fn(&BackoffNotice) + Send + Sync>;

/// Prints the notice to stderr whatever the log level is.
pub fn console_notifier() -> BackoffNotifier {
    Arc::new(|notice: &BackoffNotice| {
        eprintln!("{} {}", style("⏳").yellow(), style(notice).yellow());
    })
}

#[derive(Clone)]
pub struct RetryController {
    schedule: Vec<Duration>,
    notifier: BackoffNotifier,
}

impl fmt::Debug for RetryController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryController")
            .field("schedule", &self.schedule)
            .finish_non_exhaustive()
    }
}

impl Default for RetryController {
    /// 60s, 120s, 240s, then give up.
    fn default() -> Self {
        Self::from_secs(&[60, 120, 240])
    }
}

impl RetryController {
    pub fn new(schedule: Vec<Duration>) -> Self {
        Self {
            schedule,
            notifier: console_notifier(),
        }
    }

    pub fn from_secs(schedule_secs: &[u64]) -> Self {
        Self::new(schedule_secs.iter().copied().map(Duration::from_secs).collect())
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: BackoffNotifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn schedule(&self) -> &[Duration] {
        &self.schedule
    }

    /// Run `operation`, retrying only on rate-limit signals.
    pub async fn invoke<F, Fut, T, E>(&self, mut operation: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RateLimitSignal + std::error::Error + 'static,
    {
        let mut state = RetryState::new(self.schedule.len());

        loop {
            match operation().await {
                Ok(value) => {
                    if state.attempt_count > 0 {
                        debug!(retries = state.attempt_count, "call succeeded after backoff");
                    }
                    return Ok(value);
                }
                Err(err) if err.is_rate_limit() => {
                    let Some(wait) = self.schedule.get(state.attempt_count).copied() else {
                        warn!(
                            attempts = state.attempt_count + 1,
                            error = %err,
                            "rate limit persisted, retries exhausted"
                        );
                        return Err(RetryError::Exhausted {
                            waits: state.attempt_count,
                            last: err,
                        });
                    };

                    let notice = BackoffNotice {
                        retry: state.attempt_count + 1,
                        max_retries: state.max_attempts - 1,
                        wait,
                        reason: err.to_string(),
                    };
                    warn!(
                        retry = notice.retry,
                        wait_secs = wait.as_secs(),
                        error = %err,
                        "rate limited, backing off"
                    );
                    (self.notifier)(&notice);

                    sleep(wait).await;
                    state.attempt_count += 1;
                }
                Err(err) => {
                    debug!(error = %err, "non rate-limit failure, not retrying");
                    return Err(RetryError::Failed(err));
                }
            }
        }
    }
}
