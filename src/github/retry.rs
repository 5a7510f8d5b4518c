//! Exponential backoff for read-only GitHub API calls.
//!
//! The cascade core never retries. Retrying belongs to the GitHub
//! collaborator and only applies to effects that are safe to repeat (branch
//! and PR listings). Creating a PR, merging, and commenting run exactly once,
//! so a rejected merge is never re-attempted and a dropped response never
//! turns into a duplicate PR or comment.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::effects::GitHubEffect;

use super::error::GitHubApiError;

/// Backoff schedule: `initial_delay * backoff_multiplier^n`, capped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// Three retries, waiting 2s, 4s, then 8s.
    pub const DEFAULT: Self = Self {
        max_retries: 3,
        initial_delay: Duration::from_secs(2),
        max_delay: Duration::from_secs(16),
        backoff_multiplier: 2.0,
    };

    pub fn new(
        max_retries: u32,
        initial_delay: Duration,
        max_delay: Duration,
        backoff_multiplier: f64,
    ) -> Self {
        Self {
            max_retries,
            initial_delay,
            max_delay,
            backoff_multiplier,
        }
    }

    /// Wait before retry number `retry` (zero-based).
    pub fn delay_for_attempt(&self, retry: u32) -> Duration {
        let scaled = self.initial_delay.as_secs_f64()
            * self.backoff_multiplier.powi(retry.min(i32::MAX as u32) as i32);
        Duration::from_secs_f64(scaled.min(self.max_delay.as_secs_f64()))
    }

    /// Every wait the schedule can produce, in order.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_retries).map(|retry| self.delay_for_attempt(retry))
    }

    /// Longest time a call can spend sleeping before giving up.
    pub fn total_max_wait(&self) -> Duration {
        self.delays().sum()
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Whether a call may be repeated on a transient failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetryPolicy {
    #[default]
    RetryTransient,
    NoRetry,
}

impl RetryPolicy {
    /// Reads may be retried; mutations may not.
    pub fn for_effect(effect: &GitHubEffect) -> Self {
        if effect.is_mutation() {
            RetryPolicy::NoRetry
        } else {
            RetryPolicy::RetryTransient
        }
    }

    fn max_attempts(self, config: &RetryConfig) -> u32 {
        match self {
            RetryPolicy::RetryTransient => config.max_retries.saturating_add(1),
            RetryPolicy::NoRetry => 1,
        }
    }
}

/// How a retried call ended.
#[derive(Debug)]
pub enum RetryResult<T> {
    Success(T),

    /// Still failing transiently after every allowed attempt.
    ExhaustedRetries {
        last_error: GitHubApiError,
        attempts: u32,
    },

    /// Failed with an error that retrying cannot fix.
    NotRetriable(GitHubApiError),
}

impl<T> RetryResult<T> {
    pub fn into_result(self) -> Result<T, GitHubApiError> {
        match self {
            RetryResult::Success(value) => Ok(value),
            RetryResult::ExhaustedRetries { last_error: e, .. } | RetryResult::NotRetriable(e) => {
                Err(e)
            }
        }
    }
}

/// Runs `operation`, repeating it on transient errors as `policy` allows.
pub async fn retry_with_backoff<T, F, Fut>(
    config: RetryConfig,
    policy: RetryPolicy,
    mut operation: F,
) -> RetryResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GitHubApiError>>,
{
    let max_attempts = policy.max_attempts(&config);
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        let error = match operation().await {
            Ok(value) => return RetryResult::Success(value),
            Err(e) if !e.kind.is_retriable() => return RetryResult::NotRetriable(e),
            Err(e) => e,
        };

        if attempt >= max_attempts {
            return RetryResult::ExhaustedRetries {
                last_error: error,
                attempts: attempt,
            };
        }

        let delay = config.delay_for_attempt(attempt - 1);
        debug!(attempt, ?delay, error = %error, "Transient GitHub error; backing off");
        tokio::time::sleep(delay).await;
    }
}
