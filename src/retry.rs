use std::future::Future;
use std::time::Duration;

use crate::error::InferenceError;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(2000);

/// Fixed polling schedule for a model that may still be spinning up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Constant pause between attempts, no backoff.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// What a single attempt learned from the hosting service.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Ready(String),
    /// The model is still loading; `estimated_time` is the server's hint in seconds.
    Loading { estimated_time: Option<f64> },
    /// Non-success status without a loading hint.
    Rejected(String),
}

/// Attempt counter owned by exactly one logical request.
#[derive(Debug)]
pub struct RetryState {
    attempt: u32,
    policy: RetryPolicy,
}

impl RetryState {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { attempt: 0, policy }
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn has_remaining(&self) -> bool {
        self.attempt < self.policy.max_attempts
    }

    pub fn is_last(&self) -> bool {
        self.attempt + 1 >= self.policy.max_attempts
    }

    /// Counts the current attempt as spent and sleeps if another one follows.
    pub async fn back_off(&mut self) {
        self.attempt += 1;
        if self.has_remaining() {
            tokio::time::sleep(self.policy.delay).await;
        }
    }
}

/// Runs `attempt` until it yields text, a terminal error, or the policy runs out.
///
/// Loading outcomes always retry. Retryable errors retry on every attempt but
/// the last, where they are returned as-is.
pub async fn poll_until_ready<F, Fut>(
    policy: RetryPolicy,
    operation: &'static str,
    mut attempt: F,
) -> Result<String, InferenceError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<AttemptOutcome, InferenceError>>,
{
    let mut state = RetryState::new(policy);

    while state.has_remaining() {
        match attempt(state.attempt()).await {
            Ok(AttemptOutcome::Ready(text)) => {
                tracing::debug!(operation, attempt = state.attempt(), "model answered");
                return Ok(text);
            }
            Ok(AttemptOutcome::Rejected(message)) => {
                tracing::warn!(operation, attempt = state.attempt(), %message, "model rejected request");
                return Err(InferenceError::Request(message));
            }
            Ok(AttemptOutcome::Loading { estimated_time }) => {
                tracing::info!(
                    operation,
                    attempt = state.attempt(),
                    ?estimated_time,
                    "model still loading, retrying"
                );
            }
            Err(err) if err.is_retryable() && !state.is_last() => {
                tracing::warn!(operation, attempt = state.attempt(), error = %err, "attempt failed, retrying");
            }
            Err(err) => {
                tracing::error!(operation, attempt = state.attempt(), error = %err, "giving up");
                return Err(err);
            }
        }
        state.back_off().await;
    }

    tracing::error!(operation, attempts = state.attempt(), "model never finished loading");
    Err(InferenceError::ModelLoadTimeout)
}
