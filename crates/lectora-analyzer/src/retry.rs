//! Bounded retries around external analysis calls
//!
//! Every call to the text-understanding service goes through
//! [`RetryPolicy::call`]. Failures are classified per attempt:
//!
//! - rate-limited: wait `backoff_base * 2^(attempt - 1)` and retry
//! - malformed response: wait a fixed delay and retry
//! - anything else: one retry after the fixed delay
//!
//! Exhausting the attempts yields a [`RetryFailure`] value for the caller to
//! act on. Successful calls add their token usage to the caller's
//! accumulator and then pause for the configured throttle.

use crate::config::PipelineConfig;
use lectora_domain::{truncate_chars, TokenUsage};
use lectora_llm::LlmError;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

/// Characters of a raw payload kept for diagnostics
pub const DIAGNOSTIC_PREFIX_CHARS: usize = 1000;

/// Attempts allowed for errors that are neither throttling nor bad payloads
pub const MAX_OTHER_ATTEMPTS: u32 = 2;

/// A value produced by one external call, with the tokens it consumed
#[derive(Debug, Clone, PartialEq)]
pub struct Metered<T> {
    /// Decoded value
    pub value: T,
    /// Tokens reported for the call
    pub usage: TokenUsage,
}

impl<T> Metered<T> {
    /// Pair a value with its usage
    pub fn new(value: T, usage: TokenUsage) -> Self {
        Self { value, usage }
    }
}

/// Outcome of a single failed attempt
#[derive(Debug, Clone, PartialEq)]
pub enum CallError {
    /// The service signalled quota or throttling
    RateLimited(String),
    /// The service answered but the payload could not be decoded
    Malformed {
        /// Raw response text
        raw: String,
        /// Why decoding failed
        reason: String,
    },
    /// Any other failure
    Other(String),
}

impl From<LlmError> for CallError {
    fn from(e: LlmError) -> Self {
        if e.is_rate_limited() {
            CallError::RateLimited(e.to_string())
        } else {
            CallError::Other(e.to_string())
        }
    }
}

/// Class of a terminal failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Still throttled after the last attempt
    RateLimited,
    /// Still undecodable after the last attempt
    MalformedResponse,
    /// Service error that did not clear on retry
    Service,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::RateLimited => write!(f, "rate limited"),
            FailureKind::MalformedResponse => write!(f, "malformed response"),
            FailureKind::Service => write!(f, "service error"),
        }
    }
}

/// Terminal failure reported after the retries ran out
#[derive(Debug, Clone, PartialEq)]
pub struct RetryFailure {
    /// What kept failing
    pub kind: FailureKind,
    /// Attempts made
    pub attempts: u32,
    /// Last error message, or the raw payload prefix for malformed responses
    pub detail: String,
}

impl fmt::Display for RetryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} after {} attempt(s): {}", self.kind, self.attempts, self.detail)
    }
}

/// Retry discipline shared by every external call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff_base: Duration,
    retry_delay: Duration,
    throttle: Duration,
}

impl RetryPolicy {
    /// Create a policy with explicit delays
    pub fn new(max_retries: u32, backoff_base: Duration, retry_delay: Duration) -> Self {
        Self {
            max_retries: max_retries.max(1),
            backoff_base,
            retry_delay,
            throttle: Duration::ZERO,
        }
    }

    /// Build the policy described by a pipeline config
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.max_retries, config.backoff_base(), config.retry_delay())
            .with_throttle(config.throttle())
    }

    /// Pause after every successful call
    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }

    /// Policy with no pauses at all
    pub fn immediate(max_retries: u32) -> Self {
        Self::new(max_retries, Duration::ZERO, Duration::ZERO)
    }

    /// Attempts allowed per call
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Wait before the attempt following failed attempt `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_base
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }

    /// Run `op` until it succeeds or the attempts are exhausted
    ///
    /// `op` receives the 1-based attempt number. On success the reported
    /// usage is added to `usage`; failed attempts add nothing.
    pub async fn call<T, F, Fut>(
        &self,
        label: &str,
        usage: &mut TokenUsage,
        mut op: F,
    ) -> Result<T, RetryFailure>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Metered<T>, CallError>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;

            let (kind, detail, limit, wait) = match op(attempt).await {
                Ok(metered) => {
                    usage.add(metered.usage);
                    pause(self.throttle).await;
                    return Ok(metered.value);
                }
                Err(CallError::RateLimited(message)) => {
                    let wait = self.backoff(attempt);
                    if attempt < self.max_retries {
                        warn!(
                            "{}: rate limit reached, waiting {:?} (attempt {}/{})",
                            label, wait, attempt, self.max_retries
                        );
                    }
                    (FailureKind::RateLimited, message, self.max_retries, wait)
                }
                Err(CallError::Malformed { raw, reason }) => {
                    let prefix = truncate_chars(&raw, DIAGNOSTIC_PREFIX_CHARS).to_string();
                    warn!(
                        "{}: malformed response (attempt {}/{}): {}",
                        label, attempt, self.max_retries, reason
                    );
                    warn!("{}: response received (first {} chars): {}", label, DIAGNOSTIC_PREFIX_CHARS, prefix);
                    (FailureKind::MalformedResponse, prefix, self.max_retries, self.retry_delay)
                }
                Err(CallError::Other(message)) => {
                    warn!(
                        "{}: service error (attempt {}/{}): {}",
                        label, attempt, self.max_retries, message
                    );
                    let limit = self.max_retries.min(MAX_OTHER_ATTEMPTS);
                    (FailureKind::Service, message, limit, self.retry_delay)
                }
            };

            if attempt >= limit {
                error!("{}: giving up, {} after {} attempt(s)", label, kind, attempt);
                return Err(RetryFailure {
                    kind,
                    attempts: attempt,
                    detail,
                });
            }
            pause(wait).await;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
