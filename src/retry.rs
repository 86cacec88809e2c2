use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::metrics::{CONCURRENCY_CONFLICTS, CONCURRENCY_RETRIES};

/// Message returned once every attempt hit a concurrency conflict.
pub const CONFLICT_MESSAGE: &str =
    "Another user modified this goal set. Please reload and try again.";

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one
    pub max_attempts: u32,
    /// Initial delay between retries
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Factor to multiply delay by after each attempt
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    /// One attempt plus three retries, back to back.
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_delay: Duration::ZERO,
            max_delay: Duration::from_secs(1),
            backoff_factor: 2.0,
        }
    }
}

/// Retry policy for determining if an error is retryable
pub trait RetryPolicy<E> {
    fn is_retryable(&self, error: &E) -> bool;
}

/// Retries optimistic-concurrency conflicts and nothing else.
pub struct ConcurrencyRetryPolicy;

impl RetryPolicy<ServiceError> for ConcurrencyRetryPolicy {
    fn is_retryable(&self, error: &ServiceError) -> bool {
        error.is_retryable()
    }
}

/// Why [`with_retry`] stopped without a result.
#[derive(Debug, PartialEq)]
pub enum RetryError<E> {
    /// Every attempt failed with a retryable error; holds the last one.
    Exhausted { attempts: u32, last: E },
    /// An attempt failed with an error the policy does not retry.
    Fatal(E),
    /// The cancellation token fired before or during an attempt.
    Cancelled { attempts: u32 },
}

/// Execute an async function with retries.
///
/// The token is checked before every attempt and raced against the attempt
/// itself, so a cancelled caller never waits for another fetch.
pub async fn with_retry<F, Fut, T, E>(
    config: &RetryConfig,
    policy: impl RetryPolicy<E>,
    cancel: &CancellationToken,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut delay = config.initial_delay;
    let mut attempts = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(RetryError::Cancelled { attempts });
        }
        attempts += 1;

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(RetryError::Cancelled { attempts }),
            outcome = operation() => outcome,
        };

        match outcome {
            Ok(result) => {
                if attempts > 1 {
                    debug!("Operation succeeded after {} attempts", attempts);
                }
                return Ok(result);
            }
            Err(error) if !policy.is_retryable(&error) => return Err(RetryError::Fatal(error)),
            Err(error) if attempts >= max_attempts => {
                warn!("Operation failed after {} attempts: {}", attempts, error);
                return Err(RetryError::Exhausted {
                    attempts,
                    last: error,
                });
            }
            Err(error) => {
                warn!(
                    "Attempt {} failed: {}. Retrying in {:?}...",
                    attempts, error, delay
                );

                if !delay.is_zero() {
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(RetryError::Cancelled { attempts }),
                        _ = sleep(delay) => {}
                    }
                    delay = Duration::from_secs_f64(
                        (delay.as_secs_f64() * config.backoff_factor)
                            .min(config.max_delay.as_secs_f64()),
                    );
                }
            }
        }
    }
}

/// Runs a read-modify-write cycle on one aggregate, repeating it while the
/// repository reports concurrency conflicts.
///
/// Exhaustion turns into [`ServiceError::Conflict`] carrying
/// [`CONFLICT_MESSAGE`]; cancellation into [`ServiceError::Cancelled`]. Any
/// other error is returned unchanged after its first occurrence.
pub async fn with_concurrency_retry<F, Fut, T>(
    config: &RetryConfig,
    cancel: &CancellationToken,
    aggregate_id: Uuid,
    mut operation: F,
) -> Result<T, ServiceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ServiceError>>,
{
    let mut attempt = 0u32;
    let result = with_retry(config, ConcurrencyRetryPolicy, cancel, || {
        attempt += 1;
        if attempt > 1 {
            CONCURRENCY_RETRIES.inc();
        }
        operation()
    })
    .await;

    match result {
        Ok(value) => Ok(value),
        Err(RetryError::Fatal(error)) => Err(error),
        Err(RetryError::Exhausted { attempts, .. }) => {
            CONCURRENCY_CONFLICTS.inc();
            warn!(%aggregate_id, attempts, "Giving up after repeated concurrency conflicts");
            Err(ServiceError::Conflict(CONFLICT_MESSAGE.to_string()))
        }
        Err(RetryError::Cancelled { attempts }) => {
            debug!(%aggregate_id, attempts, "Retry loop cancelled");
            Err(ServiceError::Cancelled(format!(
                "Operation on {} was cancelled",
                aggregate_id
            )))
        }
    }
}
