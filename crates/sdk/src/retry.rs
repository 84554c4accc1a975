//! Retry logic with exponential backoff.
//!
//! Thin wrapper over the `backon` crate used by the HTTP transport for
//! idempotent gateway reads. The query engine itself never calls this; a
//! read that still fails after the policy is exhausted surfaces to the
//! pagination runner, which treats it as an empty result.

use std::future::Future;

use backon::{ExponentialBuilder, Retryable};

use crate::{
    config::RetryPolicy,
    error::{Result, SdkError},
};

/// Executes an async operation with retry using exponential backoff.
///
/// Attempts are repeated per the [`RetryPolicy`] while the operation fails
/// with a retryable error (see [`SdkError::is_retryable`]). A non-retryable
/// error returns immediately; an exhausted policy returns the last error.
///
/// # Example
///
/// ```ignore
/// use tessera_gateway_sdk::{with_retry, RetryPolicy, SdkError};
///
/// let policy = RetryPolicy::default();
/// let result = with_retry(&policy, || async {
///     Ok::<_, SdkError>("success")
/// }).await;
/// ```
pub async fn with_retry<F, Fut, T>(policy: &RetryPolicy, operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    operation
        .retry(backoff_for(policy))
        .sleep(tokio::time::sleep)
        .when(SdkError::is_retryable)
        .notify(|err: &SdkError, dur| {
            tracing::debug!(
                backoff_ms = dur.as_millis() as u64,
                error = %err,
                "retrying after backoff"
            );
        })
        .await
}

/// Maps a [`RetryPolicy`] onto backon's exponential builder.
///
/// backon counts retries, not attempts, hence the subtraction.
fn backoff_for(policy: &RetryPolicy) -> ExponentialBuilder {
    let max_retries = policy.max_attempts.saturating_sub(1) as usize;

    let builder = ExponentialBuilder::new()
        .with_min_delay(policy.initial_backoff)
        .with_max_delay(policy.max_backoff)
        .with_factor(policy.multiplier as f32)
        .with_max_times(max_retries);

    if policy.jitter { builder.with_jitter() } else { builder }
}
