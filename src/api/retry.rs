//! Exponential back-off with jitter for GitHub API calls
//!
//! [`retry_with_backoff`] repeats an async operation while it fails with a
//! transient [`ApiError`]. Permanent failures (404, 401, bad JSON) return on
//! the first attempt.

use std::future::Future;
use std::time::Duration;

use crate::api::ApiError;

/// Longest single back-off sleep
pub const MAX_DELAY_MS: u64 = 60_000;

/// Delay before retry number `attempt` (1-based), before jitter
///
/// `backoff_base_ms * 2^(attempt - 1)`, capped at [`MAX_DELAY_MS`].
pub fn backoff_delay_ms(backoff_base_ms: u64, attempt: u32) -> u64 {
    let exponent = attempt.saturating_sub(1).min(16);
    backoff_base_ms
        .saturating_mul(1u64 << exponent)
        .min(MAX_DELAY_MS)
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// Back-off schedule with `backoff_base_ms = 1_000`:
///
/// | Retry | Sleep before it              |
/// |-------|------------------------------|
/// | 1     | 1 000 ms × 2⁰ ± 25 % jitter  |
/// | 2     | 1 000 ms × 2¹ ± 25 % jitter  |
/// | 3     | 1 000 ms × 2² ± 25 % jitter  |
pub async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_transient() || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let capped = backoff_delay_ms(backoff_base_ms, attempt);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient GitHub API error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
