//! Retry with exponential backoff and jitter for transient Data API errors.
//!
//! YouTube surfaces quota pressure as 403/429 and intermittent 5xx; both are
//! worth retrying after a delay. 404s and parse failures are propagated
//! immediately since retrying returns the same result.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::YouTubeError;

/// Returns `true` if `err` represents a transient condition worth retrying.
fn is_retriable(err: &YouTubeError) -> bool {
    match err {
        YouTubeError::RateLimited { .. } | YouTubeError::Http(_) => true,
        YouTubeError::UnexpectedStatus { status, .. } => (500..600).contains(status),
        _ => false,
    }
}

/// Executes `operation` with exponential backoff plus jitter on transient errors.
///
/// The wait before the n-th retry is `backoff_base_secs * 2^(n-1)` seconds
/// plus up to 250ms of random jitter to de-synchronize bursts. With
/// `max_retries = 3` the operation is attempted at most 4 times total.
/// Non-retriable errors are returned immediately.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, YouTubeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, YouTubeError>>,
{
    let mut last_err;
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                last_err = err;
            }
        }

        let delay_secs = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
        let jitter_ms = rand::rng().random_range(0..250u64);
        tracing::warn!(
            attempt,
            max_retries,
            delay_secs,
            error = %last_err,
            "transient YouTube API error — retrying after backoff"
        );
        tokio::time::sleep(Duration::from_secs(delay_secs) + Duration::from_millis(jitter_ms))
            .await;
        attempt += 1;
    }
}
