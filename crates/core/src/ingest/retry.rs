use super::FetchError;
use std::future::Future;
use std::time::Duration;

/// Runs `op` up to `attempts` times, backing off 1s, 2s, 4s... between
/// retryable failures. Non-retryable errors return immediately.
pub async fn with_retries<T, F, Fut>(label: &str, attempts: u32, mut op: F) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let attempts = attempts.max(1);
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= attempts || !err.is_retryable() {
                    return Err(err);
                }
                let backoff = Duration::from_secs(1u64 << (attempt - 1).min(5));
                tracing::warn!(label, attempt, ?backoff, error = %err, "provider fetch failed; retrying");
                tokio::time::sleep(backoff).await;
            }
        }
    }
}
