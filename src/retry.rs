// src/retry.rs
use crate::config::RetryConfig;
use crate::error::CoreError;
use rand::Rng;
use std::future::Future;
use tracing::warn;

/// Wraps a fallible operation in bounded retry with exponential backoff and
/// jitter, retrying only the error classes `CoreError::is_retriable` marks
/// as safe — serialization failures, deadlocks, and lock-acquisition
/// timeouts, all of which Postgres guarantees rolled back cleanly.
pub async fn execute_with_retry<T, F, Fut>(config: &RetryConfig, mut operation: F) -> Result<T, CoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CoreError>>,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retriable() && attempt < config.max_attempts => {
                let backoff_ms = config.base_backoff_ms.saturating_mul(1u64 << (attempt - 1));
                let jitter_ms = rand::thread_rng().gen_range(0..=config.jitter_ms.max(1));
                let delay = std::time::Duration::from_millis(backoff_ms + jitter_ms);
                warn!(
                    attempt,
                    max_attempts = config.max_attempts,
                    kind = %err.kind().map(|k| k.to_string()).unwrap_or_default(),
                    delay_ms = delay.as_millis() as u64,
                    "retrying after transient conflict"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retries_transient_conflicts_until_success() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig {
            max_attempts: 3,
            base_backoff_ms: 1,
            jitter_ms: 1,
        };

        let result = execute_with_retry(&config, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(CoreError::TransientConflict(ErrorKind::SerializationFailure))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig {
            max_attempts: 2,
            base_backoff_ms: 1,
            jitter_ms: 1,
        };

        let result: Result<(), CoreError> = execute_with_retry(&config, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(CoreError::TransientConflict(ErrorKind::DeadlockDetected)) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn never_retries_non_retriable_errors() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig::default();

        let result: Result<(), CoreError> = execute_with_retry(&config, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(CoreError::InsufficientFunds) }
        })
        .await;

        assert!(matches!(result, Err(CoreError::InsufficientFunds)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
