//! Fixed-delay retry for transport failures.

use log::warn;
use std::time::Duration;

/// Delay between attempts after a transport failure.
pub const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Attempts made when the caller does not ask for more.
pub const DEFAULT_MAX_ATTEMPTS: usize = 1;

/// Every attempt failed before a response was obtained.
#[derive(Debug)]
pub struct TransportFailure {
    pub attempts: usize,
    pub last_error: anyhow::Error,
}

impl std::fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Transport failed after {} attempt(s): {:#}",
            self.attempts, self.last_error
        )
    }
}

impl std::error::Error for TransportFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        let source: &(dyn std::error::Error + 'static) = self.last_error.as_ref();
        Some(source)
    }
}

/// Runs `operation` up to `max_attempts` times (at least once), sleeping
/// `delay` between failed attempts. The attempt number is passed in,
/// starting at 1.
pub async fn with_retry<F, Fut, T>(
    operation_name: &str,
    max_attempts: usize,
    delay: Duration,
    operation: F,
) -> Result<T, TransportFailure>
where
    F: Fn(usize) -> Fut,
    Fut: std::future::Future<Output = anyhow::Result<T>>,
{
    let max_attempts = max_attempts.max(1);
    let mut remaining = max_attempts;
    let mut attempt = 0;

    loop {
        attempt += 1;
        match operation(attempt).await {
            Ok(result) => return Ok(result),
            Err(e) => {
                remaining -= 1;
                if remaining == 0 {
                    warn!(
                        "{}: attempt {}/{} failed ({:#}), giving up",
                        operation_name, attempt, max_attempts, e
                    );
                    return Err(TransportFailure {
                        attempts: attempt,
                        last_error: e,
                    });
                }

                warn!(
                    "{}: attempt {}/{} failed ({:#}), retrying in {}ms...",
                    operation_name,
                    attempt,
                    max_attempts,
                    e,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_with_retry_success() {
        let result = with_retry("test", 3, RETRY_DELAY, |_| async {
            Ok::<_, anyhow::Error>(42)
        })
        .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_retry_retries_on_failure() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = Arc::clone(&attempts);

        let result = with_retry("test", 5, RETRY_DELAY, |_| {
            let attempts = Arc::clone(&attempts_clone);
            async move {
                let count = attempts.fetch_add(1, Ordering::SeqCst);
                if count < 2 {
                    Err::<i32, _>(anyhow::anyhow!("connection reset"))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_retry_exhausts_attempts_with_delays_between() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = Arc::clone(&attempts);
        let start = tokio::time::Instant::now();

        let result = with_retry("test", 3, RETRY_DELAY, |_| {
            let attempts = Arc::clone(&attempts_clone);
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(anyhow::anyhow!("connection timeout"))
            }
        })
        .await;

        let failure = result.unwrap_err();
        assert_eq!(failure.attempts, 3);
        assert!(failure.last_error.to_string().contains("timeout"));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);

        // Two gaps between three attempts, none after the last one
        let elapsed = start.elapsed();
        assert!(elapsed >= RETRY_DELAY * 2);
        assert!(elapsed < RETRY_DELAY * 3);
    }

    #[tokio::test]
    async fn test_with_retry_zero_attempts_still_tries_once() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = Arc::clone(&attempts);

        let result = with_retry("test", 0, RETRY_DELAY, |_| {
            let attempts = Arc::clone(&attempts_clone);
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(anyhow::anyhow!("refused"))
            }
        })
        .await;

        assert_eq!(result.unwrap_err().attempts, 1);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_with_retry_passes_attempt_number() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);

        let _ = with_retry("test", 3, Duration::ZERO, |attempt| {
            let seen = Arc::clone(&seen_clone);
            async move {
                seen.lock().unwrap().push(attempt);
                Err::<(), _>(anyhow::anyhow!("refused"))
            }
        })
        .await;

        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_transport_failure_display() {
        let failure = TransportFailure {
            attempts: 2,
            last_error: anyhow::anyhow!("connection refused"),
        };
        let message = failure.to_string();
        assert!(message.contains("2 attempt(s)"));
        assert!(message.contains("connection refused"));
    }
}
