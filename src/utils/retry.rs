// src/utils/retry.rs

use std::time::Duration;

/// Bounded exponential backoff with optional jitter.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total tries, including the first one.
    pub max_attempts: usize,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
    pub jitter_max: Option<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(200),
            jitter_max: Some(Duration::from_millis(10)),
        }
    }
}

impl RetryConfig {
    pub fn with_attempts(max_attempts: usize) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }
}

/// Runs `f` until it succeeds, returns an error `should_retry` rejects, or
/// the attempt budget is spent. The last error is returned.
pub async fn retry_if<F, Fut, T, E, P>(config: RetryConfig, should_retry: P, mut f: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let mut attempts_left = config.max_attempts.max(1);
    let mut backoff = config.base_backoff;

    loop {
        let err = match f().await {
            Ok(v) => return Ok(v),
            Err(e) => e,
        };

        attempts_left -= 1;
        if attempts_left == 0 || !should_retry(&err) {
            return Err(err);
        }

        let extra = match config.jitter_max {
            Some(jitter_max) if !jitter_max.is_zero() => {
                let jitter_ms = jitter_max.as_millis() as u64;
                Duration::from_millis(rand::random::<u64>() % (jitter_ms + 1))
            }
            _ => Duration::ZERO,
        };
        tokio::time::sleep(backoff + extra).await;

        backoff = std::cmp::min(backoff * 2, config.max_backoff);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn quick(max_attempts: usize) -> RetryConfig {
        RetryConfig {
            max_attempts,
            base_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
            jitter_max: None,
        }
    }

    #[tokio::test]
    async fn retry_succeeds_after_retries() {
        let counter = AtomicUsize::new(0);

        let res: Result<usize, &'static str> = retry_if(quick(3), |_| true, || async {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            if n < 2 { Err("fail") } else { Ok(n) }
        })
        .await;

        assert_eq!(res, Ok(2));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_fails_after_max_attempts() {
        let counter = AtomicUsize::new(0);

        let res: Result<(), &'static str> = retry_if(quick(2), |_| true, || async {
            counter.fetch_add(1, Ordering::SeqCst);
            Err("always fail")
        })
        .await;

        assert!(res.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn non_retryable_error_stops_immediately() {
        let counter = AtomicUsize::new(0);

        let res: Result<(), &'static str> =
            retry_if(quick(5), |e| *e == "transient", || async {
                counter.fetch_add(1, Ordering::SeqCst);
                Err("fatal")
            })
            .await;

        assert_eq!(res, Err("fatal"));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
