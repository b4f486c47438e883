use std::future::Future;

use flowdeck_config::RetryPolicy;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Error, PartialEq)]
pub enum PollError<E> {
  #[error("still pending after {attempts} attempts")]
  Exhausted { attempts: u32 },

  #[error("polling was cancelled")]
  Cancelled,

  #[error("status check failed: {0}")]
  Check(E),
}

/// Poll `check` until it reports a value, waiting per `policy` before
/// each attempt.
///
/// `check` receives the zero-based attempt number and returns `Ok(None)`
/// while the external status is still pending. Attempt `n` waits
/// `policy.delay_for(n)` first, so every delay of the policy is used and at
/// most `policy.max_attempts` checks are made.
pub async fn poll_until<T, E, F, Fut>(
  policy: &RetryPolicy,
  cancel: &CancellationToken,
  mut check: F,
) -> Result<T, PollError<E>>
where
  F: FnMut(u32) -> Fut,
  Fut: Future<Output = Result<Option<T>, E>>,
{
  let mut attempt = 0;
  while let Some(delay) = policy.delay_for(attempt) {
    debug!(attempt, delay_ms = delay.as_millis() as u64, "waiting before status check");
    tokio::select! {
      biased;
      _ = cancel.cancelled() => return Err(PollError::Cancelled),
      _ = tokio::time::sleep(delay) => {}
    }

    if let Some(value) = check(attempt).await.map_err(PollError::Check)? {
      return Ok(value);
    }
    attempt += 1;
  }

  Err(PollError::Exhausted { attempts: attempt })
}

#[cfg(test)]
mod tests {
  use super::*;
  use flowdeck_config::RetryBackoff;
  use std::sync::Arc;
  use std::sync::atomic::{AtomicU32, Ordering};

  fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
      backoff: RetryBackoff::Exponential,
      initial_delay_ms: 1,
      max_attempts,
      max_delay_ms: Some(4),
    }
  }

  #[tokio::test]
  async fn test_returns_once_ready() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let result: Result<&str, PollError<String>> =
      poll_until(&fast_policy(5), &CancellationToken::new(), move |attempt| {
        counter.fetch_add(1, Ordering::SeqCst);
        async move { Ok((attempt == 2).then_some("paid")) }
      })
      .await;

    assert_eq!(result, Ok("paid"));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn test_gives_up_at_cap() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let result: Result<(), PollError<String>> =
      poll_until(&fast_policy(5), &CancellationToken::new(), move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        async { Ok(None) }
      })
      .await;

    assert_eq!(result, Err(PollError::Exhausted { attempts: 5 }));
    assert_eq!(calls.load(Ordering::SeqCst), 5);
  }

  #[tokio::test]
  async fn test_waits_before_every_check() {
    let policy = RetryPolicy {
      backoff: RetryBackoff::Constant,
      initial_delay_ms: 10,
      max_attempts: 3,
      max_delay_ms: None,
    };
    let started = std::time::Instant::now();
    let result: Result<(), PollError<String>> =
      poll_until(&policy, &CancellationToken::new(), |_| async { Ok(None) }).await;

    assert_eq!(result, Err(PollError::Exhausted { attempts: 3 }));
    assert!(started.elapsed() >= std::time::Duration::from_millis(30));
  }

  #[tokio::test]
  async fn test_check_error_stops_polling() {
    let result: Result<(), PollError<String>> =
      poll_until(&fast_policy(5), &CancellationToken::new(), |_| async {
        Err("gateway down".to_string())
      })
      .await;

    assert_eq!(result, Err(PollError::Check("gateway down".to_string())));
  }

  #[tokio::test]
  async fn test_cancel() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let result: Result<(), PollError<String>> =
      poll_until(&fast_policy(5), &cancel, |_| async { Ok(None) }).await;

    assert_eq!(result, Err(PollError::Cancelled));
  }
}
