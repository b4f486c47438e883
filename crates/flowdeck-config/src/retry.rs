use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryBackoff {
  Constant,
  Linear,
  Exponential,
}

/// Polling policy for verifying an external status (e.g. a payment).
///
/// The shape is "escalate, then give up after `max_attempts`"; the actual
/// delays are tunable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
  pub backoff: RetryBackoff,
  pub initial_delay_ms: u64,
  pub max_attempts: u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub max_delay_ms: Option<u64>,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      backoff: RetryBackoff::Exponential,
      initial_delay_ms: 2_000,
      max_attempts: 5,
      max_delay_ms: None,
    }
  }
}

impl RetryPolicy {
  /// Delay to wait before the given zero-based attempt, or `None` once the
  /// attempt cap is reached.
  pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
    if attempt >= self.max_attempts {
      return None;
    }

    let base = self.initial_delay_ms;
    let delay = match self.backoff {
      RetryBackoff::Constant => base,
      RetryBackoff::Linear => base.saturating_mul(u64::from(attempt) + 1),
      RetryBackoff::Exponential => base.saturating_mul(2u64.saturating_pow(attempt)),
    };
    let delay = match self.max_delay_ms {
      Some(max) => delay.min(max),
      None => delay,
    };

    Some(Duration::from_millis(delay))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_escalates_and_caps() {
    let policy = RetryPolicy::default();
    let delays: Vec<u64> = (0..6)
      .filter_map(|a| policy.delay_for(a))
      .map(|d| d.as_millis() as u64)
      .collect();

    assert_eq!(delays, vec![2_000, 4_000, 8_000, 16_000, 32_000]);
  }

  #[test]
  fn test_linear_with_ceiling() {
    let policy = RetryPolicy {
      backoff: RetryBackoff::Linear,
      initial_delay_ms: 100,
      max_attempts: 4,
      max_delay_ms: Some(250),
    };

    assert_eq!(policy.delay_for(0), Some(Duration::from_millis(100)));
    assert_eq!(policy.delay_for(1), Some(Duration::from_millis(200)));
    assert_eq!(policy.delay_for(2), Some(Duration::from_millis(250)));
    assert_eq!(policy.delay_for(4), None);
  }
}
