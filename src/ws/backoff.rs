//! Reconnect backoff policy.
//!
//! Exponential delay between reconnect attempts, capped, with a small
//! deterministic jitter so repeated sessions do not retry in lockstep.

use std::time::Duration;

/// Configuration for the delay between reconnect attempts.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Base delay in milliseconds for the first retry (default: 1000)
    pub initial_delay_ms: u64,
    /// Maximum delay cap in milliseconds (default: 30000)
    pub max_delay_ms: u64,
    /// Jitter factor (0.0-1.0) to spread delays (default: 0.1)
    pub jitter_factor: f64,
    /// Maximum number of consecutive failed attempts before giving up
    /// (default: `None` = unlimited)
    pub max_attempts: Option<u32>,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1000,
            max_delay_ms: 30_000,
            jitter_factor: 0.1,
            max_attempts: None,
        }
    }
}

impl BackoffPolicy {
    /// Delay to wait before retry number `attempt` (1-based: `1` is the
    /// first retry after the first failure).
    ///
    /// Exponential: `initial * 2^(attempt-1)`, capped at `max_delay_ms`,
    /// plus deterministic jitter derived from the attempt number.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let delay_ms = self
            .initial_delay_ms
            .saturating_mul(1 << (attempt - 1).min(10));
        let capped_ms = delay_ms.min(self.max_delay_ms);

        let jitter_range = (capped_ms as f64 * self.jitter_factor) as u64;
        let jittered_ms = if jitter_range > 0 {
            let jitter = (u64::from(attempt) * 7) % jitter_range;
            capped_ms.saturating_add(jitter)
        } else {
            capped_ms
        };

        Duration::from_millis(jittered_ms)
    }

    /// Whether another attempt is allowed after `failures` consecutive
    /// failed connects.
    pub fn allows_attempt(&self, failures: u32) -> bool {
        match self.max_attempts {
            Some(max) => failures < max,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_exponential() {
        let policy = BackoffPolicy {
            jitter_factor: 0.0,
            ..Default::default()
        };

        assert_eq!(policy.delay_for(0), Duration::ZERO);
        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(4000));
    }

    #[test]
    fn test_delay_capped() {
        let policy = BackoffPolicy {
            initial_delay_ms: 1000,
            max_delay_ms: 30_000,
            jitter_factor: 0.0,
            max_attempts: None,
        };

        assert_eq!(policy.delay_for(6), Duration::from_millis(30_000)); // 32s capped
        assert_eq!(policy.delay_for(10), Duration::from_millis(30_000));
    }

    #[test]
    fn test_jitter_bounded() {
        let policy = BackoffPolicy::default();
        let base = Duration::from_millis(1000);
        let delay = policy.delay_for(1);
        assert!(delay >= base);
        assert!(delay <= base + Duration::from_millis(100));
    }

    #[test]
    fn test_attempt_budget() {
        let policy = BackoffPolicy {
            max_attempts: Some(3),
            ..Default::default()
        };

        assert!(policy.allows_attempt(0));
        assert!(policy.allows_attempt(2));
        assert!(!policy.allows_attempt(3));
        assert!(!policy.allows_attempt(4));
    }

    #[test]
    fn test_unlimited_attempts() {
        let policy = BackoffPolicy::default();
        assert!(policy.allows_attempt(1_000_000));
    }
}
