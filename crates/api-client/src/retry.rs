use configuration::ClientConfig;
use rand::Rng;
use std::time::Duration;

/// Exponential backoff with additive jitter and a hard ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Jitter is drawn uniformly from `[0, max_jitter)`.
    pub max_jitter: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            base_delay: config.base_retry_delay(),
            max_delay: Duration::from_millis(config.max_retry_delay_ms),
            max_jitter: Duration::from_millis(config.max_jitter_ms),
        }
    }

    /// `min(base * 2^retry_count + jitter, max_delay)`.
    pub fn backoff(&self, retry_count: u32, jitter: Duration) -> Duration {
        let factor = 1u32.checked_shl(retry_count).unwrap_or(u32::MAX);
        self.base_delay
            .saturating_mul(factor)
            .saturating_add(jitter)
            .min(self.max_delay)
    }

    /// The delay before retry number `retry_count + 1`, with random jitter.
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::thread_rng().gen_range(0..jitter_ms))
        };
        self.backoff(retry_count, jitter)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn doubles_per_retry_without_jitter() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0, Duration::ZERO), Duration::from_millis(1_000));
        assert_eq!(policy.backoff(1, Duration::ZERO), Duration::from_millis(2_000));
        assert_eq!(policy.backoff(2, Duration::ZERO), Duration::from_millis(4_000));
        assert_eq!(policy.backoff(3, Duration::ZERO), Duration::from_millis(8_000));
    }

    #[test]
    fn caps_at_the_ceiling() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(4, Duration::ZERO), Duration::from_millis(10_000));
        assert_eq!(policy.backoff(31, Duration::ZERO), Duration::from_millis(10_000));
        assert_eq!(policy.backoff(64, Duration::from_millis(999)), Duration::from_millis(10_000));
    }

    proptest! {
        #[test]
        fn delay_stays_within_jitter_window(retry in 0u32..12, base_ms in 1u64..2_000) {
            let policy = RetryPolicy {
                base_delay: Duration::from_millis(base_ms),
                ..RetryPolicy::default()
            };
            let floor = Duration::from_millis(base_ms.saturating_mul(1 << retry));
            let ceiling = floor + Duration::from_millis(1_000);
            let cap = Duration::from_millis(10_000);

            let delay = policy.delay_for(retry);

            prop_assert!(delay <= cap);
            prop_assert!(delay >= floor.min(cap));
            prop_assert!(delay <= ceiling);
        }
    }
}
