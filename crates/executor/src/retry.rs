use std::time::Duration;

/// Strategy for computing the delay between retry attempts.
///
/// The computed delay never exceeds the configured maximum.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryStrategy {
    /// Exponential backoff: `base * multiplier^attempt`, optionally with
    /// deterministic jitter, clamped to `max`.
    Exponential {
        /// Delay before the first retry.
        base: Duration,
        /// Upper bound on the computed delay.
        max: Duration,
        /// Factor applied on each successive attempt.
        multiplier: f64,
        /// Spread concurrent retries by +0% to +40% depending on the attempt.
        jitter: bool,
    },
}

impl RetryStrategy {
    /// Exponential backoff doubling from `base`, capped at `max`, with jitter.
    #[must_use]
    pub fn exponential(base: Duration, max: Duration) -> Self {
        Self::Exponential {
            base,
            max,
            multiplier: 2.0,
            jitter: true,
        }
    }

    /// Compute the delay to wait after the failed zero-based `attempt`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use fulfillment_executor::RetryStrategy;
    ///
    /// let strategy = RetryStrategy::Exponential {
    ///     base: Duration::from_millis(100),
    ///     max: Duration::from_secs(1),
    ///     multiplier: 2.0,
    ///     jitter: false,
    /// };
    /// assert_eq!(strategy.delay_for(0), Duration::from_millis(100));
    /// assert_eq!(strategy.delay_for(5), Duration::from_secs(1));
    /// ```
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self {
            Self::Exponential {
                base,
                max,
                multiplier,
                jitter,
            } => {
                // Attempt counts are small, so the cast cannot wrap.
                #[allow(clippy::cast_possible_wrap)]
                let raw = base.as_secs_f64() * multiplier.powi(attempt as i32);

                let adjusted = if *jitter {
                    raw * (1.0 + 0.1 * f64::from(attempt % 5))
                } else {
                    raw
                };

                Duration::from_secs_f64(adjusted.min(max.as_secs_f64()))
            }
        }
    }
}

impl Default for RetryStrategy {
    /// 100 ms doubling up to 500 ms.
    fn default() -> Self {
        Self::exponential(Duration::from_millis(100), Duration::from_millis(500))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_no_jitter_doubles_until_cap() {
        let strategy = RetryStrategy::Exponential {
            base: Duration::from_millis(100),
            max: Duration::from_millis(500),
            multiplier: 2.0,
            jitter: false,
        };
        assert_eq!(strategy.delay_for(0), Duration::from_millis(100));
        assert_eq!(strategy.delay_for(1), Duration::from_millis(200));
        assert_eq!(strategy.delay_for(2), Duration::from_millis(400));
        // 800ms -> clamped
        assert_eq!(strategy.delay_for(3), Duration::from_millis(500));
        assert_eq!(strategy.delay_for(10), Duration::from_millis(500));
    }

    #[test]
    fn exponential_jitter_never_exceeds_cap() {
        let strategy = RetryStrategy::exponential(Duration::from_millis(100), Duration::from_millis(500));
        // 200ms * 1.1
        assert_eq!(strategy.delay_for(1), Duration::from_millis(220));
        for attempt in 0..20 {
            assert!(strategy.delay_for(attempt) <= Duration::from_millis(500));
        }
    }

    #[test]
    fn default_matches_commit_backoff() {
        let RetryStrategy::Exponential {
            base,
            max,
            multiplier,
            jitter,
        } = RetryStrategy::default();
        assert_eq!(base, Duration::from_millis(100));
        assert_eq!(max, Duration::from_millis(500));
        assert!((multiplier - 2.0).abs() < f64::EPSILON);
        assert!(jitter);
    }
}
