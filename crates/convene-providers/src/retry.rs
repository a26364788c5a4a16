//! Retry policy for provider GET calls.

use std::time::Duration;

use convene_core::{AccessError, BackoffPolicy};

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    Fixed {
        delay: Duration,
    },
    /// `base * factor^attempt`, capped at `max`, optionally spread by +/- 50%.
    Exponential {
        base: Duration,
        factor: f64,
        max: Duration,
        jitter: bool,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_millis(250),
            factor: 2.0,
            max: Duration::from_secs(5),
            jitter: true,
        }
    }
}

impl Backoff {
    /// Delay before retry number `attempt` (0-based).
    pub fn delay(self, attempt: u32) -> Duration {
        match self {
            Self::Fixed { delay } => delay,
            Self::Exponential {
                base,
                factor,
                max,
                jitter,
            } => {
                let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
                let seconds = (base.as_secs_f64() * factor.powi(exponent)).min(max.as_secs_f64());
                let capped = Duration::from_secs_f64(seconds);
                if jitter {
                    capped.mul_f64(0.5 + fastrand::f64())
                } else {
                    capped
                }
            }
        }
    }
}

/// Which failures are retried and how long to wait between attempts.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub enabled: bool,
    /// Total attempts are `max_retries + 1`.
    pub max_retries: u32,
    pub backoff: Backoff,
    pub retry_on_status: Vec<u16>,
    pub retry_on_timeout: bool,
    pub retry_on_connect: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_retries: 3,
            backoff: Backoff::default(),
            retry_on_status: vec![408, 429, 500, 502, 503, 504],
            retry_on_timeout: true,
            retry_on_connect: true,
        }
    }
}

impl RetryConfig {
    pub fn exponential(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    pub fn fixed(delay: Duration, max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: Backoff::Fixed { delay },
            ..Self::default()
        }
    }

    pub fn no_retry() -> Self {
        Self {
            enabled: false,
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Jittered exponential schedule built from a provider's backoff policy.
    pub fn from_backoff_policy(policy: &BackoffPolicy) -> Self {
        Self {
            max_retries: policy.max_retries,
            backoff: Backoff::Exponential {
                base: policy.initial_delay,
                factor: policy.multiplier,
                max: policy.max_delay,
                jitter: true,
            },
            ..Self::default()
        }
    }

    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_on_status.contains(&status)
    }

    /// Whether `error` is worth another attempt. Validation and decode
    /// failures never are.
    pub fn should_retry(&self, error: &AccessError) -> bool {
        if !self.enabled {
            return false;
        }
        match error {
            AccessError::Timeout { .. } => self.retry_on_timeout,
            AccessError::Connect { .. } => self.retry_on_connect,
            AccessError::Http { status, .. } => self.should_retry_status(*status),
            AccessError::Validation(_) | AccessError::Decode { .. } | AccessError::Other { .. } => {
                false
            }
        }
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_backoff_doubles_until_capped() {
        let backoff = Backoff::Exponential {
            base: Duration::from_millis(100),
            factor: 2.0,
            max: Duration::from_secs(1),
            jitter: false,
        };

        assert_eq!(backoff.delay(0), Duration::from_millis(100));
        assert_eq!(backoff.delay(1), Duration::from_millis(200));
        assert_eq!(backoff.delay(3), Duration::from_millis(800));
        assert_eq!(backoff.delay(4), Duration::from_secs(1));
        assert_eq!(backoff.delay(u32::MAX), Duration::from_secs(1));
    }

    #[test]
    fn jitter_stays_within_half_either_side() {
        let backoff = Backoff::Exponential {
            base: Duration::from_millis(100),
            factor: 2.0,
            max: Duration::from_secs(1),
            jitter: true,
        };

        for _ in 0..20 {
            let delay = backoff.delay(1);
            assert!(delay >= Duration::from_millis(100), "delay={delay:?}");
            assert!(delay <= Duration::from_millis(300), "delay={delay:?}");
        }
    }

    #[test]
    fn retries_transport_and_server_failures_only() {
        let config = RetryConfig::default();

        assert!(config.should_retry(&AccessError::timeout("slow")));
        assert!(config.should_retry(&AccessError::connect("refused")));
        assert!(config.should_retry(&AccessError::http(429, "Too Many Requests", "")));
        assert!(config.should_retry(&AccessError::http(503, "Service Unavailable", "")));
        assert!(!config.should_retry(&AccessError::http(404, "Not Found", "")));
        assert!(!config.should_retry(&AccessError::decode("not json")));
    }

    #[test]
    fn disabled_config_never_retries() {
        let config = RetryConfig::no_retry();
        assert!(!config.should_retry(&AccessError::timeout("slow")));
    }

    #[test]
    fn provider_backoff_policy_carries_over() {
        let policy = BackoffPolicy {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            max_retries: 2,
        };

        let config = RetryConfig::from_backoff_policy(&policy);

        assert_eq!(config.max_retries, 2);
        assert!(matches!(
            config.backoff,
            Backoff::Exponential { base, jitter: true, .. } if base == Duration::from_millis(500)
        ));
    }
}
