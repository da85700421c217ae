use std::fmt::Display;
use std::thread;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

/// Full-jitter exponential backoff for calls the store throttles.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: 10,
            base_delay: Duration::from_secs(3),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Uniform in `[0, min(max_delay, base_delay * 2^attempt)]`.
    pub fn delay_for<R: Rng>(&self, attempt: u32, rng: &mut R) -> Duration {
        let ceiling = self
            .base_delay
            .checked_mul(2u32.saturating_pow(attempt))
            .unwrap_or(self.max_delay)
            .min(self.max_delay);
        let millis = ceiling.as_millis() as u64;
        if millis == 0 {
            return Duration::from_millis(0);
        }
        Duration::from_millis(rng.gen_range(0..=millis))
    }

    /// Runs `call` until it succeeds, fails with something `retriable` rejects,
    /// or the retry budget is spent.
    pub fn run<T, E, F, C>(&self, operation: &str, mut call: F, retriable: C) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        C: Fn(&E) -> bool,
        E: Display,
    {
        let mut rng = rand::thread_rng();
        let mut attempt = 0;
        loop {
            match call() {
                Err(err) if attempt < self.max_retries && retriable(&err) => {
                    let delay = self.delay_for(attempt, &mut rng);
                    warn!(
                        operation = %operation,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying throttled call"
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::cell::Cell;

    fn instant(max_retries: u32) -> RetryPolicy {
        RetryPolicy { max_retries, base_delay: Duration::from_millis(0), max_delay: Duration::from_millis(0) }
    }

    #[test]
    fn delay_stays_under_the_exponential_ceiling() {
        let policy = RetryPolicy::default();
        let mut rng = StdRng::seed_from_u64(7);
        for attempt in 0..4 {
            let ceiling = Duration::from_secs(3 * 2u64.pow(attempt));
            for _ in 0..50 {
                assert!(policy.delay_for(attempt, &mut rng) <= ceiling);
            }
        }
    }

    #[test]
    fn delay_is_capped() {
        let policy = RetryPolicy::default();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            assert!(policy.delay_for(40, &mut rng) <= Duration::from_secs(60));
        }
    }

    #[test]
    fn retries_until_success() {
        let calls = Cell::new(0);
        let result: Result<u32, String> = instant(5).run(
            "GetParameters",
            || {
                calls.set(calls.get() + 1);
                if calls.get() < 3 { Err("ThrottlingException".to_string()) } else { Ok(42) }
            },
            |e| e.contains("Throttling"),
        );
        assert_eq!(result, Ok(42));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn gives_up_after_budget() {
        let calls = Cell::new(0);
        let result: Result<(), String> = instant(2).run(
            "DescribeParameters",
            || {
                calls.set(calls.get() + 1);
                Err("ThrottlingException".to_string())
            },
            |_| true,
        );
        assert!(result.is_err());
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn does_not_retry_other_failures() {
        let calls = Cell::new(0);
        let result: Result<(), String> = instant(5).run(
            "GetParameters",
            || {
                calls.set(calls.get() + 1);
                Err("AccessDeniedException".to_string())
            },
            |e| e.contains("Throttling"),
        );
        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }
}
