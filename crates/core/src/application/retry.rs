// Bounded retry for acknowledgements
use std::time::Duration;
use tracing::{info, warn};

/// Retry decision result
#[derive(Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Try again after the given backoff
    Retry(Duration),
    /// Attempts exhausted
    GiveUp,
}

/// Exponential backoff with a hard attempt cap.
///
/// `max_attempts` counts the first try, so `1` disables retries.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay_ms: u64,
}

impl RetryPolicy {
    /// # Example
    /// ```text
    /// let policy = RetryPolicy::new(3, 500);
    /// ```
    pub fn new(max_attempts: u32, base_delay_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Decide what to do after `attempts_made` failed attempts.
    ///
    /// delay = base_delay * 2^(attempts_made - 1), with ±10% jitter seeded by
    /// `seed` so concurrent relays sharing a remote do not retry in lockstep.
    pub fn should_retry(&self, attempts_made: u32, seed: &str) -> RetryDecision {
        if attempts_made >= self.max_attempts {
            warn!(
                attempts = attempts_made,
                max_attempts = self.max_attempts,
                "Max retry attempts reached"
            );
            return RetryDecision::GiveUp;
        }

        let exponent = attempts_made.saturating_sub(1).min(16);
        let base = self.base_delay_ms as f64 * 2f64.powi(exponent as i32);

        let jitter_seed = seed.chars().map(|c| c as u32).fold(0u32, u32::wrapping_add);
        let jitter_factor = 0.9 + ((jitter_seed % 21) as f64 / 100.0); // 0.9 to 1.1

        let delay = Duration::from_millis((base * jitter_factor) as u64);

        info!(
            attempt = attempts_made,
            max_attempts = self.max_attempts,
            delay_ms = delay.as_millis() as u64,
            "Scheduling retry"
        );

        RetryDecision::Retry(delay)
    }
}
