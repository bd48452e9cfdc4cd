//! Rate Limiter (Token Bucket)
//!
//! Shared by every method of the admin API, so a runaway script on the host
//! cannot turn `admin.poll.v1` into a flood against the remote authority.

use std::sync::Mutex;
use tokio::time::Instant;

/// Default burst size
pub const DEFAULT_BURST: u32 = 20;
/// Default refill, tokens per second
pub const DEFAULT_RATE: u32 = 5;

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

pub struct RateLimiter {
    bucket: Mutex<Bucket>,
    max_tokens: f64,
    refill_per_sec: f64,
}

impl RateLimiter {
    /// `RateLimiter::new(20, 5)` allows bursts of 20 and 5 calls/sec sustained
    pub fn new(max_tokens: u32, refill_per_sec: u32) -> Self {
        Self {
            bucket: Mutex::new(Bucket {
                tokens: max_tokens as f64,
                last_refill: Instant::now(),
            }),
            max_tokens: max_tokens as f64,
            refill_per_sec: refill_per_sec as f64,
        }
    }

    /// Limits from `CMDRELAY_RATE_LIMIT_BURST` / `CMDRELAY_RATE_LIMIT_RATE`
    pub fn from_env() -> Self {
        let read = |name: &str, default: u32| {
            std::env::var(name)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default)
        };
        Self::new(
            read("CMDRELAY_RATE_LIMIT_BURST", DEFAULT_BURST),
            read("CMDRELAY_RATE_LIMIT_RATE", DEFAULT_RATE),
        )
    }

    /// Consume one token; `false` when the caller must be throttled
    pub fn check(&self) -> bool {
        let mut bucket = self.bucket.lock().unwrap_or_else(|p| p.into_inner());
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_sec).min(self.max_tokens);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}
