// Time Provider Port (for testability)

/// Wall-clock source (allows fixed time in tests)
pub trait TimeProvider: Send + Sync {
    /// Current time in milliseconds since epoch
    fn now_millis(&self) -> i64;
}

/// System time provider (production)
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    /// Clock that only moves when told to
    pub struct FixedTimeProvider {
        now: AtomicI64,
    }

    impl FixedTimeProvider {
        pub fn new(now_millis: i64) -> Self {
            Self {
                now: AtomicI64::new(now_millis),
            }
        }

        pub fn advance(&self, millis: i64) {
            self.now.fetch_add(millis, Ordering::SeqCst);
        }
    }

    impl TimeProvider for FixedTimeProvider {
        fn now_millis(&self) -> i64 {
            self.now.load(Ordering::SeqCst)
        }
    }
}
