// Poll loop constants
use std::time::Duration;

/// Grace period for in-flight poll cycles when the loop stops
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);
