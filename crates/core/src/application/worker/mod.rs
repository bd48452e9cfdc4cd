// Worker - periodic poll loop

pub mod constants;
mod shutdown;

use constants::*;
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};

use crate::application::poller::Poller;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

/// Runs [`Poller::tick`] every `period`, starting one period after launch.
///
/// Each cycle runs in its own task so a panic inside one cycle is logged and
/// the loop keeps its schedule. Overlapping cycles are skipped by the poller.
pub struct PollWorker {
    poller: Arc<Poller>,
    period: Duration,
}

impl PollWorker {
    pub fn new(poller: Arc<Poller>, period: Duration) -> Self {
        Self { poller, period }
    }

    pub async fn run(&self, mut shutdown: ShutdownToken) {
        info!(
            interval_secs = self.period.as_secs(),
            "Polling started every {}s",
            self.period.as_secs()
        );

        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut cycles = JoinSet::new();

        loop {
            if shutdown.is_shutdown() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {
                    let poller = Arc::clone(&self.poller);
                    cycles.spawn(async move { poller.tick().await });
                }
                Some(joined) = cycles.join_next(), if !cycles.is_empty() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            error!("Poll cycle panicked: {}", e);
                        }
                    }
                }
                _ = shutdown.wait() => break,
            }
        }

        if !cycles.is_empty() {
            info!(in_flight = cycles.len(), "Waiting for in-flight poll");
            let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
                while cycles.join_next().await.is_some() {}
            })
            .await;
            if drained.is_err() {
                warn!("In-flight poll did not finish in time, aborting");
                cycles.abort_all();
            }
        }
        info!("Polling stopped");
    }
}
