//! Relay service - the one object adapters talk to
//!
//! Wires dispatcher, poller and presence hook over the injected ports and
//! exposes the admin operations (status, poll now, debug toggle) plus the
//! host's connect event.

use crate::application::dispatcher::Dispatcher;
use crate::application::poller::{PollRecord, Poller};
use crate::application::presence_hook::PresenceHook;
use crate::application::settings::RelaySettings;
use crate::application::worker::{PollWorker, ShutdownToken};
use crate::error::Result;
use crate::port::{
    CommandExecutor, PresenceRegistry, QueueStats, QueueStore, RemoteAuthority, TimeProvider,
};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Adapters the relay runs on
pub struct RelayPorts {
    pub remote: Arc<dyn RemoteAuthority>,
    pub queue: Arc<dyn QueueStore>,
    pub presence: Arc<dyn PresenceRegistry>,
    pub executor: Arc<dyn CommandExecutor>,
    pub time_provider: Arc<dyn TimeProvider>,
}

/// Snapshot for `admin.status.v1`
#[derive(Debug, Clone, Serialize)]
pub struct RelayStatus {
    pub version: String,
    pub website_url: String,
    pub poll_interval_sec: u64,
    pub max_per_poll: u32,
    pub check_player_online: bool,
    pub debug: bool,
    pub polling_active: bool,
    pub queue: QueueStats,
    pub last_poll: Option<PollRecord>,
    pub uptime_ms: i64,
}

pub struct RelayService {
    settings: Arc<RelaySettings>,
    queue: Arc<dyn QueueStore>,
    poller: Arc<Poller>,
    hook: PresenceHook,
    time_provider: Arc<dyn TimeProvider>,
    started_at_ms: i64,
    polling: AtomicBool,
}

impl RelayService {
    pub fn new(settings: Arc<RelaySettings>, ports: RelayPorts) -> Self {
        let dispatcher = Arc::new(Dispatcher::new(ports.executor, Arc::clone(&settings)));
        let poller = Arc::new(Poller::new(
            ports.remote,
            Arc::clone(&ports.queue),
            Arc::clone(&ports.presence),
            Arc::clone(&dispatcher),
            Arc::clone(&settings),
            Arc::clone(&ports.time_provider),
        ));
        let hook = PresenceHook::new(
            Arc::clone(&ports.queue),
            ports.presence,
            dispatcher,
            Arc::clone(&settings),
        );

        Self {
            started_at_ms: ports.time_provider.now_millis(),
            time_provider: ports.time_provider,
            queue: ports.queue,
            settings,
            poller,
            hook,
            polling: AtomicBool::new(false),
        }
    }

    pub fn settings(&self) -> &RelaySettings {
        &self.settings
    }

    /// Load persisted queue contents. A failure is logged and the relay
    /// starts with an empty queue.
    pub async fn load_queue(&self) -> usize {
        match self.queue.load().await {
            Ok(users) => {
                info!(users, "Queue loaded");
                users
            }
            Err(e) => {
                warn!(error = %e, "Queue load failed, starting empty");
                0
            }
        }
    }

    /// Run the poll loop until `shutdown` fires.
    ///
    /// Refuses to start (and returns the `Config` error) when a required
    /// field is blank, so an unconfigured relay never sends requests.
    pub async fn run_polling(&self, shutdown: ShutdownToken) -> Result<()> {
        let config = self.settings.config();
        if let Err(e) = config.validate() {
            error!("Config incomplete. Set websiteUrl, apiKey, serverToken in config.json");
            return Err(e);
        }
        if config.uses_plain_http() {
            warn!(url = %config.website_url, "websiteUrl uses plain HTTP; use HTTPS in production");
        }

        let worker = PollWorker::new(Arc::clone(&self.poller), config.poll_interval());
        self.polling.store(true, Ordering::Release);
        worker.run(shutdown).await;
        self.polling.store(false, Ordering::Release);
        Ok(())
    }

    /// One immediate cycle, outside the schedule
    pub async fn poll_now(&self) -> Option<PollRecord> {
        info!("Polling now...");
        self.poller.tick().await
    }

    pub fn toggle_debug(&self) -> Result<bool> {
        self.settings.toggle_debug()
    }

    pub fn user_connected(&self, user_id: &str) -> Option<JoinHandle<usize>> {
        self.hook.user_connected(user_id)
    }

    pub async fn status(&self) -> RelayStatus {
        let config = self.settings.config();
        RelayStatus {
            version: crate::VERSION.to_string(),
            website_url: config.website_url.clone(),
            poll_interval_sec: config.poll_interval().as_secs(),
            max_per_poll: config.max_per_poll,
            check_player_online: config.check_player_online,
            debug: self.settings.debug(),
            polling_active: self.polling.load(Ordering::Acquire),
            queue: self.queue.stats().await,
            last_poll: self.poller.last_poll(),
            uptime_ms: self.time_provider.now_millis() - self.started_at_ms,
        }
    }

    /// Final persist on the way out
    pub async fn shutdown(&self) -> Result<()> {
        self.queue.persist().await?;
        info!("Queue persisted on shutdown");
        Ok(())
    }
}
