//! Poller - one pull/verify/route/ack cycle
//!
//! `Idle -> Requesting -> (Success | Failure) -> Idle`. Each stage reports
//! through an `AppError` kind; [`Poller::tick`] decides how each kind is
//! logged and never lets a failure escape the cycle.

use crate::application::acknowledger::Acknowledger;
use crate::application::dispatcher::Dispatcher;
use crate::application::settings::RelaySettings;
use crate::application::signature::SignatureVerifier;
use crate::domain::{PullBatch, UserGroup};
use crate::error::{AppError, Result};
use crate::port::{PresenceRegistry, QueueStore, RemoteAuthority, TimeProvider};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

/// What one routed batch did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RouteReport {
    pub dispatched_commands: usize,
    pub queued_commands: usize,
    pub acked_ids: Vec<String>,
    /// HTTP status of the ack call, if one was made and reached the remote
    pub ack_status: Option<u16>,
}

/// Successful cycle outcomes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PollOutcome {
    /// Non-2xx status or empty body; nothing to do until the next tick
    NoContent { status: u16 },
    /// Valid response without items
    Empty,
    Routed(RouteReport),
}

/// Last cycle, as reported by the status endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollRecord {
    pub at_millis: i64,
    pub summary: String,
}

/// Clears the in-flight flag when the cycle ends, including by unwinding
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Poller {
    remote: Arc<dyn RemoteAuthority>,
    queue: Arc<dyn QueueStore>,
    presence: Arc<dyn PresenceRegistry>,
    dispatcher: Arc<Dispatcher>,
    acknowledger: Acknowledger,
    verifier: SignatureVerifier,
    settings: Arc<RelaySettings>,
    time_provider: Arc<dyn TimeProvider>,
    in_flight: AtomicBool,
    last_poll: Mutex<Option<PollRecord>>,
}

impl Poller {
    pub fn new(
        remote: Arc<dyn RemoteAuthority>,
        queue: Arc<dyn QueueStore>,
        presence: Arc<dyn PresenceRegistry>,
        dispatcher: Arc<Dispatcher>,
        settings: Arc<RelaySettings>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            acknowledger: Acknowledger::new(Arc::clone(&remote), Arc::clone(&settings)),
            verifier: SignatureVerifier::new(&settings.config().api_key),
            remote,
            queue,
            presence,
            dispatcher,
            settings,
            time_provider,
            in_flight: AtomicBool::new(false),
            last_poll: Mutex::new(None),
        }
    }

    /// Run one cycle and log its outcome. Never fails.
    ///
    /// Returns `None` when a previous cycle is still requesting.
    pub async fn tick(&self) -> Option<PollRecord> {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            debug!("Previous poll still in flight, skipping tick");
            return None;
        }

        let result = {
            let _guard = InFlightGuard(&self.in_flight);
            self.poll_once().await
        };

        let summary = match &result {
            Ok(PollOutcome::NoContent { status }) => format!("no content (HTTP {})", status),
            Ok(PollOutcome::Empty) => "no pending jobs".to_string(),
            Ok(PollOutcome::Routed(report)) => format!(
                "routed {} job(s): {} dispatched, {} queued",
                report.acked_ids.len(),
                report.dispatched_commands,
                report.queued_commands
            ),
            Err(e) => format!("{} failure: {}", e.kind(), e),
        };

        match &result {
            Err(AppError::Authenticity(_)) => {
                warn!("Signature verification failed. Skipping payload.");
            }
            Err(AppError::Transport(e)) => {
                if self.settings.debug() {
                    warn!(error = %e, "Pull failed: {}", e);
                } else {
                    debug!(error = %e, "Pull failed");
                }
            }
            Err(e) => {
                error!(kind = e.kind(), error = %e, "Poll parse error: {}", e);
            }
            Ok(_) => {}
        }

        let record = PollRecord {
            at_millis: self.time_provider.now_millis(),
            summary,
        };
        *self.last_poll.lock().unwrap_or_else(|p| p.into_inner()) = Some(record.clone());
        Some(record)
    }

    pub fn last_poll(&self) -> Option<PollRecord> {
        self.last_poll
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    /// Pull, verify, parse, route, acknowledge.
    pub async fn poll_once(&self) -> Result<PollOutcome> {
        let config = self.settings.config();
        let debug = self.settings.debug();

        if debug {
            info!(url = %config.pull_url(), "Polling {}", config.pull_url());
        }

        let response = self.remote.pull(config.max_per_poll).await?;

        if !response.is_success() || !response.has_body() {
            if debug {
                warn!(status = response.status, "Pull failed: HTTP {}", response.status);
            }
            return Ok(PollOutcome::NoContent {
                status: response.status,
            });
        }

        if !self.verifier.verify(
            response.timestamp.as_deref(),
            &response.body,
            response.signature.as_deref(),
        ) {
            return Err(AppError::Authenticity(
                "response signature does not match".to_string(),
            ));
        }

        let batch = PullBatch::parse(&response.body).map_err(|e| AppError::Parse(e.to_string()))?;
        if batch.is_empty() {
            return Ok(PollOutcome::Empty);
        }

        let mut report = RouteReport::default();
        for group in batch.group_by_user() {
            self.route_group(&group, &mut report).await;
            report
                .acked_ids
                .extend(group.ack_ids().map(str::to_string));
        }

        if !report.acked_ids.is_empty() {
            match self.acknowledger.ack(&report.acked_ids).await {
                Ok(status) => report.ack_status = Some(status),
                Err(e) => warn!(error = %e, count = report.acked_ids.len(), "Ack error: {}", e),
            }
        }

        Ok(PollOutcome::Routed(report))
    }

    /// Dispatch now or park in the queue, depending on presence
    async fn route_group(&self, group: &UserGroup, report: &mut RouteReport) {
        let commands = group.commands();
        let user_id = group.user_id.as_str();

        if !self.settings.config().check_player_online || user_id.is_empty() {
            drop(self.dispatcher.execute(&commands, user_id));
            report.dispatched_commands += commands.len();
            return;
        }

        match self.presence.find_connected(user_id).await {
            Some(player) => {
                info!(
                    user_id = %user_id,
                    name = %player.label(),
                    count = commands.len(),
                    "User online: {} ({}) => executing {}",
                    player.label(),
                    user_id,
                    commands.len()
                );
                drop(self.dispatcher.execute(&commands, player.label()));
                report.dispatched_commands += commands.len();
            }
            None => {
                info!(
                    user_id = %user_id,
                    count = commands.len(),
                    "User offline: {} => queueing {}",
                    user_id,
                    commands.len()
                );
                report.queued_commands += self.queue.enqueue(user_id, &commands).await;
            }
        }
    }
}
