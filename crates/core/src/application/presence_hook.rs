// Presence Hook - flushes a user's queue shortly after they connect

use crate::application::dispatcher::Dispatcher;
use crate::application::settings::RelaySettings;
use crate::port::{PresenceRegistry, QueueStore};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

#[derive(Clone)]
pub struct PresenceHook {
    queue: Arc<dyn QueueStore>,
    presence: Arc<dyn PresenceRegistry>,
    dispatcher: Arc<Dispatcher>,
    settings: Arc<RelaySettings>,
}

impl PresenceHook {
    pub fn new(
        queue: Arc<dyn QueueStore>,
        presence: Arc<dyn PresenceRegistry>,
        dispatcher: Arc<Dispatcher>,
        settings: Arc<RelaySettings>,
    ) -> Self {
        Self {
            queue,
            presence,
            dispatcher,
            settings,
        }
    }

    /// Connect event from the host. Schedules a flush after the settle delay.
    ///
    /// Returns `None` when presence checking is off (nothing is ever queued then).
    pub fn user_connected(&self, user_id: &str) -> Option<JoinHandle<usize>> {
        let config = self.settings.config();
        if !config.check_player_online || user_id.trim().is_empty() {
            return None;
        }

        let hook = self.clone();
        let user_id = user_id.to_string();
        let delay = config.connect_flush_delay();
        Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            hook.flush(&user_id).await
        }))
    }

    /// Drain and dispatch everything queued for `user_id`. Returns the number
    /// of commands handed to the dispatcher.
    pub async fn flush(&self, user_id: &str) -> usize {
        let commands = self.queue.drain(user_id).await;
        if commands.is_empty() {
            debug!(user_id = %user_id, "Nothing queued on connect");
            return 0;
        }

        let label = match self.presence.find(user_id).await {
            Some(presence) => presence.label().to_string(),
            None => "Unknown".to_string(),
        };

        info!(
            user_id = %user_id,
            name = %label,
            count = commands.len(),
            "Processing {} queued command(s) for {} ({})",
            commands.len(),
            label,
            user_id
        );
        drop(self.dispatcher.execute(&commands, &label));
        commands.len()
    }
}
