// In-memory session registry fed by connect/disconnect events

use async_trait::async_trait;
use cmdrelay_core::port::{Presence, PresenceRegistry};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

/// Presence as reported by the host through the presence API.
///
/// A disconnected user stays known (with their last display name) so the
/// flush after a reconnect can still label commands.
#[derive(Default)]
pub struct InMemoryPresenceRegistry {
    users: RwLock<HashMap<String, Presence>>,
}

impl InMemoryPresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self, user_id: &str, display_name: Option<&str>) {
        let mut users = self.users.write().unwrap_or_else(|p| p.into_inner());
        let entry = users.entry(user_id.to_string()).or_insert_with(|| Presence {
            user_id: user_id.to_string(),
            display_name: None,
            connected: false,
        });
        entry.connected = true;
        if let Some(name) = display_name.map(str::trim).filter(|n| !n.is_empty()) {
            entry.display_name = Some(name.to_string());
        }
        debug!(user_id = %user_id, "User connected");
    }

    /// Returns `false` if the user was never seen
    pub fn disconnect(&self, user_id: &str) -> bool {
        let mut users = self.users.write().unwrap_or_else(|p| p.into_inner());
        match users.get_mut(user_id) {
            Some(entry) => {
                entry.connected = false;
                debug!(user_id = %user_id, "User disconnected");
                true
            }
            None => false,
        }
    }

    pub fn online_count(&self) -> usize {
        self.users
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .values()
            .filter(|p| p.connected)
            .count()
    }
}

#[async_trait]
impl PresenceRegistry for InMemoryPresenceRegistry {
    async fn find(&self, user_id: &str) -> Option<Presence> {
        self.users
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(user_id)
            .cloned()
    }
}
