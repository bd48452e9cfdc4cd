// Presence Registry Port

use async_trait::async_trait;

/// What the session registry knows about one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presence {
    pub user_id: String,
    pub display_name: Option<String>,
    pub connected: bool,
}

impl Presence {
    /// Name used in logs and as the dispatch label
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or("Unknown")
    }
}

/// Session registry of the target system
#[async_trait]
pub trait PresenceRegistry: Send + Sync {
    /// Look up a user; `None` if the registry has never seen them
    async fn find(&self, user_id: &str) -> Option<Presence>;

    /// Convenience: known and currently connected
    async fn find_connected(&self, user_id: &str) -> Option<Presence> {
        self.find(user_id).await.filter(|p| p.connected)
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Registry with a fixed set of users
    #[derive(Default)]
    pub struct StaticPresenceRegistry {
        users: Mutex<HashMap<String, Presence>>,
    }

    impl StaticPresenceRegistry {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_online(self, user_id: &str, display_name: &str) -> Self {
            self.set(user_id, Some(display_name), true);
            self
        }

        pub fn with_offline(self, user_id: &str) -> Self {
            self.set(user_id, None, false);
            self
        }

        pub fn set(&self, user_id: &str, display_name: Option<&str>, connected: bool) {
            self.users.lock().unwrap().insert(
                user_id.to_string(),
                Presence {
                    user_id: user_id.to_string(),
                    display_name: display_name.map(str::to_string),
                    connected,
                },
            );
        }
    }

    #[async_trait]
    impl PresenceRegistry for StaticPresenceRegistry {
        async fn find(&self, user_id: &str) -> Option<Presence> {
            self.users.lock().unwrap().get(user_id).cloned()
        }
    }
}
