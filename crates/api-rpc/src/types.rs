//! RPC Request/Response Types

use cmdrelay_core::application::PollRecord;
use serde::{Deserialize, Serialize};

/// admin.status.v1 result
pub use cmdrelay_core::application::RelayStatus as StatusResponse;

/// admin.poll.v1 - Poll the remote authority now
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollResponse {
    /// `false` when a scheduled cycle was already in flight
    pub ran: bool,
    pub record: Option<PollRecord>,
}

/// admin.debug.v1 - Toggle verbose cycle logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugResponse {
    pub debug: bool,
}

/// presence.connected.v1
#[derive(Debug, Deserialize)]
pub struct ConnectedRequest {
    pub user_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectedResponse {
    pub user_id: String,
    /// A queue flush was scheduled for this user
    pub flush_scheduled: bool,
    /// Users currently marked connected
    pub online: usize,
}

/// presence.disconnected.v1
#[derive(Debug, Deserialize)]
pub struct DisconnectedRequest {
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisconnectedResponse {
    pub user_id: String,
    /// `false` if the registry never saw this user
    pub known: bool,
    pub online: usize,
}
