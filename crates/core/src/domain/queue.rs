// Pending Command Queue Domain Model

use super::job::UserId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-user pending commands, in delivery order.
///
/// Invariant: every key maps to a non-empty list. Serializes as a plain
/// JSON object `{ "<user id>": ["cmd", ...] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandQueue {
    entries: BTreeMap<UserId, Vec<String>>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the non-blank commands for a user. Returns how many were added.
    pub fn append<I, S>(&mut self, user_id: &str, commands: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let accepted: Vec<String> = commands
            .into_iter()
            .map(Into::into)
            .filter(|c| !c.trim().is_empty())
            .collect();
        let added = accepted.len();
        if added > 0 {
            self.entries
                .entry(user_id.to_string())
                .or_default()
                .extend(accepted);
        }
        added
    }

    /// Remove and return everything queued for a user
    pub fn take(&mut self, user_id: &str) -> Vec<String> {
        self.entries.remove(user_id).unwrap_or_default()
    }

    /// Merge a loaded snapshot into this queue (loaded entries are appended)
    pub fn merge(&mut self, other: CommandQueue) {
        for (user_id, commands) in other.entries {
            self.append(&user_id, commands);
        }
    }

    pub fn user_count(&self) -> usize {
        self.entries.len()
    }

    pub fn command_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
