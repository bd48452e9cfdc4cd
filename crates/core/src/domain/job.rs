// Job Domain Model

use serde::{Deserialize, Serialize};

/// Remote-assigned job identifier (opaque, echoed back on ack)
pub type JobId = String;

/// Target user identifier (empty = unscoped/broadcast)
pub type UserId = String;

/// A single job pulled from the remote authority
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobItem {
    pub id: JobId,
    pub username: UserId,
    pub command: String,
}

impl JobItem {
    pub fn new(
        id: impl Into<String>,
        username: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            command: command.into(),
        }
    }

    /// Unscoped jobs are dispatched without a presence check
    pub fn is_unscoped(&self) -> bool {
        self.username.trim().is_empty()
    }
}

// Wire shape: every field may be missing or null
#[derive(Debug, Deserialize)]
struct WireItem {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    command: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireBatch {
    #[serde(default)]
    items: Option<Vec<Option<WireItem>>>,
}

/// Batch returned by the pull endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullBatch {
    pub items: Vec<JobItem>,
}

impl PullBatch {
    /// Parse a pull response body. Null entries and null fields are tolerated.
    pub fn parse(body: &str) -> serde_json::Result<Self> {
        let wire: WireBatch = serde_json::from_str(body)?;
        let items = wire
            .items
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .map(|w| JobItem {
                id: w.id.unwrap_or_default(),
                username: w.username.unwrap_or_default(),
                command: w.command.unwrap_or_default(),
            })
            .collect();
        Ok(Self { items })
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Group routable items by target user, in first-seen order.
    ///
    /// Items with a blank command are dropped. A blank username collapses
    /// to the empty key so all unscoped jobs form one group.
    pub fn group_by_user(self) -> Vec<UserGroup> {
        let mut groups: Vec<UserGroup> = Vec::new();
        for item in self.items {
            if item.command.trim().is_empty() {
                continue;
            }
            let key = if item.is_unscoped() {
                String::new()
            } else {
                item.username.clone()
            };
            match groups.iter_mut().find(|g| g.user_id == key) {
                Some(group) => group.items.push(item),
                None => groups.push(UserGroup {
                    user_id: key,
                    items: vec![item],
                }),
            }
        }
        groups
    }
}

/// All jobs in one batch that target the same user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserGroup {
    pub user_id: UserId,
    pub items: Vec<JobItem>,
}

impl UserGroup {
    pub fn commands(&self) -> Vec<String> {
        self.items.iter().map(|i| i.command.clone()).collect()
    }

    /// Ids to acknowledge once this group is routed (blank ids are skipped)
    pub fn ack_ids(&self) -> impl Iterator<Item = &str> {
        self.items
            .iter()
            .map(|i| i.id.as_str())
            .filter(|id| !id.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tolerates_nulls() {
        let body = r#"{"items":[null,{"id":"1","username":null,"command":"say hi"},{"id":"2"}]}"#;
        let batch = PullBatch::parse(body).unwrap();

        assert_eq!(batch.items.len(), 2);
        assert_eq!(batch.items[0], JobItem::new("1", "", "say hi"));
        assert_eq!(batch.items[1].command, "");
    }

    #[test]
    fn test_parse_missing_items_is_empty() {
        assert!(PullBatch::parse("{}").unwrap().is_empty());
        assert!(PullBatch::parse(r#"{"items":null}"#).unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        assert!(PullBatch::parse("{items:").is_err());
    }

    #[test]
    fn test_group_by_user_keeps_order_and_drops_blank_commands() {
        let batch = PullBatch {
            items: vec![
                JobItem::new("1", "u1", "give u1 wood 100"),
                JobItem::new("2", "u2", "   "),
                JobItem::new("3", "  ", "say server"),
                JobItem::new("4", "u1", "give u1 stone 5"),
                JobItem::new("5", "", "say again"),
            ],
        };

        let groups = batch.group_by_user();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].user_id, "u1");
        assert_eq!(
            groups[0].commands(),
            vec!["give u1 wood 100", "give u1 stone 5"]
        );
        assert_eq!(groups[1].user_id, "");
        assert_eq!(groups[1].ack_ids().collect::<Vec<_>>(), vec!["3", "5"]);
    }

    #[test]
    fn test_ack_ids_skip_blank() {
        let group = UserGroup {
            user_id: "u1".into(),
            items: vec![JobItem::new("", "u1", "a"), JobItem::new("7", "u1", "b")],
        };
        assert_eq!(group.ack_ids().collect::<Vec<_>>(), vec!["7"]);
    }
}
