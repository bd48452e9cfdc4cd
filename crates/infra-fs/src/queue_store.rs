// JSON file QueueStore

use crate::write::write_atomic_async;
use async_trait::async_trait;
use cmdrelay_core::domain::CommandQueue;
use cmdrelay_core::error::{AppError, Result};
use cmdrelay_core::port::{QueueStats, QueueStore};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

pub const QUEUE_FILE_NAME: &str = "queue.json";

/// Suffix of the copy an unreadable queue file is moved to
pub const CORRUPT_SUFFIX: &str = ".corrupt";

/// Per-user queue mirrored to `queue.json`.
///
/// Every mutation rewrites the whole document while still holding the lock,
/// so the file always matches some serialization of the in-memory state.
pub struct JsonFileQueueStore {
    path: PathBuf,
    queue: Mutex<CommandQueue>,
}

impl JsonFileQueueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            queue: Mutex::new(CommandQueue::new()),
        }
    }

    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(QUEUE_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where an unreadable queue file is set aside on load
    pub fn corrupt_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(CORRUPT_SUFFIX);
        PathBuf::from(name)
    }

    async fn write(&self, queue: &CommandQueue) -> Result<()> {
        let json = serde_json::to_vec_pretty(queue)?;
        write_atomic_async(&self.path, &json)
            .await
            .map_err(|e| AppError::Persistence(format!("{}: {}", self.path.display(), e)))
    }

    async fn write_or_log(&self, queue: &CommandQueue) {
        if let Err(e) = self.write(queue).await {
            error!(path = %self.path.display(), error = %e, "Queue persist failed: {}", e);
        }
    }
}

#[async_trait]
impl QueueStore for JsonFileQueueStore {
    async fn enqueue(&self, user_id: &str, commands: &[String]) -> usize {
        let mut queue = self.queue.lock().await;
        let added = queue.append(user_id, commands.iter().cloned());
        if added > 0 {
            self.write_or_log(&queue).await;
        }
        added
    }

    async fn drain(&self, user_id: &str) -> Vec<String> {
        let mut queue = self.queue.lock().await;
        let drained = queue.take(user_id);
        if !drained.is_empty() {
            self.write_or_log(&queue).await;
        }
        drained
    }

    async fn load(&self) -> Result<usize> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No queue file yet");
                return Ok(0);
            }
            Err(e) => return Err(e.into()),
        };

        let loaded: CommandQueue = match serde_json::from_str(&raw) {
            Ok(loaded) => loaded,
            Err(e) => {
                let backup = self.corrupt_path();
                match tokio::fs::rename(&self.path, &backup).await {
                    Ok(()) => warn!(
                        path = %self.path.display(),
                        backup = %backup.display(),
                        error = %e,
                        "Queue file unreadable, moved to {}",
                        backup.display()
                    ),
                    Err(rename_err) => warn!(
                        path = %self.path.display(),
                        error = %e,
                        rename_error = %rename_err,
                        "Queue file unreadable and could not be set aside"
                    ),
                }
                return Err(AppError::Persistence(format!("{}: {}", self.path.display(), e)));
            }
        };

        let users = loaded.user_count();
        self.queue.lock().await.merge(loaded);
        Ok(users)
    }

    async fn persist(&self) -> Result<()> {
        let queue = self.queue.lock().await;
        self.write(&queue).await
    }

    async fn stats(&self) -> QueueStats {
        let queue = self.queue.lock().await;
        QueueStats {
            users: queue.user_count(),
            commands: queue.command_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn cmds(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_enqueue_survives_restart() {
        let dir = TempDir::new().unwrap();

        let store = JsonFileQueueStore::in_dir(dir.path());
        store.enqueue("u1", &cmds(&["a", "b"])).await;
        store.enqueue("u2", &cmds(&["c"])).await;
        drop(store);

        let reopened = JsonFileQueueStore::in_dir(dir.path());
        assert_eq!(reopened.load().await.unwrap(), 2);
        assert_eq!(reopened.drain("u1").await, vec!["a", "b"]);
        assert_eq!(reopened.drain("u2").await, vec!["c"]);
    }

    #[tokio::test]
    async fn test_file_is_plain_user_map() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileQueueStore::in_dir(dir.path());

        store.enqueue("u1", &cmds(&["give u1 wood 100"])).await;

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(doc, serde_json::json!({"u1": ["give u1 wood 100"]}));
    }

    #[tokio::test]
    async fn test_drain_removes_user_from_file() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileQueueStore::in_dir(dir.path());
        store.enqueue("u1", &cmds(&["a"])).await;

        assert_eq!(store.drain("u1").await, vec!["a"]);
        assert!(store.drain("u1").await.is_empty());

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw.trim(), "{}");
    }

    #[tokio::test]
    async fn test_blank_commands_are_not_stored() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileQueueStore::in_dir(dir.path());

        let added = store.enqueue("u1", &cmds(&["", "  "])).await;

        assert_eq!(added, 0);
        assert_eq!(store.stats().await, QueueStats::default());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileQueueStore::in_dir(dir.path());
        assert_eq!(store.load().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_error_and_state_stays_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileQueueStore::in_dir(dir.path());
        std::fs::write(store.path(), "[not a map").unwrap();

        assert!(matches!(store.load().await, Err(AppError::Persistence(_))));
        assert_eq!(store.stats().await.commands, 0);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_set_aside_before_next_write() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileQueueStore::in_dir(dir.path());
        std::fs::write(store.path(), "[not a map").unwrap();

        assert!(store.load().await.is_err());
        assert!(!store.path().exists());
        assert_eq!(
            std::fs::read_to_string(store.corrupt_path()).unwrap(),
            "[not a map"
        );

        store.enqueue("u1", &cmds(&["a"])).await;

        assert_eq!(
            std::fs::read_to_string(dir.path().join("queue.json.corrupt")).unwrap(),
            "[not a map"
        );
        let raw = std::fs::read_to_string(store.path()).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(doc, serde_json::json!({"u1": ["a"]}));
    }

    #[tokio::test]
    async fn test_write_failure_keeps_memory_state() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should be makes every write fail
        let path = dir.path().join("queue.json");
        std::fs::create_dir_all(path.join("blocker")).unwrap();
        let store = JsonFileQueueStore::new(&path);

        assert_eq!(store.enqueue("u1", &cmds(&["a"])).await, 1);
        assert!(store.persist().await.is_err());
        assert_eq!(store.drain("u1").await, vec!["a"]);
    }

    #[tokio::test]
    async fn test_concurrent_enqueue_and_drain_lose_nothing() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JsonFileQueueStore::in_dir(dir.path()));

        let mut tasks = Vec::new();
        for i in 0..20 {
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(async move {
                store.enqueue("u1", &[format!("cmd {}", i)]).await;
            }));
        }
        let mut drained = Vec::new();
        for task in tasks {
            task.await.unwrap();
            drained.extend(store.drain("u1").await);
        }
        drained.extend(store.drain("u1").await);

        drained.sort();
        let expected: Vec<String> = {
            let mut all: Vec<String> = (0..20).map(|i| format!("cmd {}", i)).collect();
            all.sort();
            all
        };
        assert_eq!(drained, expected);

        let reopened = JsonFileQueueStore::in_dir(dir.path());
        assert_eq!(reopened.load().await.unwrap(), 0);
    }
}
