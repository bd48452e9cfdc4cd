// Queue Store Port (Interface)

use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;

/// Aggregate counts for status reporting (never exposes command contents)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub users: usize,
    pub commands: usize,
}

/// Durable per-user command queue.
///
/// `enqueue` and `drain` persist the whole store before returning. A failed
/// write is logged by the implementation and the in-memory state is kept, so
/// these two never fail from the caller's point of view.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Append non-blank commands for a user; returns how many were accepted
    async fn enqueue(&self, user_id: &str, commands: &[String]) -> usize;

    /// Atomically remove and return every command queued for a user
    async fn drain(&self, user_id: &str) -> Vec<String>;

    /// Merge the persisted document into memory; returns the number of users loaded
    async fn load(&self) -> Result<usize>;

    /// Write the whole store to stable storage
    async fn persist(&self) -> Result<()>;

    async fn stats(&self) -> QueueStats;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::CommandQueue;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    /// Non-durable store that counts persist calls
    #[derive(Default)]
    pub struct InMemoryQueueStore {
        queue: Mutex<CommandQueue>,
        persist_count: AtomicUsize,
    }

    impl InMemoryQueueStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn persist_count(&self) -> usize {
            self.persist_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl QueueStore for InMemoryQueueStore {
        async fn enqueue(&self, user_id: &str, commands: &[String]) -> usize {
            let mut queue = self.queue.lock().await;
            let added = queue.append(user_id, commands.iter().cloned());
            self.persist_count.fetch_add(1, Ordering::SeqCst);
            added
        }

        async fn drain(&self, user_id: &str) -> Vec<String> {
            let mut queue = self.queue.lock().await;
            let drained = queue.take(user_id);
            self.persist_count.fetch_add(1, Ordering::SeqCst);
            drained
        }

        async fn load(&self) -> Result<usize> {
            Ok(0)
        }

        async fn persist(&self) -> Result<()> {
            self.persist_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn stats(&self) -> QueueStats {
            let queue = self.queue.lock().await;
            QueueStats {
                users: queue.user_count(),
                commands: queue.command_count(),
            }
        }
    }
}
