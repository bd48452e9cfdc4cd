// Domain Layer - Pure business logic and entities

pub mod config;
pub mod job;
pub mod queue;

// Re-exports
pub use config::RelayConfig;
pub use job::{JobId, JobItem, PullBatch, UserGroup, UserId};
pub use queue::CommandQueue;
