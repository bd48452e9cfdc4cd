// Port Layer - Interfaces for external collaborators

pub mod command_executor;
pub mod config_store;
pub mod presence;
pub mod queue_store;
pub mod remote_authority;
pub mod time_provider; // For deterministic testing

// Re-exports
pub use command_executor::{CommandExecutor, ExecutionError, ExecutionResult, ExecutionStatus};
pub use config_store::ConfigStore;
pub use presence::{Presence, PresenceRegistry};
pub use queue_store::{QueueStats, QueueStore};
pub use remote_authority::{AckRequest, PullResponse, RemoteAuthority};
pub use time_provider::TimeProvider;
