// Command Relay Infrastructure - JSON File Adapters
// Implements: QueueStore, ConfigStore

mod config_store;
mod queue_store;
mod write;

pub use config_store::{JsonFileConfigStore, CONFIG_FILE_NAME};
pub use queue_store::{JsonFileQueueStore, CORRUPT_SUFFIX, QUEUE_FILE_NAME};
