// Command Relay Infrastructure - System Adapters
// Implements: CommandExecutor, PresenceRegistry

pub mod console_executor;
pub mod presence_registry;

pub use console_executor::ConsoleCommandExecutor;
pub use presence_registry::InMemoryPresenceRegistry;
