// Application Layer - relay use cases

pub mod acknowledger;
pub mod dispatcher;
pub mod poller;
pub mod presence_hook;
pub mod relay;
pub mod retry;
pub mod settings;
pub mod signature;
pub mod worker;

// Re-exports
pub use acknowledger::Acknowledger;
pub use dispatcher::{DispatchHandle, Dispatcher};
pub use poller::{PollOutcome, PollRecord, Poller, RouteReport};
pub use presence_hook::PresenceHook;
pub use relay::{RelayPorts, RelayService, RelayStatus};
pub use retry::{RetryDecision, RetryPolicy};
pub use settings::RelaySettings;
pub use signature::SignatureVerifier;
pub use worker::{shutdown_channel, PollWorker, ShutdownSender, ShutdownToken};
