// Acknowledger - tells the remote authority which jobs were routed

use crate::application::retry::{RetryDecision, RetryPolicy};
use crate::application::settings::RelaySettings;
use crate::error::{AppError, Result};
use crate::port::RemoteAuthority;
use std::sync::Arc;
use tracing::info;

/// Base delay between ack attempts when retries are enabled
pub const ACK_RETRY_BASE_DELAY_MS: u64 = 500;

pub struct Acknowledger {
    remote: Arc<dyn RemoteAuthority>,
    settings: Arc<RelaySettings>,
    retry_policy: RetryPolicy,
}

impl Acknowledger {
    pub fn new(remote: Arc<dyn RemoteAuthority>, settings: Arc<RelaySettings>) -> Self {
        let retry_policy = RetryPolicy::new(
            settings.config().ack_max_attempts(),
            ACK_RETRY_BASE_DELAY_MS,
        );
        Self {
            remote,
            settings,
            retry_policy,
        }
    }

    /// Acknowledge `ids`. Returns the final HTTP status.
    ///
    /// A non-2xx answer is not an error: the remote simply redelivers. Only a
    /// transport failure on the last attempt is returned as `Err`.
    pub async fn ack(&self, ids: &[String]) -> Result<u16> {
        let debug = self.settings.debug();
        if debug {
            info!(count = ids.len(), "Ack {} ids", ids.len());
        }

        let seed = ids.first().map(String::as_str).unwrap_or_default();
        let mut attempts = 0;
        loop {
            attempts += 1;
            let outcome = self.remote.ack(ids).await;

            let retryable = match &outcome {
                Ok(status) if (200..300).contains(status) => false,
                Ok(_) | Err(AppError::Transport(_)) => true,
                Err(_) => false,
            };

            if retryable {
                if let RetryDecision::Retry(delay) = self.retry_policy.should_retry(attempts, seed) {
                    tokio::time::sleep(delay).await;
                    continue;
                }
            }

            if let Ok(status) = &outcome {
                if debug {
                    info!(status = *status, attempts, "Ack result: HTTP {}", status);
                }
            }
            return outcome;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RelayConfig;
    use crate::port::config_store::mocks::InMemoryConfigStore;
    use crate::port::remote_authority::mocks::MockRemoteAuthority;

    fn ack_with(remote: Arc<MockRemoteAuthority>, max_attempts: u32) -> Acknowledger {
        let config = RelayConfig {
            ack_max_attempts: max_attempts,
            ..Default::default()
        };
        let settings = Arc::new(RelaySettings::new(
            config,
            Arc::new(InMemoryConfigStore::new(None)),
        ));
        Acknowledger::new(remote, settings)
    }

    fn ids() -> Vec<String> {
        vec!["1".to_string(), "2".to_string()]
    }

    #[tokio::test]
    async fn test_ack_sends_ids_once() {
        let remote = Arc::new(MockRemoteAuthority::new());
        let acknowledger = ack_with(remote.clone(), 1);

        assert_eq!(acknowledger.ack(&ids()).await.unwrap(), 200);
        assert_eq!(remote.acks(), vec![ids()]);
    }

    #[tokio::test]
    async fn test_default_policy_does_not_retry() {
        let remote = Arc::new(MockRemoteAuthority::new());
        remote.push_ack_result(Err(AppError::Transport("down".into())));
        let acknowledger = ack_with(remote.clone(), 1);

        assert!(acknowledger.ack(&ids()).await.is_err());
        assert_eq!(remote.acks().len(), 1);
    }

    #[tokio::test]
    async fn test_non_success_status_is_returned_not_raised() {
        let remote = Arc::new(MockRemoteAuthority::new());
        remote.push_ack_result(Ok(503));
        let acknowledger = ack_with(remote.clone(), 1);

        assert_eq!(acknowledger.ack(&ids()).await.unwrap(), 503);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_retry_recovers() {
        let remote = Arc::new(MockRemoteAuthority::new());
        remote.push_ack_result(Err(AppError::Transport("reset".into())));
        remote.push_ack_result(Ok(502));
        let acknowledger = ack_with(remote.clone(), 3);

        assert_eq!(acknowledger.ack(&ids()).await.unwrap(), 200);
        assert_eq!(remote.acks().len(), 3);
    }
}
