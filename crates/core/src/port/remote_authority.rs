// Remote Authority Port
// The fixed two-endpoint contract: pull pending jobs, ack consumed ones

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Raw pull response, before verification and parsing
#[derive(Debug, Clone, Default)]
pub struct PullResponse {
    pub status: u16,
    pub body: String,
    /// `X-Timestamp` response header
    pub timestamp: Option<String>,
    /// `X-Signature` response header
    pub signature: Option<String>,
}

impl PullResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn signed(
        body: impl Into<String>,
        timestamp: impl Into<String>,
        signature: impl Into<String>,
    ) -> Self {
        Self {
            status: 200,
            body: body.into(),
            timestamp: Some(timestamp.into()),
            signature: Some(signature.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn has_body(&self) -> bool {
        !self.body.trim().is_empty()
    }
}

/// JSON body of the ack endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckRequest {
    pub token: String,
    pub ids: Vec<String>,
}

/// Remote authority client
///
/// Errors are `AppError::Transport` (connection failure, timeout). A non-2xx
/// status is not an error at this layer; the caller inspects it.
#[async_trait]
pub trait RemoteAuthority: Send + Sync {
    /// POST the pull endpoint asking for at most `limit` jobs
    async fn pull(&self, limit: u32) -> Result<PullResponse>;

    /// POST the ack endpoint; returns the HTTP status
    async fn ack(&self, ids: &[String]) -> Result<u16>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted remote: pops one pull response per call, records acks
    #[derive(Default)]
    pub struct MockRemoteAuthority {
        pulls: Mutex<VecDeque<Result<PullResponse>>>,
        acks: Mutex<Vec<Vec<String>>>,
        ack_statuses: Mutex<VecDeque<Result<u16>>>,
        pull_limits: Mutex<Vec<u32>>,
    }

    impl MockRemoteAuthority {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_pull(&self, response: PullResponse) {
            self.pulls.lock().unwrap().push_back(Ok(response));
        }

        pub fn push_pull_error(&self, message: &str) {
            self.pulls
                .lock()
                .unwrap()
                .push_back(Err(AppError::Transport(message.to_string())));
        }

        /// Script the outcome of the next ack call (default: 200)
        pub fn push_ack_result(&self, result: Result<u16>) {
            self.ack_statuses.lock().unwrap().push_back(result);
        }

        pub fn acks(&self) -> Vec<Vec<String>> {
            self.acks.lock().unwrap().clone()
        }

        pub fn pull_limits(&self) -> Vec<u32> {
            self.pull_limits.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RemoteAuthority for MockRemoteAuthority {
        async fn pull(&self, limit: u32) -> Result<PullResponse> {
            self.pull_limits.lock().unwrap().push(limit);
            self.pulls
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(PullResponse::ok(r#"{"items":[]}"#)))
        }

        async fn ack(&self, ids: &[String]) -> Result<u16> {
            self.acks.lock().unwrap().push(ids.to_vec());
            self.ack_statuses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(200))
        }
    }
}
