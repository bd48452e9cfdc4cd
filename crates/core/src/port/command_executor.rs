// Command Executor Port
// Abstraction for running one raw command string against the target console

use async_trait::async_trait;
use thiserror::Error;

/// Result of one command execution
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    pub duration_ms: i64,
    pub exit_code: Option<i32>,
    pub output: Option<String>,
}

/// Execution status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    Success,
    Failed,
}

/// Execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Command timeout after {0}ms")]
    Timeout(i64),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Command Executor trait
///
/// Implementations:
/// - ConsoleCommandExecutor: pipes the command through an external console client
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run a single command string against the target
    ///
    /// # Errors
    /// - ExecutionError::SpawnFailed if the console client cannot be started
    /// - ExecutionError::Timeout if the target does not answer in time
    ///
    /// A command the target refuses is `Ok` with `ExecutionStatus::Failed`.
    async fn execute(&self, command: &str) -> Result<ExecutionResult, ExecutionError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    /// Mock executor behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Always succeed
        Success,
        /// Fail only commands containing the given marker
        FailMatching(String),
        /// Panic with message (for isolation testing)
        Panic(String),
    }

    /// One recorded call
    #[derive(Debug, Clone)]
    pub struct ExecutedCommand {
        pub command: String,
        pub at: Instant,
    }

    /// Mock Command Executor that records every call in order
    #[derive(Clone)]
    pub struct MockCommandExecutor {
        behavior: Arc<Mutex<MockBehavior>>,
        calls: Arc<Mutex<Vec<ExecutedCommand>>>,
    }

    impl MockCommandExecutor {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior: Arc::new(Mutex::new(behavior)),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }
        pub fn new_success() -> Self {
            Self::new(MockBehavior::Success)
        }
        pub fn new_fail_matching(marker: impl Into<String>) -> Self {
            Self::new(MockBehavior::FailMatching(marker.into()))
        }
        pub fn new_panic_inducing(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::Panic(message.into()))
        }
        pub fn calls(&self) -> Vec<ExecutedCommand> {
            self.calls.lock().unwrap().clone()
        }
        pub fn commands(&self) -> Vec<String> {
            self.calls().into_iter().map(|c| c.command).collect()
        }
    }

    #[async_trait]
    impl CommandExecutor for MockCommandExecutor {
        async fn execute(&self, command: &str) -> Result<ExecutionResult, ExecutionError> {
            self.calls.lock().unwrap().push(ExecutedCommand {
                command: command.to_string(),
                at: Instant::now(),
            });

            let behavior = self.behavior.lock().unwrap().clone();
            match behavior {
                MockBehavior::Success => Ok(ExecutionResult {
                    status: ExecutionStatus::Success,
                    duration_ms: 1,
                    exit_code: Some(0),
                    output: None,
                }),
                MockBehavior::FailMatching(marker) if command.contains(&marker) => {
                    Ok(ExecutionResult {
                        status: ExecutionStatus::Failed,
                        duration_ms: 1,
                        exit_code: Some(1),
                        output: Some(format!("mock failure for {}", command)),
                    })
                }
                MockBehavior::FailMatching(_) => Ok(ExecutionResult {
                    status: ExecutionStatus::Success,
                    duration_ms: 1,
                    exit_code: Some(0),
                    output: None,
                }),
                MockBehavior::Panic(msg) => {
                    panic!("{}", msg);
                }
            }
        }
    }
}
