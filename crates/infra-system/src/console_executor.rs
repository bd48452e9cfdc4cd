// Console executor
// Runs each command through an external console client, e.g. `rcon-cli "say hi"`
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use cmdrelay_core::port::{
    CommandExecutor, ExecutionError, ExecutionResult, ExecutionStatus, TimeProvider,
};

/// Spawns the configured console program once per command.
///
/// `console_command` is split on whitespace into program and leading
/// arguments (`docker exec mc rcon-cli` works); the relay command is
/// appended as one final argument, never passed through a shell.
pub struct ConsoleCommandExecutor {
    program: String,
    base_args: Vec<String>,
    timeout: Duration,
    time_provider: Arc<dyn TimeProvider>,
}

impl ConsoleCommandExecutor {
    /// # Errors
    /// `InvalidCommand` if `console_command` is blank
    pub fn new(
        console_command: &str,
        timeout: Duration,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Result<Self, ExecutionError> {
        let mut parts = console_command.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or_else(|| {
            ExecutionError::InvalidCommand("consoleCommand is empty".to_string())
        })?;
        Ok(Self {
            program,
            base_args: parts.collect(),
            timeout,
            time_provider,
        })
    }

    async fn spawn_and_wait(&self, command: &str) -> Result<std::process::Output, ExecutionError> {
        let child = Command::new(&self.program)
            .args(&self.base_args)
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExecutionError::SpawnFailed(format!("{}: {}", self.program, e)))?;

        match timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(ExecutionError::IoError(e.to_string())),
            Err(_) => Err(ExecutionError::Timeout(self.timeout.as_millis() as i64)),
        }
    }
}

fn build_result(output: std::process::Output, duration_ms: i64) -> ExecutionResult {
    let status = if output.status.success() {
        ExecutionStatus::Success
    } else {
        ExecutionStatus::Failed
    };

    let mut text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(stderr.trim());
    }

    ExecutionResult {
        status,
        duration_ms,
        exit_code: output.status.code(),
        output: (!text.is_empty()).then_some(text),
    }
}

#[async_trait]
impl CommandExecutor for ConsoleCommandExecutor {
    async fn execute(&self, command: &str) -> Result<ExecutionResult, ExecutionError> {
        let command = command.trim();
        if command.is_empty() {
            return Err(ExecutionError::InvalidCommand("blank command".to_string()));
        }

        let start = self.time_provider.now_millis();
        let output = self.spawn_and_wait(command).await?;
        let result = build_result(output, self.time_provider.now_millis() - start);

        debug!(
            program = %self.program,
            command = %command,
            exit_code = ?result.exit_code,
            duration_ms = result.duration_ms,
            "Console command finished"
        );
        Ok(result)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use cmdrelay_core::port::time_provider::SystemTimeProvider;

    fn executor(console_command: &str, timeout_ms: u64) -> ConsoleCommandExecutor {
        ConsoleCommandExecutor::new(
            console_command,
            Duration::from_millis(timeout_ms),
            Arc::new(SystemTimeProvider),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_command_is_passed_as_single_argument() {
        let result = executor("echo", 5_000)
            .execute("give u1 wood 100")
            .await
            .unwrap();

        assert_eq!(result.status, ExecutionStatus::Success);
        assert_eq!(result.output.as_deref(), Some("give u1 wood 100"));
    }

    #[tokio::test]
    async fn test_base_args_come_first() {
        let result = executor("printf %s|", 5_000).execute("say hi").await.unwrap();
        assert_eq!(result.output.as_deref(), Some("say hi|"));
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_failed_status() {
        let result = executor("false", 5_000).execute("anything").await.unwrap();

        assert_eq!(result.status, ExecutionStatus::Failed);
        assert_eq!(result.exit_code, Some(1));
    }

    #[tokio::test]
    async fn test_slow_console_times_out() {
        let result = executor("sleep", 100).execute("10").await;
        assert!(matches!(result, Err(ExecutionError::Timeout(100))));
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_failure() {
        let result = executor("cmdrelay-no-such-console", 1_000)
            .execute("say hi")
            .await;
        assert!(matches!(result, Err(ExecutionError::SpawnFailed(_))));
    }

    #[test]
    fn test_blank_console_command_rejected() {
        let result =
            ConsoleCommandExecutor::new("   ", Duration::from_secs(1), Arc::new(SystemTimeProvider));
        assert!(matches!(result, Err(ExecutionError::InvalidCommand(_))));
    }
}
