//! Dispatcher - spaced, ordered execution of command lists
//!
//! Command *k* of a list is scheduled `k * spacing` after the call, so the
//! console is never flooded and the execution order follows the input order.
//! Every command runs in its own task: a failing or panicking command does
//! not cancel or delay its siblings.

use crate::application::settings::RelaySettings;
use crate::port::{CommandExecutor, ExecutionStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// One command with its delay relative to the dispatch call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledCommand {
    pub command: String,
    pub delay: Duration,
}

/// Trim, drop blanks, and assign increasing delays starting at zero.
///
/// Delays saturate at `Duration::MAX` instead of overflowing.
pub fn schedule(commands: &[String], spacing: Duration) -> Vec<ScheduledCommand> {
    commands
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .enumerate()
        .map(|(k, command)| ScheduledCommand {
            command: command.to_string(),
            delay: spacing.saturating_mul(u32::try_from(k).unwrap_or(u32::MAX)),
        })
        .collect()
}

/// Handles of the tasks spawned by one dispatch.
///
/// Dropping it detaches the tasks; callers on the hot path never wait.
#[must_use = "drop the handle explicitly to detach the scheduled commands"]
pub struct DispatchHandle {
    handles: Vec<JoinHandle<()>>,
}

impl DispatchHandle {
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every scheduled command; returns how many tasks panicked
    pub async fn join(self) -> usize {
        let mut panicked = 0;
        for handle in self.handles {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    panicked += 1;
                }
            }
        }
        panicked
    }
}

pub struct Dispatcher {
    executor: Arc<dyn CommandExecutor>,
    settings: Arc<RelaySettings>,
}

impl Dispatcher {
    pub fn new(executor: Arc<dyn CommandExecutor>, settings: Arc<RelaySettings>) -> Self {
        Self { executor, settings }
    }

    /// Schedule `commands` for `label` (display name or raw user id).
    ///
    /// Must be called from within a tokio runtime.
    pub fn execute(&self, commands: &[String], label: &str) -> DispatchHandle {
        let plan = schedule(commands, self.settings.config().dispatch_spacing());
        if plan.is_empty() {
            return DispatchHandle { handles: vec![] };
        }

        if self.settings.debug() {
            info!(label = %label, count = plan.len(), "Executing {} command(s) for {}", plan.len(), label);
        }

        let handles = plan
            .into_iter()
            .map(|scheduled| {
                let executor = Arc::clone(&self.executor);
                let settings = Arc::clone(&self.settings);
                tokio::spawn(async move {
                    if !scheduled.delay.is_zero() {
                        tokio::time::sleep(scheduled.delay).await;
                    }
                    run_one(executor.as_ref(), &settings, &scheduled.command).await;
                })
            })
            .collect();

        DispatchHandle { handles }
    }
}

async fn run_one(executor: &dyn CommandExecutor, settings: &RelaySettings, command: &str) {
    match executor.execute(command).await {
        Ok(result) if result.status == ExecutionStatus::Success => {
            if settings.debug() {
                info!(command = %command, duration_ms = result.duration_ms, "OK: {}", command);
            }
        }
        Ok(result) => {
            error!(
                command = %command,
                exit_code = ?result.exit_code,
                output = ?result.output,
                "Exec fail: {} => exit {:?}",
                command,
                result.exit_code
            );
        }
        Err(e) => {
            error!(command = %command, error = %e, "Exec fail: {} => {}", command, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RelayConfig;
    use crate::port::command_executor::mocks::MockCommandExecutor;
    use crate::port::config_store::mocks::InMemoryConfigStore;

    fn settings(delay_between_sec: f64) -> Arc<RelaySettings> {
        let config = RelayConfig {
            delay_between_sec,
            ..Default::default()
        };
        Arc::new(RelaySettings::new(
            config,
            Arc::new(InMemoryConfigStore::new(None)),
        ))
    }

    fn cmds(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_schedule_trims_skips_blanks_and_spaces_delays() {
        let plan = schedule(
            &cmds(&["  a ", "", "b", "   ", "c"]),
            Duration::from_millis(750),
        );

        assert_eq!(
            plan.iter().map(|s| s.command.as_str()).collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
        assert_eq!(plan[0].delay, Duration::ZERO);
        assert_eq!(plan[1].delay, Duration::from_millis(750));
        assert_eq!(plan[2].delay, Duration::from_millis(1500));
    }

    #[test]
    fn test_schedule_delays_strictly_increase() {
        let input: Vec<String> = (0..50).map(|i| format!("cmd {}", i)).collect();
        let plan = schedule(&input, Duration::from_millis(50));

        for pair in plan.windows(2) {
            assert!(pair[1].delay > pair[0].delay);
        }
    }

    #[test]
    fn test_schedule_saturates_huge_spacing() {
        let spacing = Duration::from_secs_f64(1e19);
        let plan = schedule(&cmds(&["a", "b", "c"]), spacing);

        assert_eq!(plan[0].delay, Duration::ZERO);
        assert_eq!(plan[1].delay, spacing);
        assert_eq!(plan[2].delay, Duration::MAX);
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_with_huge_spacing_runs_first_command() {
        let executor = MockCommandExecutor::new_success();
        let dispatcher = Dispatcher::new(Arc::new(executor.clone()), settings(1e19));

        let handle = dispatcher.execute(&cmds(&["a", "b", "c"]), "u1");
        assert_eq!(handle.len(), 3);
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(executor.commands(), vec!["a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_runs_in_input_order() {
        let executor = MockCommandExecutor::new_success();
        let dispatcher = Dispatcher::new(Arc::new(executor.clone()), settings(0.75));

        let handle = dispatcher.execute(&cmds(&["first", "second", "third"]), "u1");
        assert_eq!(handle.len(), 3);
        assert_eq!(handle.join().await, 0);

        assert_eq!(executor.commands(), vec!["first", "second", "third"]);
        let calls = executor.calls();
        assert!(calls[1].at - calls[0].at >= Duration::from_millis(750));
        assert!(calls[2].at - calls[1].at >= Duration::from_millis(750));
    }

    #[tokio::test(start_paused = true)]
    async fn test_spacing_floor_applies() {
        let executor = MockCommandExecutor::new_success();
        let dispatcher = Dispatcher::new(Arc::new(executor.clone()), settings(0.0));

        dispatcher.execute(&cmds(&["a", "b"]), "u1").join().await;

        let calls = executor.calls();
        assert!(calls[1].at - calls[0].at >= Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_does_not_stop_siblings() {
        let executor = MockCommandExecutor::new_fail_matching("bad");
        let dispatcher = Dispatcher::new(Arc::new(executor.clone()), settings(0.1));

        dispatcher
            .execute(&cmds(&["ok 1", "bad 2", "ok 3"]), "u1")
            .join()
            .await;

        assert_eq!(executor.commands(), vec!["ok 1", "bad 2", "ok 3"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_executor_is_isolated_per_command() {
        let executor = MockCommandExecutor::new_panic_inducing("console exploded");
        let dispatcher = Dispatcher::new(Arc::new(executor.clone()), settings(0.1));

        let panicked = dispatcher.execute(&cmds(&["a", "b"]), "u1").join().await;

        assert_eq!(panicked, 2);
        assert_eq!(executor.commands(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_blank_only_input_schedules_nothing() {
        let executor = MockCommandExecutor::new_success();
        let dispatcher = Dispatcher::new(Arc::new(executor.clone()), settings(0.1));

        let handle = dispatcher.execute(&cmds(&["", "  "]), "u1");
        assert!(handle.is_empty());
    }
}
