//! Command Relay - Main Entry Point
//! Pulls remote jobs, verifies them, and delivers them to the local console

mod env;
mod telemetry;

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use cmdrelay_api_rpc::{RateLimiter, RpcHandler, RpcServer, RpcServerConfig};
use cmdrelay_core::application::{shutdown_channel, RelayPorts, RelayService, RelaySettings};
use cmdrelay_core::port::time_provider::SystemTimeProvider;
use cmdrelay_core::port::TimeProvider;
use cmdrelay_infra_fs::{JsonFileConfigStore, JsonFileQueueStore};
use cmdrelay_infra_http::HttpRemoteAuthority;
use cmdrelay_infra_system::{ConsoleCommandExecutor, InMemoryPresenceRegistry};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const POLL_STOP_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Logging
    telemetry::init_logging()?;
    info!("Command Relay v{} starting...", VERSION);

    // 2. Configuration
    let env = env::DaemonEnv::from_env();
    info!(data_dir = %env.data_dir.display(), "Loading configuration...");
    let config_store = Arc::new(JsonFileConfigStore::in_dir(&env.data_dir));
    let settings = Arc::new(RelaySettings::load_or_default(config_store));
    let config = settings.config().clone();

    // 3. Adapters (DI wiring)
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let remote = Arc::new(HttpRemoteAuthority::new(&config).context("HTTP client setup failed")?);
    let executor = Arc::new(
        ConsoleCommandExecutor::new(
            &config.console_command,
            config.request_timeout(),
            Arc::clone(&time_provider),
        )
        .context("console executor setup failed")?,
    );
    let queue = Arc::new(JsonFileQueueStore::in_dir(&env.data_dir));
    let presence = Arc::new(InMemoryPresenceRegistry::new());

    let relay = Arc::new(RelayService::new(
        settings,
        RelayPorts {
            remote,
            queue,
            presence: presence.clone(),
            executor,
            time_provider,
        },
    ));

    // 4. Restore queued commands
    relay.load_queue().await;

    // 5. Admin / presence API
    let rpc_config = RpcServerConfig {
        port: env.rpc_port,
        ..Default::default()
    };
    let handler = RpcHandler::new(Arc::clone(&relay), presence, RateLimiter::from_env());
    let (rpc_handle, rpc_addr) = RpcServer::new(rpc_config, handler)
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    // 6. Poll loop (refuses to start on incomplete config; the API stays up)
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let poll_relay = Arc::clone(&relay);
    let poll_handle = tokio::spawn(async move {
        if let Err(e) = poll_relay.run_polling(shutdown_rx).await {
            error!(error = %e, "Polling disabled");
        }
    });

    info!(api = %rpc_addr, "Relay ready. Press Ctrl+C to shutdown");

    // 7. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Exiting gracefully...");

    // 8. Graceful shutdown
    shutdown_tx.shutdown();
    if tokio::time::timeout(POLL_STOP_TIMEOUT, poll_handle).await.is_err() {
        warn!("Poll loop did not stop in time");
    }
    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    if let Err(e) = relay.shutdown().await {
        error!(error = %e, "Final queue persist failed");
    }
    telemetry::shutdown_telemetry();

    info!("Shutdown complete.");
    Ok(())
}
