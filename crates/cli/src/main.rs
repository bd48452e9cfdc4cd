//! Command Relay CLI - operator interface to the relay's admin API

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9737";

#[derive(Parser)]
#[command(name = "cmdrelay-cli")]
#[command(about = "Command Relay CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Admin API URL
    #[arg(long, env = "CMDRELAY_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Show relay status
    Status,

    /// Poll the remote authority now
    Poll,

    /// Toggle verbose cycle logging
    Debug,

    /// Report a user as connected (flushes their queued commands)
    Connect {
        /// User id as sent by the remote authority
        user: String,

        /// Display name used in logs
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Report a user as disconnected
    Disconnect {
        /// User id
        user: String,
    },
}

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Tabled)]
struct StatusRow {
    field: &'static str,
    value: String,
}

async fn call_rpc(url: &str, method: &str, params: Value) -> Result<Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0",
        method,
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to relay")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

/// Render a JSON scalar without quotes
fn plain(value: &Value) -> String {
    match value {
        Value::String(s) if s.is_empty() => "(not set)".to_string(),
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

fn status_rows(status: &Value) -> Vec<StatusRow> {
    let uptime_secs = status["uptime_ms"].as_i64().unwrap_or(0) / 1000;
    let last_poll = status["last_poll"]["summary"]
        .as_str()
        .unwrap_or("never")
        .to_string();

    vec![
        StatusRow { field: "Version", value: plain(&status["version"]) },
        StatusRow { field: "Website URL", value: plain(&status["website_url"]) },
        StatusRow {
            field: "Poll interval",
            value: format!("{}s", plain(&status["poll_interval_sec"])),
        },
        StatusRow { field: "Max per poll", value: plain(&status["max_per_poll"]) },
        StatusRow { field: "Check online", value: plain(&status["check_player_online"]) },
        StatusRow { field: "Debug", value: plain(&status["debug"]) },
        StatusRow { field: "Polling", value: plain(&status["polling_active"]) },
        StatusRow { field: "Queued users", value: plain(&status["queue"]["users"]) },
        StatusRow { field: "Queued commands", value: plain(&status["queue"]["commands"]) },
        StatusRow { field: "Last poll", value: last_poll },
        StatusRow { field: "Uptime", value: format!("{}s", uptime_secs) },
    ]
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Status => {
            println!("{}", "Command Relay Status".cyan().bold());
            println!();

            match call_rpc(&cli.rpc_url, "admin.status.v1", json!({})).await {
                Ok(status) => {
                    println!("  {} {}", "API:".bold(), cli.rpc_url);
                    if status["polling_active"].as_bool().unwrap_or(false) {
                        println!("  {} {}", "State:".bold(), "POLLING".green());
                    } else {
                        println!("  {} {}", "State:".bold(), "IDLE (check config.json)".yellow());
                    }
                    println!();
                    println!("{}", Table::new(status_rows(&status)));
                }
                Err(e) => {
                    println!("  {} {}", "State:".bold(), "OFFLINE".red());
                    println!("  {} {}", "Error:".bold(), e);
                }
            }
        }

        Commands::Poll => {
            println!("{}", "Polling now...".cyan());
            let result = call_rpc(&cli.rpc_url, "admin.poll.v1", json!({})).await?;

            if result["ran"].as_bool().unwrap_or(false) {
                let summary = result["record"]["summary"].as_str().unwrap_or("done");
                println!("{} {}", "✓".green(), summary);
            } else {
                println!("{}", "A poll is already in flight".yellow());
            }
        }

        Commands::Debug => {
            let result = call_rpc(&cli.rpc_url, "admin.debug.v1", json!({})).await?;
            let enabled = result["debug"].as_bool().unwrap_or(false);
            let label = if enabled { "ON".green() } else { "OFF".yellow() };
            println!("Debug: {}", label.bold());
        }

        Commands::Connect { user, name } => {
            let params = json!({
                "user_id": user,
                "display_name": name,
            });
            let result = call_rpc(&cli.rpc_url, "presence.connected.v1", params).await?;

            println!("{}", format!("✓ {} connected", user).green().bold());
            println!("  Online: {}", plain(&result["online"]));
            if result["flush_scheduled"].as_bool().unwrap_or(false) {
                println!("  Queued commands will be delivered shortly");
            }
        }

        Commands::Disconnect { user } => {
            let params = json!({ "user_id": user });
            let result = call_rpc(&cli.rpc_url, "presence.disconnected.v1", params).await?;

            if result["known"].as_bool().unwrap_or(false) {
                println!("{}", format!("✓ {} disconnected", user).green().bold());
            } else {
                println!("{}", format!("○ {} was not connected", user).yellow());
            }
            println!("  Online: {}", plain(&result["online"]));
        }
    }

    Ok(())
}
