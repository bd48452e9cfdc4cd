//! JSON-RPC Server
//!
//! TCP on localhost only; the host plugin and the operator CLI are the
//! only intended callers.

use crate::handler::RpcHandler;
use crate::types::{ConnectedRequest, DisconnectedRequest};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::RpcModule;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

const DEFAULT_RPC_HOST: &str = "127.0.0.1";
pub const DEFAULT_RPC_PORT: u16 = 9737;

/// RPC Server Configuration
pub struct RpcServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub fn new(config: RpcServerConfig, handler: RpcHandler) -> Self {
        Self {
            config,
            handler: Arc::new(handler),
        }
    }

    fn build_module(&self) -> Result<RpcModule<()>, String> {
        let mut module = RpcModule::new(());

        let handler = self.handler.clone();
        module
            .register_async_method("admin.status.v1", move |_, _, _| {
                let handler = handler.clone();
                async move { handler.status().await }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("admin.poll.v1", move |_, _, _| {
                let handler = handler.clone();
                async move { handler.poll().await }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("admin.debug.v1", move |_, _, _| {
                let handler = handler.clone();
                async move { handler.toggle_debug().await }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("presence.connected.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: ConnectedRequest = params.parse()?;
                    handler.connected(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("presence.disconnected.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: DisconnectedRequest = params.parse()?;
                    handler.disconnected(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        Ok(module)
    }

    /// Bind and start serving. Returns the handle and the bound address
    /// (useful with port 0).
    pub async fn start(self) -> Result<(ServerHandle, SocketAddr), String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let module = self.build_module()?;

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| format!("Failed to build server on {}: {}", addr, e))?;
        let local_addr = server
            .local_addr()
            .map_err(|e| format!("Failed to read bound address: {}", e))?;

        info!(addr = %local_addr, "Admin API listening on {}", local_addr);
        Ok((server.start(module), local_addr))
    }
}
