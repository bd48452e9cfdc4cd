//! RPC Method Handlers

use crate::error::{invalid_params, throttled, to_rpc_error};
use crate::rate_limiter::RateLimiter;
use crate::types::{
    ConnectedRequest, ConnectedResponse, DebugResponse, DisconnectedRequest,
    DisconnectedResponse, PollResponse, StatusResponse,
};
use cmdrelay_core::application::RelayService;
use cmdrelay_infra_system::InMemoryPresenceRegistry;
use jsonrpsee::types::ErrorObjectOwned;
use std::sync::Arc;
use tracing::info;

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    relay: Arc<RelayService>,
    presence: Arc<InMemoryPresenceRegistry>,
    rate_limiter: RateLimiter,
}

impl RpcHandler {
    pub fn new(
        relay: Arc<RelayService>,
        presence: Arc<InMemoryPresenceRegistry>,
        rate_limiter: RateLimiter,
    ) -> Self {
        Self {
            relay,
            presence,
            rate_limiter,
        }
    }

    fn admit(&self) -> Result<(), ErrorObjectOwned> {
        if self.rate_limiter.check() {
            Ok(())
        } else {
            Err(throttled())
        }
    }

    /// admin.status.v1
    pub async fn status(&self) -> Result<StatusResponse, ErrorObjectOwned> {
        self.admit()?;
        Ok(self.relay.status().await)
    }

    /// admin.poll.v1
    pub async fn poll(&self) -> Result<PollResponse, ErrorObjectOwned> {
        self.admit()?;
        let record = self.relay.poll_now().await;
        Ok(PollResponse {
            ran: record.is_some(),
            record,
        })
    }

    /// admin.debug.v1
    pub async fn toggle_debug(&self) -> Result<DebugResponse, ErrorObjectOwned> {
        self.admit()?;
        let debug = self.relay.toggle_debug().map_err(to_rpc_error)?;
        Ok(DebugResponse { debug })
    }

    /// presence.connected.v1
    pub async fn connected(
        &self,
        params: ConnectedRequest,
    ) -> Result<ConnectedResponse, ErrorObjectOwned> {
        self.admit()?;
        let user_id = params.user_id.trim();
        if user_id.is_empty() {
            return Err(invalid_params("user_id must not be blank"));
        }

        self.presence
            .connect(user_id, params.display_name.as_deref());
        let flush_scheduled = self.relay.user_connected(user_id).is_some();
        let online = self.presence.online_count();
        info!(user_id = %user_id, flush_scheduled, online, "Presence: connected");

        Ok(ConnectedResponse {
            user_id: user_id.to_string(),
            flush_scheduled,
            online,
        })
    }

    /// presence.disconnected.v1
    pub async fn disconnected(
        &self,
        params: DisconnectedRequest,
    ) -> Result<DisconnectedResponse, ErrorObjectOwned> {
        self.admit()?;
        let user_id = params.user_id.trim();
        let known = self.presence.disconnect(user_id);
        let online = self.presence.online_count();
        info!(user_id = %user_id, known, online, "Presence: disconnected");

        Ok(DisconnectedResponse {
            user_id: user_id.to_string(),
            known,
            online,
        })
    }
}
