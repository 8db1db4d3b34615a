//! Remote-call transport: a deadline-bound gRPC invocation of the logging
//! peer.
//!
//! A fresh channel is opened per invocation and the client holds no shared
//! state. The default deadline is shorter than the other transports' --
//! the peer is assumed local and low-latency. Call-layer failures
//! (unreachable, deadline) map to transport errors; any other non-OK
//! status is the peer reporting a business failure.

use async_trait::async_trait;
use serde_json::json;
use switchyard_core::{Action, Envelope};
use tonic::transport::Channel;
use tonic::Code;

use super::{TransportClient, TransportError};
use crate::dispatch::route::RouteEntry;

pub mod proto {
    #![allow(clippy::pedantic, clippy::all)]
    tonic::include_proto!("logging");
}

use proto::log_service_client::LogServiceClient;
use proto::LogRequest;

/// gRPC client for the logging peer's `WriteLog` method.
pub struct RemoteCallClient;

impl RemoteCallClient {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for RemoteCallClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransportClient for RemoteCallClient {
    async fn invoke(&self, route: &RouteEntry, action: &Action) -> Result<Envelope, TransportError> {
        // The remote peer only understands log entries; the handler layer
        // enforces this before dispatch.
        let Action::Log(payload) = action else {
            return Err(TransportError::Decode(
                "remote-call transport requires a logging payload".into(),
            ));
        };

        let endpoint = format!("http://{}:{}", route.host, route.port);
        let channel = Channel::from_shared(endpoint)
            .map_err(|e| TransportError::Unavailable(e.to_string()))?
            .connect_timeout(route.timeout);
        let channel = tokio::time::timeout(route.timeout, channel.connect())
            .await
            .map_err(|_| TransportError::DeadlineExceeded(route.timeout))?
            .map_err(|e| TransportError::Unavailable(e.to_string()))?;

        let mut client = LogServiceClient::new(channel);
        let request = LogRequest {
            name: payload.name.clone(),
            data: payload.message.clone(),
        };

        let reply = tokio::time::timeout(route.timeout, client.write_log(request))
            .await
            .map_err(|_| TransportError::DeadlineExceeded(route.timeout))?;

        match reply {
            Ok(response) => Ok(Envelope::success(
                "Logged via RPC",
                Some(json!(response.into_inner().message)),
            )),
            Err(status) => Err(match status.code() {
                Code::DeadlineExceeded => TransportError::DeadlineExceeded(route.timeout),
                Code::Unavailable => TransportError::Unavailable(status.message().to_string()),
                _ => TransportError::DownstreamFailure(status.message().to_string()),
            }),
        }
    }
}
