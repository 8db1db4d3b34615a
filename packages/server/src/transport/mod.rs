//! Transport clients: the three invocation strategies for reaching a
//! downstream service.
//!
//! Each client implements [`TransportClient`] and converts its raw
//! response or acknowledgement into the uniform [`Envelope`] before it
//! leaves this layer. Clients hold no per-request state after `invoke`
//! returns; the queue publisher's shared channel is the one long-lived
//! resource (see [`queue`]).

pub mod http;
pub mod queue;
pub mod rpc;

use std::time::Duration;

use async_trait::async_trait;
use switchyard_core::{Action, Envelope};

use crate::dispatch::route::RouteEntry;

pub use http::BlockingHttpClient;
pub use queue::{establish, BackoffState, BootstrapError, QueuePublisher};
pub use rpc::RemoteCallClient;

// ---------------------------------------------------------------------------
// TransportKind
// ---------------------------------------------------------------------------

/// The invocation strategy bound to a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// Synchronous HTTP call-and-wait.
    BlockingHttp,
    /// Fire-and-forget publish to the bootstrapped queue.
    QueuePublish,
    /// Deadline-bound remote procedure call.
    RemoteCall,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::BlockingHttp => "blocking-http",
            Self::QueuePublish => "queue-publish",
            Self::RemoteCall => "remote-call",
        })
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Per-call transport failures.
///
/// Every variant maps to a failed envelope at the dispatch layer; none of
/// them crash the process or trigger a retry.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The downstream peer could not be reached (dial/connection failure).
    #[error("downstream unreachable: {0}")]
    Unavailable(String),
    /// The call exceeded its per-transport deadline.
    #[error("call exceeded its {}ms deadline", .0.as_millis())]
    DeadlineExceeded(Duration),
    /// The response body held trailing data after the first envelope.
    #[error("response held more than one envelope")]
    MultipleEnvelopes,
    /// The peer explicitly signalled failure (error flag, non-success
    /// status, or a non-transport RPC status).
    #[error("downstream reported failure: {0}")]
    DownstreamFailure(String),
    /// The peer's response could not be decoded as an envelope.
    #[error("malformed downstream response: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// TransportClient trait
// ---------------------------------------------------------------------------

/// One invocation strategy. Implementations are registered with the
/// dispatcher keyed by [`TransportKind`] and must be safe for concurrent
/// use by many in-flight dispatches.
#[async_trait]
pub trait TransportClient: Send + Sync {
    /// Invokes the transport for `action` against `route`'s target,
    /// returning the normalized response envelope.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] for dial failures, deadline overruns,
    /// protocol violations, and downstream-reported failures.
    async fn invoke(&self, route: &RouteEntry, action: &Action) -> Result<Envelope, TransportError>;
}
