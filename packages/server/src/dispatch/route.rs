//! The route table: the immutable mapping from action tag to transport and
//! target.
//!
//! Entries are built once at startup from [`GatewayConfig`] and shared
//! read-only across all concurrent requests. Routing is a pure function of
//! the action tag.

use std::collections::HashMap;
use std::time::Duration;

use switchyard_core::ActionKind;

use crate::config::{GatewayConfig, LogTransport};
use crate::transport::TransportKind;

/// One immutable routing record: which transport reaches which target, and
/// under what deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub kind: TransportKind,
    pub host: String,
    pub port: u16,
    pub path: String,
    pub timeout: Duration,
}

impl RouteEntry {
    /// The plain-HTTP target URL for this entry.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, self.path)
    }
}

/// The dispatch table plus the two fixed routes used by forced-transport
/// endpoints (`/enqueue`, `/rpc/log`).
#[derive(Debug, Clone)]
pub struct RouteTable {
    by_action: HashMap<ActionKind, RouteEntry>,
    queue: RouteEntry,
    rpc_log: RouteEntry,
}

impl RouteTable {
    /// Builds the table from resolved configuration.
    ///
    /// Default topology mirrors the downstream services: every action tag
    /// routes to its HTTP backend. The logging backend is also reachable
    /// over the queue and the RPC peer, so its bound transport is a config
    /// choice (`LOG_TRANSPORT`); the same queue and RPC routes back the
    /// forced-transport endpoints.
    #[must_use]
    pub fn from_config(config: &GatewayConfig) -> Self {
        let http = |host: &str, port: u16, path: &str| RouteEntry {
            kind: TransportKind::BlockingHttp,
            host: host.to_string(),
            port,
            path: path.to_string(),
            timeout: config.http_timeout(),
        };

        let queue = RouteEntry {
            kind: TransportKind::QueuePublish,
            host: config.amqp_host.clone(),
            port: config.amqp_port,
            path: String::new(),
            timeout: config.publish_timeout(),
        };
        let rpc_log = RouteEntry {
            kind: TransportKind::RemoteCall,
            host: config.log_service_host.clone(),
            port: config.log_rpc_port,
            path: String::new(),
            timeout: config.rpc_timeout(),
        };

        let mut by_action = HashMap::new();
        by_action.insert(
            ActionKind::Authenticate,
            http(&config.auth_service_host, config.auth_service_port, "/auth"),
        );
        by_action.insert(
            ActionKind::Log,
            match config.log_transport {
                LogTransport::Http => {
                    http(&config.log_service_host, config.log_service_port, "/log")
                }
                LogTransport::Queue => queue.clone(),
                LogTransport::Rpc => rpc_log.clone(),
            },
        );
        by_action.insert(
            ActionKind::Send,
            http(&config.mail_service_host, config.mail_service_port, "/send"),
        );

        Self {
            by_action,
            queue,
            rpc_log,
        }
    }

    /// Looks up the route bound to an action tag.
    #[must_use]
    pub fn lookup(&self, kind: ActionKind) -> Option<&RouteEntry> {
        self.by_action.get(&kind)
    }

    /// The fixed route for forced queue publishes.
    #[must_use]
    pub fn queue_route(&self) -> &RouteEntry {
        &self.queue
    }

    /// The fixed route for forced remote-call log dispatch.
    #[must_use]
    pub fn rpc_log_route(&self) -> &RouteEntry {
        &self.rpc_log
    }

    /// A table with no per-action routes, for tests exercising the
    /// unknown-route path.
    #[cfg(test)]
    pub(crate) fn empty_for_tests(queue: RouteEntry, rpc_log: RouteEntry) -> Self {
        Self {
            by_action: HashMap::new(),
            queue,
            rpc_log,
        }
    }
}
