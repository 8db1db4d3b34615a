//! Queue publish transport and its bootstrap.
//!
//! The publisher's connection is established once, before the gateway
//! accepts any request: a bounded retry loop with quadratically growing
//! backoff, followed by an idempotent declaration of the destination
//! queue. Bootstrap failure is fatal -- the process must not start.
//!
//! Publishing is fire-and-forget: success means the broker accepted the
//! frame, not that any consumer processed it. The lapin channel is
//! internally synchronized, so the one shared publisher handle is safe
//! under concurrent dispatches.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use lapin::options::{BasicPublishOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};
use switchyard_core::{Action, Envelope};
use tracing::{info, warn};

use super::{TransportClient, TransportError};
use crate::config::GatewayConfig;
use crate::dispatch::route::RouteEntry;

/// Bootstrap-only errors. All of them abort startup.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("queue connection failed after {attempts} attempts: {source}")]
    Connect {
        attempts: u32,
        #[source]
        source: lapin::Error,
    },
    #[error("failed to open a channel: {0}")]
    Channel(#[source] lapin::Error),
    #[error("queue '{queue}' already exists with a conflicting configuration: {source}")]
    TopologyConflict {
        queue: String,
        #[source]
        source: lapin::Error,
    },
}

// ---------------------------------------------------------------------------
// Backoff
// ---------------------------------------------------------------------------

/// Retry state threaded through the bootstrap loop and discarded once a
/// connection succeeds.
///
/// The delay grows with the square of the attempt number: attempt 1 waits
/// one base unit, attempt 2 waits four, attempt 3 waits nine.
#[derive(Debug, Clone, Copy)]
pub struct BackoffState {
    pub attempt: u32,
    pub delay: Duration,
}

impl BackoffState {
    #[must_use]
    pub fn new(base_unit: Duration) -> Self {
        Self {
            attempt: 1,
            delay: base_unit,
        }
    }

    /// Moves to the next attempt and recomputes its delay.
    pub fn advance(&mut self, base_unit: Duration) {
        self.attempt += 1;
        self.delay = base_unit.saturating_mul(self.attempt * self.attempt);
    }
}

/// Runs `connect` under the bounded backoff policy.
///
/// Returns the first successful value, or `(attempts_made, last_error)`
/// once `max_attempts` consecutive attempts have failed. Generic over the
/// connect future so tests can drive the schedule with simulated failures.
pub(crate) async fn connect_with_retry<T, E, F, Fut>(
    mut connect: F,
    max_attempts: u32,
    base_unit: Duration,
) -> Result<T, (u32, E)>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut backoff = BackoffState::new(base_unit);
    loop {
        match connect().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if backoff.attempt >= max_attempts {
                    return Err((backoff.attempt, err));
                }
                warn!(
                    attempt = backoff.attempt,
                    delay_ms = backoff.delay.as_millis() as u64,
                    error = %err,
                    "queue broker not ready, backing off"
                );
                tokio::time::sleep(backoff.delay).await;
                backoff.advance(base_unit);
            }
        }
    }
}

/// Awaits `operation` under `deadline`, translating an overrun into
/// [`TransportError::DeadlineExceeded`].
async fn with_deadline<T, E>(
    deadline: Duration,
    operation: impl Future<Output = Result<T, E>>,
) -> Result<T, TransportError>
where
    E: std::fmt::Display,
{
    match tokio::time::timeout(deadline, operation).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(TransportError::Unavailable(err.to_string())),
        Err(_) => Err(TransportError::DeadlineExceeded(deadline)),
    }
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

/// Establishes the queue connection and declares the destination queue.
///
/// Runs once, synchronously, before the listener binds. Uses a one-second
/// backoff base unit; see [`connect_with_retry`] for the schedule.
///
/// # Errors
///
/// Returns a fatal [`BootstrapError`] when the broker stays unreachable
/// past the configured attempt budget, the channel cannot be opened, or
/// the queue exists with a conflicting configuration.
pub async fn establish(config: &GatewayConfig) -> Result<QueuePublisher, BootstrapError> {
    let uri = config.amqp_uri();
    info!(host = %config.amqp_host, port = config.amqp_port, "connecting to queue broker");

    let connection = connect_with_retry(
        || {
            let uri = uri.clone();
            async move { Connection::connect(&uri, ConnectionProperties::default()).await }
        },
        config.queue_max_connect_attempts,
        Duration::from_secs(1),
    )
    .await
    .map_err(|(attempts, source)| BootstrapError::Connect { attempts, source })?;

    let channel = connection
        .create_channel()
        .await
        .map_err(BootstrapError::Channel)?;
    declare_queue(&channel, &config.queue_name).await?;
    info!(queue = %config.queue_name, "queue topology declared");

    Ok(QueuePublisher {
        _connection: connection,
        channel,
        queue: config.queue_name.clone(),
    })
}

/// Declares the destination queue with the fixed configuration:
/// non-durable, non-exclusive, auto-delete off, no arguments.
///
/// The declaration is idempotent -- repeating it against an identical
/// existing queue succeeds. A mismatched existing declaration is surfaced
/// as [`BootstrapError::TopologyConflict`].
async fn declare_queue(channel: &Channel, queue: &str) -> Result<(), BootstrapError> {
    channel
        .queue_declare(queue, QueueDeclareOptions::default(), FieldTable::default())
        .await
        .map_err(|source| BootstrapError::TopologyConflict {
            queue: queue.to_string(),
            source,
        })?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Publisher
// ---------------------------------------------------------------------------

/// Fire-and-forget publish client bound to the bootstrapped queue.
///
/// The process owns exactly one of these for its lifetime; it is shared by
/// every in-flight dispatch.
pub struct QueuePublisher {
    // Owns the connection so the channel stays usable; dropped at shutdown.
    _connection: Connection,
    channel: Channel,
    queue: String,
}

impl QueuePublisher {
    async fn publish(&self, body: Vec<u8>, deadline: Duration) -> Result<(), TransportError> {
        let publish = self.channel.basic_publish(
            "",
            &self.queue,
            BasicPublishOptions::default(),
            &body,
            BasicProperties::default().with_content_type("text/plain".into()),
        );
        with_deadline(deadline, publish).await.map(|_confirm| ())
    }
}

#[async_trait]
impl TransportClient for QueuePublisher {
    async fn invoke(&self, route: &RouteEntry, action: &Action) -> Result<Envelope, TransportError> {
        let body = serde_json::to_vec(&action.to_request_value())
            .expect("request envelope serializes infallibly");
        self.publish(body, route.timeout).await?;
        Ok(Envelope::success("Request sent to queue", None))
    }
}
