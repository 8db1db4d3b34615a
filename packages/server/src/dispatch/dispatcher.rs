//! The dispatcher: resolves an action's route and invokes exactly one
//! transport client.
//!
//! Transport clients are registered per [`TransportKind`], so tests can
//! substitute spies for the real network clients. Every per-request
//! failure is caught here and converted into a failed envelope; nothing on
//! this path crashes the process or retries.

use std::collections::HashMap;
use std::sync::Arc;

use switchyard_core::{Action, Envelope};
use tracing::{debug, error, warn};

use super::failure_message;
use super::route::{RouteEntry, RouteTable};
use crate::transport::{TransportClient, TransportKind};

/// Routes actions to registered transport clients and normalizes results.
///
/// Holds the immutable route table and one shared client per transport
/// kind. Cheap to share behind an `Arc`; `dispatch` takes `&self` and is
/// safe under any number of concurrent in-flight requests.
pub struct Dispatcher {
    routes: RouteTable,
    clients: HashMap<TransportKind, Arc<dyn TransportClient>>,
}

impl Dispatcher {
    /// Creates a dispatcher over the given route table with no clients
    /// registered.
    #[must_use]
    pub fn new(routes: RouteTable) -> Self {
        Self {
            routes,
            clients: HashMap::new(),
        }
    }

    /// Registers the client bound to a transport kind, replacing any
    /// previous registration.
    pub fn register(&mut self, kind: TransportKind, client: Arc<dyn TransportClient>) {
        self.clients.insert(kind, client);
    }

    /// Dispatches an action through the route table.
    ///
    /// Exactly one transport call is made per dispatch; a route-table miss
    /// fails immediately without touching any transport.
    pub async fn dispatch(&self, action: &Action) -> Envelope {
        let kind = action.kind();
        let Some(route) = self.routes.lookup(kind) else {
            warn!(action = %kind, "no route registered for action");
            return Envelope::failure(format!("unknown action: {kind}"));
        };
        debug!(action = %kind, transport = %route.kind, target = %route.host, "routed");
        self.invoke(route, action).await
    }

    /// Dispatches an action with the transport kind forced, bypassing the
    /// per-action table. Used by the forced-transport endpoints.
    pub async fn dispatch_via(&self, kind: TransportKind, action: &Action) -> Envelope {
        match kind {
            TransportKind::QueuePublish => self.invoke(self.routes.queue_route(), action).await,
            TransportKind::RemoteCall => self.invoke(self.routes.rpc_log_route(), action).await,
            TransportKind::BlockingHttp => self.dispatch(action).await,
        }
    }

    async fn invoke(&self, route: &RouteEntry, action: &Action) -> Envelope {
        let kind = action.kind();
        let Some(client) = self.clients.get(&route.kind) else {
            error!(transport = %route.kind, "no client registered for transport");
            return Envelope::failure(failure_message(kind));
        };

        match client.invoke(route, action).await {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(action = %kind, transport = %route.kind, error = %err, "transport invocation failed");
                Envelope::failure(failure_message(kind))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;
    use switchyard_core::{AuthPayload, LogPayload, SendPayload};

    use super::*;
    use crate::transport::TransportError;

    /// A transport double that records invocations and replies with a
    /// fixed outcome.
    struct SpyTransport {
        calls: AtomicUsize,
        outcome: Outcome,
    }

    enum Outcome {
        Reply(Envelope),
        Fail(fn() -> TransportError),
        /// Echo the request payload back in `data`, after a per-call delay.
        EchoAfter(Duration),
    }

    impl SpyTransport {
        fn replying(envelope: Envelope) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                outcome: Outcome::Reply(envelope),
            })
        }

        fn failing(make: fn() -> TransportError) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                outcome: Outcome::Fail(make),
            })
        }

        fn echoing_after(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                outcome: Outcome::EchoAfter(delay),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TransportClient for SpyTransport {
        async fn invoke(
            &self,
            _route: &RouteEntry,
            action: &Action,
        ) -> Result<Envelope, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.outcome {
                Outcome::Reply(envelope) => Ok(envelope.clone()),
                Outcome::Fail(make) => Err(make()),
                Outcome::EchoAfter(delay) => {
                    tokio::time::sleep(*delay).await;
                    Ok(Envelope::success("echo", Some(action.payload_value())))
                }
            }
        }
    }

    fn default_routes() -> RouteTable {
        RouteTable::from_config(&clap::Parser::try_parse_from(["switchyard"]).unwrap())
    }

    fn auth_action() -> Action {
        Action::Authenticate(AuthPayload {
            email: "a@b.com".into(),
            password: "pw".into(),
        })
    }

    fn log_action(message: &str) -> Action {
        Action::Log(LogPayload {
            name: "event".into(),
            message: message.into(),
        })
    }

    fn send_action(subject: &str) -> Action {
        Action::Send(SendPayload {
            from: None,
            from_name: None,
            to: "a@b.com".into(),
            subject: subject.into(),
            body: "b".into(),
            attachments: None,
        })
    }

    #[tokio::test]
    async fn routes_to_exactly_one_transport() {
        let mut dispatcher = Dispatcher::new(default_routes());
        let http = SpyTransport::replying(Envelope::success("Authenticated", None));
        let queue = SpyTransport::replying(Envelope::success("queued", None));
        let rpc = SpyTransport::replying(Envelope::success("rpc", None));
        dispatcher.register(TransportKind::BlockingHttp, http.clone());
        dispatcher.register(TransportKind::QueuePublish, queue.clone());
        dispatcher.register(TransportKind::RemoteCall, rpc.clone());

        let envelope = dispatcher.dispatch(&auth_action()).await;

        assert!(!envelope.error);
        assert_eq!(http.call_count(), 1);
        assert_eq!(queue.call_count(), 0);
        assert_eq!(rpc.call_count(), 0);
    }

    #[tokio::test]
    async fn route_table_miss_invokes_no_transport() {
        let routes = RouteTable::empty_for_tests(
            default_routes().queue_route().clone(),
            default_routes().rpc_log_route().clone(),
        );
        let mut dispatcher = Dispatcher::new(routes);
        let http = SpyTransport::replying(Envelope::success("ok", None));
        dispatcher.register(TransportKind::BlockingHttp, http.clone());

        let envelope = dispatcher.dispatch(&auth_action()).await;

        assert!(envelope.error);
        assert_eq!(envelope.message, "unknown action: authentication");
        assert_eq!(http.call_count(), 0);
    }

    #[tokio::test]
    async fn send_round_trip_preserves_the_mock_envelope() {
        let mut dispatcher = Dispatcher::new(default_routes());
        dispatcher.register(
            TransportKind::BlockingHttp,
            SpyTransport::replying(Envelope::success("Email Sent", None)),
        );

        let envelope = dispatcher.dispatch(&send_action("s")).await;

        assert_eq!(envelope, Envelope::success("Email Sent", None));
    }

    #[tokio::test]
    async fn transport_failure_maps_to_fixed_message() {
        let mut dispatcher = Dispatcher::new(default_routes());
        dispatcher.register(
            TransportKind::BlockingHttp,
            SpyTransport::failing(|| TransportError::Unavailable("connection refused".into())),
        );

        let envelope = dispatcher.dispatch(&auth_action()).await;

        assert!(envelope.error);
        assert_eq!(envelope.message, "Authentication failed");
        assert!(envelope.data.is_none());
    }

    #[tokio::test]
    async fn deadline_failure_does_not_leak_detail() {
        let mut dispatcher = Dispatcher::new(default_routes());
        dispatcher.register(
            TransportKind::BlockingHttp,
            SpyTransport::failing(|| {
                TransportError::DeadlineExceeded(Duration::from_secs(5))
            }),
        );

        let envelope = dispatcher.dispatch(&log_action("m")).await;

        assert_eq!(envelope.message, "Log failed");
    }

    #[tokio::test]
    async fn dispatch_via_forces_the_queue_transport() {
        let mut dispatcher = Dispatcher::new(default_routes());
        let http = SpyTransport::replying(Envelope::success("http", None));
        let queue = SpyTransport::replying(Envelope::success("Request sent to queue", None));
        dispatcher.register(TransportKind::BlockingHttp, http.clone());
        dispatcher.register(TransportKind::QueuePublish, queue.clone());

        let envelope = dispatcher
            .dispatch_via(TransportKind::QueuePublish, &log_action("m"))
            .await;

        assert_eq!(envelope.message, "Request sent to queue");
        assert_eq!(http.call_count(), 0);
        assert_eq!(queue.call_count(), 1);
    }

    #[tokio::test]
    async fn unregistered_transport_fails_without_panic() {
        let dispatcher = Dispatcher::new(default_routes());
        let envelope = dispatcher.dispatch(&send_action("s")).await;
        assert!(envelope.error);
        assert_eq!(envelope.message, "Email send failed");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn hundred_concurrent_dispatches_do_not_cross_contaminate() {
        let mut dispatcher = Dispatcher::new(default_routes());
        dispatcher.register(
            TransportKind::BlockingHttp,
            SpyTransport::echoing_after(Duration::from_millis(1)),
        );
        let dispatcher = Arc::new(dispatcher);

        let mut handles = Vec::new();
        for i in 0..100u64 {
            let dispatcher = Arc::clone(&dispatcher);
            handles.push(tokio::spawn(async move {
                let action = match i % 3 {
                    0 => log_action(&format!("message-{i}")),
                    1 => send_action(&format!("subject-{i}")),
                    _ => auth_action(),
                };
                // Staggered start times push completions out of submission
                // order.
                tokio::time::sleep(Duration::from_micros((i % 13) * 100)).await;
                let expected = action.payload_value();
                (expected, dispatcher.dispatch(&action).await)
            }));
        }

        for handle in handles {
            let (expected, envelope) = handle.await.unwrap();
            assert!(!envelope.error);
            assert_eq!(envelope.data, Some(expected), "payload crossed requests");
        }
    }

    #[tokio::test]
    async fn echo_transport_reflects_log_payload() {
        let mut dispatcher = Dispatcher::new(default_routes());
        dispatcher.register(
            TransportKind::BlockingHttp,
            SpyTransport::echoing_after(Duration::ZERO),
        );

        let envelope = dispatcher.dispatch(&log_action("hello")).await;

        assert_eq!(
            envelope.data,
            Some(json!({"name": "event", "message": "hello"}))
        );
    }
}
