//! Network module with deferred startup lifecycle.
//!
//! `new()` allocates shared state, `start()` binds the TCP listener, and
//! `serve()` accepts connections until shutdown. The split keeps bootstrap
//! ordering explicit: the queue connection is established and the
//! dispatcher assembled before any port is bound.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::config::NetworkConfig;
use super::handlers::{
    enqueue_handler, handle_handler, health_handler, liveness_handler, readiness_handler,
    root_handler, rpc_log_handler, AppState,
};
use super::middleware::build_http_layers;
use super::shutdown::ShutdownController;
use crate::dispatch::Dispatcher;

/// Inbound request bodies are capped at 1 MiB.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// How long `serve()` waits for in-flight dispatches after the shutdown
/// signal fires.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Manages the gateway's HTTP server lifecycle.
///
/// 1. `new()` -- allocates the shutdown controller and takes the dispatcher
/// 2. `start()` -- binds the TCP listener to the configured address
/// 3. `serve()` -- accepts connections until the shutdown future resolves
pub struct NetworkModule {
    config: NetworkConfig,
    dispatcher: Arc<Dispatcher>,
    listener: Option<TcpListener>,
    shutdown: Arc<ShutdownController>,
}

impl NetworkModule {
    /// Creates a new network module without binding any port.
    #[must_use]
    pub fn new(config: NetworkConfig, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            config,
            dispatcher,
            listener: None,
            shutdown: Arc::new(ShutdownController::new()),
        }
    }

    /// Returns a shared reference to the shutdown controller, for health
    /// checks and external shutdown triggers.
    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.shutdown)
    }

    /// Assembles the axum router with all routes and middleware.
    ///
    /// Routes:
    /// - `POST /` -- static gateway acknowledgement
    /// - `POST /handle` -- route-table dispatch
    /// - `POST /enqueue` -- forced queue publish
    /// - `POST /rpc/log` -- forced remote-call dispatch (logging only)
    /// - `GET /health`, `/health/live`, `/health/ready` -- probes
    #[must_use]
    pub fn build_router(&self) -> Router {
        let state = AppState {
            dispatcher: Arc::clone(&self.dispatcher),
            shutdown: Arc::clone(&self.shutdown),
            start_time: Instant::now(),
        };

        Router::new()
            .route("/", post(root_handler))
            .route("/handle", post(handle_handler))
            .route("/enqueue", post(enqueue_handler))
            .route("/rpc/log", post(rpc_log_handler))
            .route("/health", get(health_handler))
            .route("/health/live", get(liveness_handler))
            .route("/health/ready", get(readiness_handler))
            .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
            .layer(build_http_layers(&self.config))
            .with_state(state)
    }

    /// Binds the TCP listener to the configured host and port.
    ///
    /// Returns the actual bound port, which may differ from the configured
    /// one when port 0 is used (OS-assigned).
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        info!("listener bound to {}:{}", self.config.host, port);

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves connections until the shutdown future resolves, then drains.
    ///
    /// Consumes `self` because the listener moves into the server.
    ///
    /// # Errors
    ///
    /// Returns an error on a fatal I/O failure in the server loop.
    ///
    /// # Panics
    ///
    /// Panics if `start()` was not called before `serve()`.
    pub async fn serve(
        mut self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let listener = self
            .listener
            .take()
            .expect("start() must be called before serve()");
        let shutdown_ctrl = Arc::clone(&self.shutdown);

        let router = self.build_router();

        // Bootstrap finished before start(); readiness probes may pass now.
        shutdown_ctrl.set_ready();

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;

        shutdown_ctrl.trigger_shutdown();
        if shutdown_ctrl.wait_for_drain(DRAIN_TIMEOUT).await {
            info!("all in-flight dispatches drained");
        } else {
            warn!("drain timeout expired with dispatches still in flight");
        }
        Ok(())
    }
}
