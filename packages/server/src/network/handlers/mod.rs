//! HTTP handler definitions for the gateway.
//!
//! This module defines `AppState` (the shared state carried through axum
//! extractors) and re-exports all handler functions for convenient access
//! when building the router.

pub mod gateway;
pub mod health;

pub use gateway::{enqueue_handler, handle_handler, root_handler, rpc_log_handler};
pub use health::{health_handler, liveness_handler, readiness_handler};

use std::sync::Arc;
use std::time::Instant;

use crate::dispatch::Dispatcher;

use super::ShutdownController;

/// Shared application state passed to all axum handlers via `State`
/// extraction. Holds `Arc` references to shared resources so cloning is
/// cheap.
#[derive(Clone)]
pub struct AppState {
    /// The action dispatcher with its registered transport clients.
    pub dispatcher: Arc<Dispatcher>,
    /// Graceful shutdown controller with health state and in-flight tracking.
    pub shutdown: Arc<ShutdownController>,
    /// Process start time, used for uptime calculation.
    pub start_time: Instant,
}
