//! Gateway endpoint handlers: decode the inbound action, dispatch it, and
//! write the uniform response envelope.
//!
//! Decode failures never reach a transport: a malformed or unknown-action
//! request is answered 400 with a failed envelope. Dispatch outcomes --
//! success or normalized failure -- are answered 202: the gateway accepted
//! and forwarded the request, and the envelope's own flag carries the
//! downstream verdict.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use bytes::Bytes;
use switchyard_core::{Action, ActionKind, Envelope};

use super::AppState;
use crate::transport::TransportKind;

/// `POST /` -- static acknowledgement that the gateway is reachable.
pub async fn root_handler() -> (StatusCode, Json<Envelope>) {
    (
        StatusCode::ACCEPTED,
        Json(Envelope::success("Hit the gateway", None)),
    )
}

/// `POST /handle` -- decode one action and dispatch it through the route
/// table.
pub async fn handle_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, Json<Envelope>) {
    let _guard = state.shutdown.in_flight_guard();

    let action = match Action::decode(&body) {
        Ok(action) => action,
        Err(err) => return (StatusCode::BAD_REQUEST, Json(Envelope::failure(err.to_string()))),
    };

    let envelope = state.dispatcher.dispatch(&action).await;
    (StatusCode::ACCEPTED, Json(envelope))
}

/// `POST /enqueue` -- decode one action and publish the whole request
/// envelope to the queue, regardless of its tag.
pub async fn enqueue_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, Json<Envelope>) {
    let _guard = state.shutdown.in_flight_guard();

    let action = match Action::decode(&body) {
        Ok(action) => action,
        Err(err) => return (StatusCode::BAD_REQUEST, Json(Envelope::failure(err.to_string()))),
    };

    let envelope = state
        .dispatcher
        .dispatch_via(TransportKind::QueuePublish, &action)
        .await;
    (StatusCode::ACCEPTED, Json(envelope))
}

/// `POST /rpc/log` -- force the remote-call transport. Only logging
/// actions are accepted; the RPC peer understands nothing else.
pub async fn rpc_log_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, Json<Envelope>) {
    let _guard = state.shutdown.in_flight_guard();

    let action = match Action::decode(&body) {
        Ok(action) => action,
        Err(err) => return (StatusCode::BAD_REQUEST, Json(Envelope::failure(err.to_string()))),
    };

    if action.kind() != ActionKind::Log {
        return (
            StatusCode::BAD_REQUEST,
            Json(Envelope::failure("a logging action is required")),
        );
    }

    let envelope = state
        .dispatcher
        .dispatch_via(TransportKind::RemoteCall, &action)
        .await;
    (StatusCode::ACCEPTED, Json(envelope))
}
