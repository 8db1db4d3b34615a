//! Blocking request/response transport: POST the action payload, wait for
//! one envelope.
//!
//! The downstream reply must be a single `{error, message, data?}` JSON
//! value -- the same one-value contract enforced on inbound request bodies.
//! Trailing data after the first well-formed envelope is a protocol
//! violation, not extra information.

use async_trait::async_trait;
use switchyard_core::{from_single_json_slice, Action, Envelope, SingleJsonError};

use super::{TransportClient, TransportError};
use crate::dispatch::route::RouteEntry;
use crate::dispatch::success_message;

/// HTTP call-and-wait client.
///
/// Wraps a shared `reqwest::Client` (an internal connection pool, safe for
/// concurrent use); each invocation opens or reuses a connection and holds
/// no state afterwards.
pub struct BlockingHttpClient {
    client: reqwest::Client,
}

impl BlockingHttpClient {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for BlockingHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

fn classify(err: &reqwest::Error, route: &RouteEntry) -> TransportError {
    if err.is_timeout() {
        TransportError::DeadlineExceeded(route.timeout)
    } else {
        TransportError::Unavailable(err.to_string())
    }
}

#[async_trait]
impl TransportClient for BlockingHttpClient {
    async fn invoke(&self, route: &RouteEntry, action: &Action) -> Result<Envelope, TransportError> {
        let response = self
            .client
            .post(route.url())
            .timeout(route.timeout)
            .json(&action.payload_value())
            .send()
            .await
            .map_err(|e| classify(&e, route))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| classify(&e, route))?;

        if !status.is_success() {
            return Err(TransportError::DownstreamFailure(format!(
                "unexpected status {status}"
            )));
        }

        let reply: Envelope = from_single_json_slice(&body).map_err(|e| match e {
            SingleJsonError::TrailingValue => TransportError::MultipleEnvelopes,
            other => TransportError::Decode(other.to_string()),
        })?;

        if reply.error {
            return Err(TransportError::DownstreamFailure(reply.message));
        }

        Ok(Envelope::success(success_message(action.kind()), reply.data))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use switchyard_core::{AuthPayload, LogPayload};

    use super::*;
    use crate::transport::TransportKind;

    fn route_to(server: &mockito::ServerGuard, path: &str) -> RouteEntry {
        let (host, port) = server
            .host_with_port()
            .rsplit_once(':')
            .map(|(h, p)| (h.to_string(), p.parse().unwrap()))
            .unwrap();
        RouteEntry {
            kind: TransportKind::BlockingHttp,
            host,
            port,
            path: path.to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    fn auth_action() -> Action {
        Action::Authenticate(AuthPayload {
            email: "a@b.com".into(),
            password: "pw".into(),
        })
    }

    #[tokio::test]
    async fn success_reply_is_normalized_with_canonical_message() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/auth")
            .match_body(mockito::Matcher::Json(
                json!({"email": "a@b.com", "password": "pw"}),
            ))
            .with_body(r#"{"error": false, "message": "ok", "data": {"token": "t"}}"#)
            .create_async()
            .await;

        let client = BlockingHttpClient::new();
        let envelope = client
            .invoke(&route_to(&server, "/auth"), &auth_action())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(envelope.message, "Authenticated");
        assert_eq!(envelope.data, Some(json!({"token": "t"})));
    }

    #[tokio::test]
    async fn downstream_error_flag_maps_to_downstream_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/auth")
            .with_body(r#"{"error": true, "message": "bad credentials"}"#)
            .create_async()
            .await;

        let client = BlockingHttpClient::new();
        let err = client
            .invoke(&route_to(&server, "/auth"), &auth_action())
            .await
            .unwrap_err();

        assert!(
            matches!(err, TransportError::DownstreamFailure(msg) if msg == "bad credentials")
        );
    }

    #[tokio::test]
    async fn trailing_envelope_is_a_protocol_violation() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/log")
            .with_body(
                r#"{"error": false, "message": "ok"}{"error": false, "message": "again"}"#,
            )
            .create_async()
            .await;

        let client = BlockingHttpClient::new();
        let action = Action::Log(LogPayload {
            name: "n".into(),
            message: "m".into(),
        });
        let err = client
            .invoke(&route_to(&server, "/log"), &action)
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::MultipleEnvelopes));
    }

    #[tokio::test]
    async fn non_success_status_maps_to_downstream_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/auth")
            .with_status(500)
            .with_body(r#"{"error": false, "message": "ignored"}"#)
            .create_async()
            .await;

        let client = BlockingHttpClient::new();
        let err = client
            .invoke(&route_to(&server, "/auth"), &auth_action())
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::DownstreamFailure(_)));
    }

    #[tokio::test]
    async fn undecodable_reply_maps_to_decode_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/auth")
            .with_body("not json at all")
            .create_async()
            .await;

        let client = BlockingHttpClient::new();
        let err = client
            .invoke(&route_to(&server, "/auth"), &auth_action())
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Decode(_)));
    }

    #[tokio::test]
    async fn unreachable_peer_maps_to_unavailable() {
        // Nothing listens on port 1.
        let route = RouteEntry {
            kind: TransportKind::BlockingHttp,
            host: "127.0.0.1".to_string(),
            port: 1,
            path: "/auth".to_string(),
            timeout: Duration::from_secs(5),
        };

        let client = BlockingHttpClient::new();
        let err = client.invoke(&route, &auth_action()).await.unwrap_err();

        assert!(matches!(err, TransportError::Unavailable(_)));
    }
}
