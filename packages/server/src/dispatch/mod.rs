//! Action dispatch: the uniform decision procedure mapping an inbound
//! action to a transport and target.
//!
//! 1. **Routing** (`route`): the immutable action-tag -> `RouteEntry` table
//! 2. **Dispatch** (`dispatcher`): invoke exactly one registered transport
//!    client and normalize every outcome into an [`Envelope`]
//!
//! [`Envelope`]: switchyard_core::Envelope

pub mod dispatcher;
pub mod route;

pub use dispatcher::Dispatcher;
pub use route::{RouteEntry, RouteTable};

use switchyard_core::ActionKind;

/// Canonical success message for an action served over the blocking
/// transport.
#[must_use]
pub fn success_message(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::Authenticate => "Authenticated",
        ActionKind::Log => "Logged",
        ActionKind::Send => "Email Sent",
    }
}

/// Canonical user-visible failure message for an action.
///
/// Deliberately carries no detail about the underlying transport error;
/// the detail goes to the log, not the caller.
#[must_use]
pub fn failure_message(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::Authenticate => "Authentication failed",
        ActionKind::Log => "Log failed",
        ActionKind::Send => "Email send failed",
    }
}
