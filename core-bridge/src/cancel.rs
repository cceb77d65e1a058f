//! Cancellation notifications.
//!
//! A cancel hook observes that the bridge stopped waiting for a request. It
//! is not an abort: the host may still complete the operation.

use bridge_traits::{CapabilityKind, RequestId};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Why the bridge stopped waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The operation's budget elapsed.
    Timeout,
    /// [`Correlator::cancel`](crate::correlator::Correlator::cancel) was called.
    Cancelled,
    /// The caller dropped the pending future.
    Dropped,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Timeout => f.write_str("timeout"),
            CancelReason::Cancelled => f.write_str("cancelled"),
            CancelReason::Dropped => f.write_str("dropped"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelEvent {
    pub id: RequestId,
    pub kind: CapabilityKind,
    pub reason: CancelReason,
}

/// Invoked at most once per request.
pub type CancelHook = Arc<dyn Fn(CancelEvent) + Send + Sync>;

pub(crate) fn notify(hook: Option<&CancelHook>, event: CancelEvent) {
    debug!(
        "Request {} ({}) stopped waiting: {}",
        event.id, event.kind, event.reason
    );
    if let Some(hook) = hook {
        hook(event);
    }
}
