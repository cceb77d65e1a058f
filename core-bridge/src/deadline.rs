//! Deadline guard for direct transports.
//!
//! Native invocation and HTTP calls resolve through their own future, so no
//! pending table is needed. The guard gives them the same timeout and
//! cancel-hook behaviour as the [`Correlator`](crate::correlator::Correlator).

use bridge_traits::error::{BridgeError, Result};
use bridge_traits::{CapabilityKind, RequestId};
use core_async::time::{timeout, Duration};
use std::future::Future;
use tracing::{debug, warn};

use crate::cancel::{notify, CancelEvent, CancelHook, CancelReason};

pub(crate) fn timeout_error(kind: CapabilityKind, budget: Duration) -> BridgeError {
    BridgeError::Timeout {
        kind: kind.as_str().to_string(),
        timeout_ms: u64::try_from(budget.as_millis()).unwrap_or(u64::MAX),
    }
}

struct DeadlineGuard<'a> {
    id: RequestId,
    kind: CapabilityKind,
    hook: Option<&'a CancelHook>,
    armed: bool,
}

impl Drop for DeadlineGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            notify(
                self.hook,
                CancelEvent {
                    id: self.id,
                    kind: self.kind,
                    reason: CancelReason::Dropped,
                },
            );
        }
    }
}

/// Await `operation` for at most `budget`.
///
/// On expiry the operation future is dropped, `on_cancel` fires once with
/// [`CancelReason::Timeout`] and the call fails with
/// [`BridgeError::Timeout`]. Dropping the returned future before it settles
/// fires the hook with [`CancelReason::Dropped`].
pub async fn run_with_deadline<T, F>(
    kind: CapabilityKind,
    budget: Duration,
    on_cancel: Option<&CancelHook>,
    operation: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let id = RequestId::new();
    let mut guard = DeadlineGuard {
        id,
        kind,
        hook: on_cancel,
        armed: true,
    };

    debug!("Invoking {} request {} (budget {:?})", kind, id, budget);
    let outcome = timeout(budget, operation).await;
    guard.armed = false;

    match outcome {
        Ok(result) => result,
        Err(_) => {
            warn!("{} request {} timed out after {:?}", kind, id, budget);
            notify(
                on_cancel,
                CancelEvent {
                    id,
                    kind,
                    reason: CancelReason::Timeout,
                },
            );
            Err(timeout_error(kind, budget))
        }
    }
}
