//! Request correlation for message-channel transports.
//!
//! A channel transport is fire-and-forget: the request goes out through
//! [`ChannelTransport::post`] and the answer comes back later on an unrelated
//! inbound path. The [`Correlator`] matches the two by [`RequestId`].
//!
//! Every dispatched request owns one pending entry. The entry is removed by
//! exactly one of: a matching response, the timeout, [`Correlator::cancel`],
//! the caller dropping the future, or [`Correlator::close`]. Removal from the
//! table is the only way to obtain the settle sender, so a request can never
//! be settled twice.

use bridge_traits::error::{BridgeError, Result};
use bridge_traits::{
    CapabilityKind, CapabilityRequest, CapabilityResponse, ChannelTransport, Payload, RequestId,
};
use chrono::{DateTime, Utc};
use core_async::sync::oneshot;
use core_async::time::{timeout, Duration};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

use crate::cancel::{notify, CancelEvent, CancelHook, CancelReason};
use crate::deadline::timeout_error;

/// Per-call dispatch settings.
#[derive(Clone)]
pub struct DispatchOptions {
    pub timeout: Duration,
    pub on_cancel: Option<CancelHook>,
    /// Use a caller-chosen id, so the caller can [`Correlator::cancel`] it.
    pub request_id: Option<RequestId>,
}

impl DispatchOptions {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            on_cancel: None,
            request_id: None,
        }
    }

    pub fn on_cancel(mut self, hook: CancelHook) -> Self {
        self.on_cancel = Some(hook);
        self
    }

    pub fn request_id(mut self, id: RequestId) -> Self {
        self.request_id = Some(id);
        self
    }
}

impl fmt::Debug for DispatchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchOptions")
            .field("timeout", &self.timeout)
            .field("on_cancel", &self.on_cancel.is_some())
            .field("request_id", &self.request_id)
            .finish()
    }
}

struct PendingEntry {
    sender: oneshot::Sender<Result<Value>>,
    kind: CapabilityKind,
    issued_at: DateTime<Utc>,
    on_cancel: Option<CancelHook>,
}

#[derive(Default)]
struct PendingTable {
    entries: HashMap<RequestId, PendingEntry>,
    closed: Option<String>,
}

/// Removes the entry if the dispatch future is dropped mid-flight.
struct PendingGuard<'a> {
    correlator: &'a Correlator,
    id: RequestId,
    armed: bool,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Some(entry) = self.correlator.take(self.id) {
            notify(
                entry.on_cancel.as_ref(),
                CancelEvent {
                    id: self.id,
                    kind: entry.kind,
                    reason: CancelReason::Dropped,
                },
            );
        }
    }
}

/// Pending-request table for one channel.
pub struct Correlator {
    transport: Arc<dyn ChannelTransport>,
    table: Mutex<PendingTable>,
}

impl Correlator {
    pub fn new(transport: Arc<dyn ChannelTransport>) -> Self {
        Self {
            transport,
            table: Mutex::new(PendingTable::default()),
        }
    }

    // Never held across an await point.
    fn table(&self) -> MutexGuard<'_, PendingTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take(&self, id: RequestId) -> Option<PendingEntry> {
        self.table().entries.remove(&id)
    }

    /// Send one request and wait for its settlement.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::Remote`] when the host answers `ok: false`
    /// - [`BridgeError::Timeout`] when no answer arrives within the budget
    /// - [`BridgeError::Cancelled`] after [`Correlator::cancel`]
    /// - [`BridgeError::Transport`] when posting fails or the channel closes
    /// - [`BridgeError::Protocol`] when the answer is malformed
    pub async fn dispatch(
        &self,
        kind: CapabilityKind,
        payload: Payload,
        options: DispatchOptions,
    ) -> Result<Value> {
        let request = CapabilityRequest {
            id: options.request_id.unwrap_or_default(),
            kind,
            payload,
            issued_at: Utc::now(),
        };
        let id = request.id;
        let envelope = serde_json::to_value(&request)?;
        let (sender, mut receiver) = oneshot::channel();

        {
            let mut table = self.table();
            if let Some(reason) = &table.closed {
                return Err(BridgeError::transport_closed(reason));
            }
            if table.entries.contains_key(&id) {
                return Err(BridgeError::Protocol(format!(
                    "request id {} is already pending",
                    id
                )));
            }
            table.entries.insert(
                id,
                PendingEntry {
                    sender,
                    kind,
                    issued_at: request.issued_at,
                    on_cancel: options.on_cancel.clone(),
                },
            );
        }

        let mut guard = PendingGuard {
            correlator: self,
            id,
            armed: true,
        };

        debug!("Dispatching {} request {}", kind, id);

        // One budget covers both the post and the wait: a stalled channel
        // times out like a silent host.
        let exchange = async {
            if let Err(err) = self.transport.post(envelope).await {
                // The entry may already be gone if the channel closed
                // meanwhile; the receiver then holds that settlement.
                if self.take(id).is_some() {
                    return Err(err);
                }
            }
            Ok((&mut receiver).await)
        };
        let outcome = timeout(options.timeout, exchange).await;
        guard.armed = false;

        match outcome {
            Ok(Err(err)) => {
                warn!("Failed to post {} request {}: {}", kind, id, err);
                Err(match err {
                    BridgeError::Transport(_) => err,
                    other => BridgeError::Transport(other.message()),
                })
            }
            Ok(Ok(Ok(settled))) => settled,
            Ok(Ok(Err(_))) => Err(BridgeError::transport_closed("correlator dropped")),
            Err(_) => match self.take(id) {
                Some(entry) => {
                    warn!(
                        "{} request {} timed out after {:?}",
                        kind, id, options.timeout
                    );
                    notify(
                        entry.on_cancel.as_ref(),
                        CancelEvent {
                            id,
                            kind,
                            reason: CancelReason::Timeout,
                        },
                    );
                    Err(timeout_error(kind, options.timeout))
                }
                // Settled between the timer firing and the removal.
                None => receiver
                    .try_recv()
                    .unwrap_or_else(|_| Err(timeout_error(kind, options.timeout))),
            },
        }
    }

    /// Settle a pending request from a raw inbound message.
    ///
    /// Returns `true` when the message settled a pending request. Messages
    /// for unknown or already settled ids are discarded.
    pub fn handle_message(&self, message: Value) -> bool {
        match CapabilityResponse::deserialize(&message) {
            Ok(response) => self.settle(response),
            Err(err) => {
                let id = message
                    .get("id")
                    .and_then(Value::as_str)
                    .and_then(|raw| RequestId::parse(raw).ok());

                let Some(id) = id else {
                    warn!("Dropping inbound message without a request id: {}", err);
                    return false;
                };

                match self.take(id) {
                    Some(entry) => {
                        warn!("Malformed response for {} request {}: {}", entry.kind, id, err);
                        let _ = entry.sender.send(Err(BridgeError::Protocol(format!(
                            "malformed {} response: {}",
                            entry.kind, err
                        ))));
                        true
                    }
                    None => {
                        debug!("Discarding malformed message for unknown request {}", id);
                        false
                    }
                }
            }
        }
    }

    /// Settle a pending request with a decoded response.
    pub fn settle(&self, response: CapabilityResponse) -> bool {
        let Some(entry) = self.take(response.id) else {
            debug!(
                "Discarding response for unknown or settled request {}",
                response.id
            );
            return false;
        };

        let elapsed = Utc::now() - entry.issued_at;
        debug!(
            "Settled {} request {} (ok: {}) after {} ms",
            entry.kind,
            response.id,
            response.ok,
            elapsed.num_milliseconds()
        );

        let kind = entry.kind;
        let _ = entry.sender.send(response.into_result(kind));
        true
    }

    /// Cancel a pending request. Returns `false` if it already settled.
    pub fn cancel(&self, id: RequestId) -> bool {
        let Some(entry) = self.take(id) else {
            return false;
        };

        notify(
            entry.on_cancel.as_ref(),
            CancelEvent {
                id,
                kind: entry.kind,
                reason: CancelReason::Cancelled,
            },
        );
        let _ = entry.sender.send(Err(BridgeError::Cancelled {
            kind: entry.kind.as_str().to_string(),
        }));
        true
    }

    /// Reject every pending request and refuse new ones.
    ///
    /// Returns the number of requests rejected.
    pub fn close(&self, reason: &str) -> usize {
        let drained: Vec<PendingEntry> = {
            let mut table = self.table();
            if table.closed.is_none() {
                table.closed = Some(reason.to_string());
            }
            table.entries.drain().map(|(_, entry)| entry).collect()
        };

        if !drained.is_empty() {
            warn!(
                "Transport closed ({}), rejecting {} pending request(s)",
                reason,
                drained.len()
            );
        }

        let rejected = drained.len();
        for entry in drained {
            let _ = entry.sender.send(Err(BridgeError::transport_closed(reason)));
        }
        rejected
    }

    pub fn pending_count(&self) -> usize {
        self.table().entries.len()
    }

    pub fn is_closed(&self) -> bool {
        self.table().closed.is_some()
    }
}

impl fmt::Debug for Correlator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.table();
        f.debug_struct("Correlator")
            .field("pending", &table.entries.len())
            .field("closed", &table.closed)
            .finish()
    }
}
