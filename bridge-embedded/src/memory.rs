//! In-process channel pair.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    CapabilityRequest, CapabilityResponse, ChannelTransport,
};
use core_async::sync::{mpsc, Mutex};
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::Value;
use tracing::warn;

/// Bridge side of an in-process channel.
///
/// Requests posted here arrive at the paired [`HostEndpoint`]; the host's
/// answers come back through [`MemoryChannel::take_inbound`].
pub struct MemoryChannel {
    requests: mpsc::Sender<Value>,
    inbound: Mutex<Option<mpsc::Receiver<Value>>>,
}

/// Host side of an in-process channel.
pub struct HostEndpoint {
    requests: mpsc::Receiver<Value>,
    responses: mpsc::Sender<Value>,
}

impl MemoryChannel {
    /// Create a connected pair. `buffer` bounds each direction.
    pub fn new(buffer: usize) -> (Self, HostEndpoint) {
        let (request_tx, request_rx) = mpsc::channel(buffer.max(1));
        let (response_tx, response_rx) = mpsc::channel(buffer.max(1));

        let channel = Self {
            requests: request_tx,
            inbound: Mutex::new(Some(response_rx)),
        };
        let host = HostEndpoint {
            requests: request_rx,
            responses: response_tx,
        };
        (channel, host)
    }

    /// Stream of host answers. Yields `None` after the first call.
    ///
    /// The stream ends when the [`HostEndpoint`] is dropped.
    pub async fn take_inbound(&self) -> Option<BoxStream<'static, Value>> {
        let mut receiver = self.inbound.lock().await.take()?;
        Some(stream::poll_fn(move |cx| receiver.poll_recv(cx)).boxed())
    }
}

#[async_trait]
impl ChannelTransport for MemoryChannel {
    async fn post(&self, message: Value) -> Result<()> {
        self.requests
            .send(message)
            .await
            .map_err(|_| BridgeError::Transport("host endpoint dropped".to_string()))
    }
}

impl HostEndpoint {
    /// Next raw message posted by the bridge.
    pub async fn next_message(&mut self) -> Option<Value> {
        self.requests.recv().await
    }

    /// Next request envelope. Messages that are not envelopes are skipped.
    pub async fn next_request(&mut self) -> Option<CapabilityRequest> {
        while let Some(message) = self.requests.recv().await {
            match serde_json::from_value(message) {
                Ok(request) => return Some(request),
                Err(err) => warn!("Host endpoint skipped a non-envelope message: {}", err),
            }
        }
        None
    }

    pub async fn respond(&self, response: CapabilityResponse) -> Result<()> {
        self.send_raw(serde_json::to_value(&response)?).await
    }

    /// Send any JSON value to the bridge, envelope or not.
    pub async fn send_raw(&self, message: Value) -> Result<()> {
        self.responses
            .send(message)
            .await
            .map_err(|_| BridgeError::Transport("bridge side dropped".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::{CapabilityKind, Payload};

    #[core_async::test]
    async fn test_pair_round_trip() {
        let (channel, mut host) = MemoryChannel::new(4);
        let mut inbound = channel.take_inbound().await.unwrap();
        assert!(channel.take_inbound().await.is_none());

        let request = CapabilityRequest::new(CapabilityKind::GitHubMe, Payload::new());
        channel
            .post(serde_json::to_value(&request).unwrap())
            .await
            .unwrap();

        let received = host.next_request().await.unwrap();
        assert_eq!(received.id, request.id);
        assert_eq!(received.kind, CapabilityKind::GitHubMe);

        host.respond(CapabilityResponse::success(
            received.id,
            serde_json::json!({ "login": "octocat" }),
        ))
        .await
        .unwrap();

        let answer = inbound.next().await.unwrap();
        assert_eq!(answer["result"]["login"], "octocat");

        drop(host);
        assert!(inbound.next().await.is_none());
    }

    #[core_async::test]
    async fn test_post_after_host_dropped_is_transport_error() {
        let (channel, host) = MemoryChannel::new(1);
        drop(host);

        let err = channel.post(serde_json::json!({})).await.unwrap_err();
        assert_eq!(err.code(), Some("TRANSPORT"));
    }
}
