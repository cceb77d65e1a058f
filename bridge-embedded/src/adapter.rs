//! Embedded-channel backend adapter.

use async_trait::async_trait;
use bridge_traits::{
    error::Result, CapabilityBackend, CapabilityKind, ChannelTransport, Payload,
};
use core_async::task::JoinHandle;
use core_bridge::{CancelHook, Correlator, DispatchOptions, TimeoutPolicy};
use futures::{Stream, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// [`CapabilityBackend`] over a correlated message channel.
///
/// One adapter owns one [`Correlator`]; the host must route every inbound
/// message for this channel to it.
pub struct EmbeddedAdapter {
    correlator: Arc<Correlator>,
    timeouts: TimeoutPolicy,
    on_cancel: Option<CancelHook>,
}

impl EmbeddedAdapter {
    pub fn new(transport: Arc<dyn ChannelTransport>, timeouts: TimeoutPolicy) -> Self {
        Self {
            correlator: Arc::new(Correlator::new(transport)),
            timeouts,
            on_cancel: None,
        }
    }

    pub fn with_cancel_hook(mut self, hook: CancelHook) -> Self {
        self.on_cancel = Some(hook);
        self
    }

    pub fn correlator(&self) -> &Arc<Correlator> {
        &self.correlator
    }

    /// Route one inbound message. Returns `true` if it settled a request.
    pub fn handle_message(&self, message: Value) -> bool {
        self.correlator.handle_message(message)
    }

    /// Reject everything pending and refuse further calls.
    pub fn close(&self, reason: &str) -> usize {
        self.correlator.close(reason)
    }

    /// Pump `inbound` into the correlator until it ends, then close.
    pub fn attach<S>(&self, inbound: S) -> JoinHandle<()>
    where
        S: Stream<Item = Value> + Send + 'static,
    {
        let correlator = Arc::clone(&self.correlator);
        core_async::task::spawn(async move {
            futures::pin_mut!(inbound);
            while let Some(message) = inbound.next().await {
                correlator.handle_message(message);
            }
            info!("Inbound channel ended");
            correlator.close("inbound stream ended");
        })
    }
}

#[async_trait]
impl CapabilityBackend for EmbeddedAdapter {
    fn name(&self) -> &'static str {
        "embedded"
    }

    async fn call(&self, kind: CapabilityKind, payload: Payload) -> Result<Value> {
        let mut options = DispatchOptions::new(self.timeouts.for_kind(kind));
        if let Some(hook) = &self.on_cancel {
            options = options.on_cancel(Arc::clone(hook));
        }
        self.correlator.dispatch(kind, payload, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::BridgeError;
    use mockall::mock;
    use serde_json::json;

    mock! {
        Transport {}

        #[async_trait]
        impl ChannelTransport for Transport {
            async fn post(&self, message: Value) -> Result<()>;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_envelope_carries_kind_and_payload() {
        let mut transport = MockTransport::new();
        transport
            .expect_post()
            .withf(|message| {
                message["kind"] == "github/pr:status"
                    && message["payload"]["branch"] == "main"
                    && message["id"].is_string()
                    && message["issuedAt"].is_i64()
            })
            .times(1)
            .returning(|_| Ok(()));

        let adapter = EmbeddedAdapter::new(Arc::new(transport), TimeoutPolicy::default());
        let payload = match json!({ "directory": "/repo", "branch": "main" }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };

        let err = adapter
            .call(CapabilityKind::GitHubPrStatus, payload)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            BridgeError::Timeout {
                kind: "github/pr:status".into(),
                timeout_ms: 10_000
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_adapter_fails_fast() {
        let mut transport = MockTransport::new();
        transport.expect_post().times(0);

        let adapter = EmbeddedAdapter::new(Arc::new(transport), TimeoutPolicy::default());
        assert_eq!(adapter.close("disposed"), 0);

        let err = adapter
            .call(CapabilityKind::ReadFile, Payload::new())
            .await
            .unwrap_err();
        assert_eq!(err, BridgeError::transport_closed("disposed"));
    }
}
