//! Raw host transports wrapped by the backend adapters.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Synchronous-style native invocation (desktop shell command bridge).
///
/// The host either resolves with a JSON value or rejects with an arbitrary
/// JSON value: a bare string, an object with `message` or `error`, or
/// anything else. The native adapter normalizes the rejection.
#[async_trait]
pub trait NativeInvoke: Send + Sync {
    async fn invoke(&self, command: &str, args: Value) -> std::result::Result<Value, Value>;
}

/// Fire-and-forget message channel (editor webview `postMessage`).
///
/// Responses arrive asynchronously on a separate inbound path and are fed to
/// the embedded adapter by the host.
#[async_trait]
pub trait ChannelTransport: Send + Sync {
    /// Post one outbound envelope. An error means the message was not sent.
    async fn post(&self, message: Value) -> Result<()>;
}
