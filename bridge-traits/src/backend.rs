//! Seam between the capability facade and a host transport.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::error::Result;
use crate::protocol::{CapabilityKind, Payload};

/// A host transport able to carry any [`CapabilityKind`].
///
/// Adapters receive a payload that is already normalized (forward-slash
/// paths, canonical option names) and return the host's raw result. The
/// facade owns reshaping; the adapter owns transport errors, timeouts and
/// host-specific argument spellings.
///
/// Implementations must settle every call exactly once and must never return
/// transport-native error types.
#[async_trait]
pub trait CapabilityBackend: Send + Sync {
    /// Short name used in logs (`native`, `embedded`, `http`).
    fn name(&self) -> &'static str;

    async fn call(&self, kind: CapabilityKind, payload: Payload) -> Result<Value>;
}

#[async_trait]
impl<T> CapabilityBackend for Arc<T>
where
    T: CapabilityBackend + ?Sized,
{
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn call(&self, kind: CapabilityKind, payload: Payload) -> Result<Value> {
        (**self).call(kind, payload).await
    }
}
