//! Core service and bootstrap.
//!
//! [`bootstrap`] turns a validated [`BridgeConfig`] into a [`CoreService`]:
//! exactly one capability facade over the transport the host speaks. Callers
//! hold the service value and hand out its [`FilesApi`] / [`GitHubApi`]
//! handles; nothing is registered globally.
//!
//! Each transport sits behind a cargo feature (`native`, `embedded`, `http`,
//! all on by default) so a host ships only the adapter it uses.

pub mod error;

pub use error::{CoreError, Result};

pub use bridge_traits::{BridgeError, FilesApi, GitHubApi};
pub use core_bridge::{CancelEvent, CancelHook, CancelReason, TimeoutPolicy};
pub use core_runtime::{BridgeConfig, BridgeConfigBuilder, HostKind};

use bridge_traits::CapabilityBackend;
use core_bridge::CapabilityFacade;
use std::sync::Arc;
use tracing::info;

#[cfg(feature = "embedded")]
pub use bridge_embedded::EmbeddedAdapter;

/// Capability handles for one host transport.
#[derive(Clone)]
pub struct CoreService {
    host: HostKind,
    files: Arc<dyn FilesApi>,
    github: Arc<dyn GitHubApi>,
    #[cfg(feature = "embedded")]
    embedded: Option<Arc<EmbeddedAdapter>>,
}

impl std::fmt::Debug for CoreService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreService")
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

impl CoreService {
    fn from_backend<B>(host: HostKind, backend: B, config: &BridgeConfig) -> Self
    where
        B: CapabilityBackend + 'static,
    {
        let facade = Arc::new(CapabilityFacade::new(backend).with_clock(Arc::clone(&config.clock)));
        let files: Arc<dyn FilesApi> = facade.clone();
        let github: Arc<dyn GitHubApi> = facade;

        Self {
            host,
            files,
            github,
            #[cfg(feature = "embedded")]
            embedded: None,
        }
    }

    pub fn host(&self) -> HostKind {
        self.host
    }

    /// Workspace file and command operations.
    pub fn files(&self) -> Arc<dyn FilesApi> {
        Arc::clone(&self.files)
    }

    /// GitHub account and pull request operations.
    pub fn github(&self) -> Arc<dyn GitHubApi> {
        Arc::clone(&self.github)
    }

    /// Adapter of an embedded host. The host feeds inbound channel messages
    /// to it, either one at a time with `handle_message` or via `attach`.
    #[cfg(feature = "embedded")]
    pub fn embedded(&self) -> Option<Arc<EmbeddedAdapter>> {
        self.embedded.clone()
    }

    /// Rejects pending embedded-channel requests and refuses new ones.
    /// Returns 0 for direct transports.
    #[cfg(feature = "embedded")]
    pub fn shutdown(&self, reason: &str) -> usize {
        self.embedded
            .as_ref()
            .map_or(0, |adapter| adapter.close(reason))
    }

    /// Direct transports hold no pending state; always 0.
    #[cfg(not(feature = "embedded"))]
    pub fn shutdown(&self, _reason: &str) -> usize {
        0
    }
}

/// Builds the service for `config.host`.
///
/// # Errors
///
/// - [`CoreError::Runtime`] if the config no longer validates
/// - [`CoreError::HostUnavailable`] if the host's feature is disabled
/// - [`CoreError::InitializationFailed`] if the adapter cannot be constructed
///   (e.g. a malformed base URL or a TLS backend failure)
pub fn bootstrap(config: BridgeConfig) -> Result<CoreService> {
    config.validate()?;

    let service = match config.host {
        HostKind::Native => bootstrap_native(&config)?,
        HostKind::Embedded => bootstrap_embedded(&config)?,
        HostKind::Http => bootstrap_http(&config)?,
    };

    info!(host = %service.host, "Capability bridge ready");
    Ok(service)
}

#[cfg(feature = "native")]
fn bootstrap_native(config: &BridgeConfig) -> Result<CoreService> {
    use bridge_native::NativeAdapter;

    let invoker = config.native_invoker.clone().ok_or_else(|| {
        CoreError::InitializationFailed("native host without an invoker".to_string())
    })?;

    let mut adapter = NativeAdapter::new(invoker, config.timeouts);
    if let Some(hook) = config.cancel_hook.clone() {
        adapter = adapter.with_cancel_hook(hook);
    }

    Ok(CoreService::from_backend(HostKind::Native, adapter, config))
}

#[cfg(not(feature = "native"))]
fn bootstrap_native(_config: &BridgeConfig) -> Result<CoreService> {
    Err(CoreError::HostUnavailable {
        host: "native",
        feature: "native",
    })
}

#[cfg(feature = "embedded")]
fn bootstrap_embedded(config: &BridgeConfig) -> Result<CoreService> {
    let transport = config.channel_transport.clone().ok_or_else(|| {
        CoreError::InitializationFailed("embedded host without a channel transport".to_string())
    })?;

    let mut adapter = EmbeddedAdapter::new(transport, config.timeouts);
    if let Some(hook) = config.cancel_hook.clone() {
        adapter = adapter.with_cancel_hook(hook);
    }
    let adapter = Arc::new(adapter);

    let mut service =
        CoreService::from_backend(HostKind::Embedded, Arc::clone(&adapter), config);
    service.embedded = Some(adapter);
    Ok(service)
}

#[cfg(not(feature = "embedded"))]
fn bootstrap_embedded(_config: &BridgeConfig) -> Result<CoreService> {
    Err(CoreError::HostUnavailable {
        host: "embedded",
        feature: "embedded",
    })
}

#[cfg(feature = "http")]
fn bootstrap_http(config: &BridgeConfig) -> Result<CoreService> {
    use bridge_http::{HttpAdapter, ReqwestHttpClient};
    use bridge_traits::HttpClient;

    let base_url = config.http_base_url.as_deref().ok_or_else(|| {
        CoreError::InitializationFailed("http host without a base URL".to_string())
    })?;

    let client: Arc<dyn HttpClient> = match config.http_client.clone() {
        Some(client) => client,
        None => Arc::new(ReqwestHttpClient::new().map_err(|e| {
            CoreError::InitializationFailed(format!("default HTTP client: {}", e))
        })?),
    };

    let mut adapter = HttpAdapter::new(client, base_url, config.timeouts)
        .map_err(|e| CoreError::InitializationFailed(e.to_string()))?;
    if let Some(hook) = config.cancel_hook.clone() {
        adapter = adapter.with_cancel_hook(hook);
    }

    Ok(CoreService::from_backend(HostKind::Http, adapter, config))
}

#[cfg(not(feature = "http"))]
fn bootstrap_http(_config: &BridgeConfig) -> Result<CoreService> {
    Err(CoreError::HostUnavailable {
        host: "http",
        feature: "http",
    })
}
