//! # Bridge Configuration
//!
//! The configuration system uses a builder to construct a [`BridgeConfig`]
//! holding the host kind, the transport handle that kind needs, and the
//! timeout policy. [`BridgeConfigBuilder::build`] is fail-fast: a host kind
//! without its transport never produces a config.
//!
//! ## Required per host
//!
//! | host | required | optional |
//! |---|---|---|
//! | `Native` | `native_invoker` | |
//! | `Embedded` | `channel_transport` | |
//! | `Http` | `http_base_url` | `http_client` (reqwest default at bootstrap) |
//!
//! `timeouts`, `clock` and `cancel_hook` apply to every host.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{BridgeConfig, HostKind};
//!
//! let config = BridgeConfig::builder()
//!     .host(HostKind::Http)
//!     .http_base_url("http://127.0.0.1:4096")
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{ChannelTransport, Clock, HttpClient, NativeInvoke, SystemClock};
use core_bridge::{CancelHook, TimeoutPolicy};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Which transport the host application speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKind {
    /// Direct invoke into a native shell.
    Native,
    /// Message channel to an embedding container.
    Embedded,
    /// REST calls against a local companion server.
    Http,
}

impl HostKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HostKind::Native => "native",
            HostKind::Embedded => "embedded",
            HostKind::Http => "http",
        }
    }
}

impl fmt::Display for HostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HostKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" | "desktop" => Ok(HostKind::Native),
            "embedded" | "channel" => Ok(HostKind::Embedded),
            "http" | "web" => Ok(HostKind::Http),
            other => Err(Error::Config(format!(
                "Unknown host kind '{}'. Expected one of: native, embedded, http",
                other
            ))),
        }
    }
}

/// Validated bridge configuration. Use [`BridgeConfig::builder`].
#[derive(Clone)]
pub struct BridgeConfig {
    pub host: HostKind,
    pub timeouts: TimeoutPolicy,
    /// Present when `host` is `Http`.
    pub http_base_url: Option<String>,
    /// Falls back to the reqwest client at bootstrap when absent.
    pub http_client: Option<Arc<dyn HttpClient>>,
    /// Present when `host` is `Native`.
    pub native_invoker: Option<Arc<dyn NativeInvoke>>,
    /// Present when `host` is `Embedded`.
    pub channel_transport: Option<Arc<dyn ChannelTransport>>,
    pub clock: Arc<dyn Clock>,
    pub cancel_hook: Option<CancelHook>,
}

impl fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("host", &self.host)
            .field("timeouts", &self.timeouts)
            .field("http_base_url", &self.http_base_url)
            .field(
                "http_client",
                &self.http_client.as_ref().map(|_| "HttpClient { ... }"),
            )
            .field(
                "native_invoker",
                &self.native_invoker.as_ref().map(|_| "NativeInvoke { ... }"),
            )
            .field(
                "channel_transport",
                &self
                    .channel_transport
                    .as_ref()
                    .map(|_| "ChannelTransport { ... }"),
            )
            .field("cancel_hook", &self.cancel_hook.is_some())
            .finish()
    }
}

impl BridgeConfig {
    pub fn builder() -> BridgeConfigBuilder {
        BridgeConfigBuilder::default()
    }

    /// Checks that the transport required by `host` is present and that the
    /// timeout policy is within bounds.
    pub fn validate(&self) -> Result<()> {
        self.timeouts.validate()?;

        match self.host {
            HostKind::Native if self.native_invoker.is_none() => {
                Err(native_invoker_missing_error())
            }
            HostKind::Embedded if self.channel_transport.is_none() => {
                Err(channel_transport_missing_error())
            }
            HostKind::Http => match self.http_base_url.as_deref() {
                None => Err(http_base_url_missing_error()),
                Some(url) => validate_base_url(url),
            },
            _ => Ok(()),
        }
    }
}

fn native_invoker_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "NativeInvoke".to_string(),
        message: "A native host requires an invoke handle. \
                  Call .native_invoker() with the shell's command bridge."
            .to_string(),
    }
}

fn channel_transport_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "ChannelTransport".to_string(),
        message: "An embedded host requires an outbound message channel. \
                  Call .channel_transport() with the container's post handle."
            .to_string(),
    }
}

fn http_base_url_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "HttpBaseUrl".to_string(),
        message: "An http host requires the companion server's base URL. \
                  Call .http_base_url(), e.g. \"http://127.0.0.1:4096\"."
            .to_string(),
    }
}

fn validate_base_url(url: &str) -> Result<()> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(Error::Config("HTTP base URL cannot be empty".to_string()));
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(Error::Config(format!(
            "HTTP base URL must use http or https: {}",
            trimmed
        )));
    }
    Ok(())
}

/// Builder for [`BridgeConfig`].
#[derive(Default)]
pub struct BridgeConfigBuilder {
    host: Option<HostKind>,
    timeouts: Option<TimeoutPolicy>,
    http_base_url: Option<String>,
    http_client: Option<Arc<dyn HttpClient>>,
    native_invoker: Option<Arc<dyn NativeInvoke>>,
    channel_transport: Option<Arc<dyn ChannelTransport>>,
    clock: Option<Arc<dyn Clock>>,
    cancel_hook: Option<CancelHook>,
}

impl BridgeConfigBuilder {
    /// Sets the host kind (required).
    pub fn host(mut self, host: HostKind) -> Self {
        self.host = Some(host);
        self
    }

    /// Overrides the default timeout policy.
    pub fn timeouts(mut self, timeouts: TimeoutPolicy) -> Self {
        self.timeouts = Some(timeouts);
        self
    }

    /// Sets the companion server's base URL. Required for [`HostKind::Http`].
    pub fn http_base_url(mut self, url: impl Into<String>) -> Self {
        self.http_base_url = Some(url.into());
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Required for [`HostKind::Native`].
    pub fn native_invoker(mut self, invoker: Arc<dyn NativeInvoke>) -> Self {
        self.native_invoker = Some(invoker);
        self
    }

    /// Required for [`HostKind::Embedded`].
    pub fn channel_transport(mut self, transport: Arc<dyn ChannelTransport>) -> Self {
        self.channel_transport = Some(transport);
        self
    }

    /// Clock used to stamp directory listings. Defaults to the system clock.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Observer told when the bridge stops waiting for a request.
    pub fn cancel_hook(mut self, hook: CancelHook) -> Self {
        self.cancel_hook = Some(hook);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] when no host is set, the base URL is malformed or
    ///   the timeout policy is out of bounds
    /// - [`Error::CapabilityMissing`] when the host's transport is absent
    pub fn build(self) -> Result<BridgeConfig> {
        let host = self.host.ok_or_else(|| {
            Error::Config("Host kind is required. Use .host() to set it.".to_string())
        })?;

        let config = BridgeConfig {
            host,
            timeouts: self.timeouts.unwrap_or_default(),
            http_base_url: self.http_base_url.map(|url| url.trim().to_string()),
            http_client: self.http_client,
            native_invoker: self.native_invoker,
            channel_transport: self.channel_transport,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            cancel_hook: self.cancel_hook,
        };

        config.validate()?;

        Ok(config)
    }
}
