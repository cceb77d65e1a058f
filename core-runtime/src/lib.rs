//! # Core Runtime
//!
//! Ambient runtime pieces shared by every host bridge crate:
//!
//! - [`config`] - `BridgeConfig` builder with fail-fast capability checks
//! - [`logging`] - `tracing-subscriber` setup, host `LoggerSink` forwarding
//!   and redaction helpers
//! - [`error`] - runtime/configuration errors

pub mod config;
pub mod error;
pub mod logging;

pub use config::{BridgeConfig, BridgeConfigBuilder, HostKind};
pub use error::{Error, Result};
