//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! backend adapters (`native`, `embedded`, `http`). Host applications can depend
//! on `host-bridge-workspace` and enable only the transports they ship with,
//! without wiring each crate individually.

#[cfg(any(feature = "native", feature = "embedded", feature = "http"))]
pub use core_service::*;
