//! # Native Bridge
//!
//! Backend for the desktop shell, where capabilities are host commands
//! invoked by name.
//!
//! ## Overview
//!
//! - [`NativeAdapter`] implements `CapabilityBackend` over any
//!   [`NativeInvoke`](bridge_traits::NativeInvoke). Aliased options are sent
//!   under both camelCase and snake_case names, and every call runs under the
//!   deadline guard.
//! - [`CommandRegistry`] is an in-process `NativeInvoke` mapping command
//!   names to async handlers, for embedding the host in the same binary and
//!   for tests.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_native::{CommandRegistry, NativeAdapter};
//! use core_bridge::{CapabilityFacade, TimeoutPolicy};
//! use std::sync::Arc;
//!
//! let registry = CommandRegistry::new().with("read_file", |args| async move {
//!     Ok(serde_json::json!({ "content": "", "path": args["path"] }))
//! });
//! let facade = CapabilityFacade::new(NativeAdapter::new(Arc::new(registry), TimeoutPolicy::default()));
//! ```

mod adapter;
mod registry;

pub use adapter::{command_name, rejection_error, NativeAdapter};
pub use registry::CommandRegistry;
