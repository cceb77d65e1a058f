//! # Embedded Bridge
//!
//! Backend for hosts reached through a `postMessage`-style channel, such as
//! an editor extension webview.
//!
//! ## Overview
//!
//! Requests leave through a [`ChannelTransport`](bridge_traits::ChannelTransport)
//! wrapped in a correlation envelope:
//!
//! ```json
//! { "id": "<uuid>", "kind": "read_file", "payload": { "path": "/a" }, "issuedAt": 1700000000000 }
//! ```
//!
//! and the host answers on a separate inbound path with
//! `{ "id", "ok", "result" | "error" }`. The host feeds inbound messages to
//! [`EmbeddedAdapter::handle_message`], or hands the whole inbound stream to
//! [`EmbeddedAdapter::attach`].
//!
//! ## Transports
//!
//! - [`MemoryChannel`] - in-process channel pair, the host side is a
//!   [`HostEndpoint`]
//! - [`JsonLinesChannel`] - newline-delimited JSON over any async writer,
//!   with [`json_lines_inbound`] decoding the reader side

mod adapter;
mod json_lines;
mod memory;

pub use adapter::EmbeddedAdapter;
pub use json_lines::{json_lines_inbound, JsonLinesChannel, MAX_LINE_LENGTH};
pub use memory::{HostEndpoint, MemoryChannel};
