//! # HTTP Bridge
//!
//! Backend for the browser build, where capabilities are REST endpoints on
//! a remote server.
//!
//! ## Overview
//!
//! - [`HttpAdapter`] maps each capability to a verb and path under a base
//!   URL ([`route`]), encodes reads as query parameters and writes as JSON
//!   bodies, and runs the request under the deadline guard.
//! - [`ReqwestHttpClient`] is the default [`HttpClient`](bridge_traits::HttpClient).
//!   It never retries and has no overall request timeout; the adapter's
//!   per-operation budget is the only deadline.
//!
//! Non-2xx answers become `BridgeError::Remote` with code `HTTP_<status>`.

mod adapter;
mod client;
mod data_url;
mod routes;

pub use adapter::HttpAdapter;
pub use client::ReqwestHttpClient;
pub use data_url::{data_url, mime_for_path};
pub use routes::{route, Route, RouteParams};
