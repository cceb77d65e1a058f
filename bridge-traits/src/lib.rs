//! # Host Bridge Traits
//!
//! Contracts shared by the capability facade and every host adapter.
//!
//! ## Overview
//!
//! The application runs on three hosts: a native desktop shell, an embedded
//! editor webview and a browser talking to a remote server. Each host speaks
//! a different transport, but the UI sees one capability surface:
//!
//! - [`FilesApi`](files::FilesApi) - directory listing, search, read/write,
//!   rename/delete, command execution
//! - [`GitHubApi`](github::GitHubApi) - device-flow auth and pull request
//!   operations
//!
//! ## Transport seams
//!
//! - [`CapabilityBackend`](backend::CapabilityBackend) - one call per
//!   [`CapabilityKind`](protocol::CapabilityKind), implemented by each adapter
//! - [`NativeInvoke`](transport::NativeInvoke) - native command invocation
//! - [`ChannelTransport`](transport::ChannelTransport) - outbound half of a
//!   `postMessage`-style channel
//! - [`HttpClient`](http::HttpClient) - single-shot HTTP requests
//!
//! ## Utilities
//!
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! Every contract returns [`BridgeError`](error::BridgeError). Adapters convert
//! host rejections, HTTP failures and malformed payloads before the error
//! crosses the capability boundary; callers never see `reqwest` or
//! `serde_json` errors.
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync` so a single facade can be shared across
//! tasks behind an `Arc`.

pub mod backend;
pub mod error;
pub mod files;
pub mod github;
pub mod http;
pub mod protocol;
pub mod time;
pub mod transport;

pub use error::BridgeError;

// Re-export commonly used types
pub use backend::CapabilityBackend;
pub use files::{
    CommandResult, DeleteResult, DirectoryEntry, DirectoryListResult, ExecCommandsResult,
    FileSearchHit, FilesApi, ListDirectoryOptions, PathResult, ReadFileBinaryResult,
    ReadFileResult, SearchFilesResult, SearchQuery,
};
pub use github::{
    GitHubApi, GitHubAuthStatus, GitHubChecksSummary, GitHubDeviceFlowComplete,
    GitHubDeviceFlowPending, GitHubDeviceFlowStart, GitHubDeviceFlowSuccess,
    GitHubDisconnectResult, GitHubPullRequestMergeResult, GitHubPullRequestReadyResult,
    GitHubPullRequestStatus, GitHubPullRequestSummary, GitHubRepoRef, GitHubUser, MergeMethod,
    PullRequestDraft,
};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use protocol::{CapabilityKind, CapabilityRequest, CapabilityResponse, Payload, RequestId};
pub use time::{Clock, FixedClock, LogEntry, LogLevel, LoggerSink, SystemClock};
pub use transport::{ChannelTransport, NativeInvoke};
