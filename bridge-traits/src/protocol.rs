//! Operation catalogue and correlation envelopes.
//!
//! Every capability call is identified by a [`CapabilityKind`]. Channel-based
//! transports wrap the call in a [`CapabilityRequest`] envelope and expect a
//! [`CapabilityResponse`] carrying the same [`RequestId`] back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

use crate::error::{BridgeError, Result};

/// JSON object used as the payload of every capability call.
pub type Payload = Map<String, Value>;

/// Identity of one in-flight request.
///
/// Generated fresh for every dispatch and never reused while the request is
/// pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Create a new random request ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a request ID from its string form.
    pub fn parse(s: &str) -> std::result::Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Logical operation carried across the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CapabilityKind {
    #[serde(rename = "list_directory")]
    ListDirectory,
    #[serde(rename = "search_files")]
    SearchFiles,
    #[serde(rename = "create_directory")]
    CreateDirectory,
    #[serde(rename = "read_file")]
    ReadFile,
    #[serde(rename = "read_file_binary")]
    ReadFileBinary,
    #[serde(rename = "write_file")]
    WriteFile,
    #[serde(rename = "delete_path")]
    DeletePath,
    #[serde(rename = "rename_path")]
    RenamePath,
    #[serde(rename = "exec_commands")]
    ExecCommands,
    #[serde(rename = "github/auth:status")]
    GitHubAuthStatus,
    #[serde(rename = "github/auth:start")]
    GitHubAuthStart,
    #[serde(rename = "github/auth:complete")]
    GitHubAuthComplete,
    #[serde(rename = "github/auth:disconnect")]
    GitHubAuthDisconnect,
    #[serde(rename = "github/me")]
    GitHubMe,
    #[serde(rename = "github/pr:status")]
    GitHubPrStatus,
    #[serde(rename = "github/pr:create")]
    GitHubPrCreate,
    #[serde(rename = "github/pr:merge")]
    GitHubPrMerge,
    #[serde(rename = "github/pr:ready")]
    GitHubPrReady,
}

impl CapabilityKind {
    pub const ALL: [CapabilityKind; 18] = [
        CapabilityKind::ListDirectory,
        CapabilityKind::SearchFiles,
        CapabilityKind::CreateDirectory,
        CapabilityKind::ReadFile,
        CapabilityKind::ReadFileBinary,
        CapabilityKind::WriteFile,
        CapabilityKind::DeletePath,
        CapabilityKind::RenamePath,
        CapabilityKind::ExecCommands,
        CapabilityKind::GitHubAuthStatus,
        CapabilityKind::GitHubAuthStart,
        CapabilityKind::GitHubAuthComplete,
        CapabilityKind::GitHubAuthDisconnect,
        CapabilityKind::GitHubMe,
        CapabilityKind::GitHubPrStatus,
        CapabilityKind::GitHubPrCreate,
        CapabilityKind::GitHubPrMerge,
        CapabilityKind::GitHubPrReady,
    ];

    /// Message kind as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityKind::ListDirectory => "list_directory",
            CapabilityKind::SearchFiles => "search_files",
            CapabilityKind::CreateDirectory => "create_directory",
            CapabilityKind::ReadFile => "read_file",
            CapabilityKind::ReadFileBinary => "read_file_binary",
            CapabilityKind::WriteFile => "write_file",
            CapabilityKind::DeletePath => "delete_path",
            CapabilityKind::RenamePath => "rename_path",
            CapabilityKind::ExecCommands => "exec_commands",
            CapabilityKind::GitHubAuthStatus => "github/auth:status",
            CapabilityKind::GitHubAuthStart => "github/auth:start",
            CapabilityKind::GitHubAuthComplete => "github/auth:complete",
            CapabilityKind::GitHubAuthDisconnect => "github/auth:disconnect",
            CapabilityKind::GitHubMe => "github/me",
            CapabilityKind::GitHubPrStatus => "github/pr:status",
            CapabilityKind::GitHubPrCreate => "github/pr:create",
            CapabilityKind::GitHubPrMerge => "github/pr:merge",
            CapabilityKind::GitHubPrReady => "github/pr:ready",
        }
    }

    /// Message reported when the host fails without an explanation.
    pub fn failure_message(&self) -> &'static str {
        match self {
            CapabilityKind::ListDirectory => "Failed to list directory",
            CapabilityKind::SearchFiles => "Failed to search files",
            CapabilityKind::CreateDirectory => "Failed to create directory",
            CapabilityKind::ReadFile | CapabilityKind::ReadFileBinary => "Failed to read file",
            CapabilityKind::WriteFile => "Failed to write file",
            CapabilityKind::DeletePath => "Failed to delete path",
            CapabilityKind::RenamePath => "Failed to rename path",
            CapabilityKind::ExecCommands => "Failed to execute commands",
            CapabilityKind::GitHubAuthStatus => "Failed to load GitHub auth status",
            CapabilityKind::GitHubAuthStart => "Failed to start GitHub device flow",
            CapabilityKind::GitHubAuthComplete => "Failed to complete GitHub device flow",
            CapabilityKind::GitHubAuthDisconnect => "Failed to disconnect GitHub",
            CapabilityKind::GitHubMe => "Failed to load GitHub user",
            CapabilityKind::GitHubPrStatus => "Failed to load pull request status",
            CapabilityKind::GitHubPrCreate => "Failed to create pull request",
            CapabilityKind::GitHubPrMerge => "Failed to merge pull request",
            CapabilityKind::GitHubPrReady => "Failed to mark pull request ready",
        }
    }

    pub fn is_github(&self) -> bool {
        self.as_str().starts_with("github/")
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbound correlation envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityRequest {
    pub id: RequestId,
    pub kind: CapabilityKind,
    pub payload: Payload,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub issued_at: DateTime<Utc>,
}

impl CapabilityRequest {
    pub fn new(kind: CapabilityKind, payload: Payload) -> Self {
        Self {
            id: RequestId::new(),
            kind,
            payload,
            issued_at: Utc::now(),
        }
    }
}

/// Error body of a failed [`CapabilityResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResponseError {
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Inbound settlement for a previously issued request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityResponse {
    pub id: RequestId,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
}

impl CapabilityResponse {
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            id,
            ok: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: RequestId, message: impl Into<String>, code: Option<String>) -> Self {
        Self {
            id,
            ok: false,
            result: None,
            error: Some(ResponseError {
                message: message.into(),
                code,
            }),
        }
    }

    /// Convert into the settled value, normalizing `ok: false` into a remote
    /// error whose message falls back to the operation's default.
    pub fn into_result(self, kind: CapabilityKind) -> Result<Value> {
        if self.ok {
            return Ok(self.result.unwrap_or(Value::Null));
        }

        let error = self.error.unwrap_or_default();
        Err(BridgeError::remote(
            Some(error.message.as_str()),
            error.code,
            kind.failure_message(),
        ))
    }
}
