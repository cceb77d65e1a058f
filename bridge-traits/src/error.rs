//! Caller-facing error type shared by every capability interface.
//!
//! Whatever the transport, a failed call surfaces as exactly one
//! [`BridgeError`]. Adapters convert host rejections, HTTP failures, channel
//! closures and malformed payloads into one of these variants before the
//! error crosses the capability boundary.

use thiserror::Error;

/// Message used when a host reports failure without saying why.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Operation failed";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// The channel closed or the network failed before the call settled.
    #[error("Transport error: {0}")]
    Transport(String),

    /// No settlement arrived within the operation's budget. The remote side
    /// effect may or may not have happened.
    #[error("{kind} timed out after {timeout_ms} ms")]
    Timeout { kind: String, timeout_ms: u64 },

    /// The host explicitly reported failure.
    #[error("{message}")]
    Remote {
        message: String,
        code: Option<String>,
    },

    /// The host answered with something that does not match the contract.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The caller (or the host application) cancelled the call.
    #[error("{kind} was cancelled")]
    Cancelled { kind: String },

    /// The capability is not wired for the active host.
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),
}

impl BridgeError {
    /// Build a remote failure, substituting `fallback` for a blank message.
    pub fn remote(message: Option<&str>, code: Option<String>, fallback: &str) -> Self {
        let message = message
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .or_else(|| Some(fallback.trim()).filter(|m| !m.is_empty()))
            .unwrap_or(DEFAULT_FAILURE_MESSAGE);

        BridgeError::Remote {
            message: message.to_string(),
            code,
        }
    }

    pub fn transport_closed(reason: &str) -> Self {
        BridgeError::Transport(format!("transport closed: {reason}"))
    }

    /// Human-readable message; never empty.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Machine-readable code, when one applies.
    pub fn code(&self) -> Option<&str> {
        match self {
            BridgeError::Transport(_) => Some("TRANSPORT"),
            BridgeError::Timeout { .. } => Some("TIMEOUT"),
            BridgeError::Remote { code, .. } => code.as_deref(),
            BridgeError::Protocol(_) => Some("PROTOCOL"),
            BridgeError::Cancelled { .. } => Some("CANCELLED"),
            BridgeError::NotAvailable(_) => Some("NOT_AVAILABLE"),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, BridgeError::Timeout { .. })
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Protocol(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_uses_fallback_for_blank_message() {
        let err = BridgeError::remote(Some("   "), None, "Failed to write file");
        assert_eq!(err.message(), "Failed to write file");

        let err = BridgeError::remote(None, None, "");
        assert_eq!(err.message(), DEFAULT_FAILURE_MESSAGE);
    }

    #[test]
    fn test_remote_keeps_host_message_and_code() {
        let err = BridgeError::remote(Some("Directory not found"), Some("ENOENT".into()), "x");
        assert_eq!(err.message(), "Directory not found");
        assert_eq!(err.code(), Some("ENOENT"));
    }

    #[test]
    fn test_codes() {
        let timeout = BridgeError::Timeout {
            kind: "exec_commands".into(),
            timeout_ms: 120_000,
        };
        assert!(timeout.is_timeout());
        assert_eq!(timeout.code(), Some("TIMEOUT"));
        assert_eq!(timeout.message(), "exec_commands timed out after 120000 ms");
        assert_eq!(
            BridgeError::transport_closed("host exited").message(),
            "Transport error: transport closed: host exited"
        );
    }
}
