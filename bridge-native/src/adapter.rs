//! Native-invoke backend adapter.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    CapabilityBackend, CapabilityKind, NativeInvoke, Payload,
};
use core_bridge::{apply_aliases, run_with_deadline, CancelHook, TimeoutPolicy};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Host command implementing `kind`.
pub fn command_name(kind: CapabilityKind) -> &'static str {
    match kind {
        CapabilityKind::ListDirectory => "list_directory",
        CapabilityKind::SearchFiles => "search_files",
        CapabilityKind::CreateDirectory => "create_directory",
        CapabilityKind::ReadFile => "read_file",
        CapabilityKind::ReadFileBinary => "read_file_binary",
        CapabilityKind::WriteFile => "write_file",
        CapabilityKind::DeletePath => "delete_path",
        CapabilityKind::RenamePath => "rename_path",
        CapabilityKind::ExecCommands => "exec_commands",
        CapabilityKind::GitHubAuthStatus => "github_auth_status",
        CapabilityKind::GitHubAuthStart => "github_auth_start",
        CapabilityKind::GitHubAuthComplete => "github_auth_complete",
        CapabilityKind::GitHubAuthDisconnect => "github_auth_disconnect",
        CapabilityKind::GitHubMe => "github_me",
        CapabilityKind::GitHubPrStatus => "github_pr_status",
        CapabilityKind::GitHubPrCreate => "github_pr_create",
        CapabilityKind::GitHubPrMerge => "github_pr_merge",
        CapabilityKind::GitHubPrReady => "github_pr_ready",
    }
}

/// Normalize whatever the host rejected with.
///
/// Accepted shapes: a bare string, `{ message }`, `{ error }` (string or
/// `{ message }`). Anything else falls back to the operation's default
/// message.
pub fn rejection_error(kind: CapabilityKind, rejection: Value) -> BridgeError {
    match rejection {
        Value::String(message) => BridgeError::remote(Some(&message), None, kind.failure_message()),
        Value::Object(body) => {
            let code = body
                .get("code")
                .and_then(Value::as_str)
                .map(str::to_string);
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .or_else(|| match body.get("error") {
                    Some(Value::String(message)) => Some(message.as_str()),
                    Some(Value::Object(inner)) => inner.get("message").and_then(Value::as_str),
                    _ => None,
                });
            BridgeError::remote(message, code, kind.failure_message())
        }
        _ => BridgeError::remote(None, None, kind.failure_message()),
    }
}

/// [`CapabilityBackend`] for hosts reached through [`NativeInvoke`].
pub struct NativeAdapter {
    invoker: Arc<dyn NativeInvoke>,
    timeouts: TimeoutPolicy,
    on_cancel: Option<CancelHook>,
}

impl NativeAdapter {
    pub fn new(invoker: Arc<dyn NativeInvoke>, timeouts: TimeoutPolicy) -> Self {
        Self {
            invoker,
            timeouts,
            on_cancel: None,
        }
    }

    pub fn with_cancel_hook(mut self, hook: CancelHook) -> Self {
        self.on_cancel = Some(hook);
        self
    }
}

#[async_trait]
impl CapabilityBackend for NativeAdapter {
    fn name(&self) -> &'static str {
        "native"
    }

    async fn call(&self, kind: CapabilityKind, mut payload: Payload) -> Result<Value> {
        apply_aliases(kind, &mut payload);
        let command = command_name(kind);
        debug!(command, "Invoking native command");

        run_with_deadline(
            kind,
            self.timeouts.for_kind(kind),
            self.on_cancel.as_ref(),
            async {
                self.invoker
                    .invoke(command, Value::Object(payload))
                    .await
                    .map_err(|rejection| rejection_error(kind, rejection))
            },
        )
        .await
    }
}
