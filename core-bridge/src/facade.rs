//! The capability facade handed to UI code.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::{
    CapabilityBackend, CapabilityKind, Clock, DeleteResult, DirectoryListResult,
    ExecCommandsResult, FilesApi, GitHubApi, GitHubAuthStatus, GitHubDeviceFlowComplete,
    GitHubDeviceFlowStart, GitHubDisconnectResult, GitHubPullRequestMergeResult,
    GitHubPullRequestReadyResult, GitHubPullRequestStatus, GitHubPullRequestSummary, GitHubUser,
    ListDirectoryOptions, MergeMethod, PathResult, Payload, PullRequestDraft,
    ReadFileBinaryResult, ReadFileResult, SearchFilesResult, SearchQuery, SystemClock,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use crate::normalize::{clamp_search_limit, normalize_path};
use crate::reshape;

/// Code attached to errors raised by local input validation.
pub const INVALID_INPUT: &str = "INVALID_INPUT";

fn invalid(message: &str) -> BridgeError {
    BridgeError::Remote {
        message: message.to_string(),
        code: Some(INVALID_INPUT.to_string()),
    }
}

fn required<'a>(value: &'a str, message: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(invalid(message))
    } else {
        Ok(trimmed)
    }
}

fn required_path(value: &str, message: &str) -> Result<String> {
    required(value, message).map(normalize_path)
}

fn object(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        _ => Payload::new(),
    }
}

/// [`FilesApi`] and [`GitHubApi`] over any [`CapabilityBackend`].
///
/// The facade validates input, normalizes outgoing paths, and reshapes
/// results; the backend only moves payloads. Because every method funnels
/// through one [`CapabilityBackend::call`], a backend cannot implement half
/// of the surface.
pub struct CapabilityFacade<B> {
    backend: B,
    clock: Arc<dyn Clock>,
}

impl<B: CapabilityBackend> CapabilityFacade<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            clock: Arc::new(SystemClock),
        }
    }

    /// Clock used for timestamps the host omits.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    async fn call(&self, kind: CapabilityKind, payload: Payload) -> Result<Value> {
        debug!("{} via {} backend", kind, self.backend.name());
        let value = self.backend.call(kind, payload).await?;
        reshape::ensure_success(kind, &value)?;
        Ok(value)
    }

    async fn pr_target(
        &self,
        kind: CapabilityKind,
        directory: &str,
        number: u64,
        extra: Option<(&str, Value)>,
    ) -> Result<Value> {
        let directory = required_path(directory, "directory is required")?;
        if number == 0 {
            return Err(invalid("number is required"));
        }

        let mut payload = object(json!({ "directory": directory, "number": number }));
        if let Some((key, value)) = extra {
            payload.insert(key.to_string(), value);
        }
        self.call(kind, payload).await
    }
}

#[async_trait]
impl<B: CapabilityBackend> FilesApi for CapabilityFacade<B> {
    async fn list_directory(
        &self,
        path: &str,
        options: ListDirectoryOptions,
    ) -> Result<DirectoryListResult> {
        let path = normalize_path(path.trim());
        let payload = object(json!({
            "path": path,
            "respectGitignore": options.respect_gitignore,
        }));

        let value = self.call(CapabilityKind::ListDirectory, payload).await?;
        reshape::directory_listing(value, &path, self.clock.as_ref())
    }

    async fn search(&self, query: SearchQuery) -> Result<SearchFilesResult> {
        let directory = query
            .directory
            .as_deref()
            .map(str::trim)
            .filter(|dir| !dir.is_empty())
            .map(normalize_path);

        let mut payload = object(json!({
            "query": query.query,
            "maxResults": clamp_search_limit(query.max_results),
            "includeHidden": query.include_hidden,
            "respectGitignore": query.respect_gitignore,
        }));
        if let Some(directory) = &directory {
            payload.insert("directory".into(), json!(directory));
        }

        let value = self.call(CapabilityKind::SearchFiles, payload).await?;
        reshape::search_results(value, directory.as_deref())
    }

    async fn create_directory(&self, path: &str) -> Result<PathResult> {
        let path = required_path(path, "Path is required")?;
        let value = self
            .call(CapabilityKind::CreateDirectory, object(json!({ "path": path })))
            .await?;
        reshape::path_result(CapabilityKind::CreateDirectory, value, &path)
    }

    async fn read_file(&self, path: &str) -> Result<ReadFileResult> {
        let path = required_path(path, "Path is required")?;
        let value = self
            .call(CapabilityKind::ReadFile, object(json!({ "path": path })))
            .await?;
        reshape::file_content(value, &path)
    }

    async fn read_file_binary(&self, path: &str) -> Result<ReadFileBinaryResult> {
        let path = required_path(path, "Path is required")?;
        let value = self
            .call(CapabilityKind::ReadFileBinary, object(json!({ "path": path })))
            .await?;
        reshape::binary_content(value, &path)
    }

    async fn write_file(&self, path: &str, content: &str) -> Result<PathResult> {
        let path = required_path(path, "Path is required")?;
        let value = self
            .call(
                CapabilityKind::WriteFile,
                object(json!({ "path": path, "content": content })),
            )
            .await?;
        reshape::path_result(CapabilityKind::WriteFile, value, &path)
    }

    async fn delete(&self, path: &str) -> Result<DeleteResult> {
        let path = required_path(path, "Path is required")?;
        let value = self
            .call(CapabilityKind::DeletePath, object(json!({ "path": path })))
            .await?;
        reshape::delete_result(value)
    }

    async fn rename(&self, old_path: &str, new_path: &str) -> Result<PathResult> {
        let old_path = required_path(old_path, "oldPath is required")?;
        let new_path = required_path(new_path, "newPath is required")?;
        let value = self
            .call(
                CapabilityKind::RenamePath,
                object(json!({ "oldPath": old_path, "newPath": new_path })),
            )
            .await?;
        reshape::path_result(CapabilityKind::RenamePath, value, &new_path)
    }

    async fn exec_commands(&self, commands: &[String], cwd: &str) -> Result<ExecCommandsResult> {
        if commands.is_empty() {
            return Err(invalid("Commands array is required"));
        }
        let cwd = required_path(cwd, "Working directory (cwd) is required")?;

        let value = self
            .call(
                CapabilityKind::ExecCommands,
                object(json!({ "commands": commands, "cwd": cwd })),
            )
            .await?;
        reshape::exec_result(value, commands)
    }
}

#[async_trait]
impl<B: CapabilityBackend> GitHubApi for CapabilityFacade<B> {
    async fn auth_status(&self) -> Result<GitHubAuthStatus> {
        let value = self
            .call(CapabilityKind::GitHubAuthStatus, Payload::new())
            .await?;
        reshape::relay(CapabilityKind::GitHubAuthStatus, value)
    }

    async fn auth_start(&self) -> Result<GitHubDeviceFlowStart> {
        let value = self
            .call(CapabilityKind::GitHubAuthStart, Payload::new())
            .await?;
        reshape::relay(CapabilityKind::GitHubAuthStart, value)
    }

    async fn auth_complete(&self, device_code: &str) -> Result<GitHubDeviceFlowComplete> {
        let device_code = required(device_code, "deviceCode is required")?;
        let value = self
            .call(
                CapabilityKind::GitHubAuthComplete,
                object(json!({ "deviceCode": device_code })),
            )
            .await?;
        reshape::relay(CapabilityKind::GitHubAuthComplete, value)
    }

    async fn auth_disconnect(&self) -> Result<GitHubDisconnectResult> {
        let value = self
            .call(CapabilityKind::GitHubAuthDisconnect, Payload::new())
            .await?;
        reshape::relay(CapabilityKind::GitHubAuthDisconnect, value)
    }

    async fn me(&self) -> Result<GitHubUser> {
        let value = self.call(CapabilityKind::GitHubMe, Payload::new()).await?;
        reshape::relay(CapabilityKind::GitHubMe, value)
    }

    async fn pr_status(&self, directory: &str, branch: &str) -> Result<GitHubPullRequestStatus> {
        const MESSAGE: &str = "directory and branch are required";
        let directory = required_path(directory, MESSAGE)?;
        let branch = required(branch, MESSAGE)?;

        let value = self
            .call(
                CapabilityKind::GitHubPrStatus,
                object(json!({ "directory": directory, "branch": branch })),
            )
            .await?;
        reshape::relay(CapabilityKind::GitHubPrStatus, value)
    }

    async fn pr_create(&self, draft: PullRequestDraft) -> Result<GitHubPullRequestSummary> {
        const MESSAGE: &str = "directory, title, head, base are required";
        let draft = PullRequestDraft {
            directory: required_path(&draft.directory, MESSAGE)?,
            title: required(&draft.title, MESSAGE)?.to_string(),
            head: required(&draft.head, MESSAGE)?.to_string(),
            base: required(&draft.base, MESSAGE)?.to_string(),
            body: draft.body,
            draft: draft.draft,
        };

        let value = self
            .call(
                CapabilityKind::GitHubPrCreate,
                object(serde_json::to_value(&draft)?),
            )
            .await?;
        reshape::relay(CapabilityKind::GitHubPrCreate, value)
    }

    async fn pr_merge(
        &self,
        directory: &str,
        number: u64,
        method: MergeMethod,
    ) -> Result<GitHubPullRequestMergeResult> {
        let value = self
            .pr_target(
                CapabilityKind::GitHubPrMerge,
                directory,
                number,
                Some(("method", json!(method.as_str()))),
            )
            .await?;
        reshape::relay(CapabilityKind::GitHubPrMerge, value)
    }

    async fn pr_ready(&self, directory: &str, number: u64) -> Result<GitHubPullRequestReadyResult> {
        let value = self
            .pr_target(CapabilityKind::GitHubPrReady, directory, number, None)
            .await?;
        reshape::relay(CapabilityKind::GitHubPrReady, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::FixedClock;
    use chrono::DateTime;
    use mockall::mock;
    use mockall::predicate::eq;

    mock! {
        Backend {}

        #[async_trait]
        impl CapabilityBackend for Backend {
            fn name(&self) -> &'static str;
            async fn call(&self, kind: CapabilityKind, payload: Payload) -> Result<Value>;
        }
    }

    fn backend() -> MockBackend {
        let mut backend = MockBackend::new();
        backend.expect_name().return_const("mock");
        backend
    }

    #[core_async::test]
    async fn test_list_directory_normalizes_input_and_output() {
        let mut backend = backend();
        backend
            .expect_call()
            .withf(|kind, payload| {
                *kind == CapabilityKind::ListDirectory
                    && payload["path"] == "C:/proj"
                    && payload["respectGitignore"] == true
            })
            .times(1)
            .returning(|_, _| {
                Ok(json!({
                    "directory": "C:\\proj",
                    "entries": [{ "name": "a.rs", "path": "C:\\proj\\a.rs", "isFile": true }]
                }))
            });

        let instant = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        let facade = CapabilityFacade::new(backend).with_clock(Arc::new(FixedClock(instant)));
        let listing = facade
            .list_directory(
                "C:\\proj",
                ListDirectoryOptions {
                    respect_gitignore: true,
                },
            )
            .await
            .unwrap();

        assert_eq!(listing.directory, "C:/proj");
        assert_eq!(listing.entries[0].path, "C:/proj/a.rs");
        assert_eq!(listing.entries[0].modified_time, instant);
    }

    #[core_async::test]
    async fn test_validation_happens_before_dispatch() {
        let mut backend = backend();
        backend.expect_call().times(0);
        let facade = CapabilityFacade::new(backend);

        let err = facade.read_file("  ").await.unwrap_err();
        assert_eq!(err.message(), "Path is required");
        assert_eq!(err.code(), Some(INVALID_INPUT));

        let err = facade.rename("/a", "").await.unwrap_err();
        assert_eq!(err.message(), "newPath is required");

        let err = facade.exec_commands(&[], "/tmp").await.unwrap_err();
        assert_eq!(err.message(), "Commands array is required");

        let err = facade
            .exec_commands(&["ls".to_string()], " ")
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Working directory (cwd) is required");

        let err = facade.auth_complete("").await.unwrap_err();
        assert_eq!(err.message(), "deviceCode is required");

        let err = facade.pr_status("/repo", "").await.unwrap_err();
        assert_eq!(err.message(), "directory and branch are required");

        let err = facade.pr_ready("/repo", 0).await.unwrap_err();
        assert_eq!(err.message(), "number is required");
    }

    #[core_async::test]
    async fn test_success_false_becomes_remote_error() {
        let mut backend = backend();
        backend
            .expect_call()
            .returning(|_, _| Ok(json!({ "success": false })));
        let facade = CapabilityFacade::new(backend);

        let err = facade.write_file("/a.txt", "x").await.unwrap_err();
        assert!(matches!(err, BridgeError::Remote { .. }));
        assert_eq!(err.message(), "Failed to write file");
    }

    #[core_async::test]
    async fn test_search_clamps_limit_and_omits_blank_directory() {
        let mut backend = backend();
        backend
            .expect_call()
            .withf(|_, payload| {
                payload["maxResults"] == 400 && !payload.contains_key("directory")
            })
            .times(1)
            .returning(|_, _| Ok(json!({ "root": "/home", "files": [] })));
        let facade = CapabilityFacade::new(backend);

        let result = facade
            .search(SearchQuery::new("x").in_directory(" ").max_results(10_000))
            .await
            .unwrap();
        assert!(result.files.is_empty());
        assert_eq!(result.root, "/home");
    }

    #[core_async::test]
    async fn test_pr_merge_defaults_and_payload() {
        let mut backend = backend();
        backend
            .expect_call()
            .with(
                eq(CapabilityKind::GitHubPrMerge),
                eq(object(json!({
                    "directory": "/repo",
                    "number": 12,
                    "method": "merge"
                }))),
            )
            .times(1)
            .returning(|_, _| Ok(json!({ "merged": true })));
        let facade = CapabilityFacade::new(backend);

        let result = facade
            .pr_merge("/repo", 12, MergeMethod::default())
            .await
            .unwrap();
        assert!(result.merged);
        assert_eq!(result.message, None);
    }

    #[core_async::test]
    async fn test_device_flow_pending_is_not_an_error() {
        let mut backend = backend();
        backend
            .expect_call()
            .withf(|_, payload| payload["deviceCode"] == "dc-1")
            .returning(|_, _| Ok(json!({ "connected": false, "status": "authorization_pending" })));
        let facade = CapabilityFacade::new(backend);

        let outcome = facade.auth_complete("dc-1").await.unwrap();
        assert!(!outcome.is_connected());
    }
}
