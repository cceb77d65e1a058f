//! File capability contract.
//!
//! Every host (desktop shell, editor webview, remote server) exposes the same
//! [`FilesApi`]. Result types are fully populated: the facade fills missing
//! sizes, timestamps and flags before handing them to callers, so UI code can
//! treat every field as present.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Options for [`FilesApi::list_directory`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListDirectoryOptions {
    pub respect_gitignore: bool,
}

/// A single entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub name: String,
    pub path: String,
    pub is_directory: bool,
    pub is_file: bool,
    pub is_symbolic_link: bool,
    pub size: u64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub modified_time: DateTime<Utc>,
}

/// Result of [`FilesApi::list_directory`]. Entries keep the host's order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryListResult {
    pub directory: String,
    pub entries: Vec<DirectoryEntry>,
}

/// Parameters for [`FilesApi::search`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub directory: Option<String>,
    pub query: String,
    pub max_results: Option<usize>,
    pub include_hidden: bool,
    pub respect_gitignore: bool,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            directory: None,
            query: query.into(),
            max_results: None,
            include_hidden: false,
            respect_gitignore: true,
        }
    }

    pub fn in_directory(mut self, directory: impl Into<String>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    pub fn max_results(mut self, limit: usize) -> Self {
        self.max_results = Some(limit);
        self
    }

    pub fn include_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    pub fn respect_gitignore(mut self, respect: bool) -> Self {
        self.respect_gitignore = respect;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSearchHit {
    pub name: String,
    pub path: String,
    pub relative_path: String,
    pub extension: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilesResult {
    pub root: String,
    pub count: usize,
    pub files: Vec<FileSearchHit>,
}

/// Acknowledgement of a mutation that produced or touched a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathResult {
    pub success: bool,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadFileResult {
    pub content: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadFileBinaryResult {
    pub data_url: String,
    pub path: String,
}

/// Outcome of one command in [`FilesApi::exec_commands`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult {
    pub command: String,
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub error: Option<String>,
}

/// `success` is true only when every command succeeded. A failing command is
/// reported in `results`, not as an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecCommandsResult {
    pub success: bool,
    pub results: Vec<CommandResult>,
}

/// File operations exposed to the UI layer.
///
/// Implementations must settle every call exactly once. A timeout means the
/// outcome is unknown: a write or command may still have completed on the
/// host.
#[async_trait]
pub trait FilesApi: Send + Sync {
    async fn list_directory(
        &self,
        path: &str,
        options: ListDirectoryOptions,
    ) -> Result<DirectoryListResult>;

    async fn search(&self, query: SearchQuery) -> Result<SearchFilesResult>;

    async fn create_directory(&self, path: &str) -> Result<PathResult>;

    async fn read_file(&self, path: &str) -> Result<ReadFileResult>;

    /// Read a file as a `data:` URL.
    async fn read_file_binary(&self, path: &str) -> Result<ReadFileBinaryResult>;

    async fn write_file(&self, path: &str, content: &str) -> Result<PathResult>;

    async fn delete(&self, path: &str) -> Result<DeleteResult>;

    async fn rename(&self, old_path: &str, new_path: &str) -> Result<PathResult>;

    /// Run shell commands sequentially in `cwd`.
    async fn exec_commands(&self, commands: &[String], cwd: &str) -> Result<ExecCommandsResult>;
}
