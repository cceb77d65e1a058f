//! Host results to fully populated capability types.
//!
//! Hosts are lenient about what they send back: optional sizes, missing
//! timestamps, Windows separators, `success` flags that may or may not be
//! present. The wire structs here accept all of that and the public
//! functions fill in defaults, so every adapter yields the same schema.

use bridge_traits::error::{BridgeError, Result};
use bridge_traits::{
    CapabilityKind, Clock, CommandResult, DeleteResult, DirectoryEntry, DirectoryListResult,
    ExecCommandsResult, FileSearchHit, PathResult, ReadFileBinaryResult, ReadFileResult,
    SearchFilesResult,
};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::normalize::{file_name, normalize_path};

/// Turn an explicit failure body into a [`BridgeError::Remote`].
///
/// `success: false` counts as failure for every kind except
/// `exec_commands`, where it only summarizes per-command results.
/// `ok: false` always counts.
pub fn ensure_success(kind: CapabilityKind, value: &Value) -> Result<()> {
    let Some(body) = value.as_object() else {
        return Ok(());
    };

    let failed_flag = |key: &str| body.get(key).and_then(Value::as_bool) == Some(false);
    let failed = failed_flag("ok")
        || (kind != CapabilityKind::ExecCommands && failed_flag("success"));
    if !failed {
        return Ok(());
    }

    Err(BridgeError::remote(
        error_message(body).as_deref(),
        body.get("code").and_then(Value::as_str).map(str::to_string),
        kind.failure_message(),
    ))
}

/// Message carried by an error body: `error` (string or `{message}`), then
/// `message`.
pub fn error_message(body: &Map<String, Value>) -> Option<String> {
    let from_error = match body.get("error") {
        Some(Value::String(message)) => Some(message.clone()),
        Some(Value::Object(inner)) => inner
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    };

    from_error
        .or_else(|| {
            body.get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .filter(|message| !message.trim().is_empty())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Decode a result object. `null` decodes as an empty object.
fn decode<T: DeserializeOwned>(kind: CapabilityKind, value: Value) -> Result<T> {
    let value = match value {
        Value::Null => Value::Object(Map::new()),
        object @ Value::Object(_) => object,
        other => {
            return Err(BridgeError::Protocol(format!(
                "{} result must be an object, got {}",
                kind,
                type_name(&other)
            )))
        }
    };

    serde_json::from_value(value)
        .map_err(|err| BridgeError::Protocol(format!("invalid {} result: {}", kind, err)))
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireTimestamp {
    Millis(f64),
    Text(String),
}

impl WireTimestamp {
    fn resolve(self) -> Option<DateTime<Utc>> {
        match self {
            WireTimestamp::Millis(ms) if ms.is_finite() => {
                DateTime::from_timestamp_millis(ms as i64)
            }
            WireTimestamp::Millis(_) => None,
            WireTimestamp::Text(text) => DateTime::parse_from_rfc3339(&text)
                .ok()
                .map(|parsed| parsed.with_timezone(&Utc)),
        }
    }
}

fn size_or_zero(size: Option<f64>) -> u64 {
    match size {
        Some(size) if size.is_finite() && size > 0.0 => size as u64,
        _ => 0,
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireEntry {
    name: Option<String>,
    path: Option<String>,
    is_directory: Option<bool>,
    is_file: Option<bool>,
    is_symbolic_link: Option<bool>,
    size: Option<f64>,
    modified_time: Option<WireTimestamp>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireListing {
    directory: Option<String>,
    path: Option<String>,
    entries: Option<Vec<WireEntry>>,
}

/// Reshape a `list_directory` result. Entry order is preserved.
pub fn directory_listing(
    value: Value,
    requested: &str,
    clock: &dyn Clock,
) -> Result<DirectoryListResult> {
    let wire: WireListing = decode(CapabilityKind::ListDirectory, value)?;
    let directory = normalize_path(
        wire.directory
            .or(wire.path)
            .as_deref()
            .unwrap_or(requested),
    );

    let entries = wire
        .entries
        .unwrap_or_default()
        .into_iter()
        .map(|entry| directory_entry(entry, &directory, clock))
        .collect::<Result<Vec<_>>>()?;

    Ok(DirectoryListResult { directory, entries })
}

fn directory_entry(
    entry: WireEntry,
    directory: &str,
    clock: &dyn Clock,
) -> Result<DirectoryEntry> {
    let (name, path) = match (entry.name, entry.path) {
        (Some(name), Some(path)) => (name, normalize_path(&path)),
        (None, Some(path)) => {
            let path = normalize_path(&path);
            (file_name(&path).to_string(), path)
        }
        (Some(name), None) => {
            let path = format!("{}/{}", directory.trim_end_matches('/'), name);
            (name, path)
        }
        (None, None) => {
            return Err(BridgeError::Protocol(
                "directory entry has neither name nor path".to_string(),
            ))
        }
    };

    Ok(DirectoryEntry {
        name,
        path,
        is_directory: entry.is_directory.unwrap_or(false),
        is_file: entry.is_file.unwrap_or(false),
        is_symbolic_link: entry.is_symbolic_link.unwrap_or(false),
        size: size_or_zero(entry.size),
        modified_time: entry
            .modified_time
            .and_then(WireTimestamp::resolve)
            .unwrap_or_else(|| clock.now()),
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireSearchHit {
    name: Option<String>,
    path: Option<String>,
    relative_path: Option<String>,
    extension: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireSearch {
    root: Option<String>,
    count: Option<usize>,
    files: Option<Vec<WireSearchHit>>,
}

/// Reshape a `search_files` result. A missing `files` is an empty result.
pub fn search_results(value: Value, requested_root: Option<&str>) -> Result<SearchFilesResult> {
    let wire: WireSearch = decode(CapabilityKind::SearchFiles, value)?;
    let root = normalize_path(wire.root.as_deref().or(requested_root).unwrap_or_default());

    let files: Vec<FileSearchHit> = wire
        .files
        .unwrap_or_default()
        .into_iter()
        .filter_map(|hit| search_hit(hit, &root))
        .collect();

    Ok(SearchFilesResult {
        root,
        count: wire.count.unwrap_or(files.len()),
        files,
    })
}

fn search_hit(hit: WireSearchHit, root: &str) -> Option<FileSearchHit> {
    let path = hit
        .path
        .as_deref()
        .map(normalize_path)
        .or_else(|| {
            hit.relative_path
                .as_deref()
                .map(|relative| format!("{}/{}", root.trim_end_matches('/'), normalize_path(relative)))
        })?;

    let relative_path = match hit.relative_path {
        Some(relative) => normalize_path(&relative),
        None => path
            .strip_prefix(root)
            .map(|rest| rest.trim_start_matches('/').to_string())
            .unwrap_or_else(|| path.clone()),
    };

    Some(FileSearchHit {
        name: hit.name.unwrap_or_else(|| file_name(&path).to_string()),
        extension: hit.extension,
        relative_path,
        path,
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireAck {
    success: Option<bool>,
    path: Option<String>,
}

/// Reshape the acknowledgement of a path mutation (create, write, rename).
///
/// A settled, non-error response is itself the acknowledgement, so a
/// missing `success` means `true`.
pub fn path_result(kind: CapabilityKind, value: Value, requested: &str) -> Result<PathResult> {
    let wire: WireAck = decode(kind, value)?;
    Ok(PathResult {
        success: wire.success.unwrap_or(true),
        path: normalize_path(wire.path.as_deref().unwrap_or(requested)),
    })
}

pub fn delete_result(value: Value) -> Result<DeleteResult> {
    let wire: WireAck = decode(CapabilityKind::DeletePath, value)?;
    Ok(DeleteResult {
        success: wire.success.unwrap_or(true),
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireContent {
    content: Option<String>,
    data_url: Option<String>,
    path: Option<String>,
}

pub fn file_content(value: Value, requested: &str) -> Result<ReadFileResult> {
    let wire: WireContent = decode(CapabilityKind::ReadFile, value)?;
    let content = wire.content.ok_or_else(|| {
        BridgeError::Protocol("read_file result is missing content".to_string())
    })?;

    Ok(ReadFileResult {
        content,
        path: normalize_path(wire.path.as_deref().unwrap_or(requested)),
    })
}

pub fn binary_content(value: Value, requested: &str) -> Result<ReadFileBinaryResult> {
    let wire: WireContent = decode(CapabilityKind::ReadFileBinary, value)?;
    let data_url = wire.data_url.ok_or_else(|| {
        BridgeError::Protocol("read_file_binary result is missing dataUrl".to_string())
    })?;

    Ok(ReadFileBinaryResult {
        data_url,
        path: normalize_path(wire.path.as_deref().unwrap_or(requested)),
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireCommandResult {
    command: Option<String>,
    success: Option<bool>,
    exit_code: Option<i32>,
    stdout: Option<String>,
    stderr: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireExec {
    success: Option<bool>,
    results: Option<Vec<WireCommandResult>>,
}

/// Reshape an `exec_commands` result.
///
/// A command without `success` succeeded iff it exited with status 0. The
/// overall `success` defaults to "every command succeeded".
pub fn exec_result(value: Value, commands: &[String]) -> Result<ExecCommandsResult> {
    let wire: WireExec = decode(CapabilityKind::ExecCommands, value)?;

    let results: Vec<CommandResult> = wire
        .results
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(index, result)| CommandResult {
            command: result
                .command
                .or_else(|| commands.get(index).cloned())
                .unwrap_or_default(),
            success: result.success.unwrap_or(result.exit_code == Some(0)),
            exit_code: result.exit_code,
            stdout: result.stdout,
            stderr: result.stderr,
            error: result.error,
        })
        .collect();

    Ok(ExecCommandsResult {
        success: wire
            .success
            .unwrap_or_else(|| results.iter().all(|result| result.success)),
        results,
    })
}

/// Decode a relayed payload (GitHub operations) whose fields carry their own
/// serde defaults.
pub fn relay<T: DeserializeOwned>(kind: CapabilityKind, value: Value) -> Result<T> {
    decode(kind, value)
}
