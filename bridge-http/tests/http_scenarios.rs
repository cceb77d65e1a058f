//! The HTTP backend behind the capability facade, against a scripted server.

use async_trait::async_trait;
use bridge_http::HttpAdapter;
use bridge_traits::{
    error::{BridgeError, Result},
    FilesApi, GitHubApi, HttpClient, HttpRequest, HttpResponse, ListDirectoryOptions, MergeMethod,
};
use bytes::Bytes;
use core_bridge::{CapabilityFacade, TimeoutPolicy};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

type Script = Box<dyn Fn(&HttpRequest) -> Option<(u16, Value)> + Send + Sync>;

/// Answers requests from a script; `None` means the server never answers.
struct ScriptedServer {
    script: Script,
    seen: Mutex<Vec<HttpRequest>>,
}

impl ScriptedServer {
    fn new(script: impl Fn(&HttpRequest) -> Option<(u16, Value)> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            script: Box::new(script),
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl HttpClient for ScriptedServer {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.seen.lock().unwrap().push(request.clone());
        match (self.script)(&request) {
            Some((status, body)) => Ok(HttpResponse {
                status,
                headers: HashMap::new(),
                body: Bytes::from(serde_json::to_vec(&body).unwrap()),
            }),
            None => std::future::pending().await,
        }
    }
}

fn facade(server: Arc<ScriptedServer>) -> CapabilityFacade<HttpAdapter> {
    CapabilityFacade::new(
        HttpAdapter::new(server, "https://dev.example.test", TimeoutPolicy::default()).unwrap(),
    )
}

#[tokio::test(start_paused = true)]
async fn list_directory_normalizes_windows_paths() {
    let server = ScriptedServer::new(|_| {
        Some((
            200,
            json!({
                "directory": "C:\\proj",
                "entries": [{ "name": "src", "path": "C:\\proj\\src", "isDirectory": true }]
            }),
        ))
    });

    let listing = facade(Arc::clone(&server))
        .list_directory("C:\\proj", ListDirectoryOptions { respect_gitignore: true })
        .await
        .unwrap();

    assert_eq!(listing.directory, "C:/proj");
    assert_eq!(listing.entries[0].path, "C:/proj/src");

    let seen = server.seen.lock().unwrap();
    assert_eq!(
        seen[0].url,
        "https://dev.example.test/api/fs/list?path=C%3A%2Fproj&respectGitignore=true"
    );
}

#[tokio::test(start_paused = true)]
async fn success_false_without_message_gets_default() {
    let server = ScriptedServer::new(|_| Some((200, json!({ "success": false }))));
    let err = facade(server).create_directory("/tmp/new").await.unwrap_err();

    assert!(matches!(err, BridgeError::Remote { .. }));
    assert_eq!(err.message(), "Failed to create directory");
}

#[tokio::test(start_paused = true)]
async fn unanswered_exec_times_out() {
    let server = ScriptedServer::new(|_| None);
    let err = facade(server)
        .exec_commands(&["echo hi".to_string()], "/tmp")
        .await
        .unwrap_err();

    assert_eq!(
        err,
        BridgeError::Timeout {
            kind: "exec_commands".into(),
            timeout_ms: 120_000
        }
    );
}

#[tokio::test(start_paused = true)]
async fn pr_merge_posts_method() {
    let server = ScriptedServer::new(|request| {
        let body: Value = serde_json::from_slice(request.body.as_deref()?).ok()?;
        (body["method"] == "squash" && body["number"] == 7)
            .then(|| (200, json!({ "merged": true, "message": "Pull Request successfully merged" })))
    });

    let result = facade(server)
        .pr_merge("/repo", 7, MergeMethod::Squash)
        .await
        .unwrap();
    assert!(result.merged);
}

#[tokio::test(start_paused = true)]
async fn unauthorized_maps_to_http_code() {
    let server = ScriptedServer::new(|_| Some((401, json!({ "error": "GitHub not connected" }))));
    let err = facade(server).me().await.unwrap_err();

    assert_eq!(err.message(), "GitHub not connected");
    assert_eq!(err.code(), Some("HTTP_401"));
}
