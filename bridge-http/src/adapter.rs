//! HTTP backend adapter.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    CapabilityBackend, CapabilityKind, HttpClient, HttpRequest, HttpResponse, Payload,
};
use core_bridge::reshape::error_message;
use core_bridge::{run_with_deadline, CancelHook, TimeoutPolicy};
use reqwest::{StatusCode, Url};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::data_url::{data_url, media_type, mime_for_path};
use crate::routes::{route, RouteParams};

/// [`CapabilityBackend`] for a remote server's REST API.
pub struct HttpAdapter {
    client: Arc<dyn HttpClient>,
    base_url: Url,
    timeouts: TimeoutPolicy,
    on_cancel: Option<CancelHook>,
}

impl HttpAdapter {
    /// # Errors
    ///
    /// `base_url` must be an absolute `http` or `https` URL.
    pub fn new(client: Arc<dyn HttpClient>, base_url: &str, timeouts: TimeoutPolicy) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| BridgeError::NotAvailable(format!("invalid base URL {}: {}", base_url, e)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(BridgeError::NotAvailable(format!(
                "unsupported base URL scheme: {}",
                base_url.scheme()
            )));
        }

        Ok(Self {
            client,
            base_url,
            timeouts,
            on_cancel: None,
        })
    }

    pub fn with_cancel_hook(mut self, hook: CancelHook) -> Self {
        self.on_cancel = Some(hook);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let joined = format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path);
        Url::parse(&joined).map_err(|e| BridgeError::Protocol(format!("invalid URL {}: {}", joined, e)))
    }

    fn build_request(&self, kind: CapabilityKind, payload: &Payload) -> Result<HttpRequest> {
        let route = route(kind);
        let mut url = self.endpoint(route.path)?;

        if let RouteParams::Query(pairs) = route.params {
            let mut query = url.query_pairs_mut();
            for (name, key) in pairs {
                if let Some(value) = payload.get(*key).and_then(query_value) {
                    query.append_pair(name, &value);
                }
            }
        }
        // An empty query leaves a dangling `?`.
        if url.query() == Some("") {
            url.set_query(None);
        }

        let request = HttpRequest::new(route.method, url.as_str()).header("Accept", "application/json");
        match route.params {
            RouteParams::Json => request.json(payload),
            RouteParams::Query(_) | RouteParams::Empty => Ok(request),
        }
    }

    /// Interpret a response for `kind`. `path` is the requested file for reads.
    fn interpret(&self, kind: CapabilityKind, path: Option<&str>, response: HttpResponse) -> Result<Value> {
        if !response.is_success() {
            return Err(status_error(kind, &response));
        }

        match kind {
            CapabilityKind::ReadFile => Ok(json!({
                "content": response.text()?,
                "path": path,
            })),
            CapabilityKind::ReadFileBinary => {
                let path = path.unwrap_or_default();
                let mime = response
                    .header("Content-Type")
                    .and_then(media_type)
                    .unwrap_or_else(|| mime_for_path(path));
                Ok(json!({
                    "dataUrl": data_url(mime, &response.body),
                    "path": path,
                }))
            }
            _ if response.body.iter().all(u8::is_ascii_whitespace) => Ok(Value::Null),
            _ => response.json(),
        }
    }
}

fn query_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// Non-2xx response to [`BridgeError::Remote`] with code `HTTP_<status>`.
fn status_error(kind: CapabilityKind, response: &HttpResponse) -> BridgeError {
    let status = response.status;
    let from_body = response
        .json::<Value>()
        .ok()
        .and_then(|body| body.as_object().and_then(error_message));
    let message = from_body.unwrap_or_else(|| {
        StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", status))
    });

    warn!(status, %kind, "HTTP request failed: {}", message);
    BridgeError::remote(
        Some(&message),
        Some(format!("HTTP_{}", status)),
        kind.failure_message(),
    )
}

#[async_trait]
impl CapabilityBackend for HttpAdapter {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn call(&self, kind: CapabilityKind, payload: Payload) -> Result<Value> {
        let request = self.build_request(kind, &payload)?;
        let path = payload.get("path").and_then(Value::as_str);
        debug!(%kind, url = %request.url, "Dispatching HTTP capability");

        run_with_deadline(
            kind,
            self.timeouts.for_kind(kind),
            self.on_cancel.as_ref(),
            async {
                let response = self.client.execute(request).await?;
                self.interpret(kind, path, response)
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::HttpMethod;
    use bytes::Bytes;
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        Client {}

        #[async_trait]
        impl HttpClient for Client {
            async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
        }
    }

    fn response(status: u16, body: &'static [u8]) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from_static(body),
        }
    }

    fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            _ => Payload::new(),
        }
    }

    fn adapter(client: MockClient) -> HttpAdapter {
        HttpAdapter::new(Arc::new(client), "http://localhost:3000/", TimeoutPolicy::default()).unwrap()
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let client: Arc<dyn HttpClient> = Arc::new(MockClient::new());
        assert!(HttpAdapter::new(client.clone(), "not a url", TimeoutPolicy::default()).is_err());
        assert!(HttpAdapter::new(client, "ftp://host", TimeoutPolicy::default()).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_encodes_query() {
        let mut client = MockClient::new();
        client
            .expect_execute()
            .withf(|request| {
                let url = Url::parse(&request.url).unwrap();
                let query: HashMap<_, _> = url.query_pairs().into_owned().collect();
                request.method == HttpMethod::Get
                    && url.path() == "/api/fs/search"
                    && query.get("q").map(String::as_str) == Some("main rs")
                    && query.get("limit").map(String::as_str) == Some("60")
                    && query.get("includeHidden").map(String::as_str) == Some("false")
                    && !query.contains_key("directory")
                    && request.body.is_none()
            })
            .times(1)
            .returning(|_| Ok(response(200, br#"{"root":"/","count":0,"files":[]}"#)));

        let value = adapter(client)
            .call(
                CapabilityKind::SearchFiles,
                payload(json!({ "query": "main rs", "maxResults": 60, "includeHidden": false })),
            )
            .await
            .unwrap();
        assert_eq!(value["count"], 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_writes_send_json_body() {
        let mut client = MockClient::new();
        client
            .expect_execute()
            .withf(|request| {
                let body: Value = serde_json::from_slice(request.body.as_deref().unwrap_or_default()).unwrap();
                request.method == HttpMethod::Post
                    && request.url == "http://localhost:3000/api/fs/write"
                    && body == json!({ "path": "/a.txt", "content": "x" })
            })
            .times(1)
            .returning(|_| Ok(response(200, br#"{"success":true,"path":"/a.txt"}"#)));

        let value = adapter(client)
            .call(CapabilityKind::WriteFile, payload(json!({ "path": "/a.txt", "content": "x" })))
            .await
            .unwrap();
        assert_eq!(value["success"], true);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_file_wraps_text_body() {
        let mut client = MockClient::new();
        client
            .expect_execute()
            .returning(|_| Ok(response(200, b"fn main() {}\n")));

        let value = adapter(client)
            .call(CapabilityKind::ReadFile, payload(json!({ "path": "/src/main.rs" })))
            .await
            .unwrap();
        assert_eq!(value, json!({ "content": "fn main() {}\n", "path": "/src/main.rs" }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_binary_builds_data_url() {
        let mut client = MockClient::new();
        client.expect_execute().returning(|_| Ok(response(200, b"hi")));

        let value = adapter(client)
            .call(CapabilityKind::ReadFileBinary, payload(json!({ "path": "/img/logo.png" })))
            .await
            .unwrap();
        assert_eq!(value["dataUrl"], "data:image/png;base64,aGk=");
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_errors() {
        let mut client = MockClient::new();
        client
            .expect_execute()
            .times(1)
            .returning(|_| Ok(response(404, br#"{"error":"File not found"}"#)));
        let err = adapter(client)
            .call(CapabilityKind::ReadFile, payload(json!({ "path": "/nope" })))
            .await
            .unwrap_err();
        assert_eq!(err.message(), "File not found");
        assert_eq!(err.code(), Some("HTTP_404"));

        let mut client = MockClient::new();
        client
            .expect_execute()
            .times(1)
            .returning(|_| Ok(response(502, b"<html>bad gateway</html>")));
        let err = adapter(client)
            .call(CapabilityKind::GitHubMe, Payload::new())
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Bad Gateway");
        assert_eq!(err.code(), Some("HTTP_502"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_uses_delete_and_empty_body() {
        let mut client = MockClient::new();
        client
            .expect_execute()
            .withf(|request| {
                request.method == HttpMethod::Delete
                    && request.url == "http://localhost:3000/api/github/auth"
                    && request.body.is_none()
            })
            .times(1)
            .returning(|_| Ok(response(200, b"")));

        let value = adapter(client)
            .call(CapabilityKind::GitHubAuthDisconnect, Payload::new())
            .await
            .unwrap();
        assert!(value.is_null());
    }
}
