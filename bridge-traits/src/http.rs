//! HTTP Client Abstraction
//!
//! Minimal request/response model used by the HTTP backend. Implementations
//! must not retry: a capability call maps to exactly one request.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;

use crate::error::{BridgeError, Result};

/// HTTP method types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// HTTP request builder
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Bytes>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
        }
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        let json = serde_json::to_vec(body)
            .map_err(|e| BridgeError::Protocol(format!("JSON serialization failed: {}", e)))?;
        self.body = Some(Bytes::from(json));
        self.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        Ok(self)
    }

}

/// HTTP response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl HttpResponse {
    /// Parse response body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| BridgeError::Protocol(format!("JSON deserialization failed: {}", e)))
    }

    /// Get response body as UTF-8 string
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| BridgeError::Protocol(format!("Invalid UTF-8: {}", e)))
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Check if response status is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Async HTTP client trait
///
/// Implementations convert network failures into
/// [`BridgeError::Transport`]. Non-2xx statuses are returned as responses,
/// not errors; the caller decides how to report them.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_request_builder() {
        let request = HttpRequest::new(HttpMethod::Post, "http://localhost/api/fs/write")
            .header("Accept", "application/json")
            .json(&serde_json::json!({ "path": "/a" }))
            .unwrap();

        assert_eq!(request.url, "http://localhost/api/fs/write");
        assert_eq!(
            request.headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
        assert_eq!(request.body.as_deref(), Some(&br#"{"path":"/a"}"#[..]));
    }

    #[test]
    fn test_http_response_helpers() {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "image/png".to_string());
        let response = HttpResponse {
            status: 404,
            headers,
            body: Bytes::from_static(b"{\"error\":\"missing\"}"),
        };

        assert!(!response.is_success());
        assert_eq!(response.header("Content-Type"), Some("image/png"));
        let body: serde_json::Value = response.json().unwrap();
        assert_eq!(body["error"], "missing");
    }

    #[test]
    fn test_invalid_json_is_protocol_error() {
        let response = HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: Bytes::from_static(b"<html>"),
        };
        let err = response.json::<serde_json::Value>().unwrap_err();
        assert_eq!(err.code(), Some("PROTOCOL"));
    }
}
