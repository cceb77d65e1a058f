//! In-process command registry.

use async_trait::async_trait;
use bridge_traits::NativeInvoke;
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::warn;

type Handler = Arc<dyn Fn(Value) -> BoxFuture<'static, Result<Value, Value>> + Send + Sync>;

/// Command table served in the same process.
///
/// Handlers resolve with the command's result or reject with any JSON value,
/// exactly as an out-of-process native host would.
#[derive(Default, Clone)]
pub struct CommandRegistry {
    handlers: HashMap<String, Handler>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F, Fut>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, Value>> + Send + 'static,
    {
        let handler: Handler = Arc::new(move |args| handler(args).boxed());
        self.handlers.insert(name.into(), handler);
    }

    pub fn with<F, Fut>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, Value>> + Send + 'static,
    {
        self.register(name, handler);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }
}

#[async_trait]
impl NativeInvoke for CommandRegistry {
    async fn invoke(&self, command: &str, args: Value) -> Result<Value, Value> {
        let Some(handler) = self.handlers.get(command) else {
            warn!("Command {} not found", command);
            return Err(Value::String(format!("Command {} not found", command)));
        };
        handler(args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[core_async::test]
    async fn test_dispatches_to_registered_handler() {
        let registry = CommandRegistry::new().with("read_file", |args: Value| async move {
            Ok(json!({ "content": "hello", "path": args["path"] }))
        });

        assert!(registry.contains("read_file"));
        let value = registry
            .invoke("read_file", json!({ "path": "/a.txt" }))
            .await
            .unwrap();
        assert_eq!(value["path"], "/a.txt");
    }

    #[core_async::test]
    async fn test_unknown_command_rejects() {
        let registry = CommandRegistry::new();
        let rejection = registry.invoke("github_me", json!({})).await.unwrap_err();
        assert_eq!(rejection, json!("Command github_me not found"));
    }
}
