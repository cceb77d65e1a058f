//! Newline-delimited JSON over async byte streams.
//!
//! Useful when the embedded host is a child process or socket: each message
//! is one JSON document followed by `\n`.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    ChannelTransport,
};
use core_async::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use core_async::sync::Mutex;
use futures::{future, Stream, StreamExt};
use serde_json::Value;
use tokio_util::codec::{FramedRead, LinesCodec};
use tracing::warn;

/// Longest accepted inbound line, in bytes.
pub const MAX_LINE_LENGTH: usize = 16 * 1024 * 1024;

/// Outbound half: one JSON document per line.
pub struct JsonLinesChannel<W> {
    writer: Mutex<W>,
}

impl<W> JsonLinesChannel<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

#[async_trait]
impl<W> ChannelTransport for JsonLinesChannel<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn post(&self, message: Value) -> Result<()> {
        let mut line = serde_json::to_vec(&message)?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer
            .write_all(&line)
            .await
            .map_err(|e| BridgeError::Transport(format!("write failed: {}", e)))?;
        writer
            .flush()
            .await
            .map_err(|e| BridgeError::Transport(format!("flush failed: {}", e)))
    }
}

/// Inbound half: decode one JSON document per line.
///
/// Blank lines are ignored and lines that are not JSON are logged and
/// skipped. The stream ends at EOF or on the first read error.
pub fn json_lines_inbound<R>(reader: R) -> impl Stream<Item = Value> + Send + 'static
where
    R: AsyncRead + Unpin + Send + 'static,
{
    FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_LINE_LENGTH))
        .take_while(|line| {
            if let Err(err) = line {
                warn!("Inbound channel read failed: {}", err);
            }
            future::ready(line.is_ok())
        })
        .filter_map(|line| {
            let parsed = match line {
                Ok(line) if line.trim().is_empty() => None,
                Ok(line) => match serde_json::from_str::<Value>(&line) {
                    Ok(value) => Some(value),
                    Err(err) => {
                        warn!("Skipping inbound line that is not JSON: {}", err);
                        None
                    }
                },
                Err(_) => None,
            };
            future::ready(parsed)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_async::io::{duplex, AsyncBufReadExt, BufReader};

    #[core_async::test]
    async fn test_post_writes_one_line_per_message() {
        let (client, server) = duplex(1024);
        let channel = JsonLinesChannel::new(client);

        channel.post(serde_json::json!({ "a": 1 })).await.unwrap();
        channel.post(serde_json::json!({ "b": 2 })).await.unwrap();

        let mut lines = BufReader::new(server).lines();
        assert_eq!(lines.next_line().await.unwrap().unwrap(), r#"{"a":1}"#);
        assert_eq!(lines.next_line().await.unwrap().unwrap(), r#"{"b":2}"#);
    }

    #[core_async::test]
    async fn test_inbound_skips_noise_and_ends_at_eof() {
        let input: &[u8] = b"{\"id\":1}\n\nnot json\n{\"id\":2}\n";
        let messages: Vec<Value> = json_lines_inbound(input).collect().await;

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["id"], 1);
        assert_eq!(messages[1]["id"], 2);
    }
}
