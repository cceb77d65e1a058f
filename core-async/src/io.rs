//! Async I/O traits and utilities.
//!
//! Stream-backed transports (for example newline-delimited JSON over a child
//! process pipe) are written against these re-exports.

pub use tokio::io::{
    duplex, AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt,
    BufReader, BufWriter, DuplexStream,
};
