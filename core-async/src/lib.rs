//! Runtime abstraction layer for the host bridge crates.
//!
//! The bridge crates (`core-bridge`, `bridge-native`, `bridge-embedded`,
//! `bridge-http`) depend on this crate instead of naming Tokio directly. That
//! keeps the executor an implementation detail of the host: every timer,
//! channel and spawned task used by the correlator goes through here.
//!
//! # Modules
//!
//! - `task`: Task spawning and execution
//! - `time`: Time-related operations (sleep, timeout, instant)
//! - `sync`: Synchronization primitives (Mutex, channels)
//! - `io`: Async byte-stream traits used by stream-backed transports
//! - `runtime`: `block_on` and runtime handles
//!
//! # Examples
//!
//! ```rust
//! use core_async::task;
//! use core_async::time::{sleep, Duration};
//!
//! async fn example() {
//!     let handle = task::spawn(async {
//!         sleep(Duration::from_millis(10)).await;
//!         42
//!     });
//!     assert_eq!(handle.await.unwrap(), 42);
//! }
//! ```

// Re-export the async entry-point/test macros so downstream crates never need
// direct Tokio dependencies.
pub use core_async_macros::{main, test};

pub mod io;
pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

pub use task::spawn;
pub use time::{sleep, Duration, Instant};
