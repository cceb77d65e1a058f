//! Synchronization primitives.
//!
//! All primitives are the async-aware Tokio versions: mutexes never block the
//! executor and channels support the producer/consumer shapes the transports
//! need (an `mpsc` pair per in-process channel, a `oneshot` per pending
//! request).
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::{oneshot, Mutex};
//!
//! async fn example() {
//!     let mutex = Mutex::new(1);
//!     *mutex.lock().await += 1;
//!
//!     let (tx, rx) = oneshot::channel();
//!     tx.send(*mutex.lock().await).unwrap();
//!     assert_eq!(rx.await.unwrap(), 2);
//! }
//! ```

pub use tokio::sync::{mpsc, oneshot, Mutex, MutexGuard};
