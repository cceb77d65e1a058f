//! Time-related abstractions.
//!
//! Re-exports `tokio::time` so that request deadlines in the bridge run on the
//! same timer wheel as the host executor. Tests that pause the Tokio clock
//! therefore also pause every correlator timer.
//!
//! # Examples
//!
//! ```rust
//! use core_async::time::{sleep, Duration, Instant};
//!
//! async fn example() {
//!     let start = Instant::now();
//!     sleep(Duration::from_millis(5)).await;
//!     let _elapsed = start.elapsed();
//! }
//! ```

pub use tokio::time::{error::Elapsed, sleep, timeout, Sleep, Timeout};

pub use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Returns the current time as milliseconds since UNIX_EPOCH.
///
/// Clocks set before the epoch report `0` rather than panicking.
///
/// ```rust
/// use core_async::time::now_millis;
///
/// assert!(now_millis() > 0);
/// ```
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
