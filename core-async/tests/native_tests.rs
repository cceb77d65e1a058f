//! Integration tests for core-async on native platforms.
//!
//! These tests verify that the runtime facade behaves like the Tokio
//! primitives it re-exports.

use core_async::{sync, task, time};
use std::sync::Arc;

#[core_async::test]
async fn test_task_spawn() {
    let handle = task::spawn(async { 42 });
    let result = handle.await.unwrap();
    assert_eq!(result, 42);
}

#[core_async::test]
async fn test_task_spawn_blocking() {
    let handle = task::spawn_blocking(|| {
        std::thread::sleep(std::time::Duration::from_millis(10));
        100
    });
    let result = handle.await.unwrap();
    assert_eq!(result, 100);
}

#[core_async::test]
async fn test_sleep() {
    let start = time::Instant::now();
    time::sleep(time::Duration::from_millis(50)).await;
    let elapsed = start.elapsed();
    assert!(elapsed >= time::Duration::from_millis(50));
}

#[core_async::test]
async fn test_timeout_success() {
    let result = time::timeout(time::Duration::from_millis(100), async {
        time::sleep(time::Duration::from_millis(10)).await;
        42
    })
    .await;

    assert_eq!(result.unwrap(), 42);
}

#[core_async::test]
async fn test_timeout_failure() {
    let result = time::timeout(time::Duration::from_millis(10), async {
        time::sleep(time::Duration::from_millis(100)).await;
        42
    })
    .await;

    assert!(result.is_err());
}

#[core_async::test]
async fn test_mutex() {
    let mutex = Arc::new(sync::Mutex::new(0));
    let mutex_clone = mutex.clone();

    let handle = task::spawn(async move {
        let mut guard = mutex_clone.lock().await;
        *guard += 1;
    });

    handle.await.unwrap();

    let guard = mutex.lock().await;
    assert_eq!(*guard, 1);
}

#[core_async::test]
async fn test_mpsc_channel() {
    let (tx, mut rx) = sync::mpsc::channel(10);

    task::spawn(async move {
        for i in 0..5 {
            tx.send(i).await.unwrap();
        }
    });

    let mut sum = 0;
    while let Some(value) = rx.recv().await {
        sum += value;
    }

    assert_eq!(sum, 10);
}

#[core_async::test]
async fn test_oneshot_channel() {
    let (tx, rx) = sync::oneshot::channel();

    task::spawn(async move {
        time::sleep(time::Duration::from_millis(10)).await;
        tx.send(42).unwrap();
    });

    assert_eq!(rx.await.unwrap(), 42);
}

#[core_async::test]
async fn test_oneshot_dropped_sender_is_observable() {
    let (tx, rx) = sync::oneshot::channel::<u32>();
    drop(tx);
    assert!(rx.await.is_err());
}

#[test]
fn test_now_millis() {
    assert!(time::now_millis() > 1_600_000_000_000);
}

#[test]
fn test_block_on() {
    let value = core_async::runtime::block_on(async { 7 });
    assert_eq!(value, 7);
}
