//! The embedded backend end to end: facade, correlator and an in-process host.

use bridge_embedded::{json_lines_inbound, EmbeddedAdapter, HostEndpoint, JsonLinesChannel, MemoryChannel};
use bridge_traits::{
    error::BridgeError, CapabilityKind, CapabilityRequest, CapabilityResponse, FilesApi,
    ListDirectoryOptions,
};
use core_bridge::{CapabilityFacade, TimeoutPolicy};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

async fn wire() -> (Arc<CapabilityFacade<Arc<EmbeddedAdapter>>>, HostEndpoint) {
    let (channel, host) = MemoryChannel::new(16);
    let inbound = channel.take_inbound().await.unwrap();
    let adapter = Arc::new(EmbeddedAdapter::new(Arc::new(channel), TimeoutPolicy::default()));
    adapter.attach(inbound);
    (Arc::new(CapabilityFacade::new(adapter)), host)
}

#[tokio::test(start_paused = true)]
async fn list_directory_round_trips_through_the_channel() {
    let (facade, mut host) = wire().await;

    let host_task = tokio::spawn(async move {
        let request = host.next_request().await.unwrap();
        assert_eq!(request.kind, CapabilityKind::ListDirectory);
        assert_eq!(request.payload["path"], "C:/proj");
        assert_eq!(request.payload["respectGitignore"], true);

        host.respond(CapabilityResponse::success(
            request.id,
            json!({ "directory": "C:\\proj", "entries": [{ "name": "a.txt", "isFile": true }] }),
        ))
        .await
        .unwrap();
        host
    });

    let listing = facade
        .list_directory("C:\\proj", ListDirectoryOptions { respect_gitignore: true })
        .await
        .unwrap();
    let _host = host_task.await.unwrap();

    assert_eq!(listing.directory, "C:/proj");
    assert_eq!(listing.entries[0].path, "C:/proj/a.txt");
    assert_eq!(listing.entries[0].size, 0);
}

#[tokio::test(start_paused = true)]
async fn unanswered_exec_times_out_and_late_answer_is_ignored() {
    let (facade, mut host) = wire().await;

    let call = {
        let facade = Arc::clone(&facade);
        tokio::spawn(async move {
            facade
                .exec_commands(&["echo hi".to_string()], "/tmp")
                .await
        })
    };

    let request: CapabilityRequest = host.next_request().await.unwrap();
    let err = call.await.unwrap().unwrap_err();
    assert_eq!(
        err,
        BridgeError::Timeout {
            kind: "exec_commands".into(),
            timeout_ms: 120_000
        }
    );

    host.respond(CapabilityResponse::success(
        request.id,
        json!({ "success": true, "results": [] }),
    ))
    .await
    .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(facade.backend().correlator().pending_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_host_rejects_pending_calls() {
    let (facade, mut host) = wire().await;

    let call = {
        let facade = Arc::clone(&facade);
        tokio::spawn(async move { facade.read_file("/a.txt").await })
    };

    host.next_request().await.unwrap();
    drop(host);

    let err = call.await.unwrap().unwrap_err();
    assert_eq!(err, BridgeError::transport_closed("inbound stream ended"));
    assert!(facade.backend().correlator().is_closed());
}

#[tokio::test(start_paused = true)]
async fn failure_without_message_gets_default() {
    let (facade, mut host) = wire().await;

    tokio::spawn(async move {
        let request = host.next_request().await.unwrap();
        host.send_raw(json!({ "id": request.id.to_string(), "ok": true, "result": { "success": false } }))
            .await
            .unwrap();
        host
    });

    let err = facade.write_file("/a.txt", "x").await.unwrap_err();
    assert!(matches!(err, BridgeError::Remote { .. }));
    assert_eq!(err.message(), "Failed to write file");
}

#[tokio::test(start_paused = true)]
async fn json_lines_transport_end_to_end() {
    let (bridge_out, host_in) = tokio::io::duplex(4096);
    let (host_out, bridge_in) = tokio::io::duplex(4096);

    let adapter = Arc::new(EmbeddedAdapter::new(
        Arc::new(JsonLinesChannel::new(bridge_out)),
        TimeoutPolicy::default(),
    ));
    adapter.attach(json_lines_inbound(bridge_in));
    let facade = CapabilityFacade::new(Arc::clone(&adapter));

    tokio::spawn(async move {
        use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

        let mut lines = BufReader::new(host_in).lines();
        let mut host_out = host_out;
        while let Some(line) = lines.next_line().await.unwrap() {
            let request: CapabilityRequest = serde_json::from_str(&line).unwrap();
            let response = CapabilityResponse::success(
                request.id,
                json!({ "content": "hello", "path": request.payload["path"] }),
            );
            let mut out = serde_json::to_vec(&response).unwrap();
            out.push(b'\n');
            host_out.write_all(&out).await.unwrap();
        }
    });

    let file = facade.read_file("D:\\notes.md").await.unwrap();
    assert_eq!(file.content, "hello");
    assert_eq!(file.path, "D:/notes.md");
}

#[tokio::test(start_paused = true)]
async fn stalled_channel_times_out_within_budget() {
    use bridge_traits::{CapabilityBackend, Payload};
    use core_bridge::{CancelEvent, CancelHook, CancelReason};
    use std::sync::Mutex;

    // Room for one envelope; the host never reads, so the second post blocks.
    let (channel, _host) = MemoryChannel::new(1);
    let reasons = Arc::new(Mutex::new(Vec::new()));
    let hook: CancelHook = {
        let reasons = Arc::clone(&reasons);
        Arc::new(move |event: CancelEvent| reasons.lock().unwrap().push(event.reason))
    };
    let adapter = EmbeddedAdapter::new(Arc::new(channel), TimeoutPolicy::default())
        .with_cancel_hook(hook);

    let mut payload = Payload::new();
    payload.insert("path".into(), json!("/a.txt"));
    let err = adapter
        .call(CapabilityKind::ReadFile, payload)
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some("TIMEOUT"));

    let started = tokio::time::Instant::now();
    let mut payload = Payload::new();
    payload.insert("path".into(), json!("/repo"));
    let second = tokio::time::timeout(
        Duration::from_secs(600),
        adapter.call(CapabilityKind::ListDirectory, payload),
    )
    .await
    .expect("a blocked post must not outlive the budget");

    assert_eq!(
        second.unwrap_err(),
        BridgeError::Timeout {
            kind: "list_directory".into(),
            timeout_ms: 10_000
        }
    );
    let waited = started.elapsed();
    assert!(waited >= Duration::from_secs(10) && waited < Duration::from_secs(11), "{waited:?}");
    assert_eq!(
        *reasons.lock().unwrap(),
        vec![CancelReason::Timeout, CancelReason::Timeout]
    );
    assert_eq!(adapter.correlator().pending_count(), 0);
}
