//! Poll cycle tests against an in-process POP3 server.

#![allow(clippy::unwrap_used)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::mpsc::Receiver;

use common::{CountingStore, FakeServer, body_for};
use popwatch_core::{
    ChannelSink, CycleOutcome, CycleReport, MemoryStateStore, PollEvent, Poller, PollerConfig,
    SqliteStateRepository, spawn,
};
use popwatch_pop3::ErrorKind;

type TestPoller = Poller<MemoryStateStore, ChannelSink>;

fn poller(config: PollerConfig) -> (TestPoller, Receiver<PollEvent>) {
    let (sink, rx) = ChannelSink::new(16);
    let poller = Poller::new(config, MemoryStateStore::new(), sink).unwrap();
    (poller, rx)
}

async fn server_with(uids: &[&str]) -> FakeServer {
    let server = FakeServer::start().await;
    for uid in uids {
        server.add(uid);
    }
    server
}

fn completed(outcome: CycleOutcome) -> CycleReport {
    match outcome {
        CycleOutcome::Completed(report) => report,
        other => panic!("expected a completed cycle, got {other:?}"),
    }
}

fn records(event: PollEvent) -> Vec<String> {
    match event {
        PollEvent::Records(batch) => batch.into_iter().map(|r| r.uid).collect(),
        other => panic!("expected records, got {other:?}"),
    }
}

#[tokio::test]
async fn test_first_run_records_baseline() {
    let server = server_with(&["a", "b", "c"]).await;
    let (poller, mut rx) = poller(server.config());

    let report = completed(poller.poll().await);
    assert_eq!(
        report,
        CycleReport {
            listed: 3,
            emitted: 0,
            baseline: true
        }
    );

    let state = poller.store().get(poller.mailbox()).await.unwrap();
    assert!(state.initialized);
    assert_eq!(state.len(), 3);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_emit_on_start() {
    let server = server_with(&["a", "b", "c"]).await;
    let (poller, mut rx) = poller(PollerConfig {
        emit_on_start: true,
        ..server.config()
    });

    let report = completed(poller.poll().await);
    assert_eq!(report.emitted, 3);
    assert!(!report.baseline);

    match rx.recv().await.unwrap() {
        PollEvent::Records(batch) => {
            let uids: Vec<&str> = batch.iter().map(|r| r.uid.as_str()).collect();
            assert_eq!(uids, ["a", "b", "c"]);
            assert_eq!(batch[1].index, 2);
            assert_eq!(batch[1].raw, body_for("b"));
        }
        other => panic!("expected records, got {other:?}"),
    }
}

#[tokio::test]
async fn test_second_cycle_emits_nothing_without_new_mail() {
    let server = server_with(&["a", "b"]).await;
    let (poller, mut rx) = poller(PollerConfig {
        emit_on_start: true,
        ..server.config()
    });

    assert_eq!(completed(poller.poll().await).emitted, 2);
    assert_eq!(records(rx.recv().await.unwrap()).len(), 2);

    let report = completed(poller.poll().await);
    assert_eq!(report.listed, 2);
    assert_eq!(report.emitted, 0);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_only_new_messages_are_emitted() {
    let server = server_with(&["old-1", "old-2"]).await;
    let (poller, mut rx) = poller(server.config());

    assert!(completed(poller.poll().await).baseline);

    server.add("new-1");
    let report = completed(poller.poll().await);
    assert_eq!(report.emitted, 1);
    assert_eq!(records(rx.recv().await.unwrap()), ["new-1"]);
}

#[tokio::test]
async fn test_limit_caps_each_cycle() {
    let uids: Vec<String> = (0..20).map(|i| format!("u{i:02}")).collect();
    let server = FakeServer::start().await;
    for uid in &uids {
        server.add(uid);
    }
    let (poller, mut rx) = poller(PollerConfig {
        emit_on_start: true,
        limit: 10,
        ..server.config()
    });

    assert_eq!(completed(poller.poll().await).emitted, 10);
    assert_eq!(records(rx.recv().await.unwrap()), uids[..10]);

    let state = poller.store().get(poller.mailbox()).await.unwrap();
    assert_eq!(state.len(), 10);
    assert!(uids[..10].iter().all(|uid| state.contains(uid)));
    assert!(!state.contains("u10"));

    assert_eq!(completed(poller.poll().await).emitted, 10);
    assert_eq!(records(rx.recv().await.unwrap()), uids[10..]);
}

#[tokio::test]
async fn test_retrieve_failure_keeps_earlier_progress() {
    let server = server_with(&["m1", "m2", "m3", "m4", "m5"]).await;
    server.fail_retrieve("m3");
    let (poller, mut rx) = poller(PollerConfig {
        emit_on_start: true,
        ..server.config()
    });

    let CycleOutcome::Failed(err) = poller.poll().await else {
        panic!("expected the cycle to fail");
    };
    assert_eq!(err.pop3_kind(), Some(ErrorKind::Command));

    assert_eq!(records(rx.recv().await.unwrap()), ["m1", "m2"]);
    assert!(matches!(rx.recv().await.unwrap(), PollEvent::Failed(_)));

    let state = poller.store().get(poller.mailbox()).await.unwrap();
    assert!(state.initialized);
    assert_eq!(state.len(), 2);
    assert!(state.contains("m1") && state.contains("m2"));
    assert!(!state.contains("m3") && !state.contains("m4") && !state.contains("m5"));
}

#[tokio::test]
async fn test_delete_after_emit() {
    let server = server_with(&["a", "b"]).await;
    let (poller, mut rx) = poller(PollerConfig {
        emit_on_start: true,
        delete_after_emit: true,
        ..server.config()
    });

    assert_eq!(completed(poller.poll().await).emitted, 2);
    assert_eq!(records(rx.recv().await.unwrap()).len(), 2);
    assert!(server.uids().is_empty());
}

#[tokio::test]
async fn test_delete_failure_keeps_earlier_progress() {
    let server = server_with(&["m1", "m2", "m3"]).await;
    server.fail_delete("m2");
    let (poller, mut rx) = poller(PollerConfig {
        emit_on_start: true,
        delete_after_emit: true,
        ..server.config()
    });

    let CycleOutcome::Failed(err) = poller.poll().await else {
        panic!("expected the cycle to fail");
    };
    assert_eq!(err.pop3_kind(), Some(ErrorKind::Command));

    // m2 was retrieved before its DELE failed, so it is still delivered
    assert_eq!(records(rx.recv().await.unwrap()), ["m1", "m2"]);
    assert!(matches!(rx.recv().await.unwrap(), PollEvent::Failed(_)));

    let state = poller.store().get(poller.mailbox()).await.unwrap();
    assert_eq!(state.len(), 2);
    assert!(state.contains("m1") && state.contains("m2"));
    assert!(!state.contains("m3"));

    assert_eq!(server.retrieved(), ["m1", "m2"]);
    assert_eq!(server.uids(), ["m2", "m3"]);
}

#[tokio::test]
async fn test_baseline_does_not_delete() {
    let server = server_with(&["a", "b"]).await;
    let (poller, _rx) = poller(PollerConfig {
        delete_after_emit: true,
        ..server.config()
    });

    assert!(completed(poller.poll().await).baseline);
    assert_eq!(server.uids(), ["a", "b"]);
}

#[tokio::test]
async fn test_auth_failure_is_reported() {
    let server = server_with(&["a"]).await;
    let (poller, mut rx) = poller(PollerConfig {
        password: "wrong".into(),
        ..server.config()
    });

    let CycleOutcome::Failed(err) = poller.poll().await else {
        panic!("expected the cycle to fail");
    };
    assert_eq!(err.pop3_kind(), Some(ErrorKind::Auth));

    let PollEvent::Failed(message) = rx.recv().await.unwrap() else {
        panic!("expected a failure event");
    };
    assert!(message.contains("invalid password"));

    let state = poller.store().get(poller.mailbox()).await.unwrap();
    assert!(!state.initialized);
    assert!(state.is_empty());
}

#[tokio::test]
async fn test_connect_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let config = PollerConfig {
        port: Some(port),
        secure: false,
        timeout_secs: 2,
        ..PollerConfig::new("127.0.0.1", "alice", "pw")
    };
    let (poller, _rx) = poller(config);

    let CycleOutcome::Failed(err) = poller.poll().await else {
        panic!("expected the cycle to fail");
    };
    assert_eq!(err.pop3_kind(), Some(ErrorKind::Connect));
}

#[tokio::test]
async fn test_overlapping_poll_is_skipped() {
    let server = server_with(&["a"]).await;
    server.set_greeting_delay(Duration::from_millis(300));

    let (sink, _rx) = ChannelSink::new(4);
    let poller = Poller::new(server.config(), CountingStore::default(), sink).unwrap();

    let (first, second) = tokio::join!(poller.poll(), poller.poll());
    assert!(matches!(first, CycleOutcome::Completed(_)));
    assert!(second.is_skipped());

    assert_eq!(server.connections(), 1);
    assert_eq!(poller.store().loads(), 1);
    assert_eq!(poller.store().saves(), 1);
}

#[tokio::test]
async fn test_scheduler_runs_first_cycle_immediately() {
    let server = server_with(&["a"]).await;
    let (poller, mut rx) = poller(PollerConfig {
        emit_on_start: true,
        ..server.config()
    });

    let handle = spawn(Arc::new(poller));
    let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(records(event), ["a"]);

    // The scheduled cycle may still hold the lock right after delivering
    server.add("b");
    let outcome = loop {
        let outcome = handle.trigger().await;
        if !outcome.is_skipped() {
            break outcome;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    };
    let report = completed(outcome);
    assert_eq!(report.emitted, 1);
    assert_eq!(records(rx.recv().await.unwrap()), ["b"]);

    handle.stop().await;
    let connections = server.connections();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(server.connections(), connections);
}

#[tokio::test]
async fn test_sqlite_state_across_cycles() {
    let server = server_with(&["a"]).await;
    let (sink, mut rx) = ChannelSink::new(4);
    let store = SqliteStateRepository::in_memory().await.unwrap();
    let poller = Poller::new(server.config(), store, sink).unwrap();

    assert!(completed(poller.poll().await).baseline);
    server.add("b");
    assert_eq!(completed(poller.poll().await).emitted, 1);
    assert_eq!(records(rx.recv().await.unwrap()), ["b"]);

    let state = poller.store().get(poller.mailbox()).await.unwrap();
    assert!(state.contains("a") && state.contains("b"));
}
