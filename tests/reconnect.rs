//! Integration test: a dropped connection is re-established after the policy
//! delay and existing subscriptions keep receiving frames.

use livelog::demo::{demo_record, DemoSettings, DemoTransport};
use livelog::model::{ClientId, MessageKind};
use livelog::pipeline::{LivePipeline, PipelineSettings};
use livelog::session::{
    ConnectTarget, ConnectionSession, ConnectionStatus, ReconnectPolicy, SessionConfig,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn demo_session(policy: ReconnectPolicy) -> (ConnectionSession, DemoTransport) {
    let transport = DemoTransport::new(DemoSettings {
        interval: Duration::from_millis(10),
        frames_per_connection: Some(3),
        corrupt_every: None,
    });
    let config = SessionConfig {
        target: ConnectTarget::new(
            "ws://demo/ws",
            ClientId::new("reconnect-test").expect("valid client id"),
        ),
        policy,
    };
    (
        ConnectionSession::with_transport(config, transport.clone()),
        transport,
    )
}

fn shared_pipeline() -> Arc<Mutex<LivePipeline>> {
    Arc::new(Mutex::new(
        LivePipeline::new(PipelineSettings::default()).expect("settings"),
    ))
}

#[tokio::test(start_paused = true)]
async fn subscription_survives_reconnect_without_reregistration() {
    let (mut session, transport) = demo_session(ReconnectPolicy::Fixed(Duration::from_secs(1)));
    let pipeline = shared_pipeline();
    let sink = Arc::clone(&pipeline);
    let subscription = session.subscribe(&MessageKind::live_log(), move |message| {
        sink.lock().expect("lock").ingest_message(message);
    });

    session.start();

    // First connection: frames at 10, 20, 30 ms, then the peer closes.
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(pipeline.lock().expect("lock").len(), 3);
    assert_eq!(session.status(), ConnectionStatus::Disconnected);

    // Retry at ~1030 ms serves three more frames.
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(subscription.is_active());
    assert_eq!(transport.produced(), 6);

    let guard = pipeline.lock().expect("lock");
    assert_eq!(guard.len(), 6);
    for i in 0..6 {
        let entry = guard.get_index(i).expect("record present");
        assert_eq!(entry.record().message(), demo_record(i as u64).message());
    }
    drop(guard);

    session.shutdown().await;
    assert!(!session.is_running());
}

#[tokio::test(start_paused = true)]
async fn no_reconnect_happens_after_shutdown() {
    let (mut session, transport) = demo_session(ReconnectPolicy::Fixed(Duration::from_secs(1)));
    session.start();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(transport.produced(), 3);

    // Stop inside the retry delay; the pending attempt must be abandoned.
    session.shutdown().await;
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(transport.produced(), 3);
    assert_eq!(session.status(), ConnectionStatus::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn status_watch_reports_each_reconnect_cycle() {
    let (mut session, _transport) = demo_session(ReconnectPolicy::Fixed(Duration::from_secs(1)));
    let mut status = session.watch_status();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);
    let watcher = tokio::spawn(async move {
        while status.changed().await.is_ok() {
            let current = *status.borrow_and_update();
            recorder.lock().expect("lock").push(current);
        }
    });

    session.start();
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    session.shutdown().await;
    drop(session);
    watcher.await.expect("watcher task");

    let seen = seen.lock().expect("lock");
    let opens = seen
        .iter()
        .filter(|s| **s == ConnectionStatus::Open)
        .count();
    assert_eq!(opens, 2, "statuses: {seen:?}");
    assert_eq!(seen.last(), Some(&ConnectionStatus::Disconnected));
}
