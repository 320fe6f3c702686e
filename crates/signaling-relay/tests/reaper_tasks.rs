//! Session reaper timing tests.
//!
//! Uses paused tokio time so intervals elapse instantly.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use common::types::ConnectionId;
use relay_test_utils::{participant, session};
use signaling_relay::actors::RelayActorHandle;
use signaling_relay::protocol::ClientEvent;
use signaling_relay::tasks::{run_sweep, start_session_reaper, ReaperConfig};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

fn fast_config() -> ReaperConfig {
    ReaperConfig {
        interval_seconds: 60,
        max_age_seconds: 0,
    }
}

#[tokio::test(start_paused = true)]
async fn test_reaper_sweeps_every_interval() {
    let root = CancellationToken::new();
    let (relay, _task) = RelayActorHandle::spawn(root.child_token());

    let reaper = tokio::spawn(start_session_reaper(
        relay.clone(),
        fast_config(),
        root.child_token(),
    ));

    // Ticks at 0s, 60s and 120s
    tokio::time::sleep(Duration::from_secs(150)).await;

    let status = relay.get_status().await.unwrap();
    assert!(status.sweeps >= 3, "expected at least 3 sweeps, got {}", status.sweeps);

    root.cancel();
    reaper.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_reaper_stops_on_cancel() {
    let (relay, _task) = RelayActorHandle::spawn(CancellationToken::new());
    let cancel = CancellationToken::new();

    let reaper = tokio::spawn(start_session_reaper(
        relay.clone(),
        fast_config(),
        cancel.clone(),
    ));

    tokio::time::sleep(Duration::from_secs(1)).await;
    cancel.cancel();

    tokio::time::timeout(Duration::from_secs(5), reaper)
        .await
        .expect("reaper should stop promptly")
        .unwrap();

    let sweeps_at_cancel = relay.get_status().await.unwrap().sweeps;
    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(relay.get_status().await.unwrap().sweeps, sweeps_at_cancel);
}

#[tokio::test(start_paused = true)]
async fn test_reaper_keeps_occupied_sessions() {
    let root = CancellationToken::new();
    let (relay, _task) = RelayActorHandle::spawn(root.child_token());

    let conn = ConnectionId::new();
    let (tx, _rx) = mpsc::channel(8);
    relay.connect(conn, tx).await.unwrap();
    relay
        .dispatch(
            conn,
            ClientEvent::JoinSession {
                session_id: session("S1"),
                participant_id: participant("A"),
                participant_name: "a".to_string(),
            },
        )
        .await
        .unwrap();

    assert_eq!(run_sweep(&relay, &fast_config()).await, 0);
    assert!(relay.get_session(session("S1")).await.unwrap().is_some());
    assert_eq!(relay.get_status().await.unwrap().sessions_reaped, 0);
}

#[tokio::test]
async fn test_sweep_survives_stopped_relay() {
    let (relay, task) = RelayActorHandle::spawn(CancellationToken::new());
    relay.cancel();
    task.await.unwrap();

    // A failed sweep is logged, not fatal
    assert_eq!(run_sweep(&relay, &fast_config()).await, 0);
}
