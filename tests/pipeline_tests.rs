// EE - Streaming Entropy Estimation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Integration tests for the concurrent pipeline.
//!
//! Timing-based: cadences are kept short and assertions use generous
//! margins so the tests stay reliable under scheduler jitter.

use std::time::Duration;

use ee::{EngineConfig, EventKind, Pipeline};
use tokio::time::sleep;

fn fast_config() -> EngineConfig {
    EngineConfig::default()
        .with_dt(0.05)
        .with_bin_count(4)
        .with_window_length(5.0)
        .with_ttl(1.0)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_ticks_publish_states() {
    let handle = Pipeline::spawn(fast_config()).unwrap();
    let ingest = handle.ingest();

    for i in 0..20 {
        let token = if i % 2 == 0 { "1" } else { "2" };
        ingest.push(token).await.unwrap();
        sleep(Duration::from_millis(5)).await;
    }
    sleep(Duration::from_millis(120)).await;

    let state = handle.latest_state();
    assert!(state.tick >= 2);
    assert!(!state.is_stale);
    assert_eq!(state.sample_count, 20);
    assert!(state.raw_entropy > 0.0);

    let stats = handle.stats();
    assert_eq!(stats.admitted, 20);
    assert!(stats.ticks >= 2);
    assert!(stats.running);

    handle.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_staleness_under_silence() {
    let handle = Pipeline::spawn(fast_config().with_ttl(0.2)).unwrap();
    let mut events = handle.subscribe_events();
    let ingest = handle.ingest();

    ingest.push("1.0").await.unwrap();
    ingest.push("2.0").await.unwrap();
    sleep(Duration::from_millis(100)).await;
    assert!(!handle.latest_state().is_stale);

    // recovery event from the initial stale state
    let event = events.recv().await.unwrap();
    assert_eq!(event.kind, EventKind::Recovered);

    // silence well past the 0.2s ttl
    sleep(Duration::from_millis(400)).await;
    assert!(handle.latest_state().is_stale);
    let event = events.recv().await.unwrap();
    assert_eq!(event.kind, EventKind::WentStale);

    handle.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shutdown_stops_publication() {
    let handle = Pipeline::spawn(fast_config()).unwrap();
    let ingest = handle.ingest();
    ingest.push("1").await.unwrap();
    sleep(Duration::from_millis(120)).await;

    let last_tick = handle.latest_state().tick;
    assert!(last_tick >= 1);

    let state_rx = handle.subscribe_state();
    handle.shutdown().await;

    // no further snapshots after shutdown completes
    let tick_after_shutdown = state_rx.borrow().tick;
    sleep(Duration::from_millis(200)).await;
    assert_eq!(state_rx.borrow().tick, tick_after_shutdown);

    // pushes are refused once stopped
    assert!(ingest.push("2").await.is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_bootstrap_state_before_first_tick() {
    let handle = Pipeline::spawn(fast_config()).unwrap();
    // read immediately, before the first tick fires
    let state = handle.latest_state();
    assert_eq!(state.tick, 0);
    assert!(state.is_stale);
    handle.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_counters_track_drops() {
    let handle = Pipeline::spawn(fast_config()).unwrap();
    let ingest = handle.ingest();

    assert!(ingest.push("1.0").await.unwrap());
    assert!(!ingest.push("not a token").await.unwrap());
    assert!(!ingest.push_value(f64::NAN).await.unwrap());
    sleep(Duration::from_millis(120)).await;

    let stats = handle.stats();
    assert_eq!(stats.admitted, 1);
    assert_eq!(stats.dropped_malformed, 2);

    handle.shutdown().await;
}
