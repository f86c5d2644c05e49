//! Concurrent pipeline: tick scheduler and state publication.
//!
//! Wraps [`EntropyEngine`] for concurrent use: one ingestion path feeds
//! the window through an [`IngestHandle`], a periodic tick task re-runs
//! the estimation chain at the configured cadence, and readers observe
//! complete snapshots through a watch channel (single writer, atomic
//! swap-in). Ticks are never queued; if one tick overruns the interval,
//! the scheduler skips ahead to the next boundary (latest-wins).

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::engine::EntropyEngine;
use crate::error::{ConfigError, EngineError};
use crate::event::HealthEvent;
use crate::state::EntropyState;

/// Capacity of the health event broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Shared pipeline counters.
#[derive(Debug, Default)]
struct PipelineStats {
    ticks: AtomicU64,
    admitted: AtomicU64,
    dropped_malformed: AtomicU64,
    dropped_out_of_order: AtomicU64,
    running: AtomicBool,
}

/// Point-in-time view of the pipeline counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub ticks: u64,
    pub admitted: u64,
    pub dropped_malformed: u64,
    pub dropped_out_of_order: u64,
    pub running: bool,
}

impl PipelineStats {
    fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            ticks: self.ticks.load(Ordering::SeqCst),
            admitted: self.admitted.load(Ordering::SeqCst),
            dropped_malformed: self.dropped_malformed.load(Ordering::SeqCst),
            dropped_out_of_order: self.dropped_out_of_order.load(Ordering::SeqCst),
            running: self.running.load(Ordering::SeqCst),
        }
    }
}

/// Cloneable handle for feeding raw tokens into the pipeline.
///
/// Pushes only append to the window store; no recomputation happens
/// outside the tick boundary.
#[derive(Clone)]
pub struct IngestHandle {
    engine: Arc<Mutex<EntropyEngine>>,
    epoch: Instant,
    stats: Arc<PipelineStats>,
}

impl IngestHandle {
    /// Push one raw textual token, stamped with the pipeline clock.
    /// Returns whether the sample was admitted, or `ShutDown` once the
    /// pipeline has stopped.
    pub async fn push(&self, token: &str) -> Result<bool, EngineError> {
        if !self.stats.running.load(Ordering::SeqCst) {
            return Err(EngineError::ShutDown);
        }
        let timestamp = self.epoch.elapsed().as_secs_f64();
        let admitted = {
            let mut engine = self.engine.lock().await;
            engine.ingest(token, timestamp)
        };
        if admitted {
            self.stats.admitted.fetch_add(1, Ordering::SeqCst);
        } else {
            debug!("Dropped token {:?} at t={:.3}s", token, timestamp);
        }
        Ok(admitted)
    }

    /// Push an already-numeric value.
    pub async fn push_value(&self, value: f64) -> Result<bool, EngineError> {
        if !self.stats.running.load(Ordering::SeqCst) {
            return Err(EngineError::ShutDown);
        }
        let timestamp = self.epoch.elapsed().as_secs_f64();
        let admitted = {
            let mut engine = self.engine.lock().await;
            engine.ingest_value(value, timestamp)
        };
        if admitted {
            self.stats.admitted.fetch_add(1, Ordering::SeqCst);
        }
        Ok(admitted)
    }
}

/// Builder/entry point for the concurrent pipeline.
pub struct Pipeline;

impl Pipeline {
    /// Validate the configuration and start the tick task. Must be
    /// called within a tokio runtime.
    pub fn spawn(config: EngineConfig) -> Result<PipelineHandle, ConfigError> {
        let dt = config.dt;
        let engine = Arc::new(Mutex::new(EntropyEngine::new(config)?));
        let (state_tx, state_rx) = watch::channel(EntropyState::bootstrap());
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let stats = Arc::new(PipelineStats::default());
        stats.running.store(true, Ordering::SeqCst);
        let shutdown = Arc::new(Notify::new());
        let epoch = Instant::now();

        let task = tokio::spawn(tick_loop(
            Arc::clone(&engine),
            dt,
            epoch,
            state_tx,
            event_tx.clone(),
            Arc::clone(&stats),
            Arc::clone(&shutdown),
        ));

        info!("Pipeline started: dt={}s", dt);

        Ok(PipelineHandle {
            ingest: IngestHandle {
                engine,
                epoch,
                stats: Arc::clone(&stats),
            },
            state_rx,
            event_tx,
            stats,
            shutdown,
            task,
        })
    }
}

/// Cloneable read-only view of a pipeline: latest state, counters, and
/// the health event feed. Stays valid after the owning handle shuts the
/// pipeline down.
#[derive(Clone)]
pub struct PipelineView {
    state_rx: watch::Receiver<EntropyState>,
    event_tx: broadcast::Sender<HealthEvent>,
    stats: Arc<PipelineStats>,
}

impl PipelineView {
    /// Latest published snapshot.
    pub fn latest_state(&self) -> EntropyState {
        self.state_rx.borrow().clone()
    }

    /// Subscribe to published snapshots.
    pub fn subscribe_state(&self) -> watch::Receiver<EntropyState> {
        self.state_rx.clone()
    }

    /// Subscribe to health events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<HealthEvent> {
        self.event_tx.subscribe()
    }

    /// Current pipeline counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Whether the tick task is still running.
    pub fn is_running(&self) -> bool {
        self.stats.running.load(Ordering::SeqCst)
    }
}

/// Handle to a running pipeline: state feed, health events, counters,
/// and shutdown.
pub struct PipelineHandle {
    ingest: IngestHandle,
    state_rx: watch::Receiver<EntropyState>,
    event_tx: broadcast::Sender<HealthEvent>,
    stats: Arc<PipelineStats>,
    shutdown: Arc<Notify>,
    task: JoinHandle<()>,
}

impl PipelineHandle {
    /// Get a cloneable ingestion handle.
    pub fn ingest(&self) -> IngestHandle {
        self.ingest.clone()
    }

    /// Get a cloneable read-only view.
    pub fn view(&self) -> PipelineView {
        PipelineView {
            state_rx: self.state_rx.clone(),
            event_tx: self.event_tx.clone(),
            stats: Arc::clone(&self.stats),
        }
    }

    /// Latest published snapshot.
    pub fn latest_state(&self) -> EntropyState {
        self.state_rx.borrow().clone()
    }

    /// Subscribe to published snapshots.
    pub fn subscribe_state(&self) -> watch::Receiver<EntropyState> {
        self.state_rx.clone()
    }

    /// Subscribe to health events (staleness transitions).
    pub fn subscribe_events(&self) -> broadcast::Receiver<HealthEvent> {
        self.event_tx.subscribe()
    }

    /// Current pipeline counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Whether the tick task is still running.
    pub fn is_running(&self) -> bool {
        self.stats.running.load(Ordering::SeqCst)
    }

    /// Stop the tick task and wait for it to finish. An in-progress
    /// tick completes and publishes; no further snapshots follow.
    pub async fn shutdown(self) {
        self.stats.running.store(false, Ordering::SeqCst);
        self.shutdown.notify_one();
        let _ = self.task.await;
        info!("Pipeline stopped");
    }
}

async fn tick_loop(
    engine: Arc<Mutex<EntropyEngine>>,
    dt: f64,
    epoch: Instant,
    state_tx: watch::Sender<EntropyState>,
    event_tx: broadcast::Sender<HealthEvent>,
    stats: Arc<PipelineStats>,
    shutdown: Arc<Notify>,
) {
    let mut ticker = interval(Duration::from_secs_f64(dt));
    // overrun ticks are skipped, never queued
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // the interval's first tick completes immediately; skip it so the
    // first published tick lands one period in
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.notified() => break,
            _ = ticker.tick() => {
                if !stats.running.load(Ordering::SeqCst) {
                    break;
                }
                let now = epoch.elapsed().as_secs_f64();
                let (state, event, malformed, out_of_order) = {
                    let mut engine = engine.lock().await;
                    let (state, event) = engine.tick(now);
                    (
                        state,
                        event,
                        engine.dropped_malformed(),
                        engine.dropped_out_of_order(),
                    )
                };

                stats.ticks.fetch_add(1, Ordering::SeqCst);
                stats.dropped_malformed.store(malformed, Ordering::SeqCst);
                stats
                    .dropped_out_of_order
                    .store(out_of_order, Ordering::SeqCst);

                debug!(
                    "Tick {}: H={:.3} slope={:.3} curvature={:.3} n={} stale={}",
                    state.tick,
                    state.entropy,
                    state.slope,
                    state.curvature,
                    state.sample_count,
                    state.is_stale
                );

                if let Some(event) = event {
                    debug!(
                        "Health event {} at t={:.2}s: {}",
                        event.kind.as_str(),
                        event.timestamp,
                        event.message
                    );
                    // no subscribers is fine
                    let _ = event_tx.send(event);
                }

                state_tx.send_replace(state);
            }
        }
    }

    stats.running.store(false, Ordering::SeqCst);
    debug!("Tick loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_snapshot_defaults() {
        let stats = PipelineStats::default();
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.ticks, 0);
        assert_eq!(snapshot.admitted, 0);
        assert!(!snapshot.running);
    }

    #[test]
    fn test_stats_snapshot_serializes() {
        let stats = PipelineStats::default();
        let json = serde_json::to_string(&stats.snapshot()).unwrap();
        assert!(json.contains("\"ticks\""));
        assert!(json.contains("\"running\""));
    }
}
