//! Health event types.
//!
//! Staleness transitions are reported as observable events for external
//! monitoring collaborators.

use serde::{Deserialize, Serialize};

/// Kind of health event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// The pipeline went stale (ingestion silence exceeded the ttl).
    WentStale,
    /// The pipeline recovered (an admitted sample arrived).
    Recovered,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::WentStale => "WENT_STALE",
            EventKind::Recovered => "RECOVERED",
        }
    }
}

/// A health event emitted at a tick boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthEvent {
    /// Event kind.
    pub kind: EventKind,
    /// Tick timestamp in seconds at which the transition was observed.
    pub timestamp: f64,
    /// Human-readable message.
    pub message: String,
}

impl HealthEvent {
    /// Create a new event.
    pub fn new(kind: EventKind, timestamp: f64, message: impl Into<String>) -> Self {
        Self {
            kind,
            timestamp,
            message: message.into(),
        }
    }

    /// Create a went-stale event. `silence` is the observed gap in
    /// seconds, if any sample has been seen at all.
    pub fn went_stale(timestamp: f64, silence: Option<f64>) -> Self {
        let message = match silence {
            Some(gap) => format!("No admitted sample for {:.2}s", gap),
            None => "No sample admitted yet".to_string(),
        };
        Self::new(EventKind::WentStale, timestamp, message)
    }

    /// Create a recovery event.
    pub fn recovered(timestamp: f64) -> Self {
        Self::new(EventKind::Recovered, timestamp, "Ingestion resumed")
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
