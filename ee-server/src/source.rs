// EE Server - Ingestion sources
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Ingestion sources feeding the entropy pipeline.
//!
//! Three feeds are supported: a TCP line stream (one token per line,
//! plain or `{"value": ...}` JSON), CSV replay of a `value` column
//! paced at the tick interval, and the in-process test generator.
//! Sources run until the pipeline shuts down or the feed ends.

use std::path::Path;
use std::time::Duration;

use ee::IngestHandle;
use ee_testdata::{StreamConfig, TokenStream};
use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Delay between TCP reconnection attempts.
const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Errors from source setup.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("CSV not found: {0}")]
    FileNotFound(String),

    #[error("CSV must have a 'value' header")]
    MissingValueColumn,

    #[error("CSV has no rows under 'value'")]
    EmptyDataset,

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),
}

/// Load the `value` column from a CSV file. Unparseable cells are
/// skipped with a warning.
pub fn load_csv(path: &str) -> Result<Vec<f64>, SourceError> {
    if !Path::new(path).exists() {
        return Err(SourceError::FileNotFound(path.to_string()));
    }
    let mut reader = csv::Reader::from_path(path)?;

    let headers = reader.headers()?.clone();
    let value_index = headers
        .iter()
        .position(|h| h.trim() == "value")
        .ok_or(SourceError::MissingValueColumn)?;

    let mut values = Vec::new();
    for result in reader.records() {
        let record = result?;
        let Some(cell) = record.get(value_index) else {
            continue;
        };
        match cell.trim().parse::<f64>() {
            Ok(value) => values.push(value),
            Err(_) => warn!("Skipping unparseable CSV cell: {:?}", cell),
        }
    }

    if values.is_empty() {
        return Err(SourceError::EmptyDataset);
    }
    Ok(values)
}

/// Replay CSV values at the given pace. Loops when configured,
/// otherwise holds after the last row (the pipeline goes stale on its
/// own once the feed stops).
pub async fn run_csv(ingest: IngestHandle, values: Vec<f64>, pace: f64, loop_replay: bool) {
    info!(
        "CSV replay: {} values, pace={}s, loop={}",
        values.len(),
        pace,
        loop_replay
    );
    loop {
        for &value in &values {
            if ingest.push_value(value).await.is_err() {
                return;
            }
            sleep(Duration::from_secs_f64(pace)).await;
        }
        if !loop_replay {
            info!("CSV replay finished");
            return;
        }
        debug!("CSV replay looping");
    }
}

/// Read line-delimited tokens from a TCP feed. Each line is either a
/// plain token or a `{"value": ...}` JSON object. Reconnects on
/// disconnect until the pipeline shuts down.
pub async fn run_tcp(ingest: IngestHandle, addr: String) {
    loop {
        let stream = match TcpStream::connect(&addr).await {
            Ok(stream) => {
                info!("Connected to feed at {}", addr);
                stream
            }
            Err(e) => {
                warn!("Connection to {} failed: {}; retrying", addr, e);
                sleep(RECONNECT_DELAY).await;
                continue;
            }
        };

        let mut lines = BufReader::new(stream).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let token = extract_token(&line);
                    if ingest.push(&token).await.is_err() {
                        return;
                    }
                }
                Ok(None) => {
                    warn!("Feed at {} closed; reconnecting", addr);
                    break;
                }
                Err(e) => {
                    warn!("Read error from {}: {}; reconnecting", addr, e);
                    break;
                }
            }
        }
        sleep(RECONNECT_DELAY).await;
    }
}

/// Pull one line's token out of its transport framing.
fn extract_token(line: &str) -> String {
    let trimmed = line.trim();
    if trimmed.starts_with('{') {
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
            match map.get("value") {
                Some(Value::Number(n)) => return n.to_string(),
                Some(Value::String(s)) => return s.clone(),
                _ => {}
            }
        }
    }
    trimmed.to_string()
}

/// Drive the in-process test generator at its configured interval.
pub async fn run_generator(ingest: IngestHandle, config: StreamConfig) {
    let interval = config.interval;
    let mut stream = match TokenStream::new(config) {
        Ok(stream) => stream,
        Err(e) => {
            warn!("Generator setup failed: {}", e);
            return;
        }
    };
    info!(
        "Generator source: datatype={}, interval={}s",
        stream.config().datatype,
        interval
    );

    loop {
        // dropout slots emit nothing but still take a tick
        if let Some(token) = stream.next_token() {
            if ingest.push(&token).await.is_err() {
                let stats = stream.stats();
                info!(
                    "Generator stopped: emitted={} spikes={} switches={}",
                    stats.emitted, stats.spikes, stats.regime_switches
                );
                return;
            }
        }
        sleep(Duration::from_secs_f64(interval)).await;
    }
}
