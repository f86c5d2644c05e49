// EE Server - Streaming entropy estimation service
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # EE Server
//!
//! Streaming entropy estimation service with TCP, CSV and generator
//! ingestion feeds.
//!
//! ## Usage
//!
//! ```bash
//! # In-process test generator
//! ee-server --source generator --datatype mix --uf 0.3
//!
//! # Pair with a TCP token feed
//! ee-server --source tcp --tcp-addr 127.0.0.1:9009 --dt 0.25 --bins 24
//!
//! # Replay a CSV (expects a 'value' header)
//! ee-server --source csv --csv telemetry.csv --loop-replay
//! ```

mod source;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use clap::{Parser, ValueEnum};
use ee::{EngineConfig, EntropyState, EventKind, Pipeline, PipelineView, StatsSnapshot};
use ee_testdata::{DataType, StreamConfig};
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

/// Ingestion feed kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SourceKind {
    /// Line-delimited tokens from a TCP feed.
    Tcp,
    /// Replay of a CSV 'value' column.
    Csv,
    /// In-process test stream generator.
    Generator,
}

/// EE streaming entropy estimation service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8050")]
    port: u16,

    /// Ingestion source
    #[arg(short, long, value_enum, default_value_t = SourceKind::Generator)]
    source: SourceKind,

    /// Feed address for the tcp source
    #[arg(long, default_value = "127.0.0.1:9009")]
    tcp_addr: String,

    /// CSV file to replay (csv source)
    #[arg(long)]
    csv: Option<String>,

    /// Loop the CSV replay when it reaches the end
    #[arg(short, long, default_value = "true")]
    loop_replay: bool,

    /// Generator datatype: 123, abc, sym or mix
    #[arg(long, default_value = "123")]
    datatype: String,

    /// Generator unexpected factor in [0, 1]
    #[arg(long, default_value = "0.2")]
    uf: f64,

    /// Generator emission interval in seconds
    #[arg(long, default_value = "0.25")]
    clock: f64,

    /// Generator RNG seed
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Tick interval in seconds
    #[arg(long, default_value = "0.25")]
    dt: f64,

    /// Histogram bin count
    #[arg(long, default_value = "24")]
    bins: usize,

    /// Analysis window length in seconds
    #[arg(long, default_value = "45.0")]
    window: f64,

    /// EWMA smoothing factor in (0, 1]
    #[arg(long, default_value = "0.2")]
    alpha: f64,

    /// Staleness ttl in seconds
    #[arg(long, default_value = "2.0")]
    ttl: f64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Application state shared across handlers.
struct AppState {
    view: PipelineView,
    config: EngineConfig,
    source: SourceKind,
    start_time: std::time::Instant,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match args.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };
        EnvFilter::from_default_env().add_directive(level.into())
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("EE Server v{}", env!("CARGO_PKG_VERSION"));

    let config = EngineConfig::default()
        .with_dt(args.dt)
        .with_bin_count(args.bins)
        .with_window_length(args.window)
        .with_alpha(args.alpha)
        .with_ttl(args.ttl);

    // Configuration errors are fatal at startup
    let handle = match Pipeline::spawn(config.clone()) {
        Ok(handle) => handle,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Start the ingestion feed
    let ingest = handle.ingest();
    match args.source {
        SourceKind::Tcp => {
            let addr = args.tcp_addr.clone();
            tokio::spawn(source::run_tcp(ingest, addr));
        }
        SourceKind::Csv => {
            let Some(path) = args.csv.clone() else {
                error!("--csv is required with --source csv");
                std::process::exit(1);
            };
            let values = match source::load_csv(&path) {
                Ok(values) => values,
                Err(e) => {
                    error!("Failed to load dataset: {}", e);
                    std::process::exit(1);
                }
            };
            tokio::spawn(source::run_csv(ingest, values, args.dt, args.loop_replay));
        }
        SourceKind::Generator => {
            let datatype: DataType = match args.datatype.parse() {
                Ok(datatype) => datatype,
                Err(e) => {
                    error!("Invalid generator config: {}", e);
                    std::process::exit(1);
                }
            };
            let stream_config = StreamConfig::new(datatype)
                .with_interval(args.clock)
                .with_unexpected_factor(args.uf)
                .with_seed(args.seed);
            if let Err(e) = stream_config.validate() {
                error!("Invalid generator config: {}", e);
                std::process::exit(1);
            }
            tokio::spawn(source::run_generator(ingest, stream_config));
        }
    }

    // Log liveness transitions
    let mut events = handle.subscribe_events();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event.kind {
                EventKind::WentStale => {
                    warn!("Stream stale at t={:.2}s: {}", event.timestamp, event.message)
                }
                EventKind::Recovered => {
                    info!("Stream recovered at t={:.2}s", event.timestamp)
                }
            }
        }
    });

    // Create app state
    let state = Arc::new(AppState {
        view: handle.view(),
        config,
        source: args.source,
        start_time: std::time::Instant::now(),
    });

    // Build router
    let app = Router::new()
        .route("/", get(root_handler))
        .route("/state", get(state_handler))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/status", get(status_handler))
        .with_state(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("Starting server on http://{}", addr);
    info!("State endpoint: http://{}/state", addr);

    let listener = TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .unwrap();

    info!("Shutting down");
    handle.shutdown().await;
}

/// Root handler - shows a simple HTML page.
async fn root_handler() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>EE Server</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; max-width: 800px; margin: 50px auto; padding: 20px; }
        h1 { color: #2c3e50; }
        a { color: #3498db; text-decoration: none; }
        a:hover { text-decoration: underline; }
        .endpoints { background: #f8f9fa; padding: 20px; border-radius: 8px; margin: 20px 0; }
        .endpoint { margin: 10px 0; }
        code { background: #e9ecef; padding: 2px 6px; border-radius: 4px; }
    </style>
</head>
<body>
    <h1>EE Server</h1>
    <p>Streaming entropy estimation: windowed Shannon entropy with smoothing, derivatives and staleness monitoring.</p>

    <div class="endpoints">
        <h2>Endpoints</h2>
        <div class="endpoint"><a href="/state">/state</a> - Latest entropy snapshot (JSON)</div>
        <div class="endpoint"><a href="/health">/health</a> - Health check</div>
        <div class="endpoint"><a href="/ready">/ready</a> - Readiness check</div>
        <div class="endpoint"><a href="/status">/status</a> - Status information (JSON)</div>
    </div>

    <h2>Snapshot Fields</h2>
    <ul>
        <li><code>entropy</code> - Smoothed normalized entropy in [0, 1]</li>
        <li><code>raw_entropy</code> - Unsmoothed estimate for this tick's window</li>
        <li><code>slope</code> - First time-derivative of the smoothed entropy</li>
        <li><code>curvature</code> - Second time-derivative (see <code>curvature_valid</code>)</li>
        <li><code>sample_count</code> - Samples in the analysis window</li>
        <li><code>is_stale</code> - Ingestion silence exceeded the ttl</li>
    </ul>
</body>
</html>"#,
    )
}

/// Latest snapshot handler.
async fn state_handler(State(state): State<Arc<AppState>>) -> Json<EntropyState> {
    Json(state.view.latest_state())
}

/// Health check handler.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Readiness check handler.
async fn ready_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if state.view.is_running() {
        (StatusCode::OK, "Ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "Stopped")
    }
}

/// Status information response.
#[derive(Serialize)]
struct StatusResponse {
    version: String,
    uptime_secs: u64,
    source: String,
    config: EngineConfig,
    stats: StatsSnapshot,
    state: EntropyState,
}

/// Status handler - JSON summary of the running pipeline.
async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        source: format!("{:?}", state.source).to_lowercase(),
        config: state.config.clone(),
        stats: state.view.stats(),
        state: state.view.latest_state(),
    })
}
