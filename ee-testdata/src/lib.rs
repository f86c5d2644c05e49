// EE Testdata - Deterministic test stream generator
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # EE Testdata
//!
//! Deterministic test stream generator for the EE entropy engine.
//!
//! Streams combine a quasi-periodic numeric baseline with stochastic
//! perturbations whose intensity is governed by a single knob, the
//! unexpected factor:
//!
//! - **Noise**: Gaussian noise whose std grows with the factor
//! - **Spikes**: rare large excursions, probability and magnitude
//!   growing with the factor
//! - **Regime switches**: piecewise-constant bias shifts at shrinking
//!   intervals
//! - **Dropouts and duplicates**: occasional skipped or repeated tokens
//!
//! ## Quick Start
//!
//! ```rust
//! use ee_testdata::{DataType, StreamConfig, TokenStream};
//!
//! let config = StreamConfig::new(DataType::Numeric)
//!     .with_interval(0.25)
//!     .with_unexpected_factor(0.2)
//!     .with_seed(42);
//!
//! let mut stream = TokenStream::new(config).unwrap();
//! for _ in 0..100 {
//!     if let Some(token) = stream.next_token() {
//!         // feed to an ingestion path
//!         assert!(!token.is_empty());
//!     }
//! }
//! assert!(stream.stats().emitted > 0);
//! ```

pub mod config;
pub mod generator;

// Re-exports for convenience
pub use config::{DataType, StreamConfig};
pub use generator::{GeneratorError, GeneratorStats, TokenStream};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
