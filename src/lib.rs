//! # gemini-keycheck
//!
//! **Rate-limited validity and quota checks for Gemini API keys.**
//!
//! Each candidate key is sent one small `generateContent` request. The
//! response is classified so a caller can tell a working key from a
//! revoked one, and a revoked key from one that is merely out of quota.
//!
//! ## Features
//!
//! - **Global rate gate** — request starts are spaced by `min_interval`
//!   across all workers, not per worker
//! - **Bounded concurrency** — at most `max_workers` requests in flight
//! - **Per-key isolation** — a timeout or bad response fails only that key
//! - **Local validation** — empty or malformed keys never reach the network
//! - **No key leakage in logs** — only SHA-256 fingerprints are logged
//!
//! ## Quickstart
//!
//! ```no_run
//! use gemini_keycheck::{CheckerConfig, KeyChecker};
//!
//! fn main() -> Result<(), gemini_keycheck::KeycheckError> {
//!     let checker = KeyChecker::new(CheckerConfig::default())?;
//!     let keys = vec!["AIza-your-key-here-000000000".to_string()];
//!     let report = checker.check_keys(&keys)?;
//!
//!     for result in &report.results {
//!         println!("{} {}: {}", result.status_label(), result.key, result.message);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Verdicts
//!
//! See [`Verdict`]: `Passed`, `InvalidKey`, `QuotaExhausted`, `Transport`,
//! `Parse`, `Upstream`, `InvalidInput`. Only `Passed` counts as a pass.

#![deny(missing_docs)]

// Core modules
pub mod clock;
pub mod config;
pub mod errors;

// Protocol layer
pub mod protocol;

// Client layer
pub mod client;

// Policy layer
pub mod policy;

// Input layer
pub mod keys;

// Scheduling layer
pub mod dispatch;
pub mod gate;

// Reporting
pub mod report;

// Checker (main public API)
pub mod checker;

// Re-exports for public API
pub use checker::KeyChecker;
pub use client::http::GeminiClient;
pub use client::{KeyCheckRequest, KeyCheckTransport, RawResponse};
pub use clock::{Clock, SystemClock};
pub use config::CheckerConfig;
pub use errors::KeycheckError;
pub use gate::RateGate;
pub use keys::KeySource;
pub use policy::classify::{classify, Verdict};
pub use report::{KeyCheckResult, Progress, Report};

#[cfg(any(test, feature = "test-seams"))]
pub use clock::MockClock;
