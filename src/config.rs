//! Checker configuration.

use crate::KeycheckError;
use std::time::Duration;

/// Model used for the test request when none is given.
pub const DEFAULT_MODEL: &str = "gemini-3-pro-preview";

/// Prompt sent with every test request when none is given.
pub const DEFAULT_PROMPT: &str = "Whatup, Dawg??";

/// Base URL of the generative-language API.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Default number of concurrent workers.
pub const DEFAULT_MAX_WORKERS: usize = 4;

/// Default spacing between request starts.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for a key-check run.
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Model id the test request targets (e.g. "gemini-2.0-flash").
    pub model: String,

    /// Prompt text sent with each test request.
    pub prompt: String,

    /// Upper bound on requests in flight at once.
    pub max_workers: usize,

    /// Minimum spacing between two request starts, across all workers.
    pub min_interval: Duration,

    /// Timeout for a single HTTP call. Must be finite.
    pub request_timeout: Duration,

    /// API base URL, without trailing path.
    pub endpoint: String,

    /// Require keys to look like provider keys (`[A-Za-z0-9_-]{20,}`).
    pub strict_key_format: bool,

    /// Product part of the User-Agent header.
    pub user_agent_product: String,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            prompt: DEFAULT_PROMPT.to_string(),
            max_workers: DEFAULT_MAX_WORKERS,
            min_interval: DEFAULT_MIN_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            strict_key_format: true,
            user_agent_product: "gemini-keycheck".to_string(),
        }
    }
}

impl CheckerConfig {
    /// Validate configuration for obvious errors.
    pub fn validate(&self) -> Result<(), KeycheckError> {
        if self.max_workers < 1 {
            return Err(KeycheckError::ConfigError(
                "--max-workers must be at least 1".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(KeycheckError::ConfigError(
                "request timeout must be greater than zero".to_string(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(KeycheckError::ConfigError(
                "model cannot be empty".to_string(),
            ));
        }
        if self.prompt.is_empty() {
            return Err(KeycheckError::ConfigError(
                "prompt cannot be empty".to_string(),
            ));
        }
        if self.endpoint.trim().is_empty() {
            return Err(KeycheckError::ConfigError(
                "endpoint cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Convert a seconds value from the command line into a `Duration`.
///
/// Rejects negative, NaN, infinite and out-of-range values.
pub fn duration_from_secs(secs: f64, flag: &str) -> Result<Duration, KeycheckError> {
    if !secs.is_finite() {
        return Err(KeycheckError::ConfigError(format!(
            "{} must be a finite number",
            flag
        )));
    }
    if secs < 0.0 {
        return Err(KeycheckError::ConfigError(format!("{} must be >= 0", flag)));
    }
    Duration::try_from_secs_f64(secs)
        .map_err(|e| KeycheckError::ConfigError(format!("{} {}", flag, e)))
}
