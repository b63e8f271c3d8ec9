//! Transport layer: one HTTP call per key.

pub mod http;

use crate::KeycheckError;

/// Everything needed to issue one key-check request.
///
/// Built once per key before dispatch and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCheckRequest {
    /// Credential under test.
    pub key: String,
    /// Model id the request targets.
    pub model: String,
    /// Prompt text.
    pub prompt: String,
}

impl KeyCheckRequest {
    /// Create a request for `key`.
    pub fn new(
        key: impl Into<String>,
        model: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            model: model.into(),
            prompt: prompt.into(),
        }
    }
}

/// Raw HTTP outcome of a key-check request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,

    /// Response body, lossily decoded as UTF-8.
    pub body: String,

    /// Remaining quota reported in rate-limit headers.
    pub remaining_quota: Option<String>,
}

impl RawResponse {
    /// Build a response without quota headers.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            remaining_quota: None,
        }
    }
}

/// Issues the test request for one key.
///
/// Implementations are shared by every worker, so they must be `Sync`.
/// An `Err` means no HTTP response was obtained: use
/// [`KeycheckError::Transport`] for network failures.
pub trait KeyCheckTransport: Send + Sync {
    /// Send `request` and return the raw response.
    fn check(&self, request: &KeyCheckRequest) -> Result<RawResponse, KeycheckError>;
}
