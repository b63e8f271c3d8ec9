//! Response classification.
//!
//! Maps a raw `(status, body)` pair from one key-check request to a
//! [`Verdict`]. Pure: no I/O, no clock, no logging.
//!
//! Precedence for error statuses:
//! 1. Quota exhaustion (429, `RESOURCE_EXHAUSTED`, or "quota" in the error)
//! 2. Invalid credentials (401, 403, any `API_KEY_*` reason)
//! 3. Anything else is an upstream error

use crate::protocol::models::{parse_error_envelope, parse_generate_response, ErrorBody};
use serde::Serialize;
use std::fmt;

/// Maximum number of body characters carried into diagnostics.
pub const MAX_DETAIL_CHARS: usize = 500;

/// Outcome of checking a single key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Verdict {
    /// The key answered the test request.
    Passed {
        /// Generated text, or a note when the reply carried none.
        text: String,
        /// Remaining quota reported by the provider, if any.
        remaining_quota: Option<String>,
    },

    /// The provider rejected the credential.
    InvalidKey {
        /// Provider-supplied reason.
        reason: String,
    },

    /// The key works but is out of quota or rate-limited.
    QuotaExhausted {
        /// Provider-supplied reason.
        reason: String,
        /// Quota metric named by the provider, if any.
        quota_metric: Option<String>,
    },

    /// The request never produced an HTTP response.
    Transport {
        /// Transport failure description.
        reason: String,
    },

    /// The response body had an unexpected shape.
    Parse {
        /// Parser message plus a raw body excerpt.
        detail: String,
    },

    /// Any other non-success status (unknown model, server error).
    Upstream {
        /// HTTP status code.
        status: u16,
        /// Provider-supplied reason.
        reason: String,
    },

    /// The key was rejected locally and never sent.
    InvalidInput {
        /// Validation failure.
        reason: String,
    },
}

impl Verdict {
    /// Whether this verdict counts as a pass.
    pub fn passed(&self) -> bool {
        matches!(self, Verdict::Passed { .. })
    }

    /// Short machine-friendly kind name.
    pub fn kind(&self) -> &'static str {
        match self {
            Verdict::Passed { .. } => "passed",
            Verdict::InvalidKey { .. } => "invalid_key",
            Verdict::QuotaExhausted { .. } => "quota_exhausted",
            Verdict::Transport { .. } => "transport",
            Verdict::Parse { .. } => "parse",
            Verdict::Upstream { .. } => "upstream",
            Verdict::InvalidInput { .. } => "invalid_input",
        }
    }

    /// Remaining quota, only ever present on a pass.
    pub fn remaining_quota(&self) -> Option<&str> {
        match self {
            Verdict::Passed {
                remaining_quota, ..
            } => remaining_quota.as_deref(),
            _ => None,
        }
    }

    /// Diagnostic message shown next to the key.
    ///
    /// Every failure kind carries its own prefix so two different kinds
    /// never render the same message.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Passed { text, .. } => write!(f, "{}", text),
            Verdict::InvalidKey { reason } => write!(f, "invalid key: {}", reason),
            Verdict::QuotaExhausted {
                reason,
                quota_metric: Some(metric),
            } => write!(f, "quota exhausted: {} (metric: {})", reason, metric),
            Verdict::QuotaExhausted { reason, .. } => write!(f, "quota exhausted: {}", reason),
            Verdict::Transport { reason } => write!(f, "transport failure: {}", reason),
            Verdict::Parse { detail } => write!(f, "parse failure: {}", detail),
            Verdict::Upstream { status, reason } => {
                write!(f, "upstream error (HTTP {}): {}", status, reason)
            }
            Verdict::InvalidInput { reason } => write!(f, "invalid input: {}", reason),
        }
    }
}

/// Classify one HTTP response.
///
/// # Arguments
/// * `status` - HTTP status code
/// * `body` - Response body, lossily decoded
/// * `remaining_quota` - Quota hint captured from response headers
pub fn classify(status: u16, body: &str, remaining_quota: Option<String>) -> Verdict {
    if (200..300).contains(&status) {
        return classify_success(body, remaining_quota);
    }

    let error = parse_error_envelope(body);
    let reason = error_reason(error.as_ref(), body);

    if is_exhausted(status, error.as_ref(), body) {
        let quota_metric = extract_quota_metric(&reason);
        return Verdict::QuotaExhausted {
            reason,
            quota_metric,
        };
    }

    if is_invalid_credential(status, error.as_ref()) {
        return Verdict::InvalidKey { reason };
    }

    Verdict::Upstream { status, reason }
}

fn classify_success(body: &str, remaining_quota: Option<String>) -> Verdict {
    let response = match parse_generate_response(body) {
        Ok(response) => response,
        Err(e) => {
            return Verdict::Parse {
                detail: format!("{}; body: {}", e, excerpt(body)),
            }
        }
    };

    if let Some(text) = response.extract_text() {
        return Verdict::Passed {
            text,
            remaining_quota,
        };
    }

    if response.has_candidates() {
        let note = match response.finish_reason() {
            Some(reason) => format!("(no text in response, finishReason: {})", reason),
            None => "(no text in response)".to_string(),
        };
        return Verdict::Passed {
            text: note,
            remaining_quota,
        };
    }

    Verdict::Parse {
        detail: format!("response has no candidates or text; body: {}", excerpt(body)),
    }
}

fn is_exhausted(status: u16, error: Option<&ErrorBody>, body: &str) -> bool {
    if status == 429 {
        return true;
    }
    if let Some(error) = error {
        if error.status.as_deref() == Some("RESOURCE_EXHAUSTED") {
            return true;
        }
    }
    let lowered = body.to_lowercase();
    lowered.contains("resource_exhausted") || lowered.contains("quota")
}

fn is_invalid_credential(status: u16, error: Option<&ErrorBody>) -> bool {
    if status == 401 || status == 403 {
        return true;
    }
    let Some(error) = error else {
        return false;
    };
    // API_KEY_INVALID, API_KEY_EXPIRED, API_KEY_SERVICE_BLOCKED, ...
    if error.has_reason_prefix("API_KEY_")
        || error.status.as_deref() == Some("UNAUTHENTICATED")
    {
        return true;
    }
    error
        .message
        .as_deref()
        .is_some_and(|m| m.to_lowercase().contains("api key not valid"))
}

/// Prefer the provider's message; fall back to the raw body excerpt.
fn error_reason(error: Option<&ErrorBody>, body: &str) -> String {
    error
        .and_then(|e| e.message.as_deref())
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            let raw = excerpt(body);
            if raw.is_empty() {
                "(empty response body)".to_string()
            } else {
                raw
            }
        })
}

/// Extract the metric from "Quota exceeded for metric: <metric>, limit: ...".
fn extract_quota_metric(message: &str) -> Option<String> {
    message
        .split("Quota exceeded for metric:")
        .nth(1)
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Trimmed body truncated to [`MAX_DETAIL_CHARS`] characters.
pub fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_DETAIL_CHARS) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
