//! generateContent request/response structs and text extraction.

use crate::KeycheckError;
use serde::{Deserialize, Serialize};

/// Request body for `models/{model}:generateContent`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest {
    /// Conversation turns; a key check sends exactly one.
    pub contents: Vec<Content>,
}

impl GenerateContentRequest {
    /// Build a single-turn request carrying `prompt`.
    pub fn from_prompt(prompt: &str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        }
    }
}

/// One content block.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Content {
    /// Content parts.
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// A content part. Only text parts matter here.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Part {
    /// Text payload, absent for non-text parts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Raw generateContent response.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Generated candidates.
    #[serde(default)]
    pub candidates: Option<Vec<Candidate>>,

    /// Flat text field returned by simplified proxies.
    #[serde(default)]
    pub text: Option<String>,

    /// Token accounting, when reported.
    #[serde(default)]
    pub usage_metadata: Option<UsageMetadata>,
}

/// A generated candidate.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Candidate content.
    #[serde(default)]
    pub content: Option<Content>,

    /// Why generation stopped (e.g. "STOP", "SAFETY").
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Token usage for the request.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    /// Prompt tokens.
    #[serde(default)]
    pub prompt_token_count: Option<u64>,
    /// Output tokens.
    #[serde(default)]
    pub candidates_token_count: Option<u64>,
    /// Total tokens.
    #[serde(default)]
    pub total_token_count: Option<u64>,
}

impl GenerateContentResponse {
    /// First text part of the first candidate, else the flat `text` field.
    pub fn extract_text(&self) -> Option<String> {
        let candidate_text = self
            .candidates
            .as_ref()
            .and_then(|c| c.first())
            .and_then(|c| c.content.as_ref())
            .and_then(|content| content.parts.first())
            .and_then(|part| part.text.as_ref());

        candidate_text
            .or(self.text.as_ref())
            .map(|t| t.trim().to_string())
    }

    /// Whether the response carries a candidates array at all.
    pub fn has_candidates(&self) -> bool {
        self.candidates.is_some()
    }

    /// Finish reason of the first candidate.
    pub fn finish_reason(&self) -> Option<&str> {
        self.candidates
            .as_ref()
            .and_then(|c| c.first())
            .and_then(|c| c.finish_reason.as_deref())
    }
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    /// The error object.
    pub error: ErrorBody,
}

/// Google API error object.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ErrorBody {
    /// HTTP-like numeric code.
    #[serde(default)]
    pub code: Option<u16>,
    /// Human-readable message.
    #[serde(default)]
    pub message: Option<String>,
    /// Canonical status, e.g. "RESOURCE_EXHAUSTED".
    #[serde(default)]
    pub status: Option<String>,
    /// Structured details.
    #[serde(default)]
    pub details: Vec<ErrorDetail>,
}

/// One entry of `error.details`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ErrorDetail {
    /// Machine-readable reason, e.g. "API_KEY_INVALID".
    #[serde(default)]
    pub reason: Option<String>,
}

impl ErrorBody {
    /// Whether any detail carries `reason`.
    pub fn has_reason(&self, reason: &str) -> bool {
        self.details
            .iter()
            .any(|d| d.reason.as_deref() == Some(reason))
    }

    /// Whether any detail carries a reason starting with `prefix`.
    pub fn has_reason_prefix(&self, prefix: &str) -> bool {
        self.details
            .iter()
            .filter_map(|d| d.reason.as_deref())
            .any(|r| r.starts_with(prefix))
    }
}

/// Parse a generateContent response body.
pub fn parse_generate_response(body: &str) -> Result<GenerateContentResponse, KeycheckError> {
    serde_json::from_str(body)
        .map_err(|e| KeycheckError::Protocol(format!("Failed to parse response: {}", e)))
}

/// Parse an error envelope. Returns `None` for bodies of any other shape.
pub fn parse_error_envelope(body: &str) -> Option<ErrorBody> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error)
}
