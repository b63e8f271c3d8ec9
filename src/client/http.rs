//! Reqwest-based HTTP client for the generateContent API.
//!
//! Sends the key in the `x-goog-api-key` header so it never lands in a URL,
//! and captures the rate-limit headers used for remaining-quota reporting.

use crate::client::{KeyCheckRequest, KeyCheckTransport, RawResponse};
use crate::config::CheckerConfig;
use crate::protocol::models::GenerateContentRequest;
use crate::KeycheckError;
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, ACCEPT};
use std::time::Duration;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Headers checked, in order, for a remaining-quota value.
pub const QUOTA_HEADERS: &[&str] = &[
    "x-ratelimit-remaining-requests",
    "x-ratelimit-remaining",
    "x-ratelimit-remaining-tokens",
];

/// Blocking generateContent client.
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl GeminiClient {
    /// Create a new client from config.
    pub fn new(config: &CheckerConfig) -> Result<Self, KeycheckError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(build_user_agent(config))
            .build()
            .map_err(|e| {
                KeycheckError::ConfigError(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            timeout: config.request_timeout,
        })
    }

    /// URL of the generateContent method for `model`.
    pub fn generate_url(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.endpoint, model)
    }

    /// Get the configured endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn read_response(response: Response) -> Result<RawResponse, KeycheckError> {
        let status = response.status().as_u16();
        let remaining_quota = remaining_quota_from_headers(response.headers());

        let body = response
            .bytes()
            .map_err(|e| KeycheckError::Transport(format!("failed to read body: {}", e)))?;

        Ok(RawResponse {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
            remaining_quota,
        })
    }

    fn describe_error(&self, err: &reqwest::Error) -> String {
        if err.is_timeout() {
            format!("request timed out after {:.1}s", self.timeout.as_secs_f64())
        } else if err.is_connect() {
            format!("connection failed: {}", err)
        } else {
            format!("request failed: {}", err)
        }
    }
}

impl KeyCheckTransport for GeminiClient {
    fn check(&self, request: &KeyCheckRequest) -> Result<RawResponse, KeycheckError> {
        let response = self
            .client
            .post(self.generate_url(&request.model))
            .header(API_KEY_HEADER, &request.key)
            .header(ACCEPT, "application/json")
            .json(&GenerateContentRequest::from_prompt(&request.prompt))
            .send()
            .map_err(|e| KeycheckError::Transport(self.describe_error(&e)))?;

        Self::read_response(response)
    }
}

/// First non-empty remaining-quota header value.
pub fn remaining_quota_from_headers(headers: &HeaderMap) -> Option<String> {
    QUOTA_HEADERS.iter().find_map(|name| {
        headers
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    })
}

/// Build a User-Agent string from config.
///
/// Format: `<product>/gemini-keycheck-<version>`
pub fn build_user_agent(config: &CheckerConfig) -> String {
    format!(
        "{}/gemini-keycheck-{}",
        config.user_agent_product,
        env!("CARGO_PKG_VERSION")
    )
}
