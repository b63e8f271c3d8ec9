//! Keycheck error types.

use thiserror::Error;

/// Errors raised by key loading, configuration and the HTTP layer.
///
/// Only the input-level variants are fatal to a run. `Transport` and
/// `Protocol` are produced per request and folded into that key's
/// [`Verdict`](crate::policy::classify::Verdict) by the dispatcher.
#[derive(Debug, Error)]
pub enum KeycheckError {
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Key file could not be read.
    #[error("Key file I/O error: {0}")]
    KeyFileIO(String),

    /// Key file holds no keys.
    #[error("key file is empty")]
    EmptyKeyFile,

    /// No key input was supplied.
    #[error("provide a key file or a single key (positional or --key)")]
    NoKeys,

    /// Both a positional input and `--key` were supplied.
    #[error("provide either a positional input or --key, not both")]
    ConflictingInput,

    /// A single key failed local validation.
    #[error("{reason}")]
    InvalidKey {
        /// Why the key was rejected.
        reason: String,
    },

    /// Every supplied key failed local validation.
    #[error("no valid keys supplied ({rejected} rejected)")]
    NoValidKeys {
        /// Number of keys rejected before dispatch.
        rejected: usize,
    },

    /// HTTP transport error (connection, timeout, body read).
    #[error("{0}")]
    Transport(String),

    /// Response or request body could not be (de)serialized.
    #[error("Protocol error: {0}")]
    Protocol(String),
}
