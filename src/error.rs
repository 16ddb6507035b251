//! Error taxonomy for the pad core
//!
//! None of these terminate a running session: connect errors feed the
//! reconnect loop, parse errors are dropped, load/send/mutation errors end up
//! as transient notifications.

use thiserror::Error;

/// Failure to reach the relay (always retried with backoff)
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("invalid relay endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("websocket error: {0}")]
    Socket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("failed to encode hello frame: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Configuration document could not be obtained from any source
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no local snapshot and no fallback document configured")]
    NoSource,

    #[error("fallback document '{source_name}' unavailable: {reason}")]
    FallbackUnavailable { source_name: String, reason: String },

    #[error("fallback document '{source_name}' is invalid: {error}")]
    FallbackInvalid {
        source_name: String,
        #[source]
        error: ParseError,
    },
}

/// Attempted to send while the link is down
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendFailure {
    #[error("not connected to the relay")]
    NotConnected,

    #[error("connection task is gone")]
    LinkClosed,

    #[error("failed to encode frame: {0}")]
    Encode(String),
}

/// Malformed inbound frame or persisted document
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("frame has no type field")]
    MissingType,

    #[error("unknown frame type '{0}'")]
    UnknownType(String),

    #[error("duplicate profile id '{0}'")]
    DuplicateProfileId(String),
}

/// Rejected structural change to a profile's buttons
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MutationError {
    #[error("profile '{0}' not found")]
    UnknownProfile(String),

    #[error("button index {index} out of range (len {len})")]
    OutOfRange { index: usize, len: usize },
}
