//! Error types shared across subsystems.
//!
//! # Taxonomy
//! - `HttpError`: protocol violations answered with an HTTP status; never touch a session
//! - `SessionError`: session-state violations, rejected locally
//! - `FrameError`: malformed frames or inbound payloads
//! - `RegistryError`: duplicate handler registration, fatal at startup

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// A protocol violation surfaced to the client as an HTTP error response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    #[error("WebSockets Are Disabled")]
    WebSocketsDisabled,

    #[error("Can \"Upgrade\" only to \"WebSocket\".")]
    UpgradeNotWebSocket,

    #[error("\"Connection\" must be \"Upgrade\".")]
    ConnectionNotUpgrade,

    #[error("Only supported WebSocket protocol is RFC 6455.")]
    UnsupportedVersion,

    #[error("Too many connections")]
    TooManyConnections,
}

impl HttpError {
    /// Status code sent with this error.
    pub fn status(&self) -> StatusCode {
        match self {
            HttpError::WebSocketsDisabled => StatusCode::NOT_FOUND,
            HttpError::UpgradeNotWebSocket
            | HttpError::ConnectionNotUpgrade
            | HttpError::UnsupportedVersion => StatusCode::BAD_REQUEST,
            HttpError::TooManyConnections => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

/// Errors raised by session operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Another connection still open")]
    AlreadyAttached,

    #[error("Session is closed")]
    Closed,

    #[error("Outbound buffer full ({0} messages pending)")]
    BufferFull(usize),
}

/// Errors raised while decoding frames or inbound payloads.
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Empty frame")]
    Empty,

    #[error("Unknown frame type: {0:?}")]
    UnknownType(char),

    #[error("Trailing data after {0} frame")]
    TrailingData(&'static str),

    #[error("Malformed close frame")]
    MalformedClose,

    #[error("Payload is not a string or an array of strings")]
    NotStrings,

    #[error("Broken JSON encoding: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while populating the handler registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Handler already registered for {method} {prefix:?}")]
    Duplicate { prefix: String, method: String },
}
