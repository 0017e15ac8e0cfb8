//! Framed WebSocket transport.
//!
//! # Responsibilities
//! - Refuse when WebSockets are disabled (404)
//! - Validate `Upgrade` / `Connection` headers (400)
//! - Wrap everything sent in the open / heartbeat / message / close alphabet
//! - Accept a JSON array of strings or a single JSON string per event

use axum::http::HeaderMap;

use crate::config::TransportConfig;
use crate::error::{FrameError, HttpError};
use crate::protocol::{self, Frame};
use crate::routing::HandlerKind;
use crate::transport::{handshake, Transport};

#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    options: TransportConfig,
}

impl WebSocketTransport {
    pub fn new(options: TransportConfig) -> Self {
        Self { options }
    }
}

impl Transport for WebSocketTransport {
    fn kind(&self) -> HandlerKind {
        HandlerKind::WebSocket
    }

    fn options(&self) -> &TransportConfig {
        &self.options
    }

    fn handle_request(&self, headers: &HeaderMap) -> Result<(), HttpError> {
        if self.is_disabled() {
            return Err(HttpError::WebSocketsDisabled);
        }
        handshake::check_upgrade(headers)
    }

    fn encode_frame(&self, frame: Frame) -> Vec<String> {
        vec![frame.encode()]
    }

    fn decode_message(&self, text: &str) -> Result<Vec<String>, FrameError> {
        protocol::parse_payload(text)
    }
}
