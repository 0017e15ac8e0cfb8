//! Transport subsystem.
//!
//! # Data Flow
//! ```text
//! Resolved handler kind
//!     → Transport::is_disabled / handle_request (reject with HttpError)
//!     → WebSocket upgrade (http layer)
//!     → connection.rs attach_session: event loop wiring
//!         inbound text  → decode_message → Session::receive_message
//!         pong / text   → heartbeat     → Session::activate
//!         tick          → heartbeat     → Session::suspend, ping
//!         Outbound      → encode_frame  → socket
//! ```
//!
//! # Variants
//! - `WebSocketTransport`: framed, for browser clients (o / h / a[...] / c[...])
//! - `RawWebSocketTransport`: payloads only, RFC 6455 clients, no heartbeat
//!
//! # Design Decisions
//! - One trait, two concrete types; raw composes the framed one and overrides
//!   only the version check and framing hooks
//! - Protocol violations never create or touch a session
//! - Every per-event failure is handled at the event, never re-raised

pub mod connection;
pub mod handshake;
pub mod raw_websocket;
pub mod websocket;

use axum::http::HeaderMap;

use crate::config::TransportConfig;
use crate::error::{FrameError, HttpError};
use crate::protocol::Frame;
use crate::routing::HandlerKind;

pub use connection::attach_session;
pub use raw_websocket::RawWebSocketTransport;
pub use websocket::WebSocketTransport;

/// Capabilities every transport variant provides.
pub trait Transport: Send + Sync + 'static {
    fn kind(&self) -> HandlerKind;

    /// Options the transport was created with.
    fn options(&self) -> &TransportConfig;

    /// Static capability gate, checked before any protocol work.
    fn is_disabled(&self) -> bool {
        !self.options().websocket
    }

    /// Validate transport-specific request preconditions.
    fn handle_request(&self, headers: &HeaderMap) -> Result<(), HttpError>;

    /// Wire texts for `frame`, in send order. May be empty.
    fn encode_frame(&self, frame: Frame) -> Vec<String>;

    /// Messages carried by one inbound text event.
    fn decode_message(&self, text: &str) -> Result<Vec<String>, FrameError>;

    /// Whether liveness pings run on this transport.
    fn heartbeat_enabled(&self) -> bool {
        true
    }
}
