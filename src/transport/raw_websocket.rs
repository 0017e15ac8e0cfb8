//! Raw WebSocket transport.
//!
//! The framed protocol suits browsers running the client library, but not
//! programs connecting from a command line. This endpoint speaks plain
//! RFC 6455: no open frame, no heartbeats, no envelopes. Each message is
//! one WebSocket text frame in both directions.

use axum::http::HeaderMap;
use serde_json::Value;

use crate::config::TransportConfig;
use crate::error::{FrameError, HttpError};
use crate::protocol::{self, Frame};
use crate::routing::HandlerKind;
use crate::transport::{handshake, Transport, WebSocketTransport};

#[derive(Debug, Clone)]
pub struct RawWebSocketTransport {
    framed: WebSocketTransport,
}

impl RawWebSocketTransport {
    pub fn new(options: TransportConfig) -> Self {
        Self {
            framed: WebSocketTransport::new(options),
        }
    }
}

impl Transport for RawWebSocketTransport {
    fn kind(&self) -> HandlerKind {
        HandlerKind::RawWebSocket
    }

    fn options(&self) -> &TransportConfig {
        self.framed.options()
    }

    fn handle_request(&self, headers: &HeaderMap) -> Result<(), HttpError> {
        if self.is_disabled() {
            return Err(HttpError::WebSocketsDisabled);
        }
        handshake::check_version(headers)?;
        self.framed.handle_request(headers)
    }

    /// Messages go out one per WebSocket frame; every other frame vanishes.
    fn encode_frame(&self, frame: Frame) -> Vec<String> {
        match frame {
            Frame::Message(messages) => messages,
            Frame::Open | Frame::Heartbeat | Frame::Close { .. } => Vec::new(),
        }
    }

    /// The whole event is a single message, whatever it contains.
    fn decode_message(&self, text: &str) -> Result<Vec<String>, FrameError> {
        protocol::messages_from_value(Value::String(text.to_owned()))
    }

    fn heartbeat_enabled(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(version: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("upgrade", HeaderValue::from_static("websocket"));
        headers.insert("connection", HeaderValue::from_static("Upgrade"));
        headers.insert("sec-websocket-version", HeaderValue::from_static(version));
        headers
    }

    #[test]
    fn requires_rfc6455_version() {
        let transport = RawWebSocketTransport::new(TransportConfig::default());
        assert_eq!(
            transport.handle_request(&headers("7")),
            Err(HttpError::UnsupportedVersion)
        );
        assert_eq!(transport.handle_request(&headers("13")), Ok(()));
        assert_eq!(transport.handle_request(&headers("8")), Ok(()));
    }

    #[test]
    fn still_checks_upgrade_headers() {
        let transport = RawWebSocketTransport::new(TransportConfig::default());
        let mut bad = headers("13");
        bad.remove("upgrade");
        assert_eq!(
            transport.handle_request(&bad),
            Err(HttpError::UpgradeNotWebSocket)
        );
    }

    #[test]
    fn disabled_is_not_found() {
        let transport = RawWebSocketTransport::new(TransportConfig {
            websocket: false,
            ..TransportConfig::default()
        });
        assert_eq!(
            transport.handle_request(&headers("7")),
            Err(HttpError::WebSocketsDisabled)
        );
    }

    #[test]
    fn no_framing_overhead() {
        let transport = RawWebSocketTransport::new(TransportConfig::default());
        assert!(transport.encode_frame(Frame::Open).is_empty());
        assert!(transport.encode_frame(Frame::Heartbeat).is_empty());
        assert!(transport.encode_frame(Frame::close(1000, "bye")).is_empty());
        assert_eq!(
            transport.encode_frame(Frame::Message(vec!["a".into(), "b".into()])),
            vec!["a", "b"]
        );
        assert!(!transport.heartbeat_enabled());
    }

    #[test]
    fn inbound_text_is_one_message() {
        let transport = RawWebSocketTransport::new(TransportConfig::default());
        assert_eq!(
            transport.decode_message(r#"["not","split"]"#).unwrap(),
            vec![r#"["not","split"]"#]
        );
        assert_eq!(transport.decode_message("hello").unwrap(), vec!["hello"]);
    }
}
