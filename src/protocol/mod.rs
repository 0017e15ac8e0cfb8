//! Framing protocol.
//!
//! # Wire Alphabet
//! ```text
//! o                  open, once per attachment
//! h                  heartbeat
//! a["m1","m2",...]   batch of messages
//! c[code,"reason"]   session closed
//! ```
//!
//! Clients send either a JSON array of strings or a single JSON string,
//! without any frame marker.

pub mod version;

use std::fmt;

use serde_json::Value;

use crate::error::FrameError;

/// One discrete unit exchanged over a framed transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Open,
    Heartbeat,
    Message(Vec<String>),
    Close { code: u16, reason: String },
}

impl Frame {
    pub fn close(code: u16, reason: impl Into<String>) -> Self {
        Frame::Close {
            code,
            reason: reason.into(),
        }
    }

    /// Encode the frame into its wire text.
    pub fn encode(&self) -> String {
        match self {
            Frame::Open => "o".to_string(),
            Frame::Heartbeat => "h".to_string(),
            Frame::Message(messages) => format!("a{}", Value::from(messages.as_slice())),
            Frame::Close { code, reason } => {
                format!("c{}", Value::from(vec![Value::from(*code), Value::from(reason.as_str())]))
            }
        }
    }

    /// Decode wire text produced by [`Frame::encode`].
    pub fn decode(wire: &str) -> Result<Frame, FrameError> {
        let mut chars = wire.chars();
        let marker = chars.next().ok_or(FrameError::Empty)?;
        let body = chars.as_str();

        match marker {
            'o' if body.is_empty() => Ok(Frame::Open),
            'o' => Err(FrameError::TrailingData("open")),
            'h' if body.is_empty() => Ok(Frame::Heartbeat),
            'h' => Err(FrameError::TrailingData("heartbeat")),
            'a' => Ok(Frame::Message(serde_json::from_str(body)?)),
            'c' => {
                let (code, reason): (u16, String) =
                    serde_json::from_str(body).map_err(|_| FrameError::MalformedClose)?;
                Ok(Frame::Close { code, reason })
            }
            other => Err(FrameError::UnknownType(other)),
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Parse an inbound client payload into its ordered messages.
///
/// An empty payload carries no messages.
pub fn parse_payload(text: &str) -> Result<Vec<String>, FrameError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    messages_from_value(serde_json::from_str(text)?)
}

/// Flatten a structured payload into messages: a string is one message,
/// an array of strings is several.
pub fn messages_from_value(value: Value) -> Result<Vec<String>, FrameError> {
    match value {
        Value::String(message) => Ok(vec![message]),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(message) => Ok(message),
                _ => Err(FrameError::NotStrings),
            })
            .collect(),
        _ => Err(FrameError::NotStrings),
    }
}
