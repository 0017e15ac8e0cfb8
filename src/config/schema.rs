//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SockJsConfig {
    /// Listener configuration (bind address, connection ceiling).
    pub listener: ListenerConfig,

    /// URL prefix the application is mounted at (e.g., "/echo").
    pub prefix: String,

    /// Transport capabilities and timings.
    pub transports: TransportConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for SockJsConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            prefix: "/echo".to_string(),
            transports: TransportConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrent WebSocket connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Enable the WebSocket transports.
    pub websocket: bool,

    /// Interval between heartbeats in milliseconds.
    pub heartbeat_delay_ms: u64,

    /// How long a session may stay without a consumer, in milliseconds.
    pub disconnect_delay_ms: u64,

    /// Outbound messages buffered per session while no consumer is live.
    pub max_pending_messages: usize,
}

impl TransportConfig {
    pub fn heartbeat_delay(&self) -> Duration {
        Duration::from_millis(self.heartbeat_delay_ms)
    }

    pub fn disconnect_delay(&self) -> Duration {
        Duration::from_millis(self.disconnect_delay_ms)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            websocket: true,
            heartbeat_delay_ms: 25_000,
            disconnect_delay_ms: 5_000,
            max_pending_messages: 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_file_uses_defaults() {
        let config: SockJsConfig = toml::from_str("prefix = \"/chat\"").unwrap();
        assert_eq!(config.prefix, "/chat");
        assert!(config.transports.websocket);
        assert_eq!(config.transports.heartbeat_delay(), Duration::from_secs(25));
        assert_eq!(config.listener.max_connections, 10_000);
    }

    #[test]
    fn websocket_flag_is_read() {
        let config: SockJsConfig = toml::from_str(
            r#"
            [transports]
            websocket = false
            heartbeat_delay_ms = 100
            "#,
        )
        .unwrap();
        assert!(!config.transports.websocket);
        assert_eq!(config.transports.heartbeat_delay_ms, 100);
        assert_eq!(config.transports.disconnect_delay_ms, 5_000);
    }
}
