//! Metrics collection and exposition.
//!
//! # Metrics
//! - `sockjs_connections_total` (counter): connections opened, by transport
//! - `sockjs_connections_active` (gauge): live connections, by transport
//! - `sockjs_sessions_active` (gauge): sessions held by the store
//! - `sockjs_messages_received_total` / `sockjs_messages_sent_total` (counter)
//! - `sockjs_bytes_sent_total` (counter): wire bytes written, by transport
//! - `sockjs_delivery_failures_total` (counter): writes that lost the connection
//! - `sockjs_heartbeat_suspensions_total` (counter)
//! - `sockjs_rejections_total` (counter): protocol rejections, by status

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and serve it on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_connection_opened(transport: &'static str) {
    counter!("sockjs_connections_total", "transport" => transport).increment(1);
    gauge!("sockjs_connections_active", "transport" => transport).increment(1.0);
}

pub fn record_connection_closed(transport: &'static str) {
    gauge!("sockjs_connections_active", "transport" => transport).decrement(1.0);
}

pub fn record_session_opened() {
    gauge!("sockjs_sessions_active").increment(1.0);
}

pub fn record_session_closed() {
    gauge!("sockjs_sessions_active").decrement(1.0);
}

pub fn record_messages_received(transport: &'static str, count: usize) {
    counter!("sockjs_messages_received_total", "transport" => transport).increment(count as u64);
}

pub fn record_messages_sent(transport: &'static str, count: usize) {
    counter!("sockjs_messages_sent_total", "transport" => transport).increment(count as u64);
}

pub fn record_delivery(transport: &'static str, bytes: usize) {
    counter!("sockjs_bytes_sent_total", "transport" => transport).increment(bytes as u64);
}

pub fn record_delivery_failure(transport: &'static str) {
    counter!("sockjs_delivery_failures_total", "transport" => transport).increment(1);
}

pub fn record_heartbeat_suspension() {
    counter!("sockjs_heartbeat_suspensions_total").increment(1);
}

pub fn record_rejection(status: u16) {
    counter!("sockjs_rejections_total", "status" => status.to_string()).increment(1);
}
