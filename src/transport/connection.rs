//! Per-connection event loop binding a WebSocket to a session.
//!
//! # Event Handling
//! ```text
//! open      → heartbeat active, Session::attach_consumer, opening frame
//! text      → activate if inactive, decode, Session::receive_message
//!             (a full inbound queue ends the connection)
//! pong      → heartbeat answered, activate if inactive
//! tick      → suspend on missed pong, send ping + heartbeat frame
//! outbound  → encode and write, then Session::flush; a write failure ends
//!             the connection
//! close     → Session::close(1000, "Session finished")
//! ```
//!
//! Closing the socket is the only cancellation signal. The heartbeat timer
//! lives inside the loop and dies with it.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket};
use futures_util::{Sink, SinkExt, StreamExt};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use crate::error::SessionError;
use crate::heartbeat::{HeartbeatState, Liveness};
use crate::net::ConnectionId;
use crate::observability::metrics;
use crate::protocol::Frame;
use crate::session::{Consumer, Outbound, Session, SessionState};
use crate::transport::Transport;

const FINISHED: (u16, &str) = (1000, "Session finished");
const ANOTHER_CONNECTION: (u16, &str) = (2010, "Another connection still open");
const GO_AWAY: (u16, &str) = (3000, "Go away!");

/// Payload of the liveness ping.
const PING_PAYLOAD: &[u8] = b"ping";

/// Why a connection loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    /// Never attached; the session is left alone.
    Refused,
    ClientClosed,
    SessionClosed,
    DeliveryFailed,
    BrokenPayload,
    InboundOverflow,
}

/// Outcome of writing a batch of wire frames.
#[derive(Debug)]
pub struct Delivery<E> {
    /// Frames fully written.
    pub frames: usize,
    /// Bytes of frames fully written.
    pub bytes: usize,
    /// The write error that stopped the batch, if any.
    pub error: Option<E>,
}

/// Write `frames` in order, stopping at the first failure.
///
/// Delivery is best-effort: frames before the failure stay sent, the rest
/// are dropped and the caller treats the connection as lost.
pub async fn deliver<S>(sink: &mut S, frames: Vec<String>) -> Delivery<S::Error>
where
    S: Sink<Message> + Unpin,
{
    let mut delivery = Delivery {
        frames: 0,
        bytes: 0,
        error: None,
    };

    for frame in frames {
        let len = frame.len();
        if let Err(e) = sink.send(Message::Text(frame.into())).await {
            delivery.error = Some(e);
            break;
        }
        delivery.frames += 1;
        delivery.bytes += len;
    }
    delivery
}

/// Send a liveness ping followed by the transport's heartbeat frame.
pub async fn send_heartbeat<S, T>(sink: &mut S, transport: &T) -> Result<(), S::Error>
where
    S: Sink<Message> + Unpin,
    T: Transport,
{
    if !transport.heartbeat_enabled() {
        return Ok(());
    }
    sink.send(Message::Ping(Bytes::from_static(PING_PAYLOAD))).await?;
    match deliver(sink, transport.encode_frame(Frame::Heartbeat)).await.error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Close the WebSocket. Failures are logged, never propagated.
pub async fn finish<S>(sink: &mut S)
where
    S: Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    if let Err(e) = sink.send(Message::Close(None)).await {
        tracing::trace!(error = %e, "Failed to send close frame");
    }
    if let Err(e) = sink.close().await {
        tracing::trace!(error = %e, "Failed to close socket");
    }
}

/// Heartbeat timer whose first tick is one `delay` away.
///
/// A stalled loop gets a single late tick, never a burst, so the client
/// always has a full interval to answer each ping.
pub fn heartbeat_ticker(delay: Duration) -> Interval {
    let mut ticker = time::interval_at(Instant::now() + delay, delay);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Drive `socket` for `session` until either side goes away.
#[tracing::instrument(
    skip_all,
    fields(connection = %connection, transport = transport.kind().name(), session = %session.key())
)]
pub async fn attach_session<T: Transport>(
    transport: T,
    socket: WebSocket,
    session: Arc<Session>,
    connection: ConnectionId,
) {
    let name = transport.kind().name();
    metrics::record_connection_opened(name);

    let exit = run(&transport, socket, &session, connection).await;
    tracing::debug!(?exit, "Connection finished");

    if exit != Exit::Refused {
        session.close(FINISHED.0, FINISHED.1);
    }
    metrics::record_connection_closed(name);
}

async fn run<T: Transport>(
    transport: &T,
    socket: WebSocket,
    session: &Session,
    connection: ConnectionId,
) -> Exit {
    let (mut sink, mut stream) = socket.split();
    let (consumer, mut outbound) =
        Consumer::channel(connection, transport.options().max_pending_messages);
    let mut heartbeat = HeartbeatState::new(session.state() == SessionState::Active);

    heartbeat.on_open();
    if let Err(e) = session.attach_consumer(consumer) {
        tracing::warn!(error = %e, "Refusing connection");
        let (code, reason) = match e {
            SessionError::AlreadyAttached => (ANOTHER_CONNECTION.0, ANOTHER_CONNECTION.1.to_string()),
            _ => session
                .close_status()
                .map(|s| (s.code, s.reason))
                .unwrap_or((GO_AWAY.0, GO_AWAY.1.to_string())),
        };
        let _ = deliver(&mut sink, transport.encode_frame(Frame::close(code, reason))).await;
        finish(&mut sink).await;
        return Exit::Refused;
    }

    if let Some(e) = deliver(&mut sink, transport.encode_frame(Frame::Open)).await.error {
        tracing::debug!(error = %e, "Failed to send open frame");
        return Exit::DeliveryFailed;
    }

    let mut ticker = heartbeat_ticker(transport.options().heartbeat_delay());
    let heartbeat_on = transport.heartbeat_enabled();
    let name = transport.kind().name();

    loop {
        tokio::select! {
            _ = ticker.tick(), if heartbeat_on => {
                if heartbeat.on_tick() == Liveness::Suspend {
                    tracing::debug!("Heartbeat unanswered, suspending session");
                    session.suspend();
                    metrics::record_heartbeat_suspension();
                }
                if let Err(e) = send_heartbeat(&mut sink, transport).await {
                    tracing::debug!(error = %e, "Failed to send heartbeat");
                    metrics::record_delivery_failure(name);
                    return Exit::DeliveryFailed;
                }
            }

            work = outbound.recv() => match work {
                Some(Outbound::Messages(messages)) => {
                    let count = messages.len();
                    let delivery = deliver(&mut sink, transport.encode_frame(Frame::Message(messages))).await;
                    metrics::record_delivery(name, delivery.bytes);
                    if let Some(e) = delivery.error {
                        tracing::warn!(
                            messages = count,
                            frames_sent = delivery.frames,
                            bytes_sent = delivery.bytes,
                            error = %e,
                            "Error delivering messages"
                        );
                        metrics::record_delivery_failure(name);
                        return Exit::DeliveryFailed;
                    }
                    metrics::record_messages_sent(name, count);
                    session.flush();
                }
                Some(Outbound::Close(status)) => {
                    let _ = deliver(&mut sink, transport.encode_frame(Frame::close(status.code, status.reason))).await;
                    finish(&mut sink).await;
                    return Exit::SessionClosed;
                }
                None => return Exit::SessionClosed,
            },

            event = stream.next() => {
                let text = match event {
                    Some(Ok(Message::Text(text))) => text.as_str().to_owned(),
                    Some(Ok(Message::Binary(data))) => match String::from_utf8(data.to_vec()) {
                        Ok(text) => text,
                        Err(_) => {
                            tracing::warn!(len = data.len(), "Non UTF-8 binary message, closing");
                            finish(&mut sink).await;
                            return Exit::BrokenPayload;
                        }
                    },
                    Some(Ok(Message::Pong(_))) => {
                        tracing::trace!("pong");
                        if heartbeat.on_pong() == Liveness::Activate {
                            session.activate();
                        }
                        continue;
                    }
                    // Answered by the WebSocket layer.
                    Some(Ok(Message::Ping(_))) => continue,
                    Some(Ok(Message::Close(_))) | None => return Exit::ClientClosed,
                    Some(Err(e)) => {
                        tracing::debug!(error = %e, "WebSocket read failed");
                        return Exit::ClientClosed;
                    }
                };

                if heartbeat.on_message() == Liveness::Activate {
                    session.activate();
                }
                match transport.decode_message(&text) {
                    Ok(messages) => {
                        metrics::record_messages_received(name, messages.len());
                        for message in messages {
                            if let Err(SessionError::BufferFull(pending)) = session.receive_message(message) {
                                tracing::warn!(pending, "Application not keeping up, closing");
                                finish(&mut sink).await;
                                return Exit::InboundOverflow;
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Error receiving message, closing");
                        finish(&mut sink).await;
                        return Exit::BrokenPayload;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransportConfig;
    use crate::transport::{RawWebSocketTransport, WebSocketTransport};
    use futures_util::sink;

    fn texts(messages: &[Message]) -> Vec<String> {
        messages
            .iter()
            .filter_map(|m| match m {
                Message::Text(t) => Some(t.as_str().to_owned()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn framed_batches_into_one_frame() {
        let transport = WebSocketTransport::new(TransportConfig::default());
        let mut written: Vec<Message> = Vec::new();
        let frames = transport.encode_frame(Frame::Message(vec!["a".into(), "b".into()]));
        let delivery = deliver(&mut written, frames).await;

        assert_eq!(delivery.frames, 1);
        assert_eq!(delivery.bytes, r#"a["a","b"]"#.len());
        assert_eq!(texts(&written), vec![r#"a["a","b"]"#]);
    }

    #[tokio::test]
    async fn raw_sends_each_message_and_counts_bytes() {
        let transport = RawWebSocketTransport::new(TransportConfig::default());
        let mut written: Vec<Message> = Vec::new();
        let frames = transport.encode_frame(Frame::Message(vec!["one".into(), "three".into()]));
        let delivery = deliver(&mut written, frames).await;

        assert_eq!(delivery.frames, 2);
        assert_eq!(delivery.bytes, 8);
        assert!(delivery.error.is_none());
        assert_eq!(texts(&written), vec!["one", "three"]);
    }

    #[tokio::test]
    async fn partial_delivery_reports_what_was_sent() {
        let mut failing = Box::pin(sink::unfold(0usize, |sent, _msg: Message| async move {
            if sent == 1 {
                Err("connection reset")
            } else {
                Ok(sent + 1)
            }
        }));
        let delivery = deliver(&mut failing, vec!["ab".into(), "cd".into(), "ef".into()]).await;

        assert_eq!(delivery.frames, 1);
        assert_eq!(delivery.bytes, 2);
        assert_eq!(delivery.error, Some("connection reset"));
    }

    #[tokio::test]
    async fn heartbeat_is_ping_then_h() {
        let transport = WebSocketTransport::new(TransportConfig::default());
        let mut written: Vec<Message> = Vec::new();
        send_heartbeat(&mut written, &transport).await.unwrap();

        assert_eq!(written.len(), 2);
        assert!(matches!(&written[0], Message::Ping(p) if p.as_ref() == PING_PAYLOAD));
        assert_eq!(texts(&written), vec!["h"]);
    }

    #[tokio::test]
    async fn first_heartbeat_waits_a_full_interval() {
        let delay = Duration::from_millis(40);
        let mut ticker = heartbeat_ticker(delay);
        let start = Instant::now();
        ticker.tick().await;
        assert!(start.elapsed() >= delay / 2);
    }

    #[tokio::test]
    async fn stalled_loop_gets_one_late_tick_not_a_burst() {
        let delay = Duration::from_millis(40);
        let mut ticker = heartbeat_ticker(delay);

        // Several intervals pass without the loop polling the timer.
        time::sleep(delay * 4).await;
        ticker.tick().await;

        let start = Instant::now();
        ticker.tick().await;
        assert!(start.elapsed() >= delay / 2);
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn finish_on_a_dead_socket_logs_at_trace() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let mut dead = Box::pin(sink::unfold((), |_, _msg: Message| async move {
            Err::<(), _>("broken pipe")
        }));
        finish(&mut dead).await;

        let output = String::from_utf8(captured.0.lock().clone()).unwrap();
        assert!(output.contains("TRACE"), "{output}");
        assert!(output.contains("Failed to send close frame"), "{output}");
        assert!(output.contains("broken pipe"), "{output}");
    }

    #[tokio::test]
    async fn raw_heartbeat_writes_nothing() {
        let transport = RawWebSocketTransport::new(TransportConfig::default());
        let mut written: Vec<Message> = Vec::new();
        send_heartbeat(&mut written, &transport).await.unwrap();
        assert!(written.is_empty());
    }
}
