//! Session state machine.
//!
//! # States
//! ```text
//! Fresh → Active → Suspended → Active → ... → Closed
//! ```
//!
//! # State Transitions
//! - `attach_consumer`: Fresh | Suspended | Active (unattached) → Active
//! - `suspend` / `detach_consumer`: Active → Suspended
//! - `activate`: Suspended → Active
//! - `close`: any → Closed (terminal)

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::SessionError;
use crate::net::ConnectionId;
use crate::session::Consumer;

/// Opaque address of a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey(String);

impl SessionKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// WebSocket transports exchange no session id; the connection is the identity.
impl From<ConnectionId> for SessionKey {
    fn from(id: ConnectionId) -> Self {
        Self(id.as_u64().to_string())
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, never attached.
    Fresh,
    /// A live consumer receives outbound messages.
    Active,
    /// No confirmed live connection, but not terminated.
    Suspended,
    /// Terminal.
    Closed,
}

/// Code and reason recorded when a session closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseStatus {
    pub code: u16,
    pub reason: String,
}

#[derive(Debug)]
struct Inner {
    state: SessionState,
    consumer: Option<Consumer>,
    pending: VecDeque<String>,
    close_status: Option<CloseStatus>,
    inbound_tx: Option<mpsc::Sender<String>>,
    unattached_since: Option<Instant>,
}

impl Inner {
    /// Hand buffered messages to the consumer as one batch. On a full queue
    /// they stay buffered; a dead consumer is detached.
    fn flush(&mut self) {
        if self.state != SessionState::Active || self.pending.is_empty() {
            return;
        }
        let Some(consumer) = &self.consumer else {
            return;
        };

        let batch: Vec<String> = self.pending.drain(..).collect();
        match consumer.try_deliver(batch) {
            Ok(()) => {}
            Err(TrySendError::Full(batch)) => {
                self.pending = batch.into();
            }
            Err(TrySendError::Closed(batch)) => {
                self.pending = batch.into();
                self.lose_consumer();
            }
        }
    }

    fn lose_consumer(&mut self) {
        self.consumer = None;
        self.unattached_since = Some(Instant::now());
        if self.state == SessionState::Active {
            self.state = SessionState::Suspended;
        }
    }
}

/// A logical, transport-independent conversation.
#[derive(Debug)]
pub struct Session {
    key: SessionKey,
    max_pending: usize,
    inner: Mutex<Inner>,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<String>>,
}

impl Session {
    /// Create a fresh session holding at most `max_pending` undelivered
    /// messages in each direction.
    pub fn new(key: SessionKey, max_pending: usize) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel(max_pending.max(1));
        Self {
            key,
            max_pending,
            inner: Mutex::new(Inner {
                state: SessionState::Fresh,
                consumer: None,
                pending: VecDeque::new(),
                close_status: None,
                inbound_tx: Some(inbound_tx),
                unattached_since: Some(Instant::now()),
            }),
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
        }
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().state
    }

    pub fn is_closed(&self) -> bool {
        self.state() == SessionState::Closed
    }

    pub fn close_status(&self) -> Option<CloseStatus> {
        self.inner.lock().close_status.clone()
    }

    /// Connection currently attached, if any.
    pub fn consumer(&self) -> Option<ConnectionId> {
        self.inner.lock().consumer.as_ref().map(Consumer::connection)
    }

    pub fn pending_len(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// How long the session has gone without a consumer, `None` while one is
    /// attached or once closed.
    pub fn unattached_for(&self, now: Instant) -> Option<Duration> {
        let inner = self.inner.lock();
        if inner.state == SessionState::Closed {
            return None;
        }
        inner
            .unattached_since
            .map(|since| now.saturating_duration_since(since))
    }

    /// Bind a connection to this session.
    ///
    /// Fails without side effects if another consumer is attached or the
    /// session is closed. Buffered messages are flushed to the new consumer.
    pub fn attach_consumer(&self, consumer: Consumer) -> Result<(), SessionError> {
        let mut inner = self.inner.lock();
        if inner.state == SessionState::Closed {
            return Err(SessionError::Closed);
        }
        if inner.consumer.is_some() {
            return Err(SessionError::AlreadyAttached);
        }

        tracing::debug!(
            session = %self.key,
            connection = %consumer.connection(),
            from = ?inner.state,
            "Consumer attached"
        );
        inner.consumer = Some(consumer);
        inner.unattached_since = None;
        inner.state = SessionState::Active;
        inner.flush();
        Ok(())
    }

    /// Clear the consumer if it is `connection`. Returns whether it was.
    pub fn detach_consumer(&self, connection: ConnectionId) -> bool {
        let mut inner = self.inner.lock();
        let attached = inner
            .consumer
            .as_ref()
            .is_some_and(|c| c.connection() == connection);
        if attached {
            inner.lose_consumer();
            tracing::debug!(session = %self.key, %connection, "Consumer detached");
        }
        attached
    }

    /// Suspended → Active, flushing anything buffered meanwhile.
    pub fn activate(&self) {
        let mut inner = self.inner.lock();
        if inner.state == SessionState::Suspended {
            inner.state = SessionState::Active;
            tracing::debug!(session = %self.key, "Session activated");
            inner.flush();
        }
    }

    /// Active → Suspended. The consumer stays attached.
    pub fn suspend(&self) {
        let mut inner = self.inner.lock();
        if inner.state == SessionState::Active {
            inner.state = SessionState::Suspended;
            tracing::debug!(session = %self.key, "Session suspended");
        }
    }

    /// Queue an inbound message for the application.
    ///
    /// Fails with `BufferFull` when the application is `max_pending` messages
    /// behind. A message for a closed session is logged and dropped.
    pub fn receive_message(&self, payload: String) -> Result<(), SessionError> {
        let inner = self.inner.lock();
        let tx = match &inner.inbound_tx {
            Some(tx) if inner.state != SessionState::Closed => tx,
            _ => {
                tracing::warn!(session = %self.key, "Dropping message received on closed session");
                return Err(SessionError::Closed);
            }
        };
        tx.try_send(payload).map_err(|e| match e {
            TrySendError::Full(_) => SessionError::BufferFull(self.max_pending),
            // The receiver lives as long as the session.
            TrySendError::Closed(_) => SessionError::Closed,
        })
    }

    /// Next inbound message. Returns `None` once the session is closed and
    /// everything received before the close has been consumed.
    pub async fn recv(&self) -> Option<String> {
        self.inbound_rx.lock().await.recv().await
    }

    /// Send a message towards the client.
    ///
    /// Handed to the consumer while active and its queue has room; buffered
    /// otherwise, up to `max_pending` messages.
    pub fn send(&self, message: impl Into<String>) -> Result<(), SessionError> {
        let mut inner = self.inner.lock();
        if inner.state == SessionState::Closed {
            return Err(SessionError::Closed);
        }

        inner.flush();
        if inner.pending.len() >= self.max_pending {
            return Err(SessionError::BufferFull(inner.pending.len()));
        }
        inner.pending.push_back(message.into());
        inner.flush();
        Ok(())
    }

    /// Retry handing buffered messages to the consumer, e.g. once its queue
    /// has drained.
    pub fn flush(&self) {
        self.inner.lock().flush();
    }

    /// Close the session. Idempotent: only the first call records its status.
    pub fn close(&self, code: u16, reason: impl Into<String>) {
        let mut inner = self.inner.lock();
        if inner.state == SessionState::Closed {
            return;
        }

        let status = CloseStatus {
            code,
            reason: reason.into(),
        };
        tracing::info!(session = %self.key, code, reason = %status.reason, "Session closed");

        inner.state = SessionState::Closed;
        inner.close_status = Some(status.clone());
        inner.pending.clear();
        inner.inbound_tx = None;
        inner.unattached_since = None;
        if let Some(consumer) = inner.consumer.take() {
            consumer.close(status);
        }
    }
}
