//! Back-reference from a session to the connection currently serving it.
//!
//! The session holds a [`Consumer`]; the connection task owns the matching
//! [`Mailbox`]. Message batches travel through a bounded queue. The close
//! notification has its own slot, so a full queue can never swallow it.

use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tokio::sync::{mpsc, oneshot};

use crate::net::ConnectionId;
use crate::session::CloseStatus;

/// Work handed from a session to its attached connection task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Deliver these messages, in order.
    Messages(Vec<String>),
    /// The session closed; notify the peer and finish the connection.
    Close(CloseStatus),
}

/// The attached consumer of a session.
///
/// Holds only sending halves, so a session never keeps a dead connection
/// alive.
#[derive(Debug)]
pub struct Consumer {
    connection: ConnectionId,
    messages: mpsc::Sender<Vec<String>>,
    close: oneshot::Sender<CloseStatus>,
}

/// Receiving side of a [`Consumer`], owned by the connection task.
#[derive(Debug)]
pub struct Mailbox {
    messages: mpsc::Receiver<Vec<String>>,
    close: Option<oneshot::Receiver<CloseStatus>>,
}

impl Consumer {
    /// Create a consumer whose queue holds at most `capacity` batches.
    pub fn channel(connection: ConnectionId, capacity: usize) -> (Self, Mailbox) {
        let (messages_tx, messages_rx) = mpsc::channel(capacity.max(1));
        let (close_tx, close_rx) = oneshot::channel();
        let consumer = Self {
            connection,
            messages: messages_tx,
            close: close_tx,
        };
        let mailbox = Mailbox {
            messages: messages_rx,
            close: Some(close_rx),
        };
        (consumer, mailbox)
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    /// Queue a batch without waiting. The batch comes back on failure.
    pub(crate) fn try_deliver(&self, batch: Vec<String>) -> Result<(), TrySendError<Vec<String>>> {
        self.messages.try_send(batch)
    }

    /// Signal the close after everything already queued.
    pub(crate) fn close(self, status: CloseStatus) {
        if self.close.send(status).is_err() {
            tracing::trace!(connection = %self.connection, "Close notification had no receiver");
        }
    }
}

impl Mailbox {
    /// Next piece of work. Queued batches come first, the close last.
    ///
    /// Returns `None` once the consumer was dropped without closing.
    /// Cancel safe.
    pub async fn recv(&mut self) -> Option<Outbound> {
        if let Some(batch) = self.messages.recv().await {
            return Some(Outbound::Messages(batch));
        }
        let close = self.close.as_mut()?;
        let status = close.await.ok();
        self.close = None;
        status.map(Outbound::Close)
    }

    /// Non-blocking [`Mailbox::recv`].
    pub fn try_recv(&mut self) -> Option<Outbound> {
        match self.messages.try_recv() {
            Ok(batch) => return Some(Outbound::Messages(batch)),
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => {}
        }
        let close = self.close.as_mut()?;
        match close.try_recv() {
            Ok(status) => {
                self.close = None;
                Some(Outbound::Close(status))
            }
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => {
                self.close = None;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status() -> CloseStatus {
        CloseStatus {
            code: 3000,
            reason: "Go away!".into(),
        }
    }

    #[tokio::test]
    async fn close_arrives_after_queued_batches() {
        let (consumer, mut mailbox) = Consumer::channel(ConnectionId::new(), 4);
        consumer.try_deliver(vec!["a".into()]).unwrap();
        consumer.close(status());

        assert_eq!(mailbox.recv().await, Some(Outbound::Messages(vec!["a".into()])));
        assert_eq!(mailbox.recv().await, Some(Outbound::Close(status())));
        assert_eq!(mailbox.recv().await, None);
    }

    #[test]
    fn full_queue_returns_the_batch_and_keeps_the_close_slot() {
        let (consumer, mut mailbox) = Consumer::channel(ConnectionId::new(), 1);
        consumer.try_deliver(vec!["first".into()]).unwrap();

        match consumer.try_deliver(vec!["second".into()]) {
            Err(TrySendError::Full(batch)) => assert_eq!(batch, vec!["second"]),
            other => panic!("expected a full queue, got {other:?}"),
        }

        consumer.close(status());
        assert_eq!(mailbox.try_recv(), Some(Outbound::Messages(vec!["first".into()])));
        assert_eq!(mailbox.try_recv(), Some(Outbound::Close(status())));
    }

    #[tokio::test]
    async fn dropped_consumer_ends_the_mailbox() {
        let (consumer, mut mailbox) = Consumer::channel(ConnectionId::new(), 1);
        drop(consumer);
        assert_eq!(mailbox.recv().await, None);
    }

    #[test]
    fn dropped_mailbox_is_reported_as_closed() {
        let (consumer, mailbox) = Consumer::channel(ConnectionId::new(), 1);
        drop(mailbox);
        assert!(matches!(
            consumer.try_deliver(vec!["x".into()]),
            Err(TrySendError::Closed(_))
        ));
    }
}
