//! Applications served over sessions.
//!
//! An application runs once per session. It reads inbound messages with
//! [`Session::recv`] and answers with [`Session::send`]; returning ends the
//! session.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::session::Session;

/// Behavior attached to every new session.
pub trait Application: Send + Sync + 'static {
    fn serve(&self, session: Arc<Session>) -> BoxFuture<'static, ()>;
}

impl<F, Fut> Application for F
where
    F: Fn(Arc<Session>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn serve(&self, session: Arc<Session>) -> BoxFuture<'static, ()> {
        Box::pin(self(session))
    }
}

/// Sends every message straight back.
#[derive(Debug, Clone, Copy, Default)]
pub struct Echo;

impl Application for Echo {
    fn serve(&self, session: Arc<Session>) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            while let Some(message) = session.recv().await {
                if let Err(e) = session.send(message) {
                    tracing::debug!(session = %session.key(), error = %e, "Echo dropped a message");
                }
            }
        })
    }
}
