//! WebSocket upgrade handling.
//!
//! # Responsibilities
//! - Run the transport's request checks before anything else
//! - Enforce the live-connection ceiling
//! - Complete the upgrade handshake with the client
//! - Open a session for the connection and hand both to the transport loop
//!
//! # Design Decisions
//! - Rejected requests never create a session
//! - The session is created only once the upgrade succeeded

use std::sync::Arc;

use axum::body::Body;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::FromRequestParts;
use axum::http::Request;
use axum::response::{IntoResponse, Response};

use crate::error::HttpError;
use crate::http::AppState;
use crate::observability::metrics;
use crate::routing::RouteMatch;
use crate::session::SessionKey;
use crate::transport::{attach_session, Transport};

/// Validate, upgrade and attach. Returns the HTTP response for the handshake.
pub async fn upgrade<T: Transport>(
    transport: T,
    state: AppState,
    request: Request<Body>,
    route: RouteMatch,
) -> Response {
    let (mut parts, _body) = request.into_parts();

    if let Err(e) = transport.handle_request(&parts.headers) {
        tracing::debug!(
            transport = transport.kind().name(),
            status = %e.status(),
            reason = %e,
            "Rejecting upgrade"
        );
        metrics::record_rejection(e.status().as_u16());
        return e.into_response();
    }

    let max_connections = state.config.load().listener.max_connections;
    let Some(guard) = state.connections.try_track(max_connections) else {
        tracing::warn!(max_connections, "Connection limit reached");
        let e = HttpError::TooManyConnections;
        metrics::record_rejection(e.status().as_u16());
        return e.into_response();
    };

    let ws = match WebSocketUpgrade::from_request_parts(&mut parts, &state).await {
        Ok(ws) => ws,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "WebSocket handshake refused");
            return rejection.into_response();
        }
    };

    tracing::debug!(
        transport = transport.kind().name(),
        connection = %guard.id(),
        session_path = ?route.session_path,
        "Upgrading to WebSockets ..."
    );

    let max_pending = transport.options().max_pending_messages;
    ws.on_upgrade(move |socket| async move {
        let connection = guard.id();
        let session = state.sessions.open(
            SessionKey::from(connection),
            max_pending,
            Arc::clone(&state.app),
        );
        attach_session(transport, socket, session, connection).await;
        drop(guard);
    })
}
