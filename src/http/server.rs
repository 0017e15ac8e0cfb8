//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the dispatch handler
//! - Wire up middleware (request ID, tracing)
//! - Dispatch requests through the handler registry
//! - Run the idle-session sweeper
//! - Apply configuration updates as they arrive
//! - Close sessions and drain connections on shutdown

use std::io;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::app::Application;
use crate::config::SockJsConfig;
use crate::http::{request, response, websocket, welcome};
use crate::net::ConnectionTracker;
use crate::routing::{match_path, HandlerKind, HandlerRegistry};
use crate::session::{SessionStore, SessionSweeper};
use crate::transport::{RawWebSocketTransport, WebSocketTransport};

const GO_AWAY: (u16, &str) = (3000, "Go away!");

/// How long shutdown waits for connections to finish.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<HandlerRegistry>,
    pub config: Arc<ArcSwap<SockJsConfig>>,
    pub sessions: Arc<SessionStore>,
    pub connections: ConnectionTracker,
    pub app: Arc<dyn Application>,
}

/// SockJS server for one mounted application.
pub struct SockJsServer {
    state: AppState,
}

impl SockJsServer {
    pub fn new(config: SockJsConfig, registry: HandlerRegistry, app: Arc<dyn Application>) -> Self {
        let state = AppState {
            registry: Arc::new(registry),
            config: Arc::new(ArcSwap::from_pointee(config)),
            sessions: Arc::new(SessionStore::new()),
            connections: ConnectionTracker::new(),
            app,
        };
        Self { state }
    }

    /// Build the Axum router with all middleware layers.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", any(dispatch))
            .route("/{*path}", any(dispatch))
            .with_state(self.state.clone())
            .layer(PropagateRequestIdLayer::new(request::X_REQUEST_ID))
            .layer(TraceLayer::new_for_http().make_span_with(request::make_span))
            .layer(SetRequestIdLayer::new(request::X_REQUEST_ID, MakeRequestUuid))
    }

    pub fn sessions(&self) -> Arc<SessionStore> {
        Arc::clone(&self.state.sessions)
    }

    pub fn config(&self) -> Arc<SockJsConfig> {
        self.state.config.load_full()
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<SockJsConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            prefix = %self.state.config.load().prefix,
            "SockJS server starting"
        );

        let sweeper = SessionSweeper::new(self.sessions(), Arc::clone(&self.state.config));
        tokio::spawn(sweeper.run(shutdown.resubscribe()));

        let live_config = Arc::clone(&self.state.config);
        tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                tracing::info!(
                    prefix = %new_config.prefix,
                    websocket = new_config.transports.websocket,
                    "Applying new configuration"
                );
                live_config.store(Arc::new(new_config));
            }
        });

        let app = self.router();
        let sessions = self.sessions();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!(sessions = sessions.len(), "Closing sessions");
                sessions.close_all(GO_AWAY.0, GO_AWAY.1);
            })
            .await?;

        if !self.state.connections.wait_for_drain(DRAIN_TIMEOUT).await {
            tracing::warn!(
                remaining = self.state.connections.active_count(),
                "Connections still open after drain timeout"
            );
        }
        tracing::info!("SockJS server stopped");
        Ok(())
    }
}

/// Resolve the request through the registry and hand it to its handler.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let config = state.config.load_full();
    let path = request.uri().path().to_owned();
    let method = request.method().clone();

    let Some(route) = match_path(&config.prefix, &path) else {
        tracing::debug!(path = %path, "No route matched");
        return response::not_found();
    };

    let Some(kind) = state.registry.resolve(&route.prefix, &method) else {
        let allowed = state.registry.allowed_methods(&route.prefix);
        if allowed.is_empty() {
            tracing::debug!(path = %path, prefix = %route.prefix, "No handler registered");
            return response::not_found();
        }
        tracing::debug!(path = %path, method = %method, "Method not allowed");
        return response::method_not_allowed(&allowed);
    };

    match kind {
        HandlerKind::Welcome => welcome::handle(),
        HandlerKind::WebSocket => {
            let transport = WebSocketTransport::new(config.transports.clone());
            websocket::upgrade(transport, state, request, route).await
        }
        HandlerKind::RawWebSocket => {
            let transport = RawWebSocketTransport::new(config.transports.clone());
            websocket::upgrade(transport, state, request, route).await
        }
    }
}
