//! SockJS server core.
//!
//! Serves an [`Application`] over the SockJS WebSocket transports: the framed
//! endpoint used by browser clients and the raw RFC 6455 endpoint used by
//! everything else.

// Core subsystems
pub mod config;
pub mod http;
pub mod net;
pub mod routing;

// Protocol and sessions
pub mod app;
pub mod heartbeat;
pub mod protocol;
pub mod session;
pub mod transport;

// Cross-cutting concerns
pub mod error;
pub mod lifecycle;
pub mod observability;

pub use app::{Application, Echo};
pub use config::schema::SockJsConfig;
pub use http::SockJsServer;
pub use lifecycle::Shutdown;
pub use session::Session;
