//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request-id + trace layers)
//!     → dispatch: routing::match_path → HandlerRegistry::resolve
//!     → welcome.rs | websocket.rs (validate, upgrade, attach session)
//!     → response.rs (404 / 405 for everything else)
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod websocket;
pub mod welcome;

pub use request::X_REQUEST_ID;
pub use server::{AppState, SockJsServer};
