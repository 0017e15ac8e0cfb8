//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Accepted WebSocket upgrade
//!     → connection.rs (identity, live-connection accounting)
//!     → Hand off to the transport event loop
//! ```
//!
//! # Design Decisions
//! - Every connection gets a process-unique id; WebSocket sessions are keyed by it
//! - The live-connection count is bounded; upgrades beyond it are refused
//! - Accounting is released by a guard, so a panicking task cannot leak a slot

pub mod connection;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
