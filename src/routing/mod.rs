//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, method)
//!     → matcher.rs (strip mount prefix, derive registration key)
//!     → registry.rs (key + method → handler kind)
//!     → Return: handler kind, or NotFound / MethodNotAllowed
//!
//! Registry population (at startup):
//!     HandlerRegistry::standard()
//!     → one explicit register() per handler kind
//!     → duplicate (prefix, method) is a fatal error
//!     → Freeze as immutable registry
//! ```
//!
//! # Design Decisions
//! - Registry built at startup, immutable at runtime
//! - No regex in hot path (segment matching only)
//! - Deterministic: same input always resolves to the same handler

pub mod matcher;
pub mod registry;

pub use matcher::{match_path, RouteMatch, SessionPath};
pub use registry::{HandlerKind, HandlerRegistration, HandlerRegistry};
