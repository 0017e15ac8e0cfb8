//! Session subsystem.
//!
//! # Data Flow
//! ```text
//! Transport attaches (consumer = outbound channel of the connection task)
//!     → state.rs (Fresh → Active ⇄ Suspended → Closed)
//!     → inbound queue  → Application (Session::recv)
//!     → Application    → Session::send → consumer or pending buffer
//!
//! store.rs: key → Arc<Session>, spawns the application per session,
//!           forgets sessions once their application finished,
//!           sweeps sessions left without a consumer too long.
//! ```
//!
//! # Design Decisions
//! - The session never owns the connection; it holds a sender into the
//!   connection task and treats a dead channel as a detach
//! - At most one consumer; a second attach fails instead of waiting
//! - `Closed` is terminal and closing twice is a no-op

pub mod consumer;
pub mod state;
pub mod store;

pub use consumer::{Consumer, Mailbox, Outbound};
pub use state::{CloseStatus, Session, SessionKey, SessionState};
pub use store::{SessionStore, SessionSweeper};
