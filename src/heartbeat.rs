//! Heartbeat monitor.
//!
//! # State Machine
//! ```text
//! tick:  ping unanswered && active → suspend session, active = false
//!        then send a fresh ping (awaiting_pong = true)
//! pong:  awaiting_pong = false; !active → activate session, active = true
//! inbound message: !active → activate session, active = true
//! ```
//!
//! A missed pong never closes the connection. It only demotes the session to
//! suspended so that outbound messages are buffered until the client shows
//! signs of life again.
//!
//! The first tick assumes liveness: nothing is outstanding until the first
//! ping has been sent, so suspension needs one full unanswered interval.

/// What the connection task must do to the session after a heartbeat event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// Nothing changed.
    Unchanged,
    /// Call `Session::suspend`.
    Suspend,
    /// Call `Session::activate`.
    Activate,
}

/// Per-connection heartbeat state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatState {
    awaiting_pong: bool,
    active: bool,
}

impl HeartbeatState {
    /// `active` mirrors the session's activity at attachment time.
    pub fn new(active: bool) -> Self {
        Self {
            awaiting_pong: false,
            active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn awaiting_pong(&self) -> bool {
        self.awaiting_pong
    }

    /// Connection opened and the session was attached.
    pub fn on_open(&mut self) {
        self.active = true;
    }

    /// A heartbeat tick fired; a new ping is about to be sent.
    pub fn on_tick(&mut self) -> Liveness {
        let missed = self.awaiting_pong;
        self.awaiting_pong = true;

        if missed && self.active {
            self.active = false;
            Liveness::Suspend
        } else {
            Liveness::Unchanged
        }
    }

    /// The client answered the outstanding ping.
    pub fn on_pong(&mut self) -> Liveness {
        self.awaiting_pong = false;
        self.wake()
    }

    /// An inbound message arrived; any traffic proves liveness.
    pub fn on_message(&mut self) -> Liveness {
        self.wake()
    }

    fn wake(&mut self) -> Liveness {
        if self.active {
            Liveness::Unchanged
        } else {
            self.active = true;
            Liveness::Activate
        }
    }
}
