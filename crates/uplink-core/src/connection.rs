//! Connection lifecycle state machine
//!
//! Tracks one transport link's lifecycle as a pure state machine: the engine
//! feeds observed events in and executes whatever action the transition asks
//! for. Keeping the transitions free of IO makes the whole lifecycle testable
//! without a transport.

use core::fmt;

// ----------------------------------------------------------------------------
// Link State
// ----------------------------------------------------------------------------

/// Lifecycle state of a transport link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LinkState {
    /// No connection; the engine will attempt one on the next tick.
    #[default]
    Disconnected,
    /// A connect attempt is in flight.
    Connecting,
    /// The link is up; outbound frames may drain.
    Connected,
}

/// Observed events that drive [`LinkState`] transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// The engine wants the link up.
    ConnectRequested,
    /// The transport reported a successful connect.
    ConnectSucceeded,
    /// The transport reported a failed connect.
    ConnectFailed,
    /// The transport dropped while up.
    TransportLost,
    /// The engine wants the link down.
    StopRequested,
}

/// What the engine must do after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAction {
    /// Nothing to execute.
    None,
    /// Call `connect` on the transport driver.
    OpenTransport,
    /// Call `disconnect` on the transport driver.
    CloseTransport,
}

/// Result of consuming a state with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkTransition {
    pub next: LinkState,
    pub action: LinkAction,
}

impl LinkState {
    /// State name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            LinkState::Disconnected => "Disconnected",
            LinkState::Connecting => "Connecting",
            LinkState::Connected => "Connected",
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, LinkState::Connected)
    }

    /// Process an event and transition to the next state (consumes self).
    ///
    /// The function is total: an event that makes no sense in the current
    /// state leaves it unchanged with no action.
    pub fn transition(self, event: LinkEvent) -> LinkTransition {
        let (next, action) = match (self, event) {
            (LinkState::Disconnected, LinkEvent::ConnectRequested) => {
                (LinkState::Connecting, LinkAction::OpenTransport)
            }
            (LinkState::Connecting, LinkEvent::ConnectSucceeded) => {
                (LinkState::Connected, LinkAction::None)
            }
            (LinkState::Connecting, LinkEvent::ConnectFailed) => {
                (LinkState::Disconnected, LinkAction::None)
            }
            (LinkState::Connecting | LinkState::Connected, LinkEvent::TransportLost) => {
                (LinkState::Disconnected, LinkAction::None)
            }
            (LinkState::Connecting | LinkState::Connected, LinkEvent::StopRequested) => {
                (LinkState::Disconnected, LinkAction::CloseTransport)
            }
            // Spurious events leave the state alone.
            (state, _) => (state, LinkAction::None),
        };
        LinkTransition { next, action }
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
