//! Link lifecycle state machine.
//!
//! [`LinkMachine`] holds the supervisor's state and consecutive-error
//! counter. It performs no I/O: the supervisor feeds it [`LinkEvent`]s and
//! carries out the [`Action`] each transition returns, which keeps the
//! backoff and reset rules testable on their own.

/// Default number of consecutive errors before the link is reopened.
pub const DEFAULT_ERROR_THRESHOLD: u32 = 10;

/// Connection state of the serial link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
    /// The link is closed and waiting to be reopened.
    Backoff,
}

/// Something that happened to the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// The supervisor was started.
    Start,
    /// The transport opened successfully.
    Opened,
    /// The transport could not be opened.
    OpenFailed,
    /// A reading was parsed and accepted by the sink.
    Forwarded,
    /// A read, decode or forward failure.
    Fault,
    /// The backoff wait is over.
    BackoffElapsed,
    /// External stop request.
    Stop,
}

/// What the supervisor must do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Open the transport.
    Open,
    /// Keep polling for lines.
    Poll,
    /// Close the transport and wait before reopening.
    CloseAndWait,
    /// Stop the loop.
    Halt,
    /// The event does not apply in the current state.
    Ignore,
}

#[derive(Debug, Clone)]
pub struct LinkMachine {
    state: LinkState,
    consecutive_errors: u32,
    threshold: u32,
}

impl LinkMachine {
    /// Create a machine in `Disconnected` with the given error threshold.
    ///
    /// A threshold of 0 is treated as 1.
    pub fn new(threshold: u32) -> Self {
        Self {
            state: LinkState::Disconnected,
            consecutive_errors: 0,
            threshold: threshold.max(1),
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn consecutive_errors(&self) -> u32 {
        self.consecutive_errors
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Apply an event and return the action to perform.
    pub fn on(&mut self, event: LinkEvent) -> Action {
        use LinkEvent as E;
        use LinkState as S;

        match (self.state, event) {
            (_, E::Stop) => {
                self.state = S::Disconnected;
                Action::Halt
            }
            (S::Disconnected, E::Start) => {
                self.state = S::Connecting;
                Action::Open
            }
            (S::Connecting, E::Opened) => {
                self.state = S::Connected;
                self.consecutive_errors = 0;
                Action::Poll
            }
            (S::Connecting, E::OpenFailed) => {
                self.state = S::Disconnected;
                Action::Halt
            }
            (S::Connected, E::Forwarded) => {
                self.consecutive_errors = 0;
                Action::Poll
            }
            (S::Connected, E::Fault) => {
                self.consecutive_errors += 1;
                if self.consecutive_errors >= self.threshold {
                    self.state = S::Backoff;
                    self.consecutive_errors = 0;
                    Action::CloseAndWait
                } else {
                    Action::Poll
                }
            }
            (S::Backoff, E::BackoffElapsed) => {
                self.state = S::Connecting;
                Action::Open
            }
            _ => Action::Ignore,
        }
    }
}

impl Default for LinkMachine {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_THRESHOLD)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
