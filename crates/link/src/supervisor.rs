//! Serial link read loop.
//!
//! [`LinkSupervisor`] drives a [`LinkTransport`] through the
//! [`LinkMachine`] lifecycle: open, poll for lines, parse them, forward
//! readings to a [`ReadingSink`], and close/reopen the link after too many
//! consecutive errors. A failure to open the link ends the run with an
//! error; everything else is counted and logged.

use std::time::Duration;

use smartsense_core::frame::{self, FrameError};
use tokio_util::sync::CancellationToken;

use crate::error::LinkError;
use crate::machine::{Action, LinkEvent, LinkMachine, LinkState, DEFAULT_ERROR_THRESHOLD};
use crate::sink::ReadingSink;
use crate::transport::LinkTransport;

/// Idle delay between polls when no line is available.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Wait between closing and reopening the link during backoff.
pub const DEFAULT_REOPEN_DELAY: Duration = Duration::from_secs(2);

/// Wait after opening the port before the first poll (board reset on open).
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Timing and error budget for the supervisor loop.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Consecutive errors before the link is closed and reopened.
    pub error_threshold: u32,
    pub poll_interval: Duration,
    pub reopen_delay: Duration,
    pub settle_delay: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            error_threshold: DEFAULT_ERROR_THRESHOLD,
            poll_interval: DEFAULT_POLL_INTERVAL,
            reopen_delay: DEFAULT_REOPEN_DELAY,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

/// Counters accumulated over one supervisor's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Complete lines received from the transport.
    pub lines: u64,
    /// Readings accepted by the sink.
    pub forwarded: u64,
    /// Read, decode and forward failures.
    pub faults: u64,
    /// Backoff cycles (close + reopen).
    pub reconnects: u64,
}

pub struct LinkSupervisor<T: LinkTransport> {
    transport: T,
    machine: LinkMachine,
    config: SupervisorConfig,
    stats: LinkStats,
}

impl<T: LinkTransport> LinkSupervisor<T> {
    pub fn new(transport: T, config: SupervisorConfig) -> Self {
        Self {
            transport,
            machine: LinkMachine::new(config.error_threshold),
            config,
            stats: LinkStats::default(),
        }
    }

    pub fn state(&self) -> LinkState {
        self.machine.state()
    }

    pub fn consecutive_errors(&self) -> u32 {
        self.machine.consecutive_errors()
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run the read loop until `cancel` fires or the link cannot be opened.
    ///
    /// The transport is closed on every exit path, including the returned
    /// future being dropped mid-poll.
    pub async fn run<S>(&mut self, sink: &S, cancel: &CancellationToken) -> Result<(), LinkError>
    where
        S: ReadingSink + ?Sized,
    {
        let mut guard = CloseOnDrop(&mut self.transport);
        let mut ctx = Loop {
            transport: &mut *guard.0,
            machine: &mut self.machine,
            stats: &mut self.stats,
            config: &self.config,
        };
        ctx.drive(sink, cancel).await
    }
}

/// Closes the transport when the run ends, however it ends.
struct CloseOnDrop<'a, T: LinkTransport>(&'a mut T);

impl<T: LinkTransport> Drop for CloseOnDrop<'_, T> {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Borrowed state of one run.
struct Loop<'a, T: LinkTransport> {
    transport: &'a mut T,
    machine: &'a mut LinkMachine,
    stats: &'a mut LinkStats,
    config: &'a SupervisorConfig,
}

impl<T: LinkTransport> Loop<'_, T> {
    async fn drive<S>(&mut self, sink: &S, cancel: &CancellationToken) -> Result<(), LinkError>
    where
        S: ReadingSink + ?Sized,
    {
        let mut action = self.machine.on(LinkEvent::Start);

        loop {
            if cancel.is_cancelled() {
                self.machine.on(LinkEvent::Stop);
                tracing::info!(port = %self.transport.name(), "Link supervisor stopped");
                return Ok(());
            }

            action = match action {
                Action::Open => match self.transport.open() {
                    Ok(()) => {
                        tracing::info!(port = %self.transport.name(), "Link connected");
                        if !sleep_or_cancel(self.config.settle_delay, cancel).await {
                            continue;
                        }
                        self.machine.on(LinkEvent::Opened)
                    }
                    Err(e) => {
                        tracing::error!(port = %self.transport.name(), error = %e, "Failed to open link");
                        self.machine.on(LinkEvent::OpenFailed);
                        return Err(e);
                    }
                },
                Action::Poll => {
                    let (event, idle) = self.poll_once(sink).await;
                    let next = match event {
                        Some(event) => self.machine.on(event),
                        None => Action::Poll,
                    };
                    if idle
                        && next == Action::Poll
                        && !sleep_or_cancel(self.config.poll_interval, cancel).await
                    {
                        continue;
                    }
                    next
                }
                Action::CloseAndWait => {
                    tracing::warn!(
                        port = %self.transport.name(),
                        threshold = self.machine.threshold(),
                        "Too many consecutive link errors, reconnecting"
                    );
                    self.transport.close();
                    self.stats.reconnects += 1;
                    if !sleep_or_cancel(self.config.reopen_delay, cancel).await {
                        continue;
                    }
                    self.machine.on(LinkEvent::BackoffElapsed)
                }
                Action::Halt => return Ok(()),
                Action::Ignore => {
                    tracing::debug!(state = ?self.machine.state(), "Ignored link event");
                    resume_action(self.machine.state())
                }
            };
        }
    }

    /// Poll the transport once.
    ///
    /// Returns the event to feed the machine (if any) and whether the poll
    /// was idle, i.e. the loop should wait before polling again.
    async fn poll_once<S>(&mut self, sink: &S) -> (Option<LinkEvent>, bool)
    where
        S: ReadingSink + ?Sized,
    {
        match self.transport.poll_line() {
            Ok(None) => (None, true),
            Ok(Some(bytes)) => {
                self.stats.lines += 1;
                (self.handle_line(bytes, sink).await, false)
            }
            Err(e) => {
                tracing::warn!(port = %self.transport.name(), error = %e, "Link read failed");
                self.stats.faults += 1;
                (Some(LinkEvent::Fault), true)
            }
        }
    }

    async fn handle_line<S>(&mut self, bytes: Vec<u8>, sink: &S) -> Option<LinkEvent>
    where
        S: ReadingSink + ?Sized,
    {
        let line = match String::from_utf8(bytes) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %LinkError::from(e), "Skipping undecodable line");
                self.stats.faults += 1;
                return Some(LinkEvent::Fault);
            }
        };

        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        match frame::parse_line(line) {
            Ok(reading) => match sink.forward(reading).await {
                Ok(()) => {
                    self.stats.forwarded += 1;
                    tracing::debug!(
                        temperature = reading.temperature(),
                        humidity = reading.humidity(),
                        gas_level = reading.gas_level(),
                        "Reading forwarded"
                    );
                    Some(LinkEvent::Forwarded)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to forward reading");
                    self.stats.faults += 1;
                    Some(LinkEvent::Fault)
                }
            },
            Err(FrameError::NoMatch) => {
                if frame::is_status_line(line) {
                    tracing::info!(line, "Sensor status");
                } else {
                    tracing::trace!(line, "Ignoring unrecognised line");
                }
                None
            }
        }
    }
}

/// The action that continues the current state after an ignored event.
fn resume_action(state: LinkState) -> Action {
    match state {
        LinkState::Disconnected => Action::Halt,
        LinkState::Connecting => Action::Open,
        LinkState::Connected => Action::Poll,
        LinkState::Backoff => Action::CloseAndWait,
    }
}

/// Sleep for `duration` unless cancelled first. Returns `false` on cancel.
async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> bool {
    if duration.is_zero() {
        return !cancel.is_cancelled();
    }
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
