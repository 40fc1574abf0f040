//! Transport trait: moves frames between the bridge and a physical link.

use crate::liveness::{LinkEvent, LinkState};

/// Error type for low-level link I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// The device reported an I/O error.
    Io,
    /// The peer closed the link.
    Closed,
}

impl core::fmt::Display for LinkError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Io => write!(f, "link I/O error"),
            Self::Closed => write!(f, "link closed"),
        }
    }
}

/// Receives what a transport produces during [`Transport::update`].
pub trait LinkHandler {
    /// One complete inbound frame: flag byte first, no delimiter.
    fn on_frame(&mut self, frame: &[u8]);

    /// The link came up or went down.
    fn on_link_event(&mut self, event: LinkEvent) {
        let _ = event;
    }
}

/// Counters kept by every transport. All saturate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransportStats {
    pub frames_received: u32,
    pub bytes_received: u32,
    pub bytes_sent: u32,
    /// Inbound frames lost to receive buffer overflow.
    pub frames_dropped: u32,
    /// Outbound messages dropped because they did not fit.
    pub messages_dropped: u32,
    pub link_errors: u32,
}

/// A non-blocking, tick-driven link.
///
/// Nothing here reads a clock: every time-dependent call takes the current
/// time in microseconds from a monotonic source.
pub trait Transport {
    /// Reset link state. Called once before the first update.
    fn init(&mut self);

    /// Run one tick: detect timeouts, deliver received frames and flush.
    ///
    /// Must not block.
    fn update<H: LinkHandler>(&mut self, now_us: u64, handler: &mut H);

    /// Queue `flag` followed by `payload` as one outbound message.
    ///
    /// Fire-and-forget: a message that cannot be queued is dropped and
    /// counted in [`TransportStats::messages_dropped`].
    fn send(&mut self, flag: u8, payload: &[u8]);

    fn link_state(&self) -> LinkState;

    fn is_connected(&self) -> bool {
        self.link_state() == LinkState::Connected
    }

    fn stats(&self) -> TransportStats;
}

pub(crate) fn bump(counter: &mut u32) {
    *counter = counter.saturating_add(1);
}

pub(crate) fn add(counter: &mut u32, n: usize) {
    *counter = counter.saturating_add(u32::try_from(n).unwrap_or(u32::MAX));
}
