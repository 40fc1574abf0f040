//! Link liveness tracking.
//!
//! Any received byte counts as activity. The link is up from the first
//! byte until the gap since the last byte reaches the timeout. State changes
//! are reported once, as [`LinkEvent`]s.

/// Current link state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    #[default]
    Disconnected,
    Connected,
}

/// Edge reported when the link state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkEvent {
    Connected,
    Disconnected,
}

/// Edge-triggered inactivity detector.
#[derive(Debug, Clone)]
pub struct LivenessMonitor {
    timeout_us: u64,
    last_seen_us: Option<u64>,
    state: LinkState,
}

impl LivenessMonitor {
    pub const fn new(timeout_us: u64) -> Self {
        Self {
            timeout_us,
            last_seen_us: None,
            state: LinkState::Disconnected,
        }
    }

    /// Forget all activity. Does not report an event.
    pub fn reset(&mut self) {
        self.last_seen_us = None;
        self.state = LinkState::Disconnected;
    }

    /// Record that a byte arrived at `now_us`.
    ///
    /// Returns [`LinkEvent::Connected`] if the link was down.
    pub fn record_activity(&mut self, now_us: u64) -> Option<LinkEvent> {
        self.last_seen_us = Some(now_us);
        match self.state {
            LinkState::Connected => None,
            LinkState::Disconnected => {
                self.state = LinkState::Connected;
                Some(LinkEvent::Connected)
            }
        }
    }

    /// Check for a timeout at `now_us`.
    ///
    /// Returns [`LinkEvent::Disconnected`] the first time the silence reaches
    /// the timeout. A clock that appears to run backwards never times out.
    pub fn check_timeout(&mut self, now_us: u64) -> Option<LinkEvent> {
        let last = self.last_seen_us?;
        if self.state == LinkState::Connected && now_us.saturating_sub(last) >= self.timeout_us {
            self.state = LinkState::Disconnected;
            return Some(LinkEvent::Disconnected);
        }
        None
    }

    #[inline]
    pub fn state(&self) -> LinkState {
        self.state
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.state == LinkState::Connected
    }

    /// Time of the last received byte, if any.
    #[inline]
    pub fn last_seen_us(&self) -> Option<u64> {
        self.last_seen_us
    }

    #[inline]
    pub fn timeout_us(&self) -> u64 {
        self.timeout_us
    }
}
