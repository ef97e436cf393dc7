//! Redis connection gate
//!
//! Tracks connection failures and suppresses reconnection attempts for a
//! cooldown window, so a Redis outage does not add a connect timeout to
//! every request that passes through the cache.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::core::constants::REDIS_RETRY_COOLDOWN_SECS;

#[derive(Debug)]
struct GateState {
    /// Reconnection attempts are suppressed until this deadline.
    failed_until: Option<Instant>,
    /// Whether the current suppression window has been logged yet.
    cooldown_logged: bool,
}

/// Gates Redis reconnection attempts after a connection failure.
///
/// Callers pass the current instant into every method, which keeps the
/// cooldown window testable without sleeping.
#[derive(Debug)]
pub struct ConnectionGate {
    cooldown: Duration,
    state: Mutex<GateState>,
}

impl ConnectionGate {
    pub fn new() -> Self {
        Self::with_cooldown(Duration::from_secs(REDIS_RETRY_COOLDOWN_SECS))
    }

    pub fn with_cooldown(cooldown: Duration) -> Self {
        Self {
            cooldown,
            state: Mutex::new(GateState {
                failed_until: None,
                cooldown_logged: false,
            }),
        }
    }

    /// Returns `true` while reconnection attempts are suppressed.
    ///
    /// A window that `now` has passed is cleared as a side effect.
    pub fn is_open(&self, now: Instant) -> bool {
        let mut state = self.state.lock();
        match state.failed_until {
            Some(deadline) if now < deadline => true,
            Some(_) => {
                state.failed_until = None;
                state.cooldown_logged = false;
                false
            }
            None => false,
        }
    }

    /// Records a connection failure, starting (or restarting) the cooldown window.
    pub fn record_failure(&self, now: Instant) {
        let mut state = self.state.lock();
        state.failed_until = Some(now + self.cooldown);
        state.cooldown_logged = false;
    }

    /// Records a successful connection, clearing any suppression window.
    pub fn record_success(&self) {
        let mut state = self.state.lock();
        state.failed_until = None;
        state.cooldown_logged = false;
    }

    /// Returns `true` the first time it is called within the current
    /// suppression window, so the skip can be logged once rather than on
    /// every cache operation.
    pub fn should_log_cooldown(&self, now: Instant) -> bool {
        let mut state = self.state.lock();
        match state.failed_until {
            Some(deadline) if now < deadline && !state.cooldown_logged => {
                state.cooldown_logged = true;
                true
            }
            _ => false,
        }
    }

    /// Remaining suppression time, if a window is active.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        let state = self.state.lock();
        state
            .failed_until
            .and_then(|deadline| deadline.checked_duration_since(now))
    }
}

impl Default for ConnectionGate {
    fn default() -> Self {
        Self::new()
    }
}
