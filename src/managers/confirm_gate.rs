//! Two-step confirmation for destructive bulk actions.
//!
//! The first press arms the gate without effect; a second press before the
//! deadline confirms. An armed gate that is not confirmed in time disarms on
//! its own. Each gate holds a single deadline, so one action can never have
//! two timers armed at once.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Result of pressing a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmOutcome {
    /// First press: nothing happened yet.
    Armed,
    /// Second press within the window: perform the action.
    Confirmed,
}

#[derive(Debug, Clone)]
pub struct ConfirmGate {
    timeout: Duration,
    armed_until: Option<Instant>,
}

impl ConfirmGate {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            armed_until: None,
        }
    }

    pub fn press(&mut self, now: Instant) -> ConfirmOutcome {
        match self.armed_until {
            Some(deadline) if now < deadline => {
                self.armed_until = None;
                ConfirmOutcome::Confirmed
            }
            _ => {
                self.armed_until = Some(now + self.timeout);
                ConfirmOutcome::Armed
            }
        }
    }

    /// Disarms the gate if its window has passed. Returns `true` when it did.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.armed_until {
            Some(deadline) if now >= deadline => {
                self.armed_until = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_armed(&self, now: Instant) -> bool {
        matches!(self.armed_until, Some(deadline) if now < deadline)
    }
}
