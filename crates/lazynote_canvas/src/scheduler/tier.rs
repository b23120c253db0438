//! Single debounce tier state machine.
//!
//! ```text
//! Idle --request--> Pending(Timer) --timer--> Pending(Frame) --frame--> Idle
//!                        ^  request: coalesced (no timer reset)  ^
//! ```

use crate::host::{EnvironmentEventSource, FrameId, TimerId};
use std::time::Duration;

/// Debounce tiers of the update scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Environment-wide invalidation, every edge is repositioned.
    Bulk,
    /// Per-object interaction, only edges touching pending objects.
    Targeted,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bulk => "bulk",
            Self::Targeted => "targeted",
        }
    }
}

/// What a pending tier is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingStage {
    Timer(TimerId),
    Frame(FrameId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierState {
    Idle,
    Pending(PendingStage),
}

/// Result of asking a tier for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The tier was idle and armed a new timer.
    Started,
    /// The tier was already pending; the request rides along.
    Coalesced,
}

#[derive(Debug)]
pub struct DebounceTier {
    tier: Tier,
    delay: Duration,
    state: TierState,
}

impl DebounceTier {
    pub fn new(tier: Tier, delay: Duration) -> Self {
        Self {
            tier,
            delay,
            state: TierState::Idle,
        }
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn state(&self) -> TierState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, TierState::Pending(_))
    }

    pub fn request(&mut self, env: &mut dyn EnvironmentEventSource) -> RequestOutcome {
        if self.is_pending() {
            return RequestOutcome::Coalesced;
        }
        let timer = env.set_timeout(self.delay);
        self.state = TierState::Pending(PendingStage::Timer(timer));
        RequestOutcome::Started
    }

    /// Moves from the timer stage to the frame stage when `timer` is ours.
    pub fn on_timer(&mut self, timer: TimerId, env: &mut dyn EnvironmentEventSource) -> bool {
        if self.state != TierState::Pending(PendingStage::Timer(timer)) {
            return false;
        }
        let frame = env.request_frame();
        self.state = TierState::Pending(PendingStage::Frame(frame));
        true
    }

    /// Returns to idle when `frame` is ours; the caller then runs the batch.
    pub fn on_frame(&mut self, frame: FrameId) -> bool {
        if self.state != TierState::Pending(PendingStage::Frame(frame)) {
            return false;
        }
        self.state = TierState::Idle;
        true
    }

    /// Cancels whatever is in flight with the environment and goes idle.
    pub fn cancel(&mut self, env: &mut dyn EnvironmentEventSource) {
        match self.state {
            TierState::Idle => {}
            TierState::Pending(PendingStage::Timer(timer)) => env.clear_timeout(timer),
            TierState::Pending(PendingStage::Frame(frame)) => env.cancel_frame(frame),
        }
        self.state = TierState::Idle;
    }
}
