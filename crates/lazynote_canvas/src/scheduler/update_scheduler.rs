//! Two-tier reposition scheduler.
//!
//! # Responsibility
//! - Route bulk and targeted requests to their debounce tier.
//! - Hold the targeted pending object set until the targeted frame fires.
//!
//! # Invariants
//! - Bulk and targeted tiers never share a timer or frame id.
//! - The pending set is taken at frame time, so objects requested after the
//!   timer fired still ride in the same batch.

use crate::host::{EnvironmentEventSource, FrameId, TimerId};
use crate::model::connection::ObjectId;
use crate::scheduler::tier::{DebounceTier, RequestOutcome, Tier};
use std::collections::HashSet;
use std::time::Duration;

/// Work due when a scheduler frame fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameWork {
    /// Reposition every edge.
    Bulk,
    /// Reposition edges touching these objects.
    Targeted(HashSet<ObjectId>),
}

#[derive(Debug)]
pub struct UpdateScheduler {
    bulk: DebounceTier,
    targeted: DebounceTier,
    pending_targets: HashSet<ObjectId>,
}

impl UpdateScheduler {
    pub fn new(bulk_delay: Duration, targeted_delay: Duration) -> Self {
        Self {
            bulk: DebounceTier::new(Tier::Bulk, bulk_delay),
            targeted: DebounceTier::new(Tier::Targeted, targeted_delay),
            pending_targets: HashSet::new(),
        }
    }

    pub fn request_bulk(&mut self, env: &mut dyn EnvironmentEventSource) -> RequestOutcome {
        self.bulk.request(env)
    }

    /// Adds `object_id` to the pending set and arms the targeted tier.
    pub fn request_targeted(
        &mut self,
        object_id: ObjectId,
        env: &mut dyn EnvironmentEventSource,
    ) -> RequestOutcome {
        self.pending_targets.insert(object_id);
        self.targeted.request(env)
    }

    /// Returns the tier that owned `timer`, if any.
    pub fn on_timer(
        &mut self,
        timer: TimerId,
        env: &mut dyn EnvironmentEventSource,
    ) -> Option<Tier> {
        if self.bulk.on_timer(timer, env) {
            return Some(self.bulk.tier());
        }
        if self.targeted.on_timer(timer, env) {
            return Some(self.targeted.tier());
        }
        None
    }

    /// Returns the batch to run when `frame` belongs to one of the tiers.
    pub fn on_frame(&mut self, frame: FrameId) -> Option<FrameWork> {
        if self.bulk.on_frame(frame) {
            return Some(FrameWork::Bulk);
        }
        if self.targeted.on_frame(frame) {
            return Some(FrameWork::Targeted(std::mem::take(&mut self.pending_targets)));
        }
        None
    }

    /// Drops a deleted object from the pending set.
    pub fn forget_target(&mut self, object_id: ObjectId) {
        self.pending_targets.remove(&object_id);
    }

    pub fn is_pending(&self, tier: Tier) -> bool {
        match tier {
            Tier::Bulk => self.bulk.is_pending(),
            Tier::Targeted => self.targeted.is_pending(),
        }
    }

    pub fn pending_targets(&self) -> &HashSet<ObjectId> {
        &self.pending_targets
    }

    /// Cancels both tiers with the environment. Pending targets are kept.
    pub fn cancel_all(&mut self, env: &mut dyn EnvironmentEventSource) {
        self.bulk.cancel(env);
        self.targeted.cancel(env);
    }

    pub fn clear_targets(&mut self) {
        self.pending_targets.clear();
    }
}
