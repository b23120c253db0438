//! Reposition scheduling and batch execution.
//!
//! # Invariants
//! - Each anchor is measured at most once per batch.
//! - A failing or unmeasurable edge is skipped; the batch keeps going.
//! - Every executed batch is recorded in the performance monitor.

use super::ConnectionEngine;
use crate::model::connection::{ConnectionId, ObjectId};
use crate::model::geometry::AnchorHandle;
use crate::scheduler::tier::RequestOutcome;
use crate::scheduler::update_scheduler::FrameWork;
use log::{debug, warn};
use std::collections::HashSet;
use std::time::Instant;

/// What started a reposition batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchTrigger {
    /// Debounced environment-wide batch.
    Bulk,
    /// Debounced per-object batch.
    Targeted,
    /// Direct call that bypassed debouncing.
    Immediate,
    /// First placement of a freshly created curve.
    Creation,
}

impl BatchTrigger {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bulk => "bulk",
            Self::Targeted => "targeted",
            Self::Immediate => "immediate",
            Self::Creation => "creation",
        }
    }
}

/// Result of one executed batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub trigger: BatchTrigger,
    /// Distinct edges the batch looked at.
    pub edges: usize,
    /// Distinct anchors measured.
    pub anchors_measured: usize,
    pub repositioned: usize,
    /// Edges with an unmeasurable anchor or a failing renderer.
    pub skipped: usize,
}

impl ConnectionEngine {
    /// Requests a debounced reposition of every edge.
    ///
    /// Without an attached environment this runs immediately.
    pub fn schedule_reposition(&mut self) {
        let Some(attached) = self.environment.as_mut() else {
            self.reposition_now();
            return;
        };
        match self.scheduler.request_bulk(attached.source.as_mut()) {
            RequestOutcome::Started => {
                debug!("event=reposition_schedule module=canvas status=started tier=bulk")
            }
            RequestOutcome::Coalesced => self.monitor.record_throttle_hit(),
        }
    }

    /// Requests a debounced reposition of the edges touching `object_id`.
    ///
    /// Objects without edges are ignored. Without an attached environment
    /// this runs immediately.
    pub fn schedule_reposition_for(&mut self, object_id: ObjectId) {
        if self.registry.touching_count(object_id) == 0 {
            return;
        }
        let Some(attached) = self.environment.as_mut() else {
            self.reposition_now_for(object_id);
            return;
        };
        match self
            .scheduler
            .request_targeted(object_id, attached.source.as_mut())
        {
            RequestOutcome::Started => debug!(
                "event=reposition_schedule module=canvas status=started tier=targeted object={}",
                object_id
            ),
            RequestOutcome::Coalesced => self.monitor.record_throttle_hit(),
        }
    }

    /// Repositions every edge now, bypassing debounce.
    pub fn reposition_now(&mut self) -> BatchReport {
        let ids = self.registry.ids();
        self.reposition_ids(ids, BatchTrigger::Immediate)
    }

    /// Repositions the edges touching `object_id` now, bypassing debounce.
    pub fn reposition_now_for(&mut self, object_id: ObjectId) -> BatchReport {
        let ids = self.registry.edges_touching(object_id).into_iter().collect();
        self.reposition_ids(ids, BatchTrigger::Immediate)
    }

    pub(super) fn run_frame_work(&mut self, work: FrameWork) -> BatchReport {
        match work {
            FrameWork::Bulk => {
                let ids = self.registry.ids();
                self.reposition_ids(ids, BatchTrigger::Bulk)
            }
            FrameWork::Targeted(objects) => {
                let ids = objects
                    .into_iter()
                    .flat_map(|object_id| self.registry.edges_touching(object_id))
                    .collect::<HashSet<_>>();
                self.reposition_ids(ids.into_iter().collect(), BatchTrigger::Targeted)
            }
        }
    }

    /// Measures each distinct anchor once, then redraws every edge.
    pub(super) fn reposition_ids(
        &mut self,
        ids: Vec<ConnectionId>,
        trigger: BatchTrigger,
    ) -> BatchReport {
        let started = Instant::now();

        let anchors = ids
            .iter()
            .filter_map(|id| self.registry.get(id))
            .flat_map(|connection| [connection.source_anchor(), connection.target_anchor()])
            .collect::<HashSet<AnchorHandle>>();
        let unmeasurable = anchors
            .iter()
            .copied()
            .filter(|anchor| self.geometry.bounding_box(*anchor).is_none())
            .collect::<HashSet<AnchorHandle>>();

        let mut report = BatchReport {
            trigger,
            edges: ids.len(),
            anchors_measured: anchors.len(),
            repositioned: 0,
            skipped: 0,
        };
        for id in &ids {
            let Some(connection) = self.registry.get_mut(id) else {
                continue;
            };
            if unmeasurable.contains(&connection.source_anchor())
                || unmeasurable.contains(&connection.target_anchor())
            {
                debug!(
                    "event=reposition module=canvas status=skipped reason=unmeasurable id={}",
                    id
                );
                report.skipped += 1;
                continue;
            }
            match connection.render_handle_mut().reposition() {
                Ok(()) => report.repositioned += 1,
                Err(err) => {
                    warn!(
                        "event=reposition module=canvas status=error id={} error={}",
                        id, err
                    );
                    report.skipped += 1;
                }
            }
        }

        self.monitor.record(started.elapsed());
        debug!(
            "event=reposition_batch module=canvas status=ok trigger={} edges={} anchors={} repositioned={} skipped={}",
            trigger.as_str(),
            report.edges,
            report.anchors_measured,
            report.repositioned,
            report.skipped
        );
        report
    }
}
