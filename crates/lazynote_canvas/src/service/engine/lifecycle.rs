//! Connect/disconnect operations.
//!
//! # Invariants
//! - Removal APIs only delete edges of their own kind.
//! - Every multi-edge removal collects ids first, then mutates.
//! - Failures degrade to `false` plus a log line; nothing is raised.

use super::{ConnectionEngine, PendingConnection};
use crate::model::connection::{
    Connection, ConnectionId, ConnectionKind, ConnectionTarget, ObjectId, SlotIndex,
};
use crate::model::geometry::{AnchorOwner, AnchorRole};
use crate::perf::now_epoch_ms;
use crate::scheduler::tier::Tier;
use log::{debug, error, info, warn};

impl ConnectionEngine {
    /// Connects a note to an aggregation slot with a solid curve.
    ///
    /// The returned future resolves after the next frame, once both anchors
    /// were measured and the curve was drawn.
    pub fn create_aggregation(&mut self, object_id: ObjectId, slot: SlotIndex) -> PendingConnection {
        self.request_creation(object_id, ConnectionTarget::Slot(slot))
    }

    /// Connects `source` to its derived note `target` with a dashed curve.
    pub fn create_provenance(&mut self, source: ObjectId, target: ObjectId) -> PendingConnection {
        self.request_creation(source, ConnectionTarget::Note(target))
    }

    /// Removes one aggregation edge, or all of the object's aggregation edges
    /// when `slot` is `None`. Provenance edges are never touched.
    pub fn remove_aggregation(&mut self, object_id: ObjectId, slot: Option<SlotIndex>) -> bool {
        match slot {
            Some(slot) => self.remove_guarded(
                &ConnectionId::aggregation(object_id, slot),
                ConnectionKind::Aggregation,
            ),
            None => {
                let ids = self.registry.touching_matching(object_id, |connection| {
                    connection.kind() == ConnectionKind::Aggregation
                        && connection.source() == object_id
                });
                self.remove_all_guarded(ids, ConnectionKind::Aggregation) > 0
            }
        }
    }

    pub fn remove_provenance(&mut self, source: ObjectId, target: ObjectId) -> bool {
        self.remove_guarded(
            &ConnectionId::provenance(source, target),
            ConnectionKind::Provenance,
        )
    }

    /// Removes every provenance edge pointing at `target`.
    pub fn remove_all_provenance_to(&mut self, target: ObjectId) -> bool {
        let ids = self.registry.touching_matching(target, |connection| {
            connection.kind() == ConnectionKind::Provenance
                && connection.target() == ConnectionTarget::Note(target)
        });
        self.remove_all_guarded(ids, ConnectionKind::Provenance) > 0
    }

    /// Removes every provenance edge leaving `source`.
    pub fn remove_all_provenance_from(&mut self, source: ObjectId) -> bool {
        let ids = self.registry.touching_matching(source, |connection| {
            connection.kind() == ConnectionKind::Provenance && connection.source() == source
        });
        self.remove_all_guarded(ids, ConnectionKind::Provenance) > 0
    }

    /// Removes every edge of `kind`, or every edge when `kind` is `None`.
    pub fn clear(&mut self, kind: Option<ConnectionKind>) {
        let removed = match kind {
            None => self.registry.drain().len(),
            Some(kind) => {
                let ids = self
                    .registry
                    .ids_matching(|connection| connection.kind() == kind);
                self.remove_all_guarded(ids, kind)
            }
        };
        info!(
            "event=connection_clear module=canvas status=ok kind={} removed={}",
            kind.map_or("all", ConnectionKind::as_str),
            removed
        );
    }

    /// Cascade for a deleted note.
    ///
    /// Removes every edge where the note is source or target, forgets it in
    /// the targeted pending set, and fails creations still queued for it.
    /// Returns the number of removed edges.
    pub fn remove_object(&mut self, object_id: ObjectId) -> usize {
        let ids = self.registry.edges_touching(object_id);
        let removed = ids
            .iter()
            .filter_map(|id| self.registry.remove(id))
            .count();

        self.scheduler.forget_target(object_id);
        let cancelled = self.creations.cancel_touching(object_id);
        if cancelled > 0 && self.creations.is_empty() {
            if let (Some(frame), Some(attached)) =
                (self.creations.take_frame(), self.environment.as_mut())
            {
                attached.source.cancel_frame(frame);
            }
        }

        info!(
            "event=object_remove module=canvas status=ok object={} removed={} cancelled_creations={} targeted_pending={}",
            object_id,
            removed,
            cancelled,
            self.scheduler.is_pending(Tier::Targeted)
        );
        removed
    }

    fn request_creation(&mut self, source: ObjectId, target: ConnectionTarget) -> PendingConnection {
        let kind = target.kind();
        if target.object_id() == Some(source) {
            warn!(
                "event=connection_create module=canvas status=rejected reason=self_link kind={} object={}",
                kind, source
            );
            return PendingConnection::resolved(false);
        }

        let id = ConnectionId::derive(source, target);
        if self.registry.contains(&id) {
            warn!(
                "event=connection_create module=canvas status=duplicate kind={} id={}",
                kind, id
            );
            return PendingConnection::resolved(false);
        }

        if self.environment.is_none() {
            return PendingConnection::resolved(self.complete_creation(source, target));
        }

        if self.creations.frame().is_none() {
            if let Some(attached) = self.environment.as_mut() {
                let frame = attached.source.request_frame();
                self.creations.set_frame(frame);
            }
        }
        debug!(
            "event=connection_create module=canvas status=queued kind={} id={}",
            kind, id
        );
        self.creations.enqueue(source, target)
    }

    /// Measures both anchors, draws the curve and registers the edge.
    pub(super) fn complete_creation(&mut self, source: ObjectId, target: ConnectionTarget) -> bool {
        let kind = target.kind();
        let id = ConnectionId::derive(source, target);
        if self.registry.contains(&id) {
            warn!(
                "event=connection_create module=canvas status=duplicate kind={} id={}",
                kind, id
            );
            return false;
        }

        let (source_role, target_owner, target_role) = match target {
            ConnectionTarget::Slot(slot) => {
                (AnchorRole::Connector, AnchorOwner::Slot(slot), AnchorRole::Slot)
            }
            ConnectionTarget::Note(note) => (
                AnchorRole::ProvenanceOut,
                AnchorOwner::Note(note),
                AnchorRole::ProvenanceIn,
            ),
        };
        let source_owner = AnchorOwner::Note(source);
        let Some(source_anchor) = self.geometry.resolve_anchor(source_owner, source_role) else {
            warn!(
                "event=connection_create module=canvas status=anchor_unresolved kind={} owner={} role={}",
                kind,
                source_owner,
                source_role.as_str()
            );
            return false;
        };
        let Some(target_anchor) = self.geometry.resolve_anchor(target_owner, target_role) else {
            warn!(
                "event=connection_create module=canvas status=anchor_unresolved kind={} owner={} role={}",
                kind,
                target_owner,
                target_role.as_str()
            );
            return false;
        };

        let style = match kind {
            ConnectionKind::Aggregation => &self.config.aggregation_style,
            ConnectionKind::Provenance => &self.config.provenance_style,
        };
        let handle = match self.renderer.draw(source_anchor, target_anchor, style) {
            Ok(handle) => handle,
            Err(err) => {
                error!(
                    "event=connection_create module=canvas status=error kind={} id={} error={}",
                    kind, id, err
                );
                return false;
            }
        };

        let connection = Connection::new(
            source,
            target,
            source_anchor,
            target_anchor,
            handle,
            now_epoch_ms(),
        );
        if !self.registry.add(connection) {
            return false;
        }

        self.reposition_ids(vec![id.clone()], super::BatchTrigger::Creation);
        info!(
            "event=connection_create module=canvas status=ok kind={} id={}",
            kind, id
        );
        true
    }

    /// Removes `id` only when it exists and has `expected` kind.
    fn remove_guarded(&mut self, id: &ConnectionId, expected: ConnectionKind) -> bool {
        let Some(existing) = self.registry.get(id) else {
            debug!(
                "event=connection_remove module=canvas status=not_found kind={} id={}",
                expected, id
            );
            return false;
        };
        if existing.kind() != expected {
            warn!(
                "event=connection_remove module=canvas status=kind_mismatch expected={} actual={} id={}",
                expected,
                existing.kind(),
                id
            );
            return false;
        }

        // Dropping the connection destroys its render handle.
        drop(self.registry.remove(id));
        debug!(
            "event=connection_remove module=canvas status=ok kind={} id={}",
            expected, id
        );
        true
    }

    fn remove_all_guarded(&mut self, ids: Vec<ConnectionId>, expected: ConnectionKind) -> usize {
        ids.iter()
            .filter(|id| self.remove_guarded(id, expected))
            .count()
    }
}
