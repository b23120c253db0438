//! Connection edge model.
//!
//! # Responsibility
//! - Define the two edge kinds (aggregation, provenance) and their identity.
//! - Own the renderer handle of a live edge and release it exactly once.
//!
//! # Invariants
//! - `ConnectionId` is a pure function of `(kind, source, target)`.
//! - `kind` is fixed at construction and always agrees with `target`.
//! - Dropping a `Connection` destroys its render handle.

use crate::host::RenderHandle;
use crate::model::geometry::AnchorHandle;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};
use uuid::Uuid;

/// Stable identity of a canvas note.
///
/// Matches the note/atom identity used everywhere else in LazyNote.
pub type ObjectId = Uuid;

/// Number of an aggregation slot.
pub type SlotIndex = u32;

/// Edge category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionKind {
    /// Note -> numbered slot.
    Aggregation,
    /// Source note -> derived target note.
    Provenance,
}

impl ConnectionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Aggregation => "aggregation",
            Self::Provenance => "provenance",
        }
    }
}

impl Display for ConnectionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific far end of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionTarget {
    Slot(SlotIndex),
    Note(ObjectId),
}

impl ConnectionTarget {
    /// The only kind this target can belong to.
    pub fn kind(self) -> ConnectionKind {
        match self {
            Self::Slot(_) => ConnectionKind::Aggregation,
            Self::Note(_) => ConnectionKind::Provenance,
        }
    }

    /// Target note id for provenance edges; slots are not objects.
    pub fn object_id(self) -> Option<ObjectId> {
        match self {
            Self::Note(id) => Some(id),
            Self::Slot(_) => None,
        }
    }

    pub fn slot_index(self) -> Option<SlotIndex> {
        match self {
            Self::Slot(index) => Some(index),
            Self::Note(_) => None,
        }
    }
}

impl Display for ConnectionTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Slot(index) => write!(f, "slot-{index}"),
            Self::Note(id) => write!(f, "{id}"),
        }
    }
}

/// Deterministic edge identifier.
///
/// Format: `<kind>:<source>:<target>`, e.g. `aggregation:<uuid>:slot-2`.
/// The kind prefix keeps aggregation and provenance ids disjoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn derive(source: ObjectId, target: ConnectionTarget) -> Self {
        Self(format!("{}:{source}:{target}", target.kind()))
    }

    pub fn aggregation(source: ObjectId, slot: SlotIndex) -> Self {
        Self::derive(source, ConnectionTarget::Slot(slot))
    }

    pub fn provenance(source: ObjectId, target: ObjectId) -> Self {
        Self::derive(source, ConnectionTarget::Note(target))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for ConnectionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Live connector edge with its drawn curve.
pub struct Connection {
    id: ConnectionId,
    kind: ConnectionKind,
    source: ObjectId,
    target: ConnectionTarget,
    source_anchor: AnchorHandle,
    target_anchor: AnchorHandle,
    render_handle: Box<dyn RenderHandle>,
    created_at_ms: i64,
}

impl Connection {
    pub fn new(
        source: ObjectId,
        target: ConnectionTarget,
        source_anchor: AnchorHandle,
        target_anchor: AnchorHandle,
        render_handle: Box<dyn RenderHandle>,
        created_at_ms: i64,
    ) -> Self {
        Self {
            id: ConnectionId::derive(source, target),
            kind: target.kind(),
            source,
            target,
            source_anchor,
            target_anchor,
            render_handle,
            created_at_ms,
        }
    }

    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    pub fn kind(&self) -> ConnectionKind {
        self.kind
    }

    pub fn source(&self) -> ObjectId {
        self.source
    }

    pub fn target(&self) -> ConnectionTarget {
        self.target
    }

    pub fn source_anchor(&self) -> AnchorHandle {
        self.source_anchor
    }

    pub fn target_anchor(&self) -> AnchorHandle {
        self.target_anchor
    }

    pub fn created_at_ms(&self) -> i64 {
        self.created_at_ms
    }

    /// Objects this edge must be indexed under.
    ///
    /// Provenance edges register under both notes; aggregation edges only
    /// under the note because slots are not tracked objects.
    pub fn endpoints(&self) -> impl Iterator<Item = ObjectId> {
        std::iter::once(self.source).chain(self.target.object_id())
    }

    pub fn touches(&self, object_id: ObjectId) -> bool {
        self.source == object_id || self.target.object_id() == Some(object_id)
    }

    pub fn render_handle_mut(&mut self) -> &mut dyn RenderHandle {
        self.render_handle.as_mut()
    }

    pub fn summary(&self) -> ConnectionSummary {
        ConnectionSummary {
            id: self.id.clone(),
            kind: self.kind,
            source: self.source,
            target: self.target,
        }
    }
}

impl Debug for Connection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("source_anchor", &self.source_anchor)
            .field("target_anchor", &self.target_anchor)
            .field("created_at_ms", &self.created_at_ms)
            .finish_non_exhaustive()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.render_handle.destroy();
    }
}

/// Read-only projection of a connection for UI listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSummary {
    pub id: ConnectionId,
    pub kind: ConnectionKind,
    pub source: ObjectId,
    pub target: ConnectionTarget,
}
