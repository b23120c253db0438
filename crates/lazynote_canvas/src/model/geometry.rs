//! Anchor and rectangle value types.
//!
//! Anchors are owned by their canvas object. The engine only keeps the
//! opaque handle issued by the geometry provider and never controls its
//! lifetime.

use crate::model::connection::{ObjectId, SlotIndex};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Opaque handle to a measurable point on a note or slot.
///
/// Issued by [`crate::host::GeometryProvider::resolve_anchor`]. Two handles
/// compare equal when they refer to the same mounted element, which lets the
/// scheduler measure each anchor once per batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnchorHandle(u64);

impl AnchorHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl Display for AnchorHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "anchor#{}", self.0)
    }
}

/// Object that owns an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnchorOwner {
    /// A note on the canvas.
    Note(ObjectId),
    /// A numbered aggregation slot. Slots are not tracked as objects.
    Slot(SlotIndex),
}

impl Display for AnchorOwner {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Note(id) => write!(f, "note:{id}"),
            Self::Slot(index) => write!(f, "slot:{index}"),
        }
    }
}

/// Which anchor of the owner to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorRole {
    /// Aggregation connector port of a note.
    Connector,
    /// Input port of an aggregation slot.
    Slot,
    /// Outgoing provenance port on the source note.
    ProvenanceOut,
    /// Incoming provenance port on the target note.
    ProvenanceIn,
}

impl AnchorRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connector => "connector",
            Self::Slot => "slot",
            Self::ProvenanceOut => "provenance_out",
            Self::ProvenanceIn => "provenance_in",
        }
    }
}

/// Bounding rectangle in the shared viewport coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Center point, used by renderers that anchor curves mid-element.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Zero-sized rectangles belong to detached or hidden elements.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}
