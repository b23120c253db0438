//! Host collaborator contracts.
//!
//! # Responsibility
//! - Describe what the engine consumes from the hosting canvas: anchor
//!   geometry, curve drawing, and environment callbacks.
//! - Keep the engine free of any concrete UI toolkit.
//!
//! # Invariants
//! - Collaborators are called from the engine's single logical thread only.
//! - The host delivers timer, frame and environment callbacks by calling the
//!   matching `ConnectionEngine::on_*` method with the id it handed out.

use crate::model::geometry::{AnchorHandle, AnchorOwner, AnchorRole, Rect};
use crate::model::style::LineStyle;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Measures anchors on mounted canvas objects.
pub trait GeometryProvider {
    /// Returns `None` while the owner is not mounted or not measurable yet.
    fn resolve_anchor(&self, owner: AnchorOwner, role: AnchorRole) -> Option<AnchorHandle>;

    /// Forces a layout read of the anchor's current viewport rectangle.
    ///
    /// Returns `None` when the anchor has been unmounted since it resolved.
    fn bounding_box(&self, anchor: AnchorHandle) -> Option<Rect>;
}

/// Draws connector curves between two anchors.
pub trait LineRenderer {
    fn draw(
        &mut self,
        from: AnchorHandle,
        to: AnchorHandle,
        style: &LineStyle,
    ) -> Result<Box<dyn RenderHandle>, RenderError>;
}

/// One drawn curve. Exclusively owned by its `Connection`.
pub trait RenderHandle {
    /// Re-reads anchor positions and redraws the curve.
    fn reposition(&mut self) -> Result<(), RenderError>;

    /// Removes the curve from the canvas. Called exactly once.
    fn destroy(&mut self);
}

/// Renderer failure surfaced from `draw` or `reposition`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The renderer could not create a curve for the anchor pair.
    Draw(String),
    /// An existing curve could not be redrawn.
    Reposition(String),
}

impl Display for RenderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draw(details) => write!(f, "curve draw failed: {details}"),
            Self::Reposition(details) => write!(f, "curve reposition failed: {details}"),
        }
    }
}

impl Error for RenderError {}

/// Environment-wide events that invalidate every curve position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvironmentEventKind {
    WindowResize,
    Scroll,
}

impl EnvironmentEventKind {
    pub const ALL: [Self; 2] = [Self::WindowResize, Self::Scroll];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::WindowResize => "window_resize",
            Self::Scroll => "scroll",
        }
    }
}

/// Handle for an active environment subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// Handle for a pending one-shot timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// Handle for a pending paint-synchronized frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub u64);

/// Event loop services of the hosting environment.
///
/// The host remembers every id it returns and later calls back into the
/// engine with it (`on_environment_event`, `on_timer`, `on_frame`). Cancelled
/// ids must never be delivered.
pub trait EnvironmentEventSource {
    fn subscribe(&mut self, kind: EnvironmentEventKind) -> SubscriptionId;
    fn unsubscribe(&mut self, id: SubscriptionId);
    fn set_timeout(&mut self, delay: Duration) -> TimerId;
    fn clear_timeout(&mut self, id: TimerId);
    fn request_frame(&mut self) -> FrameId;
    fn cancel_frame(&mut self, id: FrameId);
}
