//! Canvas connection graph for LazyNote.
//! Creates, indexes and keeps glued the connector curves between canvas
//! notes, aggregation slots and provenance targets.

pub mod config;
pub mod host;
pub mod logging;
pub mod model;
pub mod perf;
pub mod registry;
pub mod scheduler;
pub mod service;

pub use config::{ConfigError, EngineConfig};
pub use host::{
    EnvironmentEventKind, EnvironmentEventSource, FrameId, GeometryProvider, LineRenderer,
    RenderError, RenderHandle, SubscriptionId, TimerId,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::connection::{
    Connection, ConnectionId, ConnectionKind, ConnectionSummary, ConnectionTarget, ObjectId,
    SlotIndex,
};
pub use model::geometry::{AnchorHandle, AnchorOwner, AnchorRole, Rect};
pub use model::style::{DashPattern, EndCap, EntranceAnimation, LineStyle};
pub use perf::monitor::{PerformanceMonitor, PerformanceSnapshot};
pub use registry::connection_registry::ConnectionRegistry;
pub use service::engine::{BatchReport, BatchTrigger, ConnectionEngine, PendingConnection};

/// Returns the crate version.
pub fn canvas_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
