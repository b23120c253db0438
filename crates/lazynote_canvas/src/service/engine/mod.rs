//! Connection graph engine for one canvas.
//!
//! # Responsibility
//! - Own the connection registry, update scheduler and performance monitor
//!   of one canvas, plus the host collaborators they talk to.
//! - Translate host callbacks (environment events, timers, frames) into
//!   creation completions and reposition batches.
//!
//! # Invariants
//! - One engine per canvas, created and owned by the canvas controller.
//! - All work runs to completion inside one `&mut self` call; creation is
//!   the only operation that spans a frame boundary.
//! - `destroy` releases handles, subscriptions, timers/frames and maps in
//!   that order; dropping an engine performs the same teardown.

mod lifecycle;
mod pending;
mod reposition;

pub use pending::PendingConnection;
pub use reposition::{BatchReport, BatchTrigger};

use crate::config::{ConfigError, EngineConfig};
use crate::host::{
    EnvironmentEventKind, EnvironmentEventSource, FrameId, GeometryProvider, LineRenderer,
    SubscriptionId, TimerId,
};
use crate::model::connection::{
    ConnectionId, ConnectionKind, ConnectionSummary, ConnectionTarget, ObjectId,
};
use crate::perf::monitor::{PerformanceMonitor, PerformanceSnapshot};
use crate::registry::connection_registry::ConnectionRegistry;
use crate::scheduler::update_scheduler::UpdateScheduler;
use log::{debug, info};
use pending::PendingCreations;

struct AttachedEnvironment {
    source: Box<dyn EnvironmentEventSource>,
    subscriptions: Vec<SubscriptionId>,
}

/// Connection graph and reposition engine.
pub struct ConnectionEngine {
    config: EngineConfig,
    geometry: Box<dyn GeometryProvider>,
    renderer: Box<dyn LineRenderer>,
    registry: ConnectionRegistry,
    scheduler: UpdateScheduler,
    monitor: PerformanceMonitor,
    environment: Option<AttachedEnvironment>,
    creations: PendingCreations,
}

impl ConnectionEngine {
    /// Creates an engine with default debounce delays and curve styles.
    pub fn new(geometry: Box<dyn GeometryProvider>, renderer: Box<dyn LineRenderer>) -> Self {
        Self::build(geometry, renderer, EngineConfig::default())
    }

    /// Creates an engine with a caller-provided configuration.
    ///
    /// # Errors
    /// - Returns `ConfigError` when `config.validate()` fails.
    pub fn try_with_config(
        geometry: Box<dyn GeometryProvider>,
        renderer: Box<dyn LineRenderer>,
        config: EngineConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(geometry, renderer, config))
    }

    fn build(
        geometry: Box<dyn GeometryProvider>,
        renderer: Box<dyn LineRenderer>,
        config: EngineConfig,
    ) -> Self {
        let scheduler = UpdateScheduler::new(config.bulk_delay(), config.targeted_delay());
        Self {
            config,
            geometry,
            renderer,
            registry: ConnectionRegistry::new(),
            scheduler,
            monitor: PerformanceMonitor::new(),
            environment: None,
            creations: PendingCreations::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Wires the engine to the host event loop.
    ///
    /// Subscribes to window resize and scroll. Attaching while already
    /// attached detaches the previous source first.
    pub fn attach(&mut self, mut source: Box<dyn EnvironmentEventSource>) {
        if self.environment.is_some() {
            debug!("event=environment_attach module=canvas status=replacing");
            drop(self.detach());
        }

        let subscriptions = EnvironmentEventKind::ALL
            .iter()
            .map(|kind| source.subscribe(*kind))
            .collect::<Vec<_>>();
        info!(
            "event=environment_attach module=canvas status=ok subscriptions={}",
            subscriptions.len()
        );
        self.environment = Some(AttachedEnvironment {
            source,
            subscriptions,
        });
    }

    /// Unwires the engine from the host event loop and returns the source.
    ///
    /// In-flight timers and frames are cancelled, scheduled work is dropped
    /// and queued creations resolve to `false`. Live connections stay.
    pub fn detach(&mut self) -> Option<Box<dyn EnvironmentEventSource>> {
        let source = self.release_environment()?;
        self.scheduler.clear_targets();
        let cancelled = self.creations.cancel_all();
        info!(
            "event=environment_detach module=canvas status=ok cancelled_creations={}",
            cancelled
        );
        Some(source)
    }

    pub fn is_attached(&self) -> bool {
        self.environment.is_some()
    }

    /// Host callback for a subscribed environment event.
    pub fn on_environment_event(&mut self, kind: EnvironmentEventKind) {
        if self.environment.is_none() {
            debug!(
                "event=environment_event module=canvas status=ignored reason=detached kind={}",
                kind.as_str()
            );
            return;
        }
        self.schedule_reposition();
    }

    /// Host callback for an elapsed timer handed out by this engine.
    pub fn on_timer(&mut self, timer: TimerId) {
        let Some(attached) = self.environment.as_mut() else {
            return;
        };
        match self.scheduler.on_timer(timer, attached.source.as_mut()) {
            Some(tier) => debug!(
                "event=debounce_elapsed module=canvas status=ok tier={}",
                tier.as_str()
            ),
            None => debug!(
                "event=debounce_elapsed module=canvas status=ignored timer={}",
                timer.0
            ),
        }
    }

    /// Host callback for a paint-synchronized frame handed out by this engine.
    pub fn on_frame(&mut self, frame: FrameId) {
        if let Some(requests) = self.creations.take_due(frame) {
            for request in requests {
                let created = self.complete_creation(request.source, request.target);
                request.resolve(created);
            }
            return;
        }

        match self.scheduler.on_frame(frame) {
            Some(work) => {
                self.run_frame_work(work);
            }
            None => debug!(
                "event=frame module=canvas status=ignored frame={}",
                frame.0
            ),
        }
    }

    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    pub fn connection_count_of(&self, kind: ConnectionKind) -> usize {
        self.registry.count_of_kind(kind)
    }

    /// Whether any edge has `object_id` as source or target.
    pub fn has_connection(&self, object_id: ObjectId) -> bool {
        self.registry.touching_count(object_id) > 0
    }

    pub fn connection_count_for(&self, object_id: ObjectId) -> usize {
        self.registry.touching_count(object_id)
    }

    pub fn is_target_of_provenance(&self, object_id: ObjectId) -> bool {
        !self
            .registry
            .touching_matching(object_id, |connection| {
                connection.target() == ConnectionTarget::Note(object_id)
            })
            .is_empty()
    }

    pub fn is_source_of_provenance(&self, object_id: ObjectId) -> bool {
        !self
            .registry
            .touching_matching(object_id, |connection| {
                connection.kind() == ConnectionKind::Provenance
                    && connection.source() == object_id
            })
            .is_empty()
    }

    /// Edges touching `object_id`, sorted by id.
    pub fn connections_for(&self, object_id: ObjectId) -> Vec<ConnectionSummary> {
        let mut summaries = self
            .registry
            .edges_touching(object_id)
            .iter()
            .filter_map(|id| self.registry.get(id))
            .map(|connection| connection.summary())
            .collect::<Vec<_>>();
        summaries.sort_by(|left, right| left.id.cmp(&right.id));
        summaries
    }

    pub fn connection(&self, id: &ConnectionId) -> Option<ConnectionSummary> {
        self.registry.get(id).map(|connection| connection.summary())
    }

    /// Creations still waiting for their frame.
    pub fn pending_creation_count(&self) -> usize {
        self.creations.len()
    }

    pub fn performance_snapshot(&self) -> PerformanceSnapshot {
        self.monitor.snapshot()
    }

    pub fn reset_performance_metrics(&mut self) {
        self.monitor.reset();
    }

    /// Full teardown.
    ///
    /// Order: destroy every render handle, unsubscribe from the environment,
    /// cancel in-flight timers and frames, clear pending sets and queued
    /// creations. The engine stays usable and empty afterwards.
    pub fn destroy(&mut self) {
        let released = self.registry.drain();
        let released_count = released.len();
        drop(released);

        let was_attached = self.release_environment().is_some();
        self.scheduler.clear_targets();
        let cancelled = self.creations.cancel_all();

        info!(
            "event=engine_destroy module=canvas status=ok released_connections={} detached={} cancelled_creations={}",
            released_count, was_attached, cancelled
        );
    }

    /// Unsubscribes, then cancels every timer/frame owned by this engine.
    fn release_environment(&mut self) -> Option<Box<dyn EnvironmentEventSource>> {
        let mut attached = self.environment.take()?;
        for subscription in attached.subscriptions.drain(..) {
            attached.source.unsubscribe(subscription);
        }
        self.scheduler.cancel_all(attached.source.as_mut());
        if let Some(frame) = self.creations.take_frame() {
            attached.source.cancel_frame(frame);
        }
        Some(attached.source)
    }

    fn has_live_state(&self) -> bool {
        !self.registry.is_empty() || self.environment.is_some() || !self.creations.is_empty()
    }
}

impl Drop for ConnectionEngine {
    fn drop(&mut self) {
        if self.has_live_state() {
            self.destroy();
        }
    }
}
