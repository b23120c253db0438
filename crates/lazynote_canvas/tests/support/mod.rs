//! In-memory host collaborators for engine integration tests.
//!
//! Each fake keeps its state behind `Rc<RefCell<..>>` so the test keeps a
//! handle on it after the engine took ownership of the boxed collaborator.

#![allow(dead_code)]

use lazynote_canvas::{
    AnchorHandle, AnchorOwner, AnchorRole, ConnectionEngine, EnvironmentEventKind,
    EnvironmentEventSource, FrameId, GeometryProvider, LineRenderer, LineStyle, ObjectId, Rect,
    RenderError, RenderHandle, SubscriptionId, TimerId,
};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::rc::Rc;
use std::time::Duration;

/// Ordered log of teardown-relevant host calls shared by the fakes.
pub type Journal = Rc<RefCell<Vec<&'static str>>>;

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

#[derive(Default)]
struct GeometryState {
    mounted_notes: HashSet<ObjectId>,
    mounted_slots: HashSet<u32>,
    anchors: HashMap<(AnchorOwner, AnchorRole), AnchorHandle>,
    detached: HashSet<AnchorHandle>,
    reads: HashMap<AnchorHandle, usize>,
    next_anchor: u64,
}

#[derive(Clone, Default)]
pub struct FakeGeometry {
    state: Rc<RefCell<GeometryState>>,
}

impl FakeGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mount_note(&self, id: ObjectId) {
        self.state.borrow_mut().mounted_notes.insert(id);
    }

    pub fn unmount_note(&self, id: ObjectId) {
        self.state.borrow_mut().mounted_notes.remove(&id);
    }

    pub fn mount_slot(&self, index: u32) {
        self.state.borrow_mut().mounted_slots.insert(index);
    }

    /// Makes an already resolved anchor fail its layout read.
    pub fn detach_anchor(&self, owner: AnchorOwner, role: AnchorRole) {
        let mut state = self.state.borrow_mut();
        if let Some(handle) = state.anchors.get(&(owner, role)).copied() {
            state.detached.insert(handle);
        }
    }

    pub fn anchor_of(&self, owner: AnchorOwner, role: AnchorRole) -> Option<AnchorHandle> {
        self.state.borrow().anchors.get(&(owner, role)).copied()
    }

    pub fn total_reads(&self) -> usize {
        self.state.borrow().reads.values().sum()
    }

    pub fn max_reads_per_anchor(&self) -> usize {
        self.state.borrow().reads.values().copied().max().unwrap_or(0)
    }

    pub fn reset_reads(&self) {
        self.state.borrow_mut().reads.clear();
    }
}

impl GeometryProvider for FakeGeometry {
    fn resolve_anchor(&self, owner: AnchorOwner, role: AnchorRole) -> Option<AnchorHandle> {
        let mut state = self.state.borrow_mut();
        let mounted = match owner {
            AnchorOwner::Note(id) => state.mounted_notes.contains(&id),
            AnchorOwner::Slot(index) => state.mounted_slots.contains(&index),
        };
        if !mounted {
            return None;
        }
        if let Some(handle) = state.anchors.get(&(owner, role)) {
            return Some(*handle);
        }
        state.next_anchor += 1;
        let handle = AnchorHandle::new(state.next_anchor);
        state.anchors.insert((owner, role), handle);
        Some(handle)
    }

    fn bounding_box(&self, anchor: AnchorHandle) -> Option<Rect> {
        let mut state = self.state.borrow_mut();
        *state.reads.entry(anchor).or_default() += 1;
        if state.detached.contains(&anchor) {
            return None;
        }
        let offset = anchor.raw() as f64 * 10.0;
        Some(Rect::new(offset, offset, 8.0, 8.0))
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct HandleRecord {
    pub from: Option<AnchorHandle>,
    pub to: Option<AnchorHandle>,
    pub style: Option<LineStyle>,
    pub repositions: usize,
    pub destroyed: usize,
    pub fail_reposition: bool,
}

#[derive(Default)]
struct RendererState {
    handles: Vec<Rc<RefCell<HandleRecord>>>,
    fail_draw: bool,
    journal: Journal,
}

#[derive(Clone, Default)]
pub struct FakeRenderer {
    state: Rc<RefCell<RendererState>>,
}

struct FakeHandle {
    record: Rc<RefCell<HandleRecord>>,
    journal: Journal,
}

impl RenderHandle for FakeHandle {
    fn reposition(&mut self) -> Result<(), RenderError> {
        let mut record = self.record.borrow_mut();
        if record.fail_reposition {
            return Err(RenderError::Reposition("svg path detached".to_string()));
        }
        record.repositions += 1;
        Ok(())
    }

    fn destroy(&mut self) {
        self.record.borrow_mut().destroyed += 1;
        self.journal.borrow_mut().push("destroy");
    }
}

impl FakeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_journal(journal: Journal) -> Self {
        let renderer = Self::default();
        renderer.state.borrow_mut().journal = journal;
        renderer
    }

    pub fn fail_draws(&self, fail: bool) {
        self.state.borrow_mut().fail_draw = fail;
    }

    pub fn drawn(&self) -> usize {
        self.state.borrow().handles.len()
    }

    pub fn handle(&self, index: usize) -> Rc<RefCell<HandleRecord>> {
        self.state.borrow().handles[index].clone()
    }

    /// Handles drawn and not destroyed yet.
    pub fn live_handles(&self) -> usize {
        self.state
            .borrow()
            .handles
            .iter()
            .filter(|record| record.borrow().destroyed == 0)
            .count()
    }

    pub fn destroy_counts(&self) -> Vec<usize> {
        self.state
            .borrow()
            .handles
            .iter()
            .map(|record| record.borrow().destroyed)
            .collect()
    }

    pub fn total_repositions(&self) -> usize {
        self.state
            .borrow()
            .handles
            .iter()
            .map(|record| record.borrow().repositions)
            .sum()
    }
}

impl LineRenderer for FakeRenderer {
    fn draw(
        &mut self,
        from: AnchorHandle,
        to: AnchorHandle,
        style: &LineStyle,
    ) -> Result<Box<dyn RenderHandle>, RenderError> {
        let mut state = self.state.borrow_mut();
        if state.fail_draw {
            return Err(RenderError::Draw("canvas layer missing".to_string()));
        }
        let record = Rc::new(RefCell::new(HandleRecord {
            from: Some(from),
            to: Some(to),
            style: Some(style.clone()),
            ..HandleRecord::default()
        }));
        state.handles.push(record.clone());
        Ok(Box::new(FakeHandle {
            record,
            journal: state.journal.clone(),
        }))
    }
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

#[derive(Default)]
struct EnvironmentState {
    next_id: u64,
    subscriptions: BTreeMap<SubscriptionId, EnvironmentEventKind>,
    timers: BTreeMap<TimerId, Duration>,
    frames: BTreeSet<FrameId>,
    cleared_timers: Vec<TimerId>,
    cancelled_frames: Vec<FrameId>,
    timers_started: usize,
    journal: Journal,
}

impl EnvironmentState {
    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Manually pumped event loop.
#[derive(Clone, Default)]
pub struct FakeEnvironment {
    state: Rc<RefCell<EnvironmentState>>,
}

impl FakeEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_journal(journal: Journal) -> Self {
        let env = Self::default();
        env.state.borrow_mut().journal = journal;
        env
    }

    pub fn subscription_count(&self) -> usize {
        self.state.borrow().subscriptions.len()
    }

    pub fn pending_timers(&self) -> Vec<(TimerId, Duration)> {
        self.state
            .borrow()
            .timers
            .iter()
            .map(|(id, delay)| (*id, *delay))
            .collect()
    }

    pub fn pending_frames(&self) -> usize {
        self.state.borrow().frames.len()
    }

    pub fn timers_started(&self) -> usize {
        self.state.borrow().timers_started
    }

    pub fn cleared_timers(&self) -> usize {
        self.state.borrow().cleared_timers.len()
    }

    pub fn cancelled_frames(&self) -> usize {
        self.state.borrow().cancelled_frames.len()
    }

    /// Fires every pending timer once.
    pub fn fire_timers(&self, engine: &mut ConnectionEngine) -> usize {
        let due = std::mem::take(&mut self.state.borrow_mut().timers);
        for timer in due.keys() {
            engine.on_timer(*timer);
        }
        due.len()
    }

    /// Fires every pending frame once.
    pub fn fire_frames(&self, engine: &mut ConnectionEngine) -> usize {
        let due = std::mem::take(&mut self.state.borrow_mut().frames);
        for frame in &due {
            engine.on_frame(*frame);
        }
        due.len()
    }

    /// Fires timers and frames until nothing is pending.
    pub fn run_until_idle(&self, engine: &mut ConnectionEngine) {
        loop {
            let fired = self.fire_timers(engine) + self.fire_frames(engine);
            if fired == 0 {
                break;
            }
        }
    }

    /// Delivers `kind` if the engine is subscribed to it.
    pub fn emit(&self, kind: EnvironmentEventKind, engine: &mut ConnectionEngine) -> bool {
        let subscribed = self
            .state
            .borrow()
            .subscriptions
            .values()
            .any(|subscribed| *subscribed == kind);
        if subscribed {
            engine.on_environment_event(kind);
        }
        subscribed
    }
}

impl EnvironmentEventSource for FakeEnvironment {
    fn subscribe(&mut self, kind: EnvironmentEventKind) -> SubscriptionId {
        let mut state = self.state.borrow_mut();
        let id = SubscriptionId(state.next());
        state.subscriptions.insert(id, kind);
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        let mut state = self.state.borrow_mut();
        state.subscriptions.remove(&id);
        state.journal.borrow_mut().push("unsubscribe");
    }

    fn set_timeout(&mut self, delay: Duration) -> TimerId {
        let mut state = self.state.borrow_mut();
        let id = TimerId(state.next());
        state.timers.insert(id, delay);
        state.timers_started += 1;
        id
    }

    fn clear_timeout(&mut self, id: TimerId) {
        let mut state = self.state.borrow_mut();
        state.timers.remove(&id);
        state.cleared_timers.push(id);
        state.journal.borrow_mut().push("clear_timeout");
    }

    fn request_frame(&mut self) -> FrameId {
        let mut state = self.state.borrow_mut();
        let id = FrameId(state.next());
        state.frames.insert(id);
        id
    }

    fn cancel_frame(&mut self, id: FrameId) {
        let mut state = self.state.borrow_mut();
        state.frames.remove(&id);
        state.cancelled_frames.push(id);
        state.journal.borrow_mut().push("cancel_frame");
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Canvas {
    pub engine: ConnectionEngine,
    pub geometry: FakeGeometry,
    pub renderer: FakeRenderer,
    pub env: FakeEnvironment,
    pub journal: Journal,
}

impl Canvas {
    /// Engine attached to a manually pumped environment.
    pub fn attached() -> Self {
        let mut canvas = Self::detached();
        canvas.engine.attach(Box::new(canvas.env.clone()));
        canvas
    }

    /// Engine without environment: creation and scheduling run inline.
    pub fn detached() -> Self {
        let journal = Journal::default();
        let geometry = FakeGeometry::new();
        let renderer = FakeRenderer::with_journal(journal.clone());
        let engine = ConnectionEngine::new(Box::new(geometry.clone()), Box::new(renderer.clone()));
        Self {
            engine,
            geometry,
            renderer,
            env: FakeEnvironment::with_journal(journal.clone()),
            journal,
        }
    }

    pub fn note(&self) -> ObjectId {
        let id = uuid::Uuid::new_v4();
        self.geometry.mount_note(id);
        id
    }

    pub fn slot(&self, index: u32) -> u32 {
        self.geometry.mount_slot(index);
        index
    }

    /// Requests an aggregation edge and pumps frames until it resolves.
    pub fn connect_slot(&mut self, note: ObjectId, slot: u32) -> bool {
        let pending = self.engine.create_aggregation(note, slot);
        self.env.run_until_idle(&mut self.engine);
        futures::executor::block_on(pending)
    }

    pub fn connect_provenance(&mut self, source: ObjectId, target: ObjectId) -> bool {
        let pending = self.engine.create_provenance(source, target);
        self.env.run_until_idle(&mut self.engine);
        futures::executor::block_on(pending)
    }
}
