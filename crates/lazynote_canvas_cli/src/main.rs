//! CLI smoke entry point.
//!
//! # Responsibility
//! - Drive one scripted canvas session against in-memory host collaborators.
//! - Print a deterministic summary plus the performance snapshot as JSON.
//!
//! Set `LAZYNOTE_CANVAS_LOG_DIR` (absolute path) to also write engine logs.

use futures::executor::block_on;
use lazynote_canvas::{
    canvas_version, default_log_level, init_logging, AnchorHandle, AnchorOwner, AnchorRole,
    ConnectionEngine, ConnectionKind, EnvironmentEventKind, EnvironmentEventSource, FrameId,
    GeometryProvider, LineRenderer, LineStyle, ObjectId, Rect, RenderError, RenderHandle,
    SubscriptionId, TimerId,
};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;
use uuid::Uuid;

const LOG_DIR_ENV: &str = "LAZYNOTE_CANVAS_LOG_DIR";

/// Every anchor resolves; boxes are laid out on a fixed grid.
#[derive(Default)]
struct GridGeometry {
    anchors: RefCell<HashMap<(AnchorOwner, AnchorRole), AnchorHandle>>,
}

impl GeometryProvider for GridGeometry {
    fn resolve_anchor(&self, owner: AnchorOwner, role: AnchorRole) -> Option<AnchorHandle> {
        let mut anchors = self.anchors.borrow_mut();
        let next = AnchorHandle::new(anchors.len() as u64 + 1);
        Some(*anchors.entry((owner, role)).or_insert(next))
    }

    fn bounding_box(&self, anchor: AnchorHandle) -> Option<Rect> {
        let cell = anchor.raw() as f64;
        Some(Rect::new(cell * 40.0, cell * 24.0, 12.0, 12.0))
    }
}

#[derive(Clone, Default)]
struct CountingRenderer {
    drawn: Rc<Cell<usize>>,
    live: Rc<Cell<usize>>,
}

struct CountingHandle {
    live: Rc<Cell<usize>>,
}

impl RenderHandle for CountingHandle {
    fn reposition(&mut self) -> Result<(), RenderError> {
        Ok(())
    }

    fn destroy(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}

impl LineRenderer for CountingRenderer {
    fn draw(
        &mut self,
        _from: AnchorHandle,
        _to: AnchorHandle,
        _style: &LineStyle,
    ) -> Result<Box<dyn RenderHandle>, RenderError> {
        self.drawn.set(self.drawn.get() + 1);
        self.live.set(self.live.get() + 1);
        Ok(Box::new(CountingHandle {
            live: self.live.clone(),
        }))
    }
}

enum Callback {
    Timer(TimerId),
    Frame(FrameId),
}

/// Event loop that fires callbacks in request order when pumped.
#[derive(Clone, Default)]
struct QueueLoop {
    next_id: Rc<Cell<u64>>,
    queue: Rc<RefCell<VecDeque<Callback>>>,
}

impl QueueLoop {
    fn next(&self) -> u64 {
        self.next_id.set(self.next_id.get() + 1);
        self.next_id.get()
    }

    fn pump(&self, engine: &mut ConnectionEngine) -> usize {
        let mut fired = 0;
        loop {
            let callback = self.queue.borrow_mut().pop_front();
            match callback {
                Some(Callback::Timer(timer)) => engine.on_timer(timer),
                Some(Callback::Frame(frame)) => engine.on_frame(frame),
                None => return fired,
            }
            fired += 1;
        }
    }
}

impl EnvironmentEventSource for QueueLoop {
    fn subscribe(&mut self, _kind: EnvironmentEventKind) -> SubscriptionId {
        SubscriptionId(self.next())
    }

    fn unsubscribe(&mut self, _id: SubscriptionId) {}

    fn set_timeout(&mut self, _delay: Duration) -> TimerId {
        let timer = TimerId(self.next());
        self.queue.borrow_mut().push_back(Callback::Timer(timer));
        timer
    }

    fn clear_timeout(&mut self, id: TimerId) {
        self.queue
            .borrow_mut()
            .retain(|callback| !matches!(callback, Callback::Timer(timer) if *timer == id));
    }

    fn request_frame(&mut self) -> FrameId {
        let frame = FrameId(self.next());
        self.queue.borrow_mut().push_back(Callback::Frame(frame));
        frame
    }

    fn cancel_frame(&mut self, id: FrameId) {
        self.queue
            .borrow_mut()
            .retain(|callback| !matches!(callback, Callback::Frame(frame) if *frame == id));
    }
}

fn main() {
    println!("lazynote_canvas version={}", canvas_version());
    if let Ok(log_dir) = std::env::var(LOG_DIR_ENV) {
        if let Err(err) = init_logging(default_log_level(), &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let renderer = CountingRenderer::default();
    let event_loop = QueueLoop::default();
    let mut engine = ConnectionEngine::new(
        Box::new(GridGeometry::default()),
        Box::new(renderer.clone()),
    );
    engine.attach(Box::new(event_loop.clone()));

    let notes = (0..4).map(|_| Uuid::new_v4()).collect::<Vec<ObjectId>>();
    let pending = vec![
        engine.create_aggregation(notes[0], 1),
        engine.create_aggregation(notes[1], 1),
        engine.create_aggregation(notes[1], 2),
        engine.create_provenance(notes[0], notes[2]),
        engine.create_provenance(notes[2], notes[3]),
    ];
    event_loop.pump(&mut engine);
    let created = pending
        .into_iter()
        .map(block_on)
        .filter(|created| *created)
        .count();
    println!(
        "created={} aggregation={} provenance={}",
        created,
        engine.connection_count_of(ConnectionKind::Aggregation),
        engine.connection_count_of(ConnectionKind::Provenance)
    );

    engine.reset_performance_metrics();
    for _ in 0..8 {
        engine.on_environment_event(EnvironmentEventKind::Scroll);
    }
    engine.schedule_reposition_for(notes[2]);
    engine.schedule_reposition_for(notes[3]);
    let fired = event_loop.pump(&mut engine);
    println!("callbacks_fired={fired}");

    let removed = engine.remove_object(notes[2]);
    println!(
        "removed_with_note={} remaining={}",
        removed,
        engine.connection_count()
    );

    match serde_json::to_string_pretty(&engine.performance_snapshot()) {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("snapshot serialization failed: {err}"),
    }

    engine.destroy();
    println!(
        "drawn={} live_after_destroy={}",
        renderer.drawn.get(),
        renderer.live.get()
    );
    log::logger().flush();
}
