mod support;

use futures::executor::block_on;
use futures::FutureExt;
use lazynote_canvas::EnvironmentEventKind;
use support::{Canvas, FakeEnvironment};

fn busy_canvas() -> Canvas {
    let mut canvas = Canvas::attached();
    let a = canvas.note();
    let b = canvas.note();
    canvas.slot(1);
    assert!(canvas.connect_slot(a, 1));
    assert!(canvas.connect_provenance(a, b));
    canvas
}

#[test]
fn destroy_releases_handles_then_environment() {
    let mut canvas = busy_canvas();
    let c = canvas.note();
    let d = canvas.note();
    canvas.engine.schedule_reposition();
    let queued = canvas.engine.create_provenance(c, d);
    canvas.journal.borrow_mut().clear();

    canvas.engine.destroy();

    assert_eq!(
        *canvas.journal.borrow(),
        vec![
            "destroy",
            "destroy",
            "unsubscribe",
            "unsubscribe",
            "clear_timeout",
            "cancel_frame",
        ]
    );
    assert!(!block_on(queued));
    assert_eq!(canvas.engine.connection_count(), 0);
    assert_eq!(canvas.engine.pending_creation_count(), 0);
    assert!(!canvas.engine.is_attached());
    assert_eq!(canvas.env.subscription_count(), 0);
    assert!(canvas.env.pending_timers().is_empty());
    assert_eq!(canvas.env.pending_frames(), 0);
}

#[test]
fn destroy_cancels_a_frame_stage_batch() {
    let mut canvas = busy_canvas();
    canvas.engine.schedule_reposition();
    canvas.env.fire_timers(&mut canvas.engine);
    assert_eq!(canvas.env.pending_frames(), 1);

    canvas.engine.destroy();
    assert_eq!(canvas.env.pending_frames(), 0);
    assert_eq!(canvas.env.cancelled_frames(), 1);
}

#[test]
fn destroy_twice_is_harmless() {
    let mut canvas = busy_canvas();

    canvas.engine.destroy();
    canvas.journal.borrow_mut().clear();
    canvas.engine.destroy();

    assert!(canvas.journal.borrow().is_empty());
    assert_eq!(canvas.renderer.destroy_counts(), vec![1, 1]);
}

#[test]
fn engine_is_usable_after_destroy() {
    let mut canvas = busy_canvas();
    canvas.engine.destroy();

    let a = canvas.note();
    canvas.slot(2);
    let mut pending = canvas.engine.create_aggregation(a, 2);
    assert_eq!(pending.try_result(), Some(true));
    assert_eq!(canvas.engine.connection_count(), 1);
}

#[test]
fn dropping_the_engine_tears_down() {
    let canvas = busy_canvas();
    let Canvas {
        engine,
        renderer,
        env,
        ..
    } = canvas;

    drop(engine);
    assert_eq!(renderer.live_handles(), 0);
    assert_eq!(renderer.destroy_counts(), vec![1, 1]);
    assert_eq!(env.subscription_count(), 0);
}

#[test]
fn late_callbacks_after_destroy_are_ignored() {
    let mut canvas = busy_canvas();
    canvas.engine.schedule_reposition();
    let stale_timers = canvas.env.pending_timers();
    canvas.engine.destroy();
    canvas.engine.reset_performance_metrics();

    for (timer, _) in stale_timers {
        canvas.engine.on_timer(timer);
    }
    canvas
        .engine
        .on_environment_event(EnvironmentEventKind::WindowResize);
    assert_eq!(canvas.engine.performance_snapshot().update_count, 0);
}

#[test]
fn detach_keeps_connections_and_returns_the_source() {
    let mut canvas = busy_canvas();
    let c = canvas.note();
    let d = canvas.note();
    canvas.engine.schedule_reposition();
    let queued = canvas.engine.create_provenance(c, d);

    let source = canvas.engine.detach();
    assert!(source.is_some());
    assert!(!canvas.engine.is_attached());
    assert_eq!(canvas.engine.connection_count(), 2);
    assert_eq!(canvas.renderer.live_handles(), 2);
    assert_eq!(queued.now_or_never(), Some(false));
    assert_eq!(canvas.env.subscription_count(), 0);
    assert!(canvas.env.pending_timers().is_empty());
    assert_eq!(canvas.env.pending_frames(), 0);

    assert!(canvas.engine.detach().is_none());
}

#[test]
fn reattach_resumes_debounced_scheduling() {
    let mut canvas = busy_canvas();
    let source = canvas.engine.detach().unwrap();
    canvas.engine.attach(source);
    assert_eq!(canvas.env.subscription_count(), 2);
    canvas.engine.reset_performance_metrics();

    assert!(canvas.env.emit(EnvironmentEventKind::Scroll, &mut canvas.engine));
    assert_eq!(canvas.engine.performance_snapshot().update_count, 0);
    canvas.env.run_until_idle(&mut canvas.engine);
    assert_eq!(canvas.engine.performance_snapshot().update_count, 1);
}

#[test]
fn attach_replaces_the_previous_environment() {
    let mut canvas = busy_canvas();
    let replacement = FakeEnvironment::new();

    canvas.engine.attach(Box::new(replacement.clone()));
    assert_eq!(canvas.env.subscription_count(), 0);
    assert_eq!(replacement.subscription_count(), 2);
    assert!(canvas.engine.is_attached());
}
