//! End-to-end session scenarios: controller + relay + dispatcher + views,
//! driven by the scripted stub engine.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use traffic_console::{
    dispatch_channel, ChannelOrder, CounterView, CountingEngine, FrameImage, FrameView,
    SessionController, SessionState, StubEngine, StubStep, UpdateEvent, UpdateReceiver,
};

fn paths() -> (PathBuf, PathBuf) {
    (
        PathBuf::from("stub://camera"),
        PathBuf::from("models/yolov8n.onnx"),
    )
}

fn frame(tag: u8) -> FrameImage {
    FrameImage::new(vec![tag; 12], 2, 2, ChannelOrder::Bgr)
}

/// Pump the dispatcher into the controller until `Finished` arrives,
/// returning every observed event in delivery order.
fn drive_to_finish(
    controller: &mut SessionController,
    updates: &UpdateReceiver,
) -> Vec<UpdateEvent> {
    let mut events = Vec::new();
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        assert!(
            Instant::now() < deadline,
            "session did not finish in time (state: {})",
            controller.state()
        );
        let mut finished = false;
        for event in updates.drain_timeout(Duration::from_millis(20)) {
            controller.observe(&event);
            finished |= matches!(event, UpdateEvent::Finished);
            events.push(event);
        }
        if finished {
            return events;
        }
    }
}

fn lifecycle_states(events: &[UpdateEvent]) -> Vec<SessionState> {
    events
        .iter()
        .filter_map(|event| match event {
            UpdateEvent::Lifecycle(state) => Some(state.clone()),
            _ => None,
        })
        .collect()
}

fn finished_count(events: &[UpdateEvent]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, UpdateEvent::Finished))
        .count()
}

#[test]
fn five_snapshot_run_ends_with_final_counts_and_one_finished() {
    let engine = StubEngine::scripted(vec![
        StubStep::counts(&[("car", 1)]).with_frame(frame(1)),
        StubStep::counts(&[("car", 2)]),
        StubStep::counts(&[("car", 2), ("bus", 1)]).with_frame(frame(2)),
        StubStep::counts(&[("car", 3), ("bus", 1)]),
    ]);
    let categories = engine.categories();
    let (video, model) = paths();

    let (tx, rx) = dispatch_channel();
    let mut controller = SessionController::new(Duration::from_millis(2), tx);
    let mut counter_view = CounterView::new(categories);
    let mut frame_view = FrameView::new();

    controller.start(Box::new(engine), &video, &model).unwrap();
    let events = drive_to_finish(&mut controller, &rx);

    for event in &events {
        if let UpdateEvent::Snapshot(snapshot) = event {
            counter_view.apply(snapshot);
            frame_view.apply(snapshot);
        }
    }

    assert_eq!(counter_view.count("car"), 3);
    assert_eq!(counter_view.count("bus"), 1);
    assert_eq!(counter_view.total(), 4);
    // The last two ticks carried no frame; the view keeps the last real one.
    assert!(frame_view.has_frame());

    assert_eq!(finished_count(&events), 1);
    assert!(matches!(events.last(), Some(UpdateEvent::Finished)));
    assert_eq!(*controller.state(), SessionState::Stopped);
}

#[test]
fn open_failure_goes_initializing_to_failed_without_polling() {
    let engine = StubEngine::scripted(vec![StubStep::counts(&[("car", 1)])]);
    let stats = engine.stats_handle();
    let (video, _) = paths();
    let bad_model = PathBuf::from("models/definitely-not-here.model");

    let (tx, rx) = dispatch_channel();
    let mut controller = SessionController::new(Duration::from_millis(2), tx);

    controller.start(Box::new(engine), &video, &bad_model).unwrap();
    assert_eq!(*controller.state(), SessionState::Initializing);

    let events = drive_to_finish(&mut controller, &rx);

    let states = lifecycle_states(&events);
    assert!(!states.iter().any(|s| *s == SessionState::Running));
    assert!(matches!(controller.state(), SessionState::Failed(_)));

    // The failure reason reaches the status surface.
    assert!(events.iter().any(|event| matches!(
        event,
        UpdateEvent::Status(text) if text.contains("definitely-not-here.model")
    )));
    assert!(controller
        .status_text()
        .contains("definitely-not-here.model"));

    // The engine was never polled.
    assert_eq!(stats.frame_polls(), 0);
    assert_eq!(stats.count_polls(), 0);
    assert_eq!(finished_count(&events), 1);
}

#[test]
fn rapid_double_start_constructs_one_session() {
    let (video, model) = paths();
    let (tx, rx) = dispatch_channel();
    let mut controller = SessionController::new(Duration::from_millis(2), tx);

    let first = StubEngine::synthetic(50);
    let first_stats = first.stats_handle();
    controller.start(Box::new(first), &video, &model).unwrap();

    let second = StubEngine::synthetic(50);
    let second_stats = second.stats_handle();
    let err = controller.start(Box::new(second), &video, &model);
    assert!(err.is_err());

    drive_to_finish(&mut controller, &rx);

    assert!(first_stats.opened());
    assert!(!second_stats.opened());
    assert_eq!(second_stats.frame_polls(), 0);
}

#[test]
fn stop_is_idempotent_and_no_tick_runs_after_stopped() {
    let engine = StubEngine::synthetic(1_000_000);
    let stats = engine.stats_handle();
    let (video, model) = paths();

    let (tx, rx) = dispatch_channel();
    let mut controller = SessionController::new(Duration::from_millis(2), tx);
    controller.start(Box::new(engine), &video, &model).unwrap();

    // Let a few ticks happen before stopping.
    let deadline = Instant::now() + Duration::from_secs(5);
    while stats.frame_polls() < 3 {
        assert!(Instant::now() < deadline, "relay never polled");
        std::thread::sleep(Duration::from_millis(5));
    }

    controller.stop();
    controller.stop();

    let events = drive_to_finish(&mut controller, &rx);
    assert_eq!(finished_count(&events), 1);
    assert_eq!(*controller.state(), SessionState::Stopped);

    // The relay thread is gone; no further tick can execute.
    let polls_after_stop = stats.frame_polls();
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(stats.frame_polls(), polls_after_stop);
    assert_eq!(stats.stops(), 1);
}

#[test]
fn close_while_running_stops_within_the_bound() {
    let engine = StubEngine::synthetic(1_000_000);
    let (video, model) = paths();

    let (tx, rx) = dispatch_channel();
    let mut controller = SessionController::new(Duration::from_millis(2), tx);
    controller.start(Box::new(engine), &video, &model).unwrap();

    // Wait for the session to actually be running.
    let deadline = Instant::now() + Duration::from_secs(5);
    while *controller.state() != SessionState::Running {
        assert!(Instant::now() < deadline, "session never started running");
        for event in rx.drain_timeout(Duration::from_millis(10)) {
            controller.observe(&event);
        }
    }

    let bound = Duration::from_secs(5);
    let started = Instant::now();
    controller.shutdown(bound).unwrap();
    assert!(started.elapsed() < bound);
    assert_eq!(*controller.state(), SessionState::Stopped);
}
