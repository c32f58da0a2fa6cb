#![allow(clippy::unwrap_used)]
// Integration tests for `RemoteInterpreter`: button events end to end.

mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

use touchhub_api::{Button, ButtonEvent, RemoteEvent};
use touchhub_core::{EventOutcome, RemoteBinding, RemoteInterpreter, start_activity};

use common::{FakeHub, FakeRemote, Harness, Op, eventually, within};

// ── Helpers ─────────────────────────────────────────────────────────

async fn interpreter_for(hub: FakeHub) -> (Harness, RemoteInterpreter) {
    let harness = Harness::with_ready_hub(hub).await;
    let interpreter = RemoteInterpreter::new(harness.registry.clone(), RemoteBinding::default());
    (harness, interpreter)
}

// ── Holds ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_north_hold_then_press_starts_tv_and_zaps() {
    let (harness, interpreter) = interpreter_for(FakeHub::new()).await;
    let hub = harness.hub();

    let outcome = interpreter.handle_event(ButtonEvent::hold(Button::North)).await;
    assert_eq!(outcome, EventOutcome::Executed);
    assert_eq!(hub.started_activities(), ["1"]);
    let session = harness.registry.lookup("Huiskamer").unwrap();
    assert_eq!(session.current_activity().unwrap().label, "TV kijken");

    let outcome = interpreter.handle_event(ButtonEvent::press(Button::North)).await;
    assert_eq!(outcome, EventOutcome::Executed);
    assert_eq!(hub.sent_commands(), ["1::2"]);
}

#[tokio::test]
async fn test_east_hold_starts_secondary_activity() {
    let (harness, interpreter) = interpreter_for(FakeHub::new()).await;

    let outcome = interpreter.handle_event(ButtonEvent::hold(Button::East)).await;

    assert_eq!(outcome, EventOutcome::Executed);
    assert_eq!(harness.hub().started_activities(), ["2"]);
}

#[tokio::test]
async fn test_holds_while_on_only_turn_off() {
    // Netflix is neither bound activity; south still turns it off.
    let (harness, interpreter) = interpreter_for(FakeHub::new().running("3")).await;
    let hub = harness.hub();

    let outcome = interpreter.handle_event(ButtonEvent::hold(Button::North)).await;
    assert_eq!(outcome, EventOutcome::Ignored);
    assert!(hub.started_activities().is_empty());

    let outcome = interpreter.handle_event(ButtonEvent::hold(Button::South)).await;
    assert_eq!(outcome, EventOutcome::Executed);
    assert_eq!(hub.started_activities(), ["-1"]);
}

#[tokio::test]
async fn test_overlapping_holds_start_activity_once() {
    let (harness, interpreter) = interpreter_for(FakeHub::new()).await;
    let hub = harness.hub();
    let gate = hub.gate(Op::StartActivity);

    let first = tokio::spawn({
        let interpreter = interpreter.clone();
        async move { interpreter.handle_event(ButtonEvent::hold(Button::North)).await }
    });
    within(gate.entered()).await;

    let second = interpreter.handle_event(ButtonEvent::hold(Button::North)).await;
    let press = interpreter.handle_event(ButtonEvent::press(Button::West)).await;
    gate.release();

    assert_eq!(second, EventOutcome::Dropped);
    assert_eq!(press, EventOutcome::Dropped);
    assert_eq!(within(first).await.unwrap(), EventOutcome::Executed);
    assert_eq!(hub.started_activities(), ["1"]);
    assert!(hub.sent_commands().is_empty());
}

#[tokio::test]
async fn test_restarting_running_activity_goes_through_off() {
    let (harness, _interpreter) = interpreter_for(FakeHub::new().running("1")).await;
    let session = harness.registry.lookup("Huiskamer").unwrap();

    start_activity(&session, "TV kijken").await.unwrap();

    assert_eq!(harness.hub().started_activities(), ["-1", "1"]);
    assert_eq!(session.current_activity().unwrap().label, "TV kijken");
}

// ── Presses ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_presses_map_to_bound_commands() {
    let (harness, interpreter) = interpreter_for(FakeHub::new().running("2")).await;

    for button in [Button::North, Button::East, Button::South, Button::West] {
        let outcome = interpreter.handle_event(ButtonEvent::press(button)).await;
        assert_eq!(outcome, EventOutcome::Executed, "{button}");
    }

    assert_eq!(
        harness.hub().sent_commands(),
        [
            "1::2",
            r#"{"command"::"VolumeUp","deviceId"::"200"}"#,
            "1::3",
            r#"{"command"::"VolumeDown","deviceId"::"200"}"#,
        ]
    );
}

#[tokio::test]
async fn test_presses_without_bound_activity_are_ignored() {
    for running in ["-1", "3"] {
        let (harness, interpreter) = interpreter_for(FakeHub::new().running(running)).await;

        let outcome = interpreter.handle_event(ButtonEvent::press(Button::North)).await;

        assert_eq!(outcome, EventOutcome::Ignored, "running {running}");
        assert!(harness.hub().sent_commands().is_empty());
    }
}

#[tokio::test]
async fn test_multi_touch_is_ignored() {
    let (harness, interpreter) = interpreter_for(FakeHub::new().running("1")).await;

    for event in [
        ButtonEvent::press(Button::MultiTouch),
        ButtonEvent::hold(Button::MultiTouch),
    ] {
        assert_eq!(interpreter.handle_event(event).await, EventOutcome::Ignored);
    }
    assert!(harness.hub().calls().iter().all(|call| !matches!(
        call,
        common::Call::StartActivity(_) | common::Call::SendCommand(_)
    )));
}

#[tokio::test]
async fn test_command_in_flight_drops_next_press() {
    let (harness, interpreter) = interpreter_for(FakeHub::new().running("1")).await;
    let hub = harness.hub();
    let gate = hub.gate(Op::SendCommand);

    let first = tokio::spawn({
        let interpreter = interpreter.clone();
        async move { interpreter.handle_event(ButtonEvent::press(Button::East)).await }
    });
    within(gate.entered()).await;

    let second = interpreter.handle_event(ButtonEvent::press(Button::East)).await;
    gate.release();

    assert_eq!(second, EventOutcome::Dropped);
    assert_eq!(within(first).await.unwrap(), EventOutcome::Executed);
    assert_eq!(hub.sent_commands().len(), 1);
}

#[tokio::test]
async fn test_command_in_flight_drops_turn_off() {
    let (harness, interpreter) = interpreter_for(FakeHub::new().running("1")).await;
    let hub = harness.hub();
    let gate = hub.gate(Op::SendCommand);

    let press = tokio::spawn({
        let interpreter = interpreter.clone();
        async move { interpreter.handle_event(ButtonEvent::press(Button::East)).await }
    });
    within(gate.entered()).await;

    let hold = interpreter.handle_event(ButtonEvent::hold(Button::South)).await;
    assert!(hub.started_activities().is_empty());
    gate.release();

    assert_eq!(hold, EventOutcome::Dropped);
    assert_eq!(within(press).await.unwrap(), EventOutcome::Executed);
    assert_eq!(hub.sent_commands().len(), 1);
    assert_eq!(
        harness.registry.lookup("Huiskamer").unwrap().current_activity().unwrap().label,
        "TV kijken"
    );
}

#[tokio::test]
async fn test_missing_command_target_fails_event() {
    let harness = Harness::with_ready_hub(FakeHub::new().running("1")).await;
    let binding = RemoteBinding {
        north: touchhub_core::CommandHint::new("projector", "powerOn"),
        ..RemoteBinding::default()
    };
    let interpreter = RemoteInterpreter::new(harness.registry.clone(), binding);

    let outcome = interpreter.handle_event(ButtonEvent::press(Button::North)).await;

    assert_eq!(outcome, EventOutcome::Failed);
    assert!(harness.hub().sent_commands().is_empty());
}

#[tokio::test]
async fn test_event_fails_when_registry_stops_first() {
    let harness = Harness::new();
    harness.registry.start().await.unwrap();
    let interpreter = RemoteInterpreter::new(harness.registry.clone(), RemoteBinding::default());

    let pending = tokio::spawn({
        let interpreter = interpreter.clone();
        async move { interpreter.handle_event(ButtonEvent::hold(Button::North)).await }
    });
    tokio::task::yield_now().await;
    harness.registry.stop().await;

    assert_eq!(within(pending).await.unwrap(), EventOutcome::Failed);
}

// ── Run loop ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_run_consumes_remote_events_until_cancelled() {
    let (harness, interpreter) = interpreter_for(FakeHub::new()).await;
    let remote = Arc::new(FakeRemote::new());
    let cancel = CancellationToken::new();

    let run = tokio::spawn({
        let interpreter = interpreter.clone();
        let remote = remote.clone();
        let cancel = cancel.clone();
        async move { interpreter.run(remote, cancel).await }
    });
    eventually(|| remote.is_connected()).await;

    remote.emit(RemoteEvent::Battery(80));
    remote.emit(RemoteEvent::Error("link quality low".into()));
    remote.emit(RemoteEvent::Button(ButtonEvent::hold(Button::North)));

    eventually(|| interpreter.battery_level() == Some(80)).await;
    eventually(|| harness.hub().started_activities() == ["1"]).await;

    cancel.cancel();
    within(run).await.unwrap().unwrap();
    assert!(remote.is_disconnected());
}
