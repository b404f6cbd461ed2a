//! Architectural Contract Test: Shutdown Determinism
//!
//! This test verifies that shutdown is deterministic and complete.
//!
//! Constraints verified:
//! - Engine terminates on shutdown signal
//! - Shutdown during the inter-cycle sleep does not wait the interval out
//! - The event stream opens with Started and closes with Stopped
//! - No extra cycle runs after the signal
//!
//! If this test fails, someone has added:
//! - Detached background tasks
//! - Tasks that ignore cancellation
//! - A sleep that cannot be interrupted

mod common;

use common::*;
use upsmq_core::{BridgeEngine, EngineEvent};

const DUMP: &str = "battery.charge: 100\nups.status: OL\nups.model: Back-UPS RS 1000G\n";

#[tokio::test]
async fn shutdown_signal_terminates_engine() {
    let source = Box::new(ScriptedSource::replaying(&[DUMP]));
    let publisher = Box::new(RecordingPublisher::new());

    let (mut engine, _event_rx) = BridgeEngine::new(source, publisher, test_config())
        .expect("engine construction succeeds");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let engine_handle =
        tokio::spawn(async move { engine.run_with_shutdown(Some(shutdown_rx)).await });

    // Wait for startup
    tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

    let shutdown_result = shutdown_tx.send(());
    assert!(shutdown_result.is_ok(), "shutdown signal send succeeds");

    let result = tokio::time::timeout(tokio::time::Duration::from_secs(5), engine_handle).await;
    assert!(result.is_ok(), "Engine should terminate within 5 seconds");

    let engine_result = result.unwrap().unwrap();
    assert!(
        engine_result.is_ok(),
        "Engine should shut down successfully: {:?}",
        engine_result
    );
}

#[tokio::test]
async fn shutdown_during_sleep_does_not_wait_the_interval_out() {
    let source = ScriptedSource::replaying(&[DUMP]);
    let probe = ScriptedSource::sharing_counters_with(&source);
    let publisher = Box::new(RecordingPublisher::new());

    let mut config = test_config();
    config.general.poll_interval_secs = 3600;

    let (mut engine, _event_rx) = BridgeEngine::new(Box::new(source), publisher, config)
        .expect("engine construction succeeds");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let engine_handle =
        tokio::spawn(async move { engine.run_with_shutdown(Some(shutdown_rx)).await });

    tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
    shutdown_tx.send(()).expect("shutdown signal send succeeds");

    // An hour long interval must not delay the stop
    let result = tokio::time::timeout(tokio::time::Duration::from_secs(5), engine_handle).await;
    assert!(result.is_ok(), "Engine should stop mid-sleep");

    assert_eq!(
        probe.fetch_call_count(),
        1,
        "no extra cycle ran after the signal"
    );
}

#[tokio::test]
async fn event_stream_brackets_the_run() {
    let source = Box::new(ScriptedSource::replaying(&[DUMP]));
    let publisher = Box::new(RecordingPublisher::new());

    let (mut engine, mut event_rx) = BridgeEngine::new(source, publisher, test_config())
        .expect("engine construction succeeds");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let engine_handle =
        tokio::spawn(async move { engine.run_with_shutdown(Some(shutdown_rx)).await });

    tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
    shutdown_tx.send(()).expect("shutdown signal send succeeds");

    engine_handle
        .await
        .expect("engine task joins")
        .expect("engine shuts down cleanly");

    // The engine task is done, so the channel is closed; drain whatever
    // it emitted.
    let mut events = Vec::new();
    while let Some(event) = event_rx.recv().await {
        events.push(event);
    }

    assert_eq!(
        events.first(),
        Some(&EngineEvent::Started {
            poll_interval_secs: 1
        })
    );
    assert_eq!(
        events.last(),
        Some(&EngineEvent::Stopped {
            reason: "Shutdown signal".to_string()
        })
    );
    assert!(
        events
            .iter()
            .any(|e| matches!(e, EngineEvent::CycleCompleted { .. })),
        "the first cycle completed before the signal"
    );
}

#[tokio::test]
async fn multiple_shutdown_signals_are_safe() {
    let source = Box::new(ScriptedSource::replaying(&[DUMP]));
    let publisher = Box::new(RecordingPublisher::new());

    let (mut engine, _event_rx) = BridgeEngine::new(source, publisher, test_config())
        .expect("engine construction succeeds");

    let (shutdown_tx1, shutdown_rx1) = tokio::sync::oneshot::channel();
    let (shutdown_tx2, _shutdown_rx2) = tokio::sync::oneshot::channel();

    let engine_handle =
        tokio::spawn(async move { engine.run_with_shutdown(Some(shutdown_rx1)).await });

    tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

    // Send first shutdown
    shutdown_tx1.send(()).expect("first shutdown signal sends");

    // Send second shutdown (nobody is listening; must be harmless)
    let _ = shutdown_tx2.send(());

    let result = tokio::time::timeout(tokio::time::Duration::from_secs(5), engine_handle).await;
    assert!(
        result.is_ok(),
        "Multiple shutdown signals should not cause issues"
    );
}
