mod common;

use std::time::Duration;

use rarewatch_core::{ArtistId, SnapshotStore};
use rarewatch_daemon::{run, DaemonError, Driver};
use tempfile::TempDir;
use tokio::sync::broadcast;
use tokio_test::{assert_err, assert_ok};

use common::{creation, snapshot, RecordingNotifier, ScriptedSource};

const INTERVAL: Duration = Duration::from_secs(60);

fn driver(dir: &TempDir, source: &ScriptedSource, notifier: &RecordingNotifier) -> Driver {
    Driver::new(
        Box::new(source.clone()),
        Box::new(notifier.clone()),
        SnapshotStore::new(dir.path().join("db.json")),
        ArtistId::from("xcopy"),
    )
}

#[tokio::test(start_paused = true)]
async fn polls_immediately_then_every_interval_until_shutdown() {
    let dir = TempDir::new().unwrap();
    let source = ScriptedSource::new();
    source
        .push(snapshot(vec![creation("A", &["minted"])]))
        .push(snapshot(vec![creation("A", &["minted", "listed"])]))
        .push(snapshot(vec![creation("A", &["minted", "listed", "sold"])]));
    let notifier = RecordingNotifier::new();
    let mut driver = driver(&dir, &source, &notifier);

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let handle = tokio::spawn(async move { run(&mut driver, INTERVAL, shutdown_rx).await });

    tokio::time::sleep(Duration::from_secs(150)).await;
    shutdown_tx.send(()).unwrap();
    assert_ok!(handle.await.unwrap());

    assert_eq!(source.calls(), 3);
    assert_eq!(notifier.descriptions(), vec!["A: minted", "A: listed", "A: sold"]);
}

#[tokio::test(start_paused = true)]
async fn slow_cycles_never_overlap() {
    let dir = TempDir::new().unwrap();
    let source = ScriptedSource::new().with_delay(Duration::from_secs(90));
    for _ in 0..8 {
        source.push(snapshot(vec![creation("A", &["minted"])]));
    }
    let notifier = RecordingNotifier::new();
    let mut driver = driver(&dir, &source, &notifier);

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let handle = tokio::spawn(async move { run(&mut driver, INTERVAL, shutdown_rx).await });

    tokio::time::sleep(Duration::from_secs(400)).await;
    shutdown_tx.send(()).unwrap();
    assert_ok!(handle.await.unwrap());

    assert_eq!(source.max_in_flight(), 1);
    assert!(source.calls() <= 5, "calls = {}", source.calls());
    assert_eq!(notifier.sent().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn fetch_failure_is_skipped_and_polling_continues() {
    let dir = TempDir::new().unwrap();
    let source = ScriptedSource::new();
    source
        .push_failure("page did not load")
        .push(snapshot(vec![creation("A", &["minted"])]));
    let notifier = RecordingNotifier::new();
    let mut driver = driver(&dir, &source, &notifier);

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let handle = tokio::spawn(async move { run(&mut driver, INTERVAL, shutdown_rx).await });

    tokio::time::sleep(Duration::from_secs(90)).await;
    shutdown_tx.send(()).unwrap();
    assert_ok!(handle.await.unwrap());

    assert_eq!(source.calls(), 2);
    assert_eq!(notifier.descriptions(), vec!["A: minted"]);
}

#[tokio::test(start_paused = true)]
async fn shutdown_during_fetch_abandons_the_cycle() {
    let dir = TempDir::new().unwrap();
    let source = ScriptedSource::new().with_delay(Duration::from_secs(100));
    source.push(snapshot(vec![creation("A", &["minted"])]));
    let notifier = RecordingNotifier::new();
    let mut driver = driver(&dir, &source, &notifier);

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let handle = tokio::spawn(async move { run(&mut driver, INTERVAL, shutdown_rx).await });

    tokio::time::sleep(Duration::from_secs(10)).await;
    shutdown_tx.send(()).unwrap();
    assert_ok!(handle.await.unwrap());

    assert_eq!(source.calls(), 1);
    assert!(notifier.sent().is_empty());
    assert!(!dir.path().join("db.json").exists());
}

#[tokio::test(start_paused = true)]
async fn corrupt_state_stops_the_loop_before_polling() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("db.json"), "[{\"name\": 1}]").unwrap();
    let source = ScriptedSource::new();
    let notifier = RecordingNotifier::new();
    let mut driver = driver(&dir, &source, &notifier);

    let (_shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
    let err = assert_err!(run(&mut driver, INTERVAL, shutdown_rx).await);

    assert!(matches!(err, DaemonError::Cycle(_)));
    assert_eq!(source.calls(), 0);
}
