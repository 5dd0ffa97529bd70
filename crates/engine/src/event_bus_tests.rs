use super::*;
use chrono::Utc;
use serde_json::json;

fn repo() -> RepoSlug {
    RepoSlug("repo-aaaaaaaa".to_string())
}

fn event(seq: u64, kind: &str) -> Event {
    Event::new(seq, kind, "job-1", json!({}), Utc::now())
}

#[tokio::test]
async fn run_appends_every_event_to_the_durable_log() {
    let dir = tempfile::tempdir().unwrap();
    let bus = EventBus::new(dir.path().to_path_buf());
    let (tx, rx) = mpsc::channel(8);

    tx.send(event(0, "job.start")).await.unwrap();
    tx.send(event(1, "job.stage")).await.unwrap();
    drop(tx);
    bus.run(&repo(), rx, None).await.unwrap();

    let logged = bus.historical(&repo()).await.unwrap();
    assert_eq!(logged.len(), 2);
    assert_eq!(logged[0].kind, "job.start");
    assert_eq!(logged[1].kind, "job.stage");
}

#[tokio::test]
async fn run_forwards_every_event_to_the_caller_channel_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let bus = EventBus::new(dir.path().to_path_buf());
    let (tx, rx) = mpsc::channel(8);
    let (caller_tx, mut caller_rx) = mpsc::channel(8);

    tx.send(event(0, "job.start")).await.unwrap();
    tx.send(event(1, "job.complete")).await.unwrap();
    drop(tx);
    bus.run(&repo(), rx, Some(caller_tx)).await.unwrap();

    assert_eq!(caller_rx.recv().await.unwrap().kind, "job.start");
    assert_eq!(caller_rx.recv().await.unwrap().kind, "job.complete");
    assert!(caller_rx.recv().await.is_none());
}

#[tokio::test]
async fn a_caller_channel_closed_early_does_not_abort_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let bus = EventBus::new(dir.path().to_path_buf());
    let (tx, rx) = mpsc::channel(8);
    let (caller_tx, caller_rx) = mpsc::channel(8);
    drop(caller_rx);

    tx.send(event(0, "job.start")).await.unwrap();
    drop(tx);
    bus.run(&repo(), rx, Some(caller_tx)).await.unwrap();

    assert_eq!(bus.historical(&repo()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn subscribed_tail_receives_events_published_after_subscription() {
    let dir = tempfile::tempdir().unwrap();
    let bus = EventBus::new(dir.path().to_path_buf());
    let mut tail = bus.subscribe(&repo()).await;

    let (tx, rx) = mpsc::channel(8);
    let bus_clone = bus.clone();
    let repo_slug = repo();
    let handle = tokio::spawn(async move { bus_clone.run(&repo_slug, rx, None).await });

    tx.send(event(0, "job.start")).await.unwrap();
    tx.send(event(1, "job.stage")).await.unwrap();
    drop(tx);
    handle.await.unwrap().unwrap();

    assert_eq!(tail.recv().await.unwrap().kind, "job.start");
    assert_eq!(tail.recv().await.unwrap().kind, "job.stage");
    assert!(tail.recv().await.is_none());
}

#[tokio::test]
async fn a_tail_subscriber_that_falls_behind_is_disconnected_without_blocking_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let bus = EventBus::new(dir.path().to_path_buf());
    let laggard = bus.subscribe(&repo()).await;

    let (tx, rx) = mpsc::channel(8);
    let bus_clone = bus.clone();
    let repo_slug = repo();
    let handle = tokio::spawn(async move { bus_clone.run(&repo_slug, rx, None).await });

    let total = TAIL_HIGH_WATER_MARK + 10;
    for i in 0..total as u64 {
        tx.send(event(i, "job.stage")).await.unwrap();
    }
    drop(tx);
    handle.await.unwrap().unwrap();

    assert_eq!(bus.historical(&repo()).await.unwrap().len(), total);
    drop(laggard);
}
