use std::path::PathBuf;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use super::debouncer::Debouncer;
use super::types::{ChangeKind, PendingChange};
use super::{BuildMsg, WatchError, dispatch, pump_events};

const WINDOW: Duration = Duration::from_millis(2000);

fn make_event(paths: Vec<&str>, kind: notify::EventKind) -> notify::Event {
    notify::Event {
        kind,
        paths: paths.into_iter().map(PathBuf::from).collect(),
        attrs: Default::default(),
    }
}

fn modify_kind() -> notify::EventKind {
    notify::EventKind::Modify(notify::event::ModifyKind::Data(
        notify::event::DataChange::Any,
    ))
}

fn create_kind() -> notify::EventKind {
    notify::EventKind::Create(notify::event::CreateKind::File)
}

fn remove_kind() -> notify::EventKind {
    notify::EventKind::Remove(notify::event::RemoveKind::File)
}

fn change(path: &str, kind: ChangeKind) -> Option<PendingChange> {
    Some(PendingChange {
        path: PathBuf::from(path),
        kind,
    })
}

#[test]
fn test_debouncer_empty() {
    let mut debouncer = Debouncer::new(WINDOW);
    assert!(debouncer.is_empty());
    assert_eq!(debouncer.next_ready(Instant::now()), None);
}

#[test]
fn test_fifo_one_per_tick() {
    let mut debouncer = Debouncer::new(WINDOW);
    debouncer.add_event(&make_event(vec!["/w/b.jsx"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/w/a.jsx"], create_kind()));
    debouncer.add_event(&make_event(vec!["/w/c.jsx"], remove_kind()));

    let now = Instant::now();
    assert_eq!(debouncer.next_ready(now), change("/w/b.jsx", ChangeKind::Modified));
    assert_eq!(debouncer.queue.len(), 2);
    assert_eq!(debouncer.next_ready(now), change("/w/a.jsx", ChangeKind::Created));
    assert_eq!(debouncer.next_ready(now), change("/w/c.jsx", ChangeKind::Removed));
    assert_eq!(debouncer.next_ready(now), None);
}

#[test]
fn test_two_events_same_path_one_dispatch() {
    let mut debouncer = Debouncer::new(WINDOW);
    debouncer.add_event(&make_event(vec!["/w/Home.jsx"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/w/Home.jsx"], modify_kind()));
    assert_eq!(debouncer.queue.len(), 1);

    let start = Instant::now();
    assert!(debouncer.next_ready(start).is_some());

    // Editor writes again inside the window
    debouncer.add_event(&make_event(vec!["/w/Home.jsx"], modify_kind()));
    assert_eq!(debouncer.next_ready(start + Duration::from_millis(500)), None);
    assert!(debouncer.is_empty());
}

#[test]
fn test_same_path_after_window_dispatches_again() {
    let mut debouncer = Debouncer::new(WINDOW);
    let start = Instant::now();

    debouncer.add_event(&make_event(vec!["/w/Home.jsx"], modify_kind()));
    assert!(debouncer.next_ready(start).is_some());

    debouncer.add_event(&make_event(vec!["/w/Home.jsx"], modify_kind()));
    assert_eq!(
        debouncer.next_ready(start + WINDOW + Duration::from_millis(1)),
        change("/w/Home.jsx", ChangeKind::Modified)
    );
}

#[test]
fn test_repeat_window_is_per_path() {
    let mut debouncer = Debouncer::new(WINDOW);
    let start = Instant::now();

    debouncer.add_event(&make_event(vec!["/w/a.jsx"], modify_kind()));
    assert!(debouncer.next_ready(start).is_some());

    debouncer.add_event(&make_event(vec!["/w/b.jsx"], modify_kind()));
    assert_eq!(
        debouncer.next_ready(start + Duration::from_millis(10)),
        change("/w/b.jsx", ChangeKind::Modified)
    );
}

#[test]
fn test_removed_then_created_restores() {
    let mut debouncer = Debouncer::new(WINDOW);
    debouncer.add_event(&make_event(vec!["/w/a.jsx"], remove_kind()));
    debouncer.add_event(&make_event(vec!["/w/a.jsx"], create_kind()));
    assert_eq!(
        debouncer.next_ready(Instant::now()),
        change("/w/a.jsx", ChangeKind::Created)
    );
}

#[test]
fn test_modified_then_removed_upgrades() {
    let mut debouncer = Debouncer::new(WINDOW);
    debouncer.add_event(&make_event(vec!["/w/a.jsx"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/w/a.jsx"], remove_kind()));
    assert_eq!(
        debouncer.next_ready(Instant::now()),
        change("/w/a.jsx", ChangeKind::Removed)
    );
}

#[test]
fn test_created_then_removed_discards() {
    let mut debouncer = Debouncer::new(WINDOW);
    debouncer.add_event(&make_event(vec!["/w/a.jsx"], create_kind()));
    debouncer.add_event(&make_event(vec!["/w/a.jsx"], remove_kind()));
    assert!(debouncer.is_empty());
}

#[test]
fn test_created_then_modified_first_wins() {
    let mut debouncer = Debouncer::new(WINDOW);
    debouncer.add_event(&make_event(vec!["/w/a.jsx"], create_kind()));
    debouncer.add_event(&make_event(vec!["/w/a.jsx"], modify_kind()));
    assert_eq!(
        debouncer.next_ready(Instant::now()),
        change("/w/a.jsx", ChangeKind::Created)
    );
}

#[test]
fn test_noise_ignored() {
    let mut debouncer =
        Debouncer::new(WINDOW).with_ignored(vec![PathBuf::from("/w/.rebundle")]);

    let metadata = notify::EventKind::Modify(notify::event::ModifyKind::Metadata(
        notify::event::MetadataKind::WriteTime,
    ));
    debouncer.add_event(&make_event(vec!["/w/a.jsx"], metadata));
    debouncer.add_event(&make_event(vec!["/w/.a.jsx.swp", "/w/a.jsx~"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/w/.rebundle/dist/a_1.js"], create_kind()));
    debouncer.add_event(&make_event(
        vec!["/w/a.jsx"],
        notify::EventKind::Access(notify::event::AccessKind::Any),
    ));

    assert!(debouncer.is_empty());
}

#[tokio::test]
async fn test_dispatch_waits_for_ack() {
    let (tx, mut rx) = mpsc::channel(4);
    let pending = change("/w/a.jsx", ChangeKind::Modified).unwrap();

    let handle = tokio::spawn(async move { dispatch(&tx, pending).await });

    let Some(BuildMsg::Change { path, kind, done }) = rx.recv().await else {
        panic!("expected change message");
    };
    assert_eq!(path, PathBuf::from("/w/a.jsx"));
    assert_eq!(kind, ChangeKind::Modified);

    tokio::task::yield_now().await;
    assert!(!handle.is_finished());

    done.send(()).unwrap();
    assert!(handle.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_dispatch_fails_when_build_actor_gone() {
    let (tx, rx) = mpsc::channel(1);
    drop(rx);
    let pending = change("/w/a.jsx", ChangeKind::Modified).unwrap();
    assert!(dispatch(&tx, pending).await.is_err());
}

const TICK: Duration = Duration::from_millis(10);

#[tokio::test]
async fn test_watcher_error_is_fatal() {
    let (events_tx, events_rx) = mpsc::channel(4);
    let (build_tx, _build_rx) = mpsc::channel(4);
    events_tx
        .send(Err(notify::Error::generic("inotify watch limit reached")))
        .await
        .unwrap();

    let result = pump_events(events_rx, &build_tx, Debouncer::new(WINDOW), TICK, || {}).await;
    assert!(matches!(result, Err(WatchError::Notify(_))));
}

#[tokio::test]
async fn test_closed_event_channel_is_fatal() {
    let (events_tx, events_rx) = mpsc::channel(4);
    let (build_tx, _build_rx) = mpsc::channel(4);
    drop(events_tx);

    let result = pump_events(events_rx, &build_tx, Debouncer::new(WINDOW), TICK, || {}).await;
    assert!(matches!(result, Err(WatchError::Closed)));
}

#[tokio::test]
async fn test_pump_stops_cleanly_without_build_actor() {
    let (events_tx, events_rx) = mpsc::channel(4);
    let (build_tx, build_rx) = mpsc::channel(4);
    drop(build_rx);
    events_tx
        .send(Ok(make_event(vec!["/w/a.jsx"], modify_kind())))
        .await
        .unwrap();

    let result = pump_events(events_rx, &build_tx, Debouncer::new(WINDOW), TICK, || {}).await;
    assert!(result.is_ok());
    drop(events_tx);
}
