//! FileSystem Actor
//!
//! Watches the source tree and feeds changes to the BuildActor one at a
//! time:
//!
//! ```text
//! notify ─▶ bridge thread ─▶ Debouncer (FIFO, merge) ─tick─▶ BuildMsg::Change ─▶ await done
//! ```
//!
//! Every tick hands out at most one change, and the next tick's change is
//! not sent before the previous one is acknowledged.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use notify::RecommendedWatcher;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;

use super::messages::BuildMsg;
use crate::config::RebundleConfig;
use crate::{debug, log};

mod debouncer;
mod types;
mod watch_roots;

#[cfg(test)]
mod tests;

use debouncer::Debouncer;
use watch_roots::WatchRoots;

pub use types::{ChangeKind, PendingChange};

const BRIDGE_BUFFER: usize = 64;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("file watcher failed")]
    Notify(#[from] notify::Error),

    #[error("file watcher stopped unexpectedly")]
    Closed,
}

/// FileSystem Actor - watches for file changes
pub struct FsActor {
    /// Sync notify callback → actor (bridged in `run`)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    watcher: RecommendedWatcher,
    watch_roots: WatchRoots,
    build_tx: mpsc::Sender<BuildMsg>,
    debouncer: Debouncer,
    tick: Duration,
}

impl FsActor {
    /// Start watching immediately; events buffer until `run` is polled.
    pub fn new(
        roots: Vec<PathBuf>,
        build_tx: mpsc::Sender<BuildMsg>,
        config: &RebundleConfig,
    ) -> Result<Self, WatchError> {
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        let mut watch_roots = WatchRoots::new(roots);
        watch_roots.attach_existing(&mut watcher)?;

        let mut ignored = vec![config.build.out.clone()];
        ignored.extend(config.dev.dep_out.clone());

        Ok(Self {
            notify_rx,
            watcher,
            watch_roots,
            build_tx,
            debouncer: Debouncer::new(config.dev.same_file_window()).with_ignored(ignored),
            tick: config.dev.tick(),
        })
    }

    /// Run until the BuildActor goes away (`Ok`) or the watcher fails (`Err`).
    pub async fn run(self) -> Result<(), WatchError> {
        let Self {
            notify_rx,
            mut watcher,
            mut watch_roots,
            build_tx,
            debouncer,
            tick,
        } = self;

        let (async_tx, async_rx) = mpsc::channel(BRIDGE_BUFFER);
        std::thread::Builder::new()
            .name("rebundle-watch".into())
            .spawn(move || {
                while let Ok(result) = notify_rx.recv() {
                    let failed = result.is_err();
                    if async_tx.blocking_send(result).is_err() || failed {
                        break;
                    }
                }
            })
            .map_err(|e| WatchError::Notify(notify::Error::io(e)))?;

        pump_events(async_rx, &build_tx, debouncer, tick, || {
            watch_roots.maintain(&mut watcher);
        })
        .await
    }
}

/// Debounce watcher events and dispatch one ready change per tick.
///
/// `on_tick` runs before each dispatch attempt. Returns `Ok` once the
/// BuildActor is gone; a watcher error or a closed event channel is fatal.
async fn pump_events(
    mut events: mpsc::Receiver<notify::Result<notify::Event>>,
    build_tx: &mpsc::Sender<BuildMsg>,
    mut debouncer: Debouncer,
    tick: Duration,
    mut on_tick: impl FnMut(),
) -> Result<(), WatchError> {
    let mut ticker = tokio::time::interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            received = events.recv() => match received {
                Some(Ok(event)) => debouncer.add_event(&event),
                Some(Err(e)) => {
                    log!("error"; "watcher: {}", e);
                    return Err(e.into());
                }
                None => return Err(WatchError::Closed),
            },
            _ = ticker.tick() => {
                on_tick();
                if debouncer.is_empty() {
                    continue;
                }
                let Some(change) = debouncer.next_ready(Instant::now()) else {
                    continue;
                };
                if dispatch(build_tx, change).await.is_err() {
                    debug!("watch"; "build actor gone, stopping");
                    return Ok(());
                }
            }
        }
    }
}

/// Send one change and wait until it has been handled.
async fn dispatch(build_tx: &mpsc::Sender<BuildMsg>, change: PendingChange) -> Result<(), ()> {
    let (done, handled) = oneshot::channel();
    build_tx
        .send(BuildMsg::Change {
            path: change.path,
            kind: change.kind,
            done,
        })
        .await
        .map_err(|_| ())?;
    handled.await.map_err(|_| ())
}
