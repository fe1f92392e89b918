use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use crate::actor::build::BuildActor;
use crate::actor::fs::WatchError;
use crate::actor::messages::{BuildMsg, WsMsg};
use crate::actor::ws::WsActor;
use crate::debug;

const SHUTDOWN_POLL: Duration = Duration::from_millis(100);
const JOIN_TIMEOUT: Duration = Duration::from_millis(500);

/// Run all actors concurrently.
///
/// Stops on the shutdown signal or when any actor exits. A watcher error is
/// the only failure that propagates.
///
/// `watch` is the FsActor's run future.
pub(super) async fn run_actors(
    watch: impl Future<Output = Result<(), WatchError>> + Send + 'static,
    build: BuildActor,
    ws: WsActor,
    build_tx: mpsc::Sender<BuildMsg>,
    ws_tx: mpsc::Sender<WsMsg>,
    shutdown_rx: Option<Receiver<()>>,
) -> Result<()> {
    let mut fs_handle = tokio::spawn(watch);
    let mut build_handle = tokio::spawn(build.run());
    let mut ws_handle = tokio::spawn(ws.run());

    let shutdown = async {
        match shutdown_rx {
            Some(rx) => loop {
                if rx.try_recv().is_ok() {
                    debug!("actor"; "shutdown signal received");
                    break;
                }
                tokio::time::sleep(SHUTDOWN_POLL).await;
            },
            None => std::future::pending::<()>().await,
        }
    };

    let mut result = Ok(());
    let finished = tokio::select! {
        _ = shutdown => None,
        joined = &mut fs_handle => {
            match joined {
                Ok(Err(e)) => result = Err(anyhow::Error::from(e).context("file watcher stopped")),
                Ok(Ok(())) => {}
                Err(e) => result = Err(anyhow::anyhow!("fs actor panicked: {}", e)),
            }
            Some("fs")
        }
        _ = &mut build_handle => Some("build"),
        _ = &mut ws_handle => Some("ws"),
    };
    if let Some(name) = finished {
        debug!("actor"; "{} actor exited", name);
    }

    fs_handle.abort();
    let _ = build_tx.send(BuildMsg::Shutdown).await;
    let _ = ws_tx.send(WsMsg::Shutdown).await;
    // A handle must not be polled again once it has completed.
    if finished != Some("build") {
        let _ = tokio::time::timeout(JOIN_TIMEOUT, build_handle).await;
    }
    if finished != Some("ws") {
        let _ = tokio::time::timeout(JOIN_TIMEOUT, ws_handle).await;
    }

    result
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::change::Session;
    use crate::pack::testing::Fixture;

    type Actors = (BuildActor, WsActor, mpsc::Sender<BuildMsg>, mpsc::Sender<WsMsg>);

    fn actors(fx: &Fixture) -> Actors {
        let session = Arc::new(Session::new(fx.packer.clone()));
        let (build_tx, build_rx) = mpsc::channel(8);
        let (ws_tx, ws_rx) = mpsc::channel(8);
        let build = BuildActor::new(build_rx, ws_tx.clone(), session);
        let ws = WsActor::new(ws_rx, build_tx.clone());
        (build, ws, build_tx, ws_tx)
    }

    #[tokio::test]
    async fn test_watcher_error_fails_run() {
        let fx = Fixture::new();
        let (build, ws, build_tx, ws_tx) = actors(&fx);
        let watch = async {
            Err::<(), _>(WatchError::Notify(notify::Error::generic("watch limit reached")))
        };

        let err = run_actors(watch, build, ws, build_tx, ws_tx, None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "file watcher stopped");
        assert!(err.chain().any(|cause| cause.to_string() == "file watcher failed"));
    }

    #[tokio::test]
    async fn test_shutdown_signal_stops_cleanly() {
        let fx = Fixture::new();
        let (build, ws, build_tx, ws_tx) = actors(&fx);
        let (signal, shutdown_rx) = crossbeam::channel::bounded(1);
        signal.send(()).unwrap();

        let watch = std::future::pending::<Result<(), WatchError>>();
        let result = run_actors(watch, build, ws, build_tx, ws_tx, Some(shutdown_rx)).await;
        assert!(result.is_ok());
    }
}
