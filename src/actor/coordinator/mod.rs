//! Actor Coordinator - wires up the dev actor system
//!
//! Creates the channels, starts the hot reload listener, and runs the
//! three actors until shutdown or a fatal watcher error.

mod runtime;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use super::build::BuildActor;
use super::fs::FsActor;
use super::messages::{BuildMsg, WsMsg};
use super::ws::WsActor;
use crate::change::Session;
use crate::config::RebundleConfig;
use crate::reload::server::start_ws_server;
use crate::{debug, log};

const CHANNEL_BUFFER: usize = 32;

pub struct Coordinator {
    config: Arc<RebundleConfig>,
    session: Arc<Session>,
    shutdown_rx: Option<Receiver<()>>,
}

impl Coordinator {
    pub fn new(config: Arc<RebundleConfig>, session: Arc<Session>) -> Self {
        Self {
            config,
            session,
            shutdown_rx: None,
        }
    }

    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Run until shutdown. A watcher failure is returned as an error.
    pub async fn run(mut self) -> Result<()> {
        let (build_tx, build_rx) = mpsc::channel::<BuildMsg>(CHANNEL_BUFFER);
        let (ws_tx, ws_rx) = mpsc::channel::<WsMsg>(CHANNEL_BUFFER);

        match start_ws_server(self.config.dev.hot_reload_port, ws_tx.clone()) {
            Ok(port) => log!("dev"; "hot reload on ws://127.0.0.1:{}", port),
            Err(e) => log!("error"; "hot reload server failed: {:#}", e),
        }

        let roots = watch_roots(&self.config);
        let fs_actor = FsActor::new(roots, build_tx.clone(), &self.config)
            .context("failed to start file watcher")?;
        let build_actor = BuildActor::new(build_rx, ws_tx.clone(), Arc::clone(&self.session));
        let ws_actor = WsActor::new(ws_rx, build_tx.clone());

        debug!("actor"; "start");
        let result = runtime::run_actors(
            fs_actor.run(),
            build_actor,
            ws_actor,
            build_tx,
            ws_tx,
            self.shutdown_rx.take(),
        )
        .await;
        debug!("actor"; "stopped");
        result
    }
}

/// Directories the FsActor watches.
fn watch_roots(config: &RebundleConfig) -> Vec<PathBuf> {
    vec![config.build.web_dir.clone()]
}
