//! Dev loop: initial build, then watch, repack and notify clients.

use std::sync::Arc;

use anyhow::{Context, Result};
use crossbeam::channel;

use super::build::build_components;
use crate::actor::Coordinator;
use crate::config::RebundleConfig;
use crate::core::register_shutdown;
use crate::{debug, log};

const ACTOR_THREADS: usize = 2;

/// `rebundle dev`: returns when Ctrl+C stops the actors, or with the
/// watcher's error.
pub fn run_dev(config: RebundleConfig) -> Result<()> {
    let (session, summary) = build_components(&config)?;
    if summary.failed > 0 {
        log!("dev"; "watching anyway, fix the failing components to retry");
    }

    let (shutdown_tx, shutdown_rx) = channel::bounded(1);
    register_shutdown(shutdown_tx);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(ACTOR_THREADS)
        .thread_name("rebundle-actor")
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    log!(
        "dev"; "watching {} (tick {}ms)",
        config.root_relative(&config.build.web_dir).display(),
        config.dev.timeout_ms
    );

    let coordinator = Coordinator::new(Arc::new(config), Arc::new(session))
        .with_shutdown_signal(shutdown_rx);
    let result = runtime.block_on(coordinator.run());
    debug!("dev"; "actor system stopped");
    result
}
