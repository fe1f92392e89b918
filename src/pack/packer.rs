//! Concurrent packing with per-batch name deduplication.
//!
//! # Flow
//!
//! ```text
//! pack_many([a, b, a'])
//!   └─ pool.install ── par_iter ──┬─ pack_one(a)  ─▶ offer ─▶ appended
//!                                 ├─ pack_one(b)  ─▶ offer ─▶ appended
//!                                 └─ pack_one(a') ─▶ offer ─▶ discarded (name taken)
//!   └─ join ─▶ drain error channel ─▶ PackReport
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use crossbeam::channel;
use parking_lot::Mutex;
use rayon::prelude::*;
use rustc_hash::FxHashSet;

use super::{
    Bundle, BundleKey, CommandBundler, PackError, PackedComponent, Parse, SourceParser, SyncHook,
    WrapStats, WrapperSet,
};
use crate::config::RebundleConfig;
use crate::core::BundlerMode;
use crate::logger::ProgressLine;
use crate::{debug, log};

/// A path that failed to pack within a batch.
#[derive(Debug)]
pub struct PackFailure {
    pub path: PathBuf,
    pub error: PackError,
}

/// Outcome of one `pack_many` call.
#[derive(Debug, Default)]
pub struct PackReport {
    /// In completion order.
    pub components: Vec<PackedComponent>,
    /// Packed successfully but dropped because the name was already taken.
    pub discarded: Vec<PathBuf>,
    pub errors: Vec<PackFailure>,
}

impl PackReport {
    /// Components ordered by name.
    pub fn sorted(mut self) -> Self {
        self.components.sort_by(|a, b| a.name.cmp(&b.name));
        self
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Default)]
struct Registry {
    pages: Vec<PackedComponent>,
    names: FxHashSet<String>,
    discarded: Vec<PathBuf>,
}

/// Registry shared by the tasks of one batch.
#[derive(Default)]
pub struct PackSession {
    registry: Mutex<Registry>,
}

impl PackSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append unless the name is already packed. Returns whether it was kept.
    pub fn offer(&self, component: PackedComponent) -> bool {
        let mut registry = self.registry.lock();
        if !registry.names.insert(component.name.clone()) {
            registry.discarded.push(component.original_path);
            return false;
        }
        registry.pages.push(component);
        true
    }

    fn into_parts(self) -> (Vec<PackedComponent>, Vec<PathBuf>) {
        let registry = self.registry.into_inner();
        (registry.pages, registry.discarded)
    }
}

pub struct Packer {
    parser: Arc<dyn Parse>,
    wrappers: WrapperSet,
    bundler: Arc<dyn Bundle>,
    mode: BundlerMode,
    pool: rayon::ThreadPool,
    hook: SyncHook,
}

impl Packer {
    pub fn new(
        parser: Arc<dyn Parse>,
        wrappers: WrapperSet,
        bundler: Arc<dyn Bundle>,
        mode: BundlerMode,
        workers: usize,
    ) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("rebundle-pack-{i}"))
            .build()
            .context("failed to create pack thread pool")?;
        Ok(Self {
            parser,
            wrappers,
            bundler,
            mode,
            pool,
            hook: SyncHook::new(),
        })
    }

    /// Packer with the built-in parser, wrappers and command bundler.
    pub fn from_config(config: &RebundleConfig) -> Result<Self> {
        Self::new(
            Arc::new(SourceParser),
            WrapperSet::from_frameworks(&config.build.wrappers),
            Arc::new(CommandBundler::from_config(config)),
            config.build.mode,
            config.build.worker_count(),
        )
    }

    pub fn mode(&self) -> BundlerMode {
        self.mode
    }

    /// Run `op` on the packer's bounded pool.
    pub fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        self.pool.install(op)
    }

    pub fn hook(&self) -> &SyncHook {
        &self.hook
    }

    /// Parse, wrap and bundle one source file.
    pub fn pack_one(&self, path: &Path) -> Result<PackedComponent, PackError> {
        let document = self.parser.parse(path).map_err(|source| PackError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let wrapped = self.wrappers.wrap(&document).map_err(|source| PackError::Wrap {
            path: path.to_path_buf(),
            source,
        })?;

        let key = BundleKey::compute(&document, wrapped.framework, self.mode);
        let output = self
            .bundler
            .bundle(&wrapped, &key, self.mode)
            .map_err(|source| PackError::Bundle {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(PackedComponent {
            name: document.name.clone(),
            bundle_key: key,
            original_path: document.path.clone(),
            stats: WrapStats {
                framework: wrapped.framework,
                mode: self.mode,
                artifact: output.artifact,
                reused: output.reused,
            },
            document: Arc::new(document),
        })
    }

    /// Pack a batch concurrently; returns once every path is accounted for.
    pub fn pack_many(&self, paths: &[PathBuf]) -> PackReport {
        self.pack_batch(paths, &|| {})
    }

    /// `pack_many` that ticks `progress` as each path finishes.
    pub fn pack_with_progress(&self, paths: &[PathBuf], progress: &ProgressLine) -> PackReport {
        self.pack_batch(paths, &|| progress.inc())
    }

    fn pack_batch(&self, paths: &[PathBuf], on_done: &(dyn Fn() + Sync)) -> PackReport {
        if paths.is_empty() {
            return PackReport::default();
        }

        let session = PackSession::new();
        let (tx, rx) = channel::bounded(paths.len());

        self.pool.install(|| {
            paths.par_iter().for_each(|path| {
                let label = path.file_name().map_or_else(
                    || path.to_string_lossy(),
                    |name| name.to_string_lossy(),
                );
                match self.hook.wrap(&label, || self.pack_one(path)) {
                    Ok(component) => {
                        let name = component.name.clone();
                        if !session.offer(component) {
                            debug!("pack"; "skipped {} (`{}` already packed)", path.display(), name);
                        }
                    }
                    Err(error) => {
                        // Capacity equals the batch size, so this never blocks.
                        let _ = tx.send(PackFailure {
                            path: path.clone(),
                            error,
                        });
                    }
                }
                on_done();
            });
        });
        drop(tx);

        let errors: Vec<PackFailure> = rx.try_iter().collect();
        if let Some(first) = errors.first() {
            log!("error"; "{}", first.error.report());
        }

        let (components, discarded) = session.into_parts();
        PackReport {
            components,
            discarded,
            errors,
        }
    }

    /// Log the hook summary.
    pub fn close(&self) {
        self.hook.close();
    }
}
