//! Test doubles for the pack pipeline.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tempfile::TempDir;

use super::{
    Bundle, BundleError, BundleKey, BundleOutput, Packer, SourceParser, WrappedDocument,
    WrapperSet,
};
use crate::core::BundlerMode;

/// Writes the entry module as the artifact instead of running a bundler.
pub struct StubBundler {
    dist: PathBuf,
    calls: AtomicUsize,
    fail_names: Mutex<Vec<String>>,
}

impl StubBundler {
    pub fn new(dist: PathBuf) -> Self {
        Self {
            dist,
            calls: AtomicUsize::new(0),
            fail_names: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make bundling of the named component fail.
    pub fn fail_on(&self, name: &str) {
        self.fail_names.lock().push(name.to_string());
    }
}

impl Bundle for StubBundler {
    fn bundle(
        &self,
        wrapped: &WrappedDocument,
        key: &BundleKey,
        _mode: BundlerMode,
    ) -> Result<BundleOutput, BundleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_names.lock().contains(&wrapped.name) {
            return Err(BundleError::Failed {
                status: Some(1),
                stderr: format!("cannot bundle {}", wrapped.name),
            });
        }
        fs::create_dir_all(&self.dist).map_err(|source| BundleError::Io {
            path: self.dist.clone(),
            source,
        })?;
        let artifact = self.dist.join(format!("{key}.js"));
        fs::write(&artifact, &wrapped.entry).map_err(|source| BundleError::Io {
            path: artifact.clone(),
            source,
        })?;
        Ok(BundleOutput {
            artifact,
            reused: false,
        })
    }
}

/// A web tree in a temp dir plus a packer over it.
pub struct Fixture {
    pub temp: TempDir,
    pub bundler: Arc<StubBundler>,
    pub packer: Arc<Packer>,
}

impl Fixture {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let bundler = Arc::new(StubBundler::new(temp.path().join("out/dist")));
        let packer = Packer::new(
            Arc::new(SourceParser),
            WrapperSet::from_frameworks(&[super::Framework::React, super::Framework::Vue]),
            bundler.clone(),
            BundlerMode::Development,
            4,
        )
        .unwrap();
        Self {
            temp,
            bundler,
            packer: Arc::new(packer),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    /// Write `content` to `rel` under the root and return the path.
    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.temp.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    pub fn component(&self, rel: &str, name: &str) -> PathBuf {
        self.write(rel, &format!("export default function {name}() {{ return null; }}\n"))
    }
}
