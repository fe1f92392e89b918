//! Change request processing.
//!
//! Decides what a changed path means for the packed component set and
//! re-packs the minimum:
//!
//! | Path state                          | Action                         |
//! |-------------------------------------|--------------------------------|
//! | gone, known component               | drop from index and source map |
//! | known component                     | re-pack it                     |
//! | under the asset source              | mirror into `<out>/assets`     |
//! | new component source (in pages dir) | pack as a new component        |
//! | anything else                       | skip                           |
//!
//! In every case, components with the path in their import closure are
//! re-packed as well.

mod index;

pub use index::ComponentIndex;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::config::RebundleConfig;
use crate::output::assets::sync_asset;
use crate::output::{Manifest, SourceMap};
use crate::pack::{BundleKey, PackError, PackFailure, PackReport, PackedComponent, Packer};
use crate::utils::path::{is_component_source, normalize_path};
use crate::{debug, log};

/// A component whose bundle key was (re)computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyUpdate {
    pub name: String,
    pub previous: Option<BundleKey>,
    pub current: BundleKey,
}

impl KeyUpdate {
    pub fn changed(&self) -> bool {
        self.previous.as_ref() != Some(&self.current)
    }
}

#[derive(Debug)]
pub enum ChangeOutcome {
    Created(KeyUpdate),
    Repacked(KeyUpdate),
    Removed {
        name: String,
        key: BundleKey,
    },
    /// Components importing the changed path were re-packed, after the
    /// `primary` outcome for the path itself (if any).
    Dependents {
        primary: Option<Box<ChangeOutcome>>,
        updated: Vec<KeyUpdate>,
        failures: Vec<PackFailure>,
    },
    /// A static asset was mirrored (or its copy removed).
    Asset(PathBuf),
    Skipped,
}

impl ChangeOutcome {
    /// Attach the outcome for the changed path itself to a dependents
    /// re-pack.
    fn after(self, primary: ChangeOutcome) -> Self {
        match self {
            Self::Dependents {
                updated, failures, ..
            } => Self::Dependents {
                primary: (!matches!(primary, Self::Skipped)).then(|| Box::new(primary)),
                updated,
                failures,
            },
            other => other,
        }
    }

    /// Keys clients holding stale artifacts should reload.
    ///
    /// For changed components the previous key is reported, since that is
    /// the one clients still hold.
    pub fn stale_keys(&self) -> Vec<String> {
        let of = |u: &KeyUpdate| u.previous.as_ref().filter(|_| u.changed()).map(|k| k.to_string());
        match self {
            Self::Created(_) | Self::Asset(_) | Self::Skipped => vec![],
            Self::Repacked(update) => of(update).into_iter().collect(),
            Self::Removed { key, .. } => vec![key.to_string()],
            Self::Dependents {
                primary, updated, ..
            } => primary
                .iter()
                .flat_map(|p| p.stale_keys())
                .chain(updated.iter().filter_map(of))
                .collect(),
        }
    }

    pub fn summary(&self) -> String {
        match self {
            Self::Created(u) => format!("packed new component {} ({})", u.name, u.current),
            Self::Repacked(u) if u.changed() => format!("repacked {} ({})", u.name, u.current),
            Self::Repacked(u) => format!("{} unchanged", u.name),
            Self::Removed { name, .. } => format!("removed {name}"),
            Self::Asset(path) => format!("synced asset {}", path.display()),
            Self::Dependents {
                primary,
                updated,
                failures,
            } => format!(
                "{}repacked {} dependent{}{}",
                primary
                    .as_deref()
                    .map(|p| format!("{}, ", p.summary()))
                    .unwrap_or_default(),
                updated.len(),
                crate::utils::plural::plural_s(updated.len()),
                if failures.is_empty() {
                    String::new()
                } else {
                    format!(", {} failed", failures.len())
                }
            ),
            Self::Skipped => "nothing to do".to_string(),
        }
    }
}

/// Packed component state of a dev session.
pub struct Session {
    packer: Arc<Packer>,
    index: RwLock<ComponentIndex>,
    source_map: Mutex<SourceMap>,
    /// New components are only picked up under this directory.
    pages_dir: Option<PathBuf>,
    out_dir: Option<PathBuf>,
    dep_out: Option<PathBuf>,
    /// Asset source directory and its mirror.
    assets: Option<(PathBuf, PathBuf)>,
}

impl Session {
    pub fn new(packer: Arc<Packer>) -> Self {
        Self {
            packer,
            index: RwLock::new(ComponentIndex::new()),
            source_map: Mutex::new(SourceMap::new()),
            pages_dir: None,
            out_dir: None,
            dep_out: None,
            assets: None,
        }
    }

    pub fn from_config(config: &RebundleConfig, packer: Arc<Packer>) -> Self {
        Self {
            pages_dir: Some(normalize_path(&config.build.pages_dir())),
            out_dir: Some(config.build.out.clone()),
            dep_out: config.dev.dep_out.clone(),
            assets: config
                .build
                .assets_source()
                .map(|source| (normalize_path(&source), config.build.assets_dir())),
            ..Self::new(packer)
        }
    }

    pub fn with_dep_out(mut self, dep_out: impl Into<PathBuf>) -> Self {
        self.dep_out = Some(dep_out.into());
        self
    }

    pub fn with_pages_dir(mut self, pages_dir: impl AsRef<Path>) -> Self {
        self.pages_dir = Some(normalize_path(pages_dir.as_ref()));
        self
    }

    pub fn with_assets(mut self, source: impl AsRef<Path>, mirror: impl Into<PathBuf>) -> Self {
        self.assets = Some((normalize_path(source.as_ref()), mirror.into()));
        self
    }

    pub fn packer(&self) -> &Arc<Packer> {
        &self.packer
    }

    /// Record the components of an initial build.
    pub fn seed(&self, report: &PackReport) {
        for component in &report.components {
            self.commit(component.clone());
        }
    }

    /// Current bundle keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.index.read().keys()
    }

    pub fn component(&self, name: &str) -> Option<PackedComponent> {
        self.index.read().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.read().is_empty()
    }

    /// Process one changed path.
    ///
    /// Components whose import closure contains `path` are re-packed along
    /// with it, whether `path` is itself a component, was removed or is a
    /// plain dependency.
    pub fn handle_change(&self, path: &Path) -> Result<ChangeOutcome, PackError> {
        let path = normalize_path(path);
        let known = self.index.read().name_for_path(&path).map(str::to_owned);
        let dependents: Vec<String> = self
            .source_map
            .lock()
            .dependents(&path)
            .into_iter()
            .filter(|name| known.as_deref() != Some(name.as_str()))
            .collect();

        let primary = match known {
            Some(name) if !path.exists() => Ok(self.remove(name)),
            Some(_) => self
                .repack(&path)
                .map(|u| u.map_or(ChangeOutcome::Skipped, ChangeOutcome::Repacked)),
            None if self.is_asset(&path) => Ok(self.sync_asset(&path)),
            None if path.exists() && self.is_new_component(&path) => self
                .repack(&path)
                .map(|u| u.map_or(ChangeOutcome::Skipped, ChangeOutcome::Created)),
            None => Ok(ChangeOutcome::Skipped),
        };

        if dependents.is_empty() && matches!(primary, Ok(ChangeOutcome::Skipped)) {
            debug!("change"; "skipped {}", path.display());
            return primary;
        }

        let outcome = if dependents.is_empty() {
            primary
        } else {
            // Dependents go stale even when the changed file itself fails.
            let cascade = self.repack_dependents(&dependents);
            primary.map(|primary| cascade.after(primary))
        };

        self.persist();
        outcome
    }

    /// Re-pack the component currently published under `key`.
    pub fn handle_bundle_key(&self, key: &str) -> Result<ChangeOutcome, PackError> {
        let path = self
            .index
            .read()
            .by_key(key)
            .map(|c| c.original_path.clone());
        match path {
            Some(path) => self.handle_change(&path),
            None => {
                debug!("change"; "unknown bundle key {}", key);
                Ok(ChangeOutcome::Skipped)
            }
        }
    }

    /// Write the source map (when configured) and the manifest. Failures
    /// are logged only.
    pub fn persist(&self) {
        if let Some(dep_out) = &self.dep_out
            && let Err(e) = self.source_map.lock().write(dep_out)
        {
            log!("error"; "{:#}", anyhow::Error::from(e));
        }
        if let Some(out_dir) = &self.out_dir {
            let index = self.index.read();
            let manifest = Manifest::new(self.packer.mode(), out_dir, index.components());
            if let Err(e) = manifest.write(out_dir) {
                log!("error"; "{:#}", anyhow::Error::from(e));
            }
        }
    }

    fn is_new_component(&self, path: &Path) -> bool {
        is_component_source(path)
            && self
                .pages_dir
                .as_ref()
                .is_none_or(|pages| path.starts_with(pages))
    }

    fn is_asset(&self, path: &Path) -> bool {
        self.assets
            .as_ref()
            .is_some_and(|(source, _)| path.starts_with(source))
    }

    fn sync_asset(&self, path: &Path) -> ChangeOutcome {
        let Some((source, mirror)) = &self.assets else {
            return ChangeOutcome::Skipped;
        };
        match sync_asset(source, mirror, path) {
            Ok(true) => ChangeOutcome::Asset(path.to_path_buf()),
            Ok(false) => ChangeOutcome::Skipped,
            Err(e) => {
                log!("error"; "cannot sync asset {}: {}", path.display(), e);
                ChangeOutcome::Skipped
            }
        }
    }

    fn remove(&self, name: String) -> ChangeOutcome {
        let removed = self.index.write().remove_name(&name);
        self.source_map.lock().remove(&name);
        match removed {
            Some(component) => ChangeOutcome::Removed {
                name,
                key: component.bundle_key,
            },
            None => ChangeOutcome::Skipped,
        }
    }

    fn repack(&self, path: &Path) -> Result<Option<KeyUpdate>, PackError> {
        let mut report = self.packer.pack_many(&[path.to_path_buf()]);
        if let Some(failure) = report.errors.pop() {
            return Err(failure.error);
        }
        Ok(report.components.pop().map(|c| self.commit(c)))
    }

    fn repack_dependents(&self, names: &[String]) -> ChangeOutcome {
        let paths: Vec<PathBuf> = {
            let index = self.index.read();
            names
                .iter()
                .filter_map(|name| index.get(name).map(|c| c.original_path.clone()))
                .collect()
        };

        let report = self.packer.pack_many(&paths).sorted();
        let updated = report
            .components
            .into_iter()
            .map(|c| self.commit(c))
            .collect();
        ChangeOutcome::Dependents {
            primary: None,
            updated,
            failures: report.errors,
        }
    }

    fn commit(&self, component: PackedComponent) -> KeyUpdate {
        let mut index = self.index.write();
        let mut source_map = self.source_map.lock();

        // Declared name changed: the old name no longer exists.
        if let Some(old) = index.name_for_path(&component.original_path)
            && old != component.name
        {
            let old = old.to_owned();
            index.remove_name(&old);
            source_map.remove(&old);
        }

        source_map.record(&component);
        let update = KeyUpdate {
            name: component.name.clone(),
            previous: None,
            current: component.bundle_key.clone(),
        };
        let previous = index.insert(component).map(|c| c.bundle_key);
        KeyUpdate { previous, ..update }
    }
}
