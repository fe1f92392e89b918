//! Component → source/dependency map.
//!
//! Forward: component name → [`SourceEntry`].
//! Reverse: dependency path → names of components importing it.
//!
//! # Invariants
//! - Forward and reverse mappings are always consistent
//! - A component never lists itself as a dependency

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use super::{WriteError, write_json_atomic};
use crate::pack::{BundleKey, PackedComponent};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
    pub bundle_key: BundleKey,
    pub source: PathBuf,
    pub dependencies: Vec<PathBuf>,
}

#[derive(Debug, Default)]
pub struct SourceMap {
    entries: FxHashMap<String, SourceEntry>,
    reverse: FxHashMap<PathBuf, FxHashSet<String>>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a packed component, replacing any previous entry for its name.
    pub fn record(&mut self, component: &PackedComponent) {
        self.remove(&component.name);

        let dependencies: Vec<PathBuf> = component
            .dependencies()
            .iter()
            .filter(|dep| **dep != component.original_path)
            .cloned()
            .collect();
        for dep in &dependencies {
            self.reverse
                .entry(dep.clone())
                .or_default()
                .insert(component.name.clone());
        }

        self.entries.insert(
            component.name.clone(),
            SourceEntry {
                bundle_key: component.bundle_key.clone(),
                source: component.original_path.clone(),
                dependencies,
            },
        );
    }

    /// Remove a component and clean up its reverse mappings.
    pub fn remove(&mut self, name: &str) -> Option<SourceEntry> {
        let entry = self.entries.remove(name)?;
        for dep in &entry.dependencies {
            if let Some(dependents) = self.reverse.get_mut(dep) {
                dependents.remove(name);
                if dependents.is_empty() {
                    self.reverse.remove(dep);
                }
            }
        }
        Some(entry)
    }

    pub fn get(&self, name: &str) -> Option<&SourceEntry> {
        self.entries.get(name)
    }

    /// Names of components importing `dependency`, sorted.
    pub fn dependents(&self, dependency: &Path) -> Vec<String> {
        let mut names: Vec<String> = self
            .reverse
            .get(dependency)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize as pretty JSON, keys sorted by component name.
    pub fn write(&self, path: &Path) -> Result<(), WriteError> {
        let sorted: BTreeMap<&str, &SourceEntry> = self
            .entries
            .iter()
            .map(|(name, entry)| (name.as_str(), entry))
            .collect();
        write_json_atomic(path, &sorted)
    }
}
