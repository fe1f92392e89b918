//! Current packed components with path and bundle-key lookups.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use crate::pack::{BundleKey, PackedComponent};

#[derive(Debug, Default)]
pub struct ComponentIndex {
    by_name: FxHashMap<String, PackedComponent>,
    by_path: FxHashMap<PathBuf, String>,
    by_key: FxHashMap<BundleKey, String>,
}

impl ComponentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a component, returning the one it replaces under the same name.
    ///
    /// A replaced component from another path loses its path entry; the
    /// later pack always wins.
    pub fn insert(&mut self, component: PackedComponent) -> Option<PackedComponent> {
        let previous = self.by_name.remove(&component.name);
        if let Some(prev) = &previous {
            self.by_key.remove(&prev.bundle_key);
            if self.by_path.get(&prev.original_path) == Some(&prev.name) {
                self.by_path.remove(&prev.original_path);
            }
        }

        self.by_path
            .insert(component.original_path.clone(), component.name.clone());
        self.by_key
            .insert(component.bundle_key.clone(), component.name.clone());
        self.by_name.insert(component.name.clone(), component);
        previous
    }

    pub fn remove_name(&mut self, name: &str) -> Option<PackedComponent> {
        let component = self.by_name.remove(name)?;
        self.by_key.remove(&component.bundle_key);
        if self.by_path.get(&component.original_path).map(String::as_str) == Some(name) {
            self.by_path.remove(&component.original_path);
        }
        Some(component)
    }

    pub fn get(&self, name: &str) -> Option<&PackedComponent> {
        self.by_name.get(name)
    }

    pub fn name_for_path(&self, path: &Path) -> Option<&str> {
        self.by_path.get(path).map(String::as_str)
    }

    pub fn by_key(&self, key: &str) -> Option<&PackedComponent> {
        let name = self.by_key.get(&BundleKey::from_raw(key))?;
        self.by_name.get(name)
    }

    /// Current bundle keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.by_key.keys().map(|k| k.to_string()).collect();
        keys.sort();
        keys
    }

    pub fn components(&self) -> impl Iterator<Item = &PackedComponent> {
        self.by_name.values()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
