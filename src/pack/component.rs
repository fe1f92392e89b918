use std::path::PathBuf;
use std::sync::Arc;

use super::{BundleKey, Document, Framework};
use crate::core::BundlerMode;

/// One packed component: parsed, wrapped and bundled.
///
/// Replaced, never mutated, when its source is packed again.
#[derive(Debug, Clone)]
pub struct PackedComponent {
    pub name: String,
    pub bundle_key: BundleKey,
    pub original_path: PathBuf,
    pub document: Arc<Document>,
    pub stats: WrapStats,
}

#[derive(Debug, Clone)]
pub struct WrapStats {
    pub framework: Framework,
    pub mode: BundlerMode,
    pub artifact: PathBuf,
    /// The artifact for this key already existed.
    pub reused: bool,
}

impl PackedComponent {
    /// Local import closure of the source.
    pub fn dependencies(&self) -> &[PathBuf] {
        &self.document.imports
    }
}
