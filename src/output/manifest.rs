//! `manifest.json`: component name → bundle key and artifact.
//!
//! ```json
//! {
//!   "mode": "production",
//!   "components": {
//!     "Home": { "key": "home_3f1c2a9b0d4e5f67", "artifact": "dist/home_3f1c2a9b0d4e5f67.js" }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{WriteError, write_json_atomic};
use crate::core::BundlerMode;
use crate::pack::{BundleKey, PackedComponent};

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub key: BundleKey,
    /// Relative to the output directory.
    pub artifact: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    pub mode: BundlerMode,
    pub components: BTreeMap<String, ManifestEntry>,
}

impl Manifest {
    pub fn new<'a>(
        mode: BundlerMode,
        out_dir: &Path,
        components: impl IntoIterator<Item = &'a PackedComponent>,
    ) -> Self {
        let components = components
            .into_iter()
            .map(|c| {
                let artifact = c
                    .stats
                    .artifact
                    .strip_prefix(out_dir)
                    .unwrap_or(&c.stats.artifact)
                    .to_path_buf();
                (
                    c.name.clone(),
                    ManifestEntry {
                        key: c.bundle_key.clone(),
                        artifact,
                    },
                )
            })
            .collect();
        Self { mode, components }
    }

    /// Write to `<out_dir>/manifest.json`.
    pub fn write(&self, out_dir: &Path) -> Result<PathBuf, WriteError> {
        let path = out_dir.join(MANIFEST_FILE);
        write_json_atomic(&path, self)?;
        Ok(path)
    }
}
