//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! web_dir = "web"              # Source tree root, also the watch root
//! pages = "pages"              # Component directory inside web_dir
//! assets = "assets"            # Optional, copied to <out>/assets
//! out = ".rebundle"            # Scratch and artifact output
//! mode = "development"         # "development" | "production"
//! node_modules = "node_modules"
//! max_concurrency = 0          # 0 = available parallelism
//! wrappers = ["react", "vue"]
//!
//! [build.bundler]
//! command = ["npx", "--no-install", "esbuild", "$ENTRY", "--bundle", "--format=esm", "--outfile=$OUTPUT"]
//! production_args = ["--minify"]
//! development_args = ["--sourcemap=inline"]
//! timeout_ms = 60000
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::BundlerMode;
use crate::pack::Framework;

/// Placeholder replaced by the wrapped entry module path.
pub const ENTRY_PLACEHOLDER: &str = "$ENTRY";
/// Placeholder replaced by the temporary artifact path.
pub const OUTPUT_PLACEHOLDER: &str = "$OUTPUT";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSectionConfig {
    pub web_dir: PathBuf,
    /// Relative to `web_dir`.
    pub pages: PathBuf,
    /// Static asset directory, relative to `web_dir`. Not copied when unset.
    pub assets: Option<PathBuf>,
    pub out: PathBuf,
    pub mode: BundlerMode,
    /// Exported to the bundler as `NODE_PATH`.
    pub node_modules: PathBuf,
    pub max_concurrency: usize,
    /// Frameworks that get an entry-module wrapper.
    pub wrappers: Vec<Framework>,
    pub bundler: BundlerConfig,

    /// Wipe `out` before the initial build (CLI only).
    #[serde(skip)]
    pub clean: bool,
}

impl Default for BuildSectionConfig {
    fn default() -> Self {
        Self {
            web_dir: "web".into(),
            pages: "pages".into(),
            assets: None,
            out: ".rebundle".into(),
            mode: BundlerMode::default(),
            node_modules: "node_modules".into(),
            max_concurrency: 0,
            wrappers: vec![Framework::React, Framework::Vue],
            bundler: BundlerConfig::default(),
            clean: false,
        }
    }
}

impl BuildSectionConfig {
    /// Absolute component directory (`web_dir/pages`).
    pub fn pages_dir(&self) -> PathBuf {
        self.web_dir.join(&self.pages)
    }

    /// Scratch directory for wrapped entry modules.
    pub fn scratch_dir(&self) -> PathBuf {
        self.out.join("base").join("pages")
    }

    /// Final artifact directory.
    pub fn dist_dir(&self) -> PathBuf {
        self.out.join("dist")
    }

    /// Absolute asset source directory, when configured.
    pub fn assets_source(&self) -> Option<PathBuf> {
        self.assets.as_ref().map(|assets| self.web_dir.join(assets))
    }

    /// Mirror of the asset source.
    pub fn assets_dir(&self) -> PathBuf {
        self.out.join("assets")
    }

    /// Resolved worker count for the packer pool.
    pub fn worker_count(&self) -> usize {
        match self.max_concurrency {
            0 => std::thread::available_parallelism().map_or(4, |n| n.get()),
            n => n,
        }
    }
}

/// External bundler invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BundlerConfig {
    /// Program and arguments; `$ENTRY` and `$OUTPUT` are substituted.
    pub command: Vec<String>,
    pub production_args: Vec<String>,
    pub development_args: Vec<String>,
    pub timeout_ms: u64,
}

impl Default for BundlerConfig {
    fn default() -> Self {
        Self {
            command: [
                "npx",
                "--no-install",
                "esbuild",
                ENTRY_PLACEHOLDER,
                "--bundle",
                "--format=esm",
                "--outfile=$OUTPUT",
            ]
            .map(String::from)
            .to_vec(),
            production_args: vec!["--minify".into()],
            development_args: vec!["--sourcemap=inline".into()],
            timeout_ms: 60_000,
        }
    }
}

impl BundlerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Extra arguments for the given mode.
    pub fn mode_args(&self, mode: BundlerMode) -> &[String] {
        match mode {
            BundlerMode::Development => &self.development_args,
            BundlerMode::Production => &self.production_args,
        }
    }
}
