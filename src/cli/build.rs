//! Initial build.
//!
//! - **Prepare** - optional clean, create scratch/dist/assets directories,
//!   mirror the asset source
//! - **Collect** - every component source under `web_dir/pages`
//! - **Pack** - `pack_many` on the bounded pool, with a progress line
//! - **Write** - manifest and (when configured) the dependency map

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use jwalk::WalkDir;

use crate::change::Session;
use crate::config::RebundleConfig;
use crate::logger::ProgressLine;
use crate::output::assets::copy_assets;
use crate::pack::Packer;
use crate::utils::path::{is_component_source, is_temp_file};
use crate::utils::plural::plural_count;
use crate::{debug, log};

/// Counts of one initial build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub packed: usize,
    pub discarded: usize,
    pub failed: usize,
}

impl std::fmt::Display for BuildSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "packed {}", plural_count(self.packed, "component"))?;
        if self.discarded > 0 {
            write!(f, ", {} skipped", plural_count(self.discarded, "duplicate"))?;
        }
        if self.failed > 0 {
            write!(f, ", {} failed", self.failed)?;
        }
        Ok(())
    }
}

/// `rebundle build`: pack everything once; any failed component fails the command.
pub fn run_build(config: &RebundleConfig) -> Result<()> {
    let (session, summary) = build_components(config)?;
    session.packer().close();
    if summary.failed > 0 {
        bail!("{} failed to pack", plural_count(summary.failed, "component"));
    }
    Ok(())
}

/// Pack every page component and write the build outputs.
///
/// Per-component failures are logged and counted, not returned.
pub fn build_components(config: &RebundleConfig) -> Result<(Session, BuildSummary)> {
    prepare_output(config)?;

    let pages_dir = config.build.pages_dir();
    let sources = collect_sources(&pages_dir);
    if sources.is_empty() {
        log!("build"; "no components found in {}", config.root_relative(&pages_dir).display());
    }

    let packer = Arc::new(Packer::from_config(config)?);
    let report = {
        let progress = ProgressLine::new("pack", sources.len());
        let report = packer.pack_with_progress(&sources, &progress);
        progress.finish();
        report.sorted()
    };

    for failure in &report.errors {
        log!("error"; "{}", failure.error.report());
    }

    let summary = BuildSummary {
        packed: report.components.len(),
        discarded: report.discarded.len(),
        failed: report.errors.len(),
    };

    let session = Session::from_config(config, packer);
    session.seed(&report);
    session.persist();

    log!("build"; "{}", summary);
    Ok((session, summary))
}

fn prepare_output(config: &RebundleConfig) -> Result<()> {
    let build = &config.build;
    if build.clean && build.out.exists() {
        debug!("build"; "cleaning {}", build.out.display());
        fs::remove_dir_all(&build.out)
            .with_context(|| format!("failed to clean {}", build.out.display()))?;
    }

    for dir in [build.scratch_dir(), build.dist_dir(), build.assets_dir()] {
        fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;
    }

    if let Some(source) = build.assets_source() {
        let copied = copy_assets(&source, &build.assets_dir(), build.clean)
            .with_context(|| format!("failed to copy assets from {}", source.display()))?;
        debug!("build"; "copied {}", plural_count(copied, "asset"));
    }
    Ok(())
}

/// Component sources under `dir`, sorted for a stable pack order.
fn collect_sources(dir: &Path) -> Vec<PathBuf> {
    let mut sources: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path())
        .filter(|p| is_component_source(p) && !is_temp_file(p))
        .collect();
    sources.sort();
    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::MANIFEST_FILE;
    use tempfile::TempDir;

    fn project(temp: &TempDir) -> RebundleConfig {
        let mut config = RebundleConfig::default();
        config.root = temp.path().to_path_buf();
        config.build.web_dir = temp.path().join("web");
        config.build.out = temp.path().join("out");
        config.build.node_modules = temp.path().join("node_modules");
        config.build.max_concurrency = 2;
        config.build.bundler.command = ["cp", "$ENTRY", "$OUTPUT"].map(String::from).to_vec();
        config.build.bundler.development_args.clear();
        config.dev.dep_out = Some(temp.path().join("deps.json"));
        config
    }

    fn write(temp: &TempDir, rel: &str, content: &str) {
        let path = temp.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_build_packs_pages() {
        let temp = TempDir::new().unwrap();
        write(&temp, "web/pages/Home.jsx", "export default function Home() {}");
        write(&temp, "web/pages/blog/Post.jsx", "export default function Post() {}");
        write(&temp, "web/pages/Again.jsx", "export default function Home() { return 2; }");
        write(&temp, "web/pages/README.md", "# not a component");
        write(&temp, "web/components/Button.jsx", "export default function Button() {}");

        let config = project(&temp);
        let (session, summary) = build_components(&config).unwrap();

        assert_eq!(summary.packed, 2);
        assert_eq!(summary.discarded, 1);
        assert_eq!(summary.failed, 0);
        assert!(session.component("Post").is_some());
        assert!(session.component("Button").is_none());

        let manifest: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(config.build.out.join(MANIFEST_FILE)).unwrap(),
        )
        .unwrap();
        assert_eq!(manifest["components"].as_object().unwrap().len(), 2);
        assert!(temp.path().join("deps.json").exists());
    }

    #[test]
    fn test_clean_removes_stale_output() {
        let temp = TempDir::new().unwrap();
        write(&temp, "web/pages/Home.jsx", "export default function Home() {}");
        write(&temp, "out/dist/old_0000000000000000.js", "stale");

        let mut config = project(&temp);
        config.build.clean = true;
        build_components(&config).unwrap();

        assert!(!config.build.out.join("dist/old_0000000000000000.js").exists());
        assert!(config.build.scratch_dir().is_dir());
        assert!(config.build.assets_dir().is_dir());
    }

    #[test]
    fn test_assets_mirrored() {
        let temp = TempDir::new().unwrap();
        write(&temp, "web/pages/Home.jsx", "export default function Home() {}");
        write(&temp, "web/static/logo.svg", "<svg/>");
        write(&temp, "web/static/css/site.css", "body {}");

        let mut config = project(&temp);
        config.build.assets = Some("static".into());
        build_components(&config).unwrap();

        let assets = config.build.assets_dir();
        assert_eq!(fs::read_to_string(assets.join("logo.svg")).unwrap(), "<svg/>");
        assert!(assets.join("css/site.css").is_file());
    }

    #[test]
    fn test_failures_are_counted() {
        let temp = TempDir::new().unwrap();
        write(&temp, "web/pages/Home.jsx", "export default function Home() {}");
        write(&temp, "web/pages/Bad.jsx", "");

        let config = project(&temp);
        let (_, summary) = build_components(&config).unwrap();
        assert_eq!(summary.packed, 1);
        assert_eq!(summary.failed, 1);
        assert!(run_build(&config).is_err());
    }

    #[test]
    fn test_summary_display() {
        let summary = BuildSummary {
            packed: 3,
            discarded: 1,
            failed: 0,
        };
        assert_eq!(summary.to_string(), "packed 3 components, 1 duplicate skipped");
    }
}
