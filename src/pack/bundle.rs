//! Bundler invocation.
//!
//! [`CommandBundler`] drives an external bundler (esbuild by default):
//!
//! ```text
//! <out>/base/pages/<key>.entry.js   wrapped entry module (scratch)
//! <out>/dist/.<key>XXXX.js          bundler output (temporary)
//! <out>/dist/<key>.js               final artifact (renamed into place)
//! ```
//!
//! The final path only ever holds a complete, non-empty artifact.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{BundleError, BundleKey, WrappedDocument};
use crate::config::{ENTRY_PLACEHOLDER, OUTPUT_PLACEHOLDER, RebundleConfig};
use crate::core::BundlerMode;
use crate::utils::exec::{Cmd, ExecError};

/// Location of a finished artifact.
#[derive(Debug, Clone)]
pub struct BundleOutput {
    pub artifact: PathBuf,
    /// Artifact already existed for this key; the bundler did not run.
    pub reused: bool,
}

pub trait Bundle: Send + Sync {
    fn bundle(
        &self,
        wrapped: &WrappedDocument,
        key: &BundleKey,
        mode: BundlerMode,
    ) -> Result<BundleOutput, BundleError>;
}

pub struct CommandBundler {
    command: Vec<String>,
    production_args: Vec<String>,
    development_args: Vec<String>,
    timeout: Duration,
    root: PathBuf,
    node_modules: PathBuf,
    scratch_dir: PathBuf,
    dist_dir: PathBuf,
}

impl CommandBundler {
    pub fn from_config(config: &RebundleConfig) -> Self {
        let build = &config.build;
        Self {
            command: build.bundler.command.clone(),
            production_args: build.bundler.production_args.clone(),
            development_args: build.bundler.development_args.clone(),
            timeout: build.bundler.timeout(),
            root: config.root.clone(),
            node_modules: build.node_modules.clone(),
            scratch_dir: build.scratch_dir(),
            dist_dir: build.dist_dir(),
        }
    }

    pub fn artifact_path(&self, key: &BundleKey) -> PathBuf {
        self.dist_dir.join(format!("{key}.js"))
    }

    fn entry_path(&self, key: &BundleKey) -> PathBuf {
        self.scratch_dir.join(format!("{key}.entry.js"))
    }

    /// Configured command with placeholders substituted and mode args appended.
    fn command_line(&self, entry: &Path, output: &Path, mode: BundlerMode) -> Vec<String> {
        let entry = entry.to_string_lossy();
        let output = output.to_string_lossy();
        let mode_args = match mode {
            BundlerMode::Development => &self.development_args,
            BundlerMode::Production => &self.production_args,
        };
        self.command
            .iter()
            .chain(mode_args)
            .map(|arg| {
                arg.replace(ENTRY_PLACEHOLDER, &entry)
                    .replace(OUTPUT_PLACEHOLDER, &output)
            })
            .collect()
    }

    fn run(&self, args: &[String], mode: BundlerMode) -> Result<(), BundleError> {
        let output = Cmd::from_slice(args)
            .cwd(&self.root)
            .envs([
                ("NODE_PATH", self.node_modules.to_string_lossy().as_ref()),
                ("NODE_ENV", mode.as_str()),
            ])
            .timeout(self.timeout)
            .run()
            .map_err(|err| match err {
                ExecError::NotFound { program } => BundleError::MissingTool { program },
                ExecError::TimedOut { after, .. } => BundleError::TimedOut { after },
                ExecError::Spawn { program, source } | ExecError::Wait { program, source } => {
                    BundleError::Io {
                        path: program.into(),
                        source,
                    }
                }
            })?;

        if !output.success() {
            return Err(BundleError::Failed {
                status: output.status.code(),
                stderr: output.diagnostics(),
            });
        }
        Ok(())
    }
}

impl Bundle for CommandBundler {
    fn bundle(
        &self,
        wrapped: &WrappedDocument,
        key: &BundleKey,
        mode: BundlerMode,
    ) -> Result<BundleOutput, BundleError> {
        let artifact = self.artifact_path(key);
        if is_complete(&artifact) {
            return Ok(BundleOutput {
                artifact,
                reused: true,
            });
        }

        for dir in [&self.scratch_dir, &self.dist_dir] {
            fs::create_dir_all(dir).map_err(|source| BundleError::Io {
                path: dir.clone(),
                source,
            })?;
        }

        let entry = self.entry_path(key);
        fs::write(&entry, &wrapped.entry).map_err(|source| BundleError::Io {
            path: entry.clone(),
            source,
        })?;

        // Removed on drop unless persisted, so failures leave nothing behind.
        let temp = tempfile::Builder::new()
            .prefix(&format!(".{key}"))
            .suffix(".js")
            .tempfile_in(&self.dist_dir)
            .map_err(|source| BundleError::Io {
                path: self.dist_dir.clone(),
                source,
            })?;

        let args = self.command_line(&entry, temp.path(), mode);
        self.run(&args, mode)?;

        if !is_complete(temp.path()) {
            return Err(BundleError::IncompleteArtifact { path: artifact });
        }
        temp.persist(&artifact).map_err(|err| BundleError::Io {
            path: artifact.clone(),
            source: err.error,
        })?;

        Ok(BundleOutput {
            artifact,
            reused: false,
        })
    }
}

fn is_complete(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|meta| meta.is_file() && meta.len() > 0)
}
