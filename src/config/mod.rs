//! Project configuration management for `rebundle.toml`.
//!
//! # Sections
//!
//! | Section            | Purpose                                          |
//! |--------------------|--------------------------------------------------|
//! | `[build]`          | Source tree, output layout, mode, concurrency    |
//! | `[build.bundler]`  | External bundler command and deadline            |
//! | `[dev]`            | Watch tick, repeat window, hot reload port       |
//!
//! A missing config file is not an error: every field has a default, and
//! the project root falls back to the current directory.

pub mod section;
mod error;
mod util;

use util::find_config_file;

pub use error::{ConfigDiagnostics, ConfigError};
pub use section::{
    BuildSectionConfig, BundlerConfig, DevConfig, ENTRY_PLACEHOLDER, OUTPUT_PLACEHOLDER,
};

use crate::{
    cli::{BuildArgs, Cli, Commands},
    debug, log,
    utils::path::{normalize_path, resolve_config_path},
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Root configuration structure representing rebundle.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RebundleConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub build: BuildSectionConfig,

    #[serde(default)]
    pub dev: DevConfig,
}

impl RebundleConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd for the config file; its parent directory
    /// becomes the project root.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = match find_config_file(&cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.config_path = normalize_path(&path);
                config
            }
            None => {
                debug!("config"; "{} not found, using defaults", cli.config.display());
                Self {
                    config_path: cwd.join(&cli.config),
                    ..Self::default()
                }
            }
        };

        config.finalize(cli);
        config.validate()?;
        Ok(config)
    }

    fn finalize(&mut self, cli: &Cli) {
        let root = self
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        self.root = root;

        // CLI paths are relative to the project root, like config paths.
        Self::update_option(&mut self.build.web_dir, cli.web_dir.as_ref());
        self.apply_command_options(cli);
        self.normalize_paths();
    }

    fn normalize_paths(&mut self) {
        let root = self.root.clone();
        let build = &mut self.build;
        build.web_dir = normalize_path(&resolve_config_path(&build.web_dir, &root));
        // `pages` stays relative to web_dir; `pages_dir()` joins them.
        build.out = resolve_config_path(&build.out, &root);
        build.node_modules = resolve_config_path(&build.node_modules, &root);
        if let Some(dep_out) = &self.dev.dep_out {
            self.dev.dep_out = Some(resolve_config_path(dep_out, &root));
        }
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    fn apply_command_options(&mut self, cli: &Cli) {
        match &cli.command {
            Commands::Build { build_args } => self.apply_build_args(build_args),
            Commands::Dev {
                build_args,
                timeout,
                same_file_timeout,
                port,
            } => {
                self.apply_build_args(build_args);
                Self::update_option(&mut self.dev.timeout_ms, timeout.as_ref());
                Self::update_option(
                    &mut self.dev.same_file_timeout_ms,
                    same_file_timeout.as_ref(),
                );
                Self::update_option(&mut self.dev.hot_reload_port, port.as_ref());
            }
        }
    }

    fn apply_build_args(&mut self, args: &BuildArgs) {
        self.build.clean = args.clean;
        Self::update_option(&mut self.build.mode, args.mode.as_ref());
        Self::update_option(&mut self.build.max_concurrency, args.jobs.as_ref());
        if let Some(dep_out) = &args.dep_out {
            self.dev.dep_out = Some(dep_out.clone());
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // parsing
    // ========================================================================

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Check values that would make the build or the watcher misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        if self.dev.timeout_ms == 0 {
            diag.error("dev.timeout_ms", "must be greater than 0");
        }
        if self.dev.same_file_timeout_ms == 0 {
            diag.error("dev.same_file_timeout_ms", "must be greater than 0");
        }
        if self.build.bundler.timeout_ms == 0 {
            diag.error("build.bundler.timeout_ms", "must be greater than 0");
        }
        match self.build.bundler.command.first() {
            None => diag.error("build.bundler.command", "must not be empty"),
            Some(program) if program.trim().is_empty() => {
                diag.error("build.bundler.command", "program name must not be blank")
            }
            Some(_) => {}
        }
        if !self.build.bundler.command.iter().any(|a| a.contains(ENTRY_PLACEHOLDER)) {
            diag.error(
                "build.bundler.command",
                format!("must reference the entry module as `{ENTRY_PLACEHOLDER}`"),
            );
        }
        if !self.build.bundler.command.iter().any(|a| a.contains(OUTPUT_PLACEHOLDER)) {
            diag.error(
                "build.bundler.command",
                format!("must reference the artifact path as `{OUTPUT_PLACEHOLDER}`"),
            );
        }
        if !self.build.web_dir.is_dir() {
            diag.error(
                "build.web_dir",
                format!("directory `{}` does not exist", self.build.web_dir.display()),
            );
        }

        diag.into_result()
    }

    /// Get path relative to the project root
    pub fn root_relative(&self, path: impl AsRef<Path>) -> PathBuf {
        path.as_ref()
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.as_ref().to_path_buf())
    }
}

/// Parse a config snippet, panicking on invalid TOML.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> RebundleConfig {
    RebundleConfig::from_str(content).expect("valid test config")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn rooted(temp: &TempDir, content: &str) -> RebundleConfig {
        let mut config = test_parse_config(content);
        config.root = temp.path().to_path_buf();
        config.normalize_paths();
        config
    }

    #[test]
    fn test_unknown_fields_collected() {
        let (config, ignored) = RebundleConfig::parse_with_ignored(
            "[build]\nweb_dir = \"src\"\nminify = true\n\n[dev]\nwatch = false",
        )
        .unwrap();
        assert_eq!(config.build.web_dir, PathBuf::from("src"));
        assert_eq!(ignored, vec!["build.minify", "dev.watch"]);
    }

    #[test]
    fn test_invalid_toml() {
        let err = RebundleConfig::from_str("[dev]\ntimeout_ms = \"soon\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_paths_resolved_against_root() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("web")).unwrap();
        let config = rooted(&temp, "[dev]\ndep_out = \"deps.json\"");

        assert!(config.build.web_dir.is_absolute());
        assert!(config.build.web_dir.ends_with("web"));
        assert_eq!(config.build.out, temp.path().join(".rebundle"));
        assert_eq!(config.dev.dep_out, Some(temp.path().join("deps.json")));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let temp = TempDir::new().unwrap();
        let config = rooted(
            &temp,
            "[dev]\ntimeout_ms = 0\n\n[build.bundler]\ncommand = []",
        );
        let Err(ConfigError::Validation(diag)) = config.validate() else {
            panic!("expected validation error");
        };
        let fields: Vec<_> = diag.errors().iter().map(|e| e.field).collect();
        assert!(fields.contains(&"dev.timeout_ms"));
        assert!(fields.contains(&"build.bundler.command"));
        assert!(fields.contains(&"build.web_dir"));
    }

    #[test]
    fn test_cli_overrides() {
        use clap::Parser;
        let cli = Cli::try_parse_from([
            "rebundle",
            "dev",
            "--timeout",
            "100",
            "--port",
            "9000",
            "--jobs",
            "2",
        ])
        .unwrap();
        let mut config = RebundleConfig::default();
        config.apply_command_options(&cli);
        assert_eq!(config.dev.timeout_ms, 100);
        assert_eq!(config.dev.hot_reload_port, 9000);
        assert_eq!(config.dev.same_file_timeout_ms, 2000);
        assert_eq!(config.build.max_concurrency, 2);
    }
}
