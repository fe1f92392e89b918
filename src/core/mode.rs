//! Bundler mode for development/production builds.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How the bundler should build an artifact.
///
/// Part of every bundle key: the same source packed in two modes yields two
/// distinct artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BundlerMode {
    /// Unminified output with fast rebuilds.
    #[default]
    Development,
    /// Minified output.
    Production,
}

impl BundlerMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }

    #[inline]
    pub const fn is_dev(self) -> bool {
        matches!(self, Self::Development)
    }
}

impl fmt::Display for BundlerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_serde_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: BundlerMode,
        }
        let w: Wrapper = toml::from_str("mode = \"production\"").unwrap();
        assert_eq!(w.mode, BundlerMode::Production);
        assert!(!w.mode.is_dev());
    }

    #[test]
    fn test_mode_default_is_development() {
        assert_eq!(BundlerMode::default().to_string(), "development");
    }
}
