//! `[dev]` section configuration.
//!
//! ```toml
//! [dev]
//! timeout_ms = 2000             # Watch tick; at most one change per tick
//! same_file_timeout_ms = 2000   # Repeats of one path inside this window are dropped
//! hot_reload_port = 3005
//! dep_out = "deps.json"         # Optional dependency map output
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DevConfig {
    pub timeout_ms: u64,
    pub same_file_timeout_ms: u64,
    pub hot_reload_port: u16,
    pub dep_out: Option<PathBuf>,
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 2000,
            same_file_timeout_ms: 2000,
            hot_reload_port: 3005,
            dep_out: None,
        }
    }
}

impl DevConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn same_file_window(&self) -> Duration {
        Duration::from_millis(self.same_file_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;
    use std::path::PathBuf;

    #[test]
    fn test_dev_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.dev.timeout_ms, 2000);
        assert_eq!(config.dev.same_file_timeout_ms, 2000);
        assert_eq!(config.dev.hot_reload_port, 3005);
        assert!(config.dev.dep_out.is_none());
    }

    #[test]
    fn test_dev_config() {
        let config = test_parse_config(
            "[dev]\ntimeout_ms = 250\nhot_reload_port = 4000\ndep_out = \"deps.json\"",
        );
        assert_eq!(config.dev.tick().as_millis(), 250);
        assert_eq!(config.dev.same_file_timeout_ms, 2000);
        assert_eq!(config.dev.hot_reload_port, 4000);
        assert_eq!(config.dev.dep_out, Some(PathBuf::from("deps.json")));
    }
}
