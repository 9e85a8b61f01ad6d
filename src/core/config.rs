//! Display and layout settings, read from `config.yaml` in the data directory.

use super::error::{Result, ThinktreeError};
use super::layout::LayoutConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThinktreeConfig {
    pub layout: LayoutConfig,
    /// Characters of idea text shown on tree nodes and loose thoughts.
    pub preview_chars: usize,
    /// Characters of the parent's text shown as "builds on".
    pub parent_preview_chars: usize,
}

impl Default for ThinktreeConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            preview_chars: 60,
            parent_preview_chars: 40,
        }
    }
}

impl ThinktreeConfig {
    /// Loads the config file; a missing file yields the defaults.
    ///
    /// # Errors
    /// Returns a system error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| {
            ThinktreeError::system("config_read_failed", e.to_string(), "config:load")
                .with_context("path", path.display().to_string())
        })?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).map_err(|e| {
            ThinktreeError::system("config_parse_failed", e.to_string(), "config:load")
                .with_context("path", path.display().to_string())
                .with_hint("Fix or remove config.yaml to use the defaults")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ThinktreeConfig::load(&dir.path().join("config.yaml")).unwrap();
        assert_eq!(config, ThinktreeConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "layout:\n  node_width: 120\npreview_chars: 30\n").unwrap();

        let config = ThinktreeConfig::load(&path).unwrap();
        assert_eq!(config.layout.node_width, 120.0);
        assert_eq!(config.layout.node_height, 80.0);
        assert_eq!(config.preview_chars, 30);
        assert_eq!(config.parent_preview_chars, 40);
    }

    #[test]
    fn malformed_file_is_a_system_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "layout: [not, a, map").unwrap();

        let err = ThinktreeConfig::load(&path).unwrap_err();
        assert_eq!(err.code, "config_parse_failed");
    }
}
