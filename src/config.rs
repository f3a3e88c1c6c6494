//! Chart configuration
//!
//! Configuration is stored in `<dir>/config.toml` (default `.orgchart/config.toml`)
//! and controls layout spacing, edge routing, tree building and export naming.
//! When a data directory has no config file, `~/.config/orgchart/config.toml` is
//! used if present, then built-in defaults.

use crate::layout::{ClusterConfig, LayoutConfig, LayoutError, RoutingConfig};
use crate::tree::{BuildOptions, OrphanPolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub layout: LayoutConfig,

    #[serde(default)]
    pub routing: RoutingConfig,

    /// Secondary tree view
    #[serde(default)]
    pub cluster: ClusterConfig,

    #[serde(default)]
    pub tree: TreeConfig,

    #[serde(default)]
    pub export: ExportConfig,
}

/// Tree building configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Insert department nodes when a manager's reports span several departments
    #[serde(default = "default_group_by_department")]
    pub group_by_department: bool,

    /// "report" (default) or "attach-to-root"
    #[serde(default)]
    pub orphan_policy: OrphanPolicy,
}

fn default_group_by_department() -> bool {
    true
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            group_by_department: default_group_by_department(),
            orphan_policy: OrphanPolicy::default(),
        }
    }
}

impl TreeConfig {
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            group_by_department: self.group_by_department,
            orphan_policy: self.orphan_policy,
            root: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// CSV file names are `<prefix>-YYYY-MM-DD.csv`
    #[serde(default = "default_filename_prefix")]
    pub filename_prefix: String,
}

fn default_filename_prefix() -> String {
    "employee-list".to_string()
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            filename_prefix: default_filename_prefix(),
        }
    }
}

impl Config {
    /// Path of the user-wide config file
    pub fn global_path() -> anyhow::Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("orgchart").join("config.toml"))
    }

    fn read(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))?;
        Ok(config)
    }

    /// Load configuration from `<dir>/config.toml`, falling back to the global
    /// file and then to defaults.
    pub fn load(dir: &Path) -> anyhow::Result<Self> {
        let config_path = dir.join("config.toml");
        if config_path.exists() {
            return Self::read(&config_path);
        }

        if let Ok(global) = Self::global_path()
            && global.exists()
        {
            return Self::read(&global);
        }

        Ok(Self::default())
    }

    /// Save configuration to `<dir>/config.toml`
    pub fn save(&self, dir: &Path) -> anyhow::Result<()> {
        let config_path = dir.join("config.toml");

        let content = toml::to_string_pretty(self)
            .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;

        fs::write(&config_path, content)
            .map_err(|e| anyhow::anyhow!("Failed to write config: {}", e))?;

        Ok(())
    }

    /// Write a default config file unless one exists. Returns whether it was created.
    pub fn init(dir: &Path) -> anyhow::Result<bool> {
        let config_path = dir.join("config.toml");

        if config_path.exists() {
            return Ok(false);
        }

        Self::default().save(dir)?;
        Ok(true)
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        self.layout.validate()?;
        self.routing.validate()?;
        self.cluster.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutMode;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.layout.horizontal_spacing, 240.0);
        assert_eq!(config.layout.vertical_spacing, 200.0);
        assert_eq!(config.layout.max_leaf_nodes_per_row, 2);
        assert_eq!(config.routing.clearance, 60.0);
        assert!(config.tree.group_by_department);
        assert_eq!(config.export.filename_prefix, "employee-list");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();

        let mut config = Config::default();
        config.layout.max_leaf_nodes_per_row = 3;
        config.tree.orphan_policy = OrphanPolicy::AttachToRoot;
        config.save(temp_dir.path()).unwrap();

        let loaded = Config::load(temp_dir.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_init_config() {
        let temp_dir = TempDir::new().unwrap();
        assert!(Config::init(temp_dir.path()).unwrap());
        assert!(!Config::init(temp_dir.path()).unwrap());
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_str = r#"
[layout]
mode = "cluster"
horizontal_spacing = 300.0

[tree]
group_by_department = false
orphan_policy = "attach-to-root"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.layout.mode, LayoutMode::Cluster);
        assert_eq!(config.layout.horizontal_spacing, 300.0);
        // Unset keys keep their defaults.
        assert_eq!(config.layout.vertical_spacing, 200.0);
        assert_eq!(config.routing.card_height, 120.0);

        let options = config.tree.build_options();
        assert!(!options.group_by_department);
        assert_eq!(options.orphan_policy, OrphanPolicy::AttachToRoot);
    }

    #[test]
    fn test_validate_rejects_bad_spacing() {
        let toml_str = r#"
[layout]
vertical_spacing = -10.0
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_err());
    }
}
