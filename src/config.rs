//! Configuration loading and management
//!
//! Handles parsing of `.qtree.toml` configuration files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::layout::LayoutParams;
use crate::model::Position;

/// Name of the per-root configuration file
pub const CONFIG_FILE: &str = ".qtree.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Overlap resolution settings
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Defaults for new quests
    #[serde(default)]
    pub quests: QuestsConfig,

    /// Store location
    #[serde(default)]
    pub store: StoreConfig,
}

/// Layout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Node radius in canvas units
    #[serde(default = "default_node_radius")]
    pub node_radius: f64,

    /// Extra clearance kept around each node
    #[serde(default = "default_padding")]
    pub padding: f64,

    /// Maximum relaxation passes after a drag
    #[serde(default = "default_iterations")]
    pub iterations: usize,
}

fn default_node_radius() -> f64 {
    40.0
}

fn default_padding() -> f64 {
    20.0
}

fn default_iterations() -> usize {
    4
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_radius: default_node_radius(),
            padding: default_padding(),
            iterations: default_iterations(),
        }
    }
}

impl LayoutConfig {
    pub fn params(&self) -> LayoutParams {
        LayoutParams {
            node_radius: self.node_radius,
            padding: self.padding,
            max_iterations: self.iterations,
        }
    }

    fn validate(&self) -> Result<()> {
        if !(self.node_radius.is_finite() && self.node_radius > 0.0) {
            return Err(Error::InvalidConfig(
                "layout.node_radius must be > 0".to_string(),
            ));
        }
        if !(self.padding.is_finite() && self.padding >= 0.0) {
            return Err(Error::InvalidConfig(
                "layout.padding must be >= 0".to_string(),
            ));
        }
        if !(1..=64).contains(&self.iterations) {
            return Err(Error::InvalidConfig(
                "layout.iterations must be between 1 and 64".to_string(),
            ));
        }
        Ok(())
    }
}

/// Defaults for quests created without explicit fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestsConfig {
    /// Title given to new quests
    #[serde(default = "default_title")]
    pub default_title: String,

    /// Drop position of new quests (the canvas centre)
    #[serde(default)]
    pub default_x: f64,

    #[serde(default)]
    pub default_y: f64,
}

fn default_title() -> String {
    "New Quest".to_string()
}

impl Default for QuestsConfig {
    fn default() -> Self {
        Self {
            default_title: default_title(),
            default_x: 0.0,
            default_y: 0.0,
        }
    }
}

impl QuestsConfig {
    pub fn default_position(&self) -> Position {
        Position::new(self.default_x, self.default_y)
    }

    fn validate(&self) -> Result<()> {
        if self.default_title.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "quests.default_title cannot be empty".to_string(),
            ));
        }
        if !(self.default_x.is_finite() && self.default_y.is_finite()) {
            return Err(Error::InvalidConfig(
                "quests.default_x/default_y must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Store location
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Data directory; relative paths resolve against the root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a `.qtree.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a root directory, or return defaults
    pub fn load_from_root(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILE);
        if !config_path.exists() {
            return Self::default();
        }
        match Self::load(&config_path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(
                    path = %config_path.display(),
                    error = %err,
                    "ignoring invalid config"
                );
                Self::default()
            }
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        self.layout.validate()?;
        self.quests.validate()?;
        Ok(())
    }
}
