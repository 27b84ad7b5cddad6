//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/mindtree/mindtree.toml`
//! 3. Environment variables: `MINDTREE_*` prefix (`__` separates nested keys)
//! 4. Command line (`--data-dir`), applied by the caller

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::{ApplicationError, SessionOptions};
use crate::domain::colorizer::{DEFAULT_BRANCH_COLORS, DEFAULT_ROOT_COLOR};
use crate::domain::{Layout, Palette};

/// Placement of new nodes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    /// Horizontal distance from a parent to its children
    pub child_offset_x: f64,
    /// Vertical distance between siblings
    pub spacing_y: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let layout = Layout::default();
        Self {
            child_offset_x: layout.child_offset_x,
            spacing_y: layout.spacing_y,
        }
    }
}

/// Branch color palette as hex strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PaletteConfig {
    pub root: String,
    pub branches: Vec<String>,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            root: DEFAULT_ROOT_COLOR.to_string(),
            branches: DEFAULT_BRANCH_COLORS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Unified configuration for mindtree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Directory holding one JSON file per map
    pub data_dir: PathBuf,
    /// Quiet period after the last edit before a session writes
    pub autosave_delay_ms: u64,
    pub layout: LayoutConfig,
    pub palette: PaletteConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            autosave_delay_ms: 800,
            layout: LayoutConfig::default(),
            palette: PaletteConfig::default(),
        }
    }
}

/// Default map directory (platform data dir, e.g. ~/.local/share/mindtree/maps).
fn default_data_dir() -> PathBuf {
    ProjectDirs::from("", "", "mindtree")
        .map(|dirs| dirs.data_dir().join("maps"))
        .unwrap_or_else(|| PathBuf::from("~/.mindtree/maps"))
}

/// Get the XDG config directory for mindtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "mindtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("mindtree.toml"))
}

impl Settings {
    /// Load settings from defaults, the global config file and `MINDTREE_*` variables.
    pub fn load() -> Result<Self, ApplicationError> {
        Self::load_from(global_config_path().as_deref())
    }

    /// Load settings using `config_file` in place of the global config file.
    ///
    /// A missing file is skipped; a malformed one is an error.
    pub fn load_from(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        let defaults = Config::try_from(&Settings::default()).map_err(config_err)?;
        let mut builder = Config::builder().add_source(defaults);

        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path).required(false));
        }

        builder = builder.add_source(
            Environment::with_prefix("MINDTREE")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("palette.branches")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_err)?;
        let mut settings: Self = config.try_deserialize().map_err(config_err)?;

        // Expand ~ and $VAR in path-like fields
        settings.expand_paths();
        Ok(settings)
    }

    /// Replace `data_dir` with a command line value, expanding `~` and `$VAR`.
    pub fn override_data_dir(&mut self, dir: &Path) {
        self.data_dir = dir.to_path_buf();
        self.expand_paths();
    }

    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        let raw = self.data_dir.to_string_lossy().to_string();
        let expanded = shellexpand::full(&raw)
            .map(|s| s.into_owned())
            .unwrap_or(raw);
        self.data_dir = PathBuf::from(expanded);
    }

    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }

    pub fn layout(&self) -> Layout {
        Layout {
            child_offset_x: self.layout.child_offset_x,
            spacing_y: self.layout.spacing_y,
        }
    }

    /// Validated palette.
    pub fn palette(&self) -> Result<Palette, ApplicationError> {
        Ok(Palette::from_hex(&self.palette.root, &self.palette.branches)?)
    }

    pub fn session_options(&self) -> Result<SessionOptions, ApplicationError> {
        Ok(SessionOptions {
            autosave_delay: self.autosave_delay(),
            layout: self.layout(),
            palette: self.palette()?,
        })
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r##"# mindtree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/mindtree/mindtree.toml
#   Env:    MINDTREE_* environment variables, e.g.
#           MINDTREE_DATA_DIR, MINDTREE_LAYOUT__SPACING_Y,
#           MINDTREE_PALETTE__BRANCHES="#ff0000,#00ff00"

# Directory holding the map files
# data_dir = "~/.local/share/mindtree/maps"

# Milliseconds without edits before a session saves
# autosave_delay_ms = 800

[layout]
# child_offset_x = 220.0
# spacing_y = 80.0

[palette]
# Color of the root node
# root = "#37474f"

# Branch colors, in the order of the root's children.
# Branches past the end of the list reuse the last color.
# branches = ["#e57373", "#64b5f6", "#81c784", "#ffb74d"]
"##
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
