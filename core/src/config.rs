//! Configuration management (~/.config/Tessera/config.toml)
//!
//! Handles loading, saving, and providing defaults for terrain generation, stream
//! output and the simulation world. Settings are stored in TOML format in the
//! platform-specific config directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tessera configuration.
///
/// Every section falls back to its defaults when missing from the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Terrain generation settings
    #[serde(default)]
    pub terrain: TerrainConfig,
    /// Scene stream settings
    #[serde(default)]
    pub stream: StreamConfig,
    /// Simulation world limits
    #[serde(default)]
    pub world: WorldConfig,
}

/// Terrain generation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainConfig {
    /// Cells per side of the mesh terrain (default: 10)
    #[serde(default = "default_mesh_grid")]
    pub mesh_grid: u32,
    /// Size of one mesh cell (default: 2.0)
    #[serde(default = "default_mesh_cell_size")]
    pub mesh_cell_size: f32,
    /// Samples per side of the height field (default: 32)
    #[serde(default = "default_height_field_grid")]
    pub height_field_grid: u32,
    /// Spacing between height-field samples (default: 1.0)
    #[serde(default = "default_height_field_cell_size")]
    pub height_field_cell_size: f32,
    /// Highest terrain point, also the base height of the body stack (default: 4.0)
    #[serde(default = "default_max_height")]
    pub max_height: f32,
    /// Height of the rim around the mesh terrain (default: 2.0)
    #[serde(default = "default_rim_height")]
    pub rim_height: f32,
    /// Perlin seed (default: 0)
    #[serde(default)]
    pub noise_seed: u32,
    /// Noise period on every axis (default: 256)
    #[serde(default = "default_noise_period")]
    pub noise_period: u32,
}

/// Stream output configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Pretty-print written scenes (default: true)
    #[serde(default = "default_true")]
    pub pretty: bool,
}

/// Simulation world configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Maximum number of live bodies, rigid and soft (default: 1024)
    #[serde(default = "default_max_bodies")]
    pub max_bodies: u32,
    /// Number of object layers (default: 2)
    #[serde(default = "default_num_layers")]
    pub num_layers: u16,
}

fn default_mesh_grid() -> u32 {
    10
}
fn default_mesh_cell_size() -> f32 {
    2.0
}
fn default_height_field_grid() -> u32 {
    32
}
fn default_height_field_cell_size() -> f32 {
    1.0
}
fn default_max_height() -> f32 {
    4.0
}
fn default_rim_height() -> f32 {
    2.0
}
fn default_noise_period() -> u32 {
    256
}

fn default_true() -> bool {
    true
}
fn default_max_bodies() -> u32 {
    1024
}
fn default_num_layers() -> u16 {
    tessera_shared::ObjectLayer::NUM_LAYERS
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            mesh_grid: default_mesh_grid(),
            mesh_cell_size: default_mesh_cell_size(),
            height_field_grid: default_height_field_grid(),
            height_field_cell_size: default_height_field_cell_size(),
            max_height: default_max_height(),
            rim_height: default_rim_height(),
            noise_seed: 0,
            noise_period: default_noise_period(),
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            pretty: default_true(),
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            max_bodies: default_max_bodies(),
            num_layers: default_num_layers(),
        }
    }
}

/// Errors raised by [`load_from`] and [`save_to`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Returns the platform-specific configuration directory.
///
/// On Windows: `%APPDATA%\Tessera\config`
/// On macOS: `~/Library/Application Support/io.tessera.Tessera`
/// On Linux: `~/.config/Tessera`
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io.tessera", "", "Tessera")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Loads the configuration from disk.
///
/// Reads `config.toml` from the platform's configuration directory.
/// Returns default values if the file doesn't exist or cannot be parsed.
pub fn load() -> Config {
    config_dir()
        .and_then(|dir| std::fs::read_to_string(dir.join("config.toml")).ok())
        .and_then(|content| toml::from_str(&content).ok())
        .unwrap_or_default()
}

/// Loads the configuration from an explicit path.
///
/// Unlike [`load`], a missing or malformed file is an error.
pub fn load_from(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Saves the configuration to disk.
///
/// Writes `config.toml` to the platform's configuration directory.
/// Creates the directory if it doesn't exist.
pub fn save(config: &Config) -> Result<(), ConfigError> {
    match config_dir() {
        Some(dir) => save_to(config, dir.join("config.toml")),
        None => Ok(()),
    }
}

/// Saves the configuration to an explicit path, creating parent directories.
pub fn save_to(config: &Config, path: impl AsRef<Path>) -> Result<(), ConfigError> {
    let path = path.as_ref();
    let io_error = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(io_error)
}
