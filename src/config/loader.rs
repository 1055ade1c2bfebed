//! Configuration loading and discovery for `assetpipe.toml`
//!
//! Provides functions to find, load, and merge configuration.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::schema::{default_platforms, AssetPipeConfig, HashingConfig, ProjectConfig, SubIdConfig};
use crate::subid::OverflowPolicy;

/// File name searched for by [`find_config`].
pub const CONFIG_FILE_NAME: &str = "assetpipe.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse assetpipe.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override cache directory
    pub cache: Option<PathBuf>,
    /// Override temp directory
    pub temp: Option<PathBuf>,
    /// Keep only these platforms
    pub platforms: Option<Vec<String>>,
    /// Override sub id overflow policy
    pub overflow: Option<OverflowPolicy>,
    /// Override hashing buffer size
    pub hash_buffer_size: Option<usize>,
    /// Override per-chunk hashing delay
    pub hash_delay_ms: Option<u64>,
}

/// Find assetpipe.toml by walking up from the current working directory.
pub fn find_config() -> Option<PathBuf> {
    let cwd = env::current_dir().ok()?;
    find_config_from(cwd)
}

/// Find assetpipe.toml by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from an assetpipe.toml file.
///
/// If a path is provided, loads from that file. Otherwise, uses `find_config()`
/// to locate the config file. If no config file is found, returns a default
/// configuration.
pub fn load_config(path: Option<&Path>) -> Result<AssetPipeConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => load_config_file(&p),
        None => Ok(default_config()),
    }
}

/// Load and validate configuration from a specific file path.
pub fn load_config_file(path: &Path) -> Result<AssetPipeConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: AssetPipeConfig = toml::from_str(&contents)?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    log::debug!("loaded {} recognizers from {}", config.recognizers.len(), path.display());
    Ok(config)
}

/// Create a default configuration when no assetpipe.toml is found.
///
/// The project is named after the current directory and builds for `pc` only.
pub fn default_config() -> AssetPipeConfig {
    let project_name = env::current_dir()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "unnamed".to_string());

    AssetPipeConfig {
        project: ProjectConfig {
            name: project_name,
            cache: PathBuf::from("Cache"),
            temp: PathBuf::from("Cache/tmp"),
        },
        platforms: default_platforms(),
        subid: SubIdConfig::default(),
        hashing: HashingConfig::default(),
        recognizers: BTreeMap::new(),
    }
}

/// Merge CLI overrides into a configuration.
///
/// CLI arguments take precedence over config file values.
pub fn merge_cli_overrides(config: &mut AssetPipeConfig, overrides: &CliOverrides) {
    if let Some(ref cache) = overrides.cache {
        config.project.cache = cache.clone();
    }
    if let Some(ref temp) = overrides.temp {
        config.project.temp = temp.clone();
    }

    if let Some(ref keep) = overrides.platforms {
        config.platforms.retain(|id, _| keep.iter().any(|k| k.eq_ignore_ascii_case(id)));
    }

    if let Some(overflow) = overrides.overflow {
        config.subid.overflow = overflow;
    }

    if let Some(buffer_size) = overrides.hash_buffer_size {
        config.hashing.buffer_size = buffer_size;
    }
    if let Some(delay_ms) = overrides.hash_delay_ms {
        config.hashing.delay_ms = delay_ms;
    }
}

/// Get the project root directory from a config file path.
pub fn project_root(config_path: &Path) -> Option<&Path> {
    config_path.parent()
}

/// Resolve a path relative to the project root.
///
/// If the path is absolute, returns it unchanged.
/// If relative, joins it with the project root.
pub fn resolve_path(project_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_root.join(path)
    }
}
