//! Configuration module for the asset pipeline
//!
//! Provides types and parsing for `assetpipe.toml` project configuration.

pub mod loader;
pub mod schema;

pub use loader::{
    default_config, find_config, find_config_from, load_config, load_config_file,
    merge_cli_overrides, project_root, resolve_path, CliOverrides, ConfigError, CONFIG_FILE_NAME,
};
pub use schema::*;
