//! Configuration schema types for `assetpipe.toml`
//!
//! Defines the structure and validation rules for an asset pipeline project.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::asset::AssetType;
use crate::fingerprint::{ContentHasher, DEFAULT_BUFFER_SIZE};
use crate::pattern::{BuilderPattern, PatternKind, PatternMatcher};
use crate::platform::{PlatformInfo, COMMON_PLATFORM_NAME};
use crate::subid::{construct_with_policy, OverflowPolicy, SubIdError};

/// Params value that removes a platform from a recognizer.
pub const SKIP_PARAMS: &str = "skip";

/// Project metadata section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name (required)
    pub name: String,
    /// Product cache root
    #[serde(default = "default_cache")]
    pub cache: PathBuf,
    /// Parent of per-job scratch directories
    #[serde(default = "default_temp")]
    pub temp: PathBuf,
}

fn default_cache() -> PathBuf {
    PathBuf::from("Cache")
}

fn default_temp() -> PathBuf {
    PathBuf::from("Cache/tmp")
}

/// One `[platforms.<id>]` entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformConfig {
    #[serde(default)]
    pub tags: Vec<String>,
}

pub(crate) fn default_platforms() -> BTreeMap<String, PlatformConfig> {
    BTreeMap::from([(
        "pc".to_string(),
        PlatformConfig { tags: vec!["tools".to_string(), "renderer".to_string()] },
    )])
}

/// Sub id packing settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubIdConfig {
    /// What to do with ids or LODs that do not fit their field
    #[serde(default)]
    pub overflow: OverflowPolicy,
}

/// Content hashing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashingConfig {
    /// Read buffer size in bytes
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    /// Artificial per-chunk delay, for reproducing concurrent-writer races
    #[serde(default)]
    pub delay_ms: u64,
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self { buffer_size: default_buffer_size(), delay_ms: 0 }
    }
}

impl HashingConfig {
    pub fn hasher(&self) -> ContentHasher {
        ContentHasher::new()
            .with_buffer_size(self.buffer_size)
            .with_delay(Duration::from_millis(self.delay_ms))
    }
}

/// A `[recognizers.<name>]` entry: a builder that copies matching sources
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizerConfig {
    pub pattern: String,
    #[serde(default)]
    pub kind: PatternKind,
    #[serde(default)]
    pub version: i32,
    #[serde(default)]
    pub analysis_fingerprint: String,
    /// Params for every platform without an override; `"skip"` disables
    #[serde(default = "default_params")]
    pub params: String,
    #[serde(default)]
    pub critical: bool,
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default)]
    pub check_server: bool,
    #[serde(default)]
    pub lock_source: bool,
    /// Declared product type; inferred from the file name when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_asset_type: Option<String>,
    /// Declared product sub id index; with `product_lod`, replaces inference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_sub_id: Option<u32>,
    /// Declared product level of detail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_lod: Option<u32>,
    /// Overrides keyed by platform identifier or platform tag
    #[serde(default)]
    pub platforms: BTreeMap<String, String>,
}

fn default_params() -> String {
    "copy".to_string()
}

fn default_priority() -> i32 {
    -1
}

impl RecognizerConfig {
    pub fn builder_pattern(&self) -> BuilderPattern {
        BuilderPattern::new(self.pattern.clone(), self.kind)
    }

    /// Params for `platform`, or `None` when the recognizer skips it.
    ///
    /// An override keyed by the platform identifier beats one keyed by a tag.
    /// The common platform only gets jobs through an explicit override.
    pub fn params_for(&self, platform: &PlatformInfo) -> Option<&str> {
        let by_identifier =
            self.platforms.iter().find(|(key, _)| platform.has_identifier(key)).map(|(_, v)| v);
        let by_tag = || self.platforms.iter().find(|(key, _)| platform.has_tag(key)).map(|(_, v)| v);

        let params = match by_identifier.or_else(by_tag) {
            Some(params) => params.as_str(),
            None if platform.is_common() => return None,
            None => self.params.as_str(),
        };

        if params.eq_ignore_ascii_case(SKIP_PARAMS) {
            None
        } else {
            Some(params)
        }
    }

    pub fn product_asset_type(&self) -> Option<AssetType> {
        self.product_asset_type.as_deref().and_then(AssetType::parse)
    }

    /// The packed sub id declared by `product_sub_id` and `product_lod`, or
    /// `None` when neither is set.
    pub fn declared_sub_id(&self, policy: OverflowPolicy) -> Result<Option<u32>, SubIdError> {
        if self.product_sub_id.is_none() && self.product_lod.is_none() {
            return Ok(None);
        }
        let id = self.product_sub_id.unwrap_or(0);
        let lod = self.product_lod.unwrap_or(0);
        construct_with_policy(id, lod, 0, policy).map(Some)
    }
}

/// Complete assetpipe.toml configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetPipeConfig {
    /// Project metadata (required)
    pub project: ProjectConfig,
    /// Platforms jobs are created for
    #[serde(default = "default_platforms")]
    pub platforms: BTreeMap<String, PlatformConfig>,
    #[serde(default)]
    pub subid: SubIdConfig,
    #[serde(default)]
    pub hashing: HashingConfig,
    #[serde(default)]
    pub recognizers: BTreeMap<String, RecognizerConfig>,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "recognizers.textures.pattern")
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "assetpipe.toml: '{}' {}", self.field, self.message)
    }
}

impl AssetPipeConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();
        let mut push = |field: String, message: &str| {
            errors.push(ConfigValidationError { field, message: message.to_string() });
        };

        if self.project.name.is_empty() {
            push("project.name".to_string(), "must be a non-empty string");
        }

        if self.platforms.is_empty() {
            push("platforms".to_string(), "must declare at least one platform");
        }
        for id in self.platforms.keys() {
            if id.eq_ignore_ascii_case(COMMON_PLATFORM_NAME) {
                push(format!("platforms.{}", id), "is reserved");
            }
        }

        if self.hashing.buffer_size == 0 {
            push("hashing.buffer_size".to_string(), "must be a positive integer");
        }

        let platforms = self.platform_infos();
        for (name, recognizer) in &self.recognizers {
            if recognizer.pattern.is_empty() {
                push(format!("recognizers.{}.pattern", name), "must be a non-empty pattern");
            } else {
                let matcher = PatternMatcher::new(recognizer.builder_pattern());
                if !matcher.is_valid() {
                    push(format!("recognizers.{}.pattern", name), "is not a valid regular expression");
                }
            }

            if recognizer.product_asset_type.is_some() && recognizer.product_asset_type().is_none() {
                push(format!("recognizers.{}.product_asset_type", name), "must be a UUID");
            }

            // Truncation is checked when the sub id is packed
            if self.subid.overflow == OverflowPolicy::Reject {
                match recognizer.declared_sub_id(OverflowPolicy::Reject) {
                    Err(SubIdError::IdOutOfRange(_)) => {
                        push(format!("recognizers.{}.product_sub_id", name), "does not fit the id field");
                    }
                    Err(SubIdError::LodOutOfRange(_)) => {
                        push(format!("recognizers.{}.product_lod", name), "does not fit the LOD field");
                    }
                    Ok(_) => {}
                }
            }

            for key in recognizer.platforms.keys() {
                let known = key.eq_ignore_ascii_case(COMMON_PLATFORM_NAME)
                    || platforms.iter().any(|p| p.has_identifier(key) || p.has_tag(key));
                if !known {
                    push(
                        format!("recognizers.{}.platforms.{}", name, key),
                        "names no declared platform or tag",
                    );
                }
            }
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Declared platforms, in identifier order.
    pub fn platform_infos(&self) -> Vec<PlatformInfo> {
        self.platforms
            .iter()
            .map(|(id, platform)| PlatformInfo::new(id.clone(), platform.tags.iter().cloned()))
            .collect()
    }
}
