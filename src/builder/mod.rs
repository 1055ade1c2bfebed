//! Builder identity and the registration boundary.
//!
//! A builder announces itself with a [`BuilderDescriptor`] and, when it runs
//! in-process, an implementation of [`Builder`]. Routing lives in
//! [`registry`].

pub mod registry;

use std::collections::{HashMap, HashSet};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::asset::AssetId;
use crate::cancel::CancellationToken;
use crate::job::{CreateJobsRequest, CreateJobsResponse, ProcessJobRequest, ProcessJobResponse};
use crate::pattern::BuilderPattern;

pub use registry::{BuilderRegistry, MatchMode, RegisteredBuilder, Registration, RegistryError};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct BuilderFlags: u8 {
        /// Products never declare dependencies; dependency scanning is skipped.
        const EMITS_NO_DEPENDENCIES = 1 << 0;
        /// On failure, remove the last good product instead of keeping it.
        const DELETE_LAST_KNOWN_GOOD_PRODUCT_ON_FAILURE = 1 << 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BuilderType {
    #[default]
    Internal,
    External,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuilderDescriptor {
    pub name: String,
    pub id: Uuid,
    /// Evaluated in order.
    #[serde(default)]
    pub patterns: Vec<BuilderPattern>,
    /// Bumping it invalidates every job fingerprint this builder produced.
    #[serde(default)]
    pub version: i32,
    /// Changing it forces CreateJobs to run again for every owned file.
    #[serde(default)]
    pub analysis_fingerprint: String,
    #[serde(default)]
    pub flags: BuilderFlags,
    #[serde(default)]
    pub flags_by_job_key: HashMap<String, BuilderFlags>,
    #[serde(default)]
    pub builder_type: BuilderType,
    /// Products kept even when their job fails, by job key.
    #[serde(default)]
    pub products_to_keep_on_failure: HashMap<String, HashSet<AssetId>>,
}

impl BuilderDescriptor {
    pub fn new(name: impl Into<String>, id: Uuid) -> Self {
        Self {
            name: name.into(),
            id,
            patterns: Vec::new(),
            version: 0,
            analysis_fingerprint: String::new(),
            flags: BuilderFlags::empty(),
            flags_by_job_key: HashMap::new(),
            builder_type: BuilderType::Internal,
            products_to_keep_on_failure: HashMap::new(),
        }
    }

    pub fn with_pattern(mut self, pattern: BuilderPattern) -> Self {
        self.patterns.push(pattern);
        self
    }

    /// Add flags for one job key only.
    pub fn add_flags(&mut self, flags: BuilderFlags, job_key: impl Into<String>) {
        *self.flags_by_job_key.entry(job_key.into()).or_default() |= flags;
    }

    /// True if `flag` is set globally or for `job_key`.
    pub fn has_flag(&self, flag: BuilderFlags, job_key: &str) -> bool {
        if self.flags.contains(flag) {
            return true;
        }
        self.flags_by_job_key.get(job_key).is_some_and(|flags| flags.contains(flag))
    }

    pub fn is_external(&self) -> bool {
        self.builder_type == BuilderType::External
    }

    /// Keep `product` in the cache when a run of `job_key` fails.
    pub fn keep_on_failure(&mut self, job_key: impl Into<String>, product: AssetId) {
        self.products_to_keep_on_failure.entry(job_key.into()).or_default().insert(product);
    }

    pub fn products_to_keep_on_failure(&self, job_key: &str) -> Option<&HashSet<AssetId>> {
        self.products_to_keep_on_failure.get(job_key)
    }

    /// Whether a failed run of `job_key` deletes the last good `product`.
    pub fn deletes_on_failure(&self, job_key: &str, product: &AssetId) -> bool {
        self.has_flag(BuilderFlags::DELETE_LAST_KNOWN_GOOD_PRODUCT_ON_FAILURE, job_key)
            && !self.products_to_keep_on_failure(job_key).is_some_and(|keep| keep.contains(product))
    }
}

/// An in-process builder.
///
/// Both calls report failure through the response value; they must not panic,
/// and a panic is treated as a crash of the builder.
pub trait Builder: Send + Sync {
    fn descriptor(&self) -> BuilderDescriptor;

    fn create_jobs(&self, request: &CreateJobsRequest) -> CreateJobsResponse;

    /// Long-running work polls `cancel` and returns `Cancelled` once it is set.
    fn process_job(&self, request: &ProcessJobRequest, cancel: &CancellationToken) -> ProcessJobResponse;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_flag_global_or_per_key() {
        let mut descriptor = BuilderDescriptor::new("Shader", Uuid::from_u128(1));
        assert!(!descriptor.has_flag(BuilderFlags::EMITS_NO_DEPENDENCIES, "compile"));

        descriptor.add_flags(BuilderFlags::EMITS_NO_DEPENDENCIES, "compile");
        assert!(descriptor.has_flag(BuilderFlags::EMITS_NO_DEPENDENCIES, "compile"));
        assert!(!descriptor.has_flag(BuilderFlags::EMITS_NO_DEPENDENCIES, "reflect"));

        descriptor.flags = BuilderFlags::DELETE_LAST_KNOWN_GOOD_PRODUCT_ON_FAILURE;
        assert!(descriptor.has_flag(BuilderFlags::DELETE_LAST_KNOWN_GOOD_PRODUCT_ON_FAILURE, "reflect"));
    }

    #[test]
    fn test_add_flags_accumulates() {
        let mut descriptor = BuilderDescriptor::new("Shader", Uuid::from_u128(1));
        descriptor.add_flags(BuilderFlags::EMITS_NO_DEPENDENCIES, "compile");
        descriptor.add_flags(BuilderFlags::DELETE_LAST_KNOWN_GOOD_PRODUCT_ON_FAILURE, "compile");
        assert_eq!(descriptor.flags_by_job_key["compile"], BuilderFlags::all());
    }

    #[test]
    fn test_builder_type() {
        let mut descriptor = BuilderDescriptor::new("Remote", Uuid::from_u128(2));
        assert!(!descriptor.is_external());
        descriptor.builder_type = BuilderType::External;
        assert!(descriptor.is_external());
    }

    #[test]
    fn test_products_kept_on_failure() {
        let source = Uuid::from_u128(40);
        let kept = AssetId::new(source, 1);
        let dropped = AssetId::new(source, 2);

        let mut descriptor = BuilderDescriptor::new("Shader", Uuid::from_u128(1));
        descriptor.keep_on_failure("compile", kept);
        assert!(descriptor.products_to_keep_on_failure("compile").is_some_and(|k| k.contains(&kept)));
        assert!(descriptor.products_to_keep_on_failure("reflect").is_none());

        // Nothing is deleted until the builder asks for it
        assert!(!descriptor.deletes_on_failure("compile", &dropped));

        descriptor.add_flags(BuilderFlags::DELETE_LAST_KNOWN_GOOD_PRODUCT_ON_FAILURE, "compile");
        assert!(descriptor.deletes_on_failure("compile", &dropped));
        assert!(!descriptor.deletes_on_failure("compile", &kept));
        assert!(!descriptor.deletes_on_failure("reflect", &dropped));
    }
}
