//! CreateJobs request and response.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::diagnostics;
use crate::platform::PlatformInfo;

use super::dependency::SourceFileDependency;
use super::descriptor::JobDescriptor;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateJobsRequest {
    pub builder_id: Uuid,
    /// Relative to `watch_folder`.
    pub source_file: String,
    pub watch_folder: String,
    pub enabled_platforms: Vec<PlatformInfo>,
    #[serde(default)]
    pub source_file_uuid: Uuid,
}

impl CreateJobsRequest {
    pub fn new(
        builder_id: Uuid,
        source_file: impl Into<String>,
        watch_folder: impl Into<String>,
        enabled_platforms: Vec<PlatformInfo>,
        source_file_uuid: Uuid,
    ) -> Self {
        Self {
            builder_id,
            source_file: source_file.into(),
            watch_folder: watch_folder.into(),
            enabled_platforms,
            source_file_uuid,
        }
    }

    /// Case-insensitive lookup over the enabled platforms.
    ///
    /// An empty identifier is a caller bug: it is reported on the Error
    /// channel and never matches.
    pub fn has_platform(&self, identifier: &str) -> bool {
        if identifier.is_empty() {
            diagnostics::error("has_platform called with an empty platform identifier");
            return false;
        }
        self.enabled_platforms.iter().any(|p| p.has_identifier(identifier))
    }

    pub fn has_platform_with_tag(&self, tag: &str) -> bool {
        if tag.is_empty() {
            diagnostics::error("has_platform_with_tag called with an empty tag");
            return false;
        }
        self.enabled_platforms.iter().any(|p| p.has_tag(tag))
    }

    pub fn platform(&self, identifier: &str) -> Option<&PlatformInfo> {
        self.enabled_platforms.iter().find(|p| p.has_identifier(identifier))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CreateJobsResultCode {
    #[default]
    Failed,
    /// The builder is going away; retry later.
    ShuttingDown,
    Success,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateJobsResponse {
    pub result: CreateJobsResultCode,
    #[serde(default)]
    pub source_file_dependency_list: Vec<SourceFileDependency>,
    #[serde(default)]
    pub create_job_outputs: Vec<JobDescriptor>,
}

impl CreateJobsResponse {
    pub fn succeeded(&self) -> bool {
        self.result == CreateJobsResultCode::Success
    }
}
