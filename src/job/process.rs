//! ProcessJob request and response.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::platform::PlatformInfo;

use super::dependency::SourceFileDependency;
use super::descriptor::JobDescriptor;
use super::gate::{self, ProductCollision};
use super::product::JobProduct;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessJobRequest {
    /// Relative to `watch_folder`.
    pub source_file: String,
    pub watch_folder: String,
    pub full_path: String,
    pub builder_guid: Uuid,
    pub job_description: JobDescriptor,
    /// Scratch directory owned by the builder for the duration of the call.
    pub temp_dir_path: String,
    pub platform_info: PlatformInfo,
    #[serde(default)]
    pub source_file_dependency_list: Vec<SourceFileDependency>,
    #[serde(default)]
    pub source_file_uuid: Uuid,
    pub job_id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProcessJobResultCode {
    Success,
    #[default]
    Failed,
    Crashed,
    Cancelled,
    NetworkIssue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessJobResponse {
    #[serde(default)]
    pub output_products: Vec<JobProduct>,
    pub result_code: ProcessJobResultCode,
    #[serde(default = "default_true")]
    pub requires_sub_id_generation: bool,
    /// Other sources the coordinator should revisit. Not validated here.
    #[serde(default)]
    pub sources_to_reprocess: Vec<String>,
    #[serde(default)]
    pub keep_temp_folder: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ProcessJobResponse {
    fn default() -> Self {
        Self::with_result(ProcessJobResultCode::Failed)
    }
}

impl ProcessJobResponse {
    pub fn with_result(result_code: ProcessJobResultCode) -> Self {
        Self {
            output_products: Vec::new(),
            result_code,
            requires_sub_id_generation: true,
            sources_to_reprocess: Vec::new(),
            keep_temp_folder: false,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.result_code == ProcessJobResultCode::Success
    }

    /// `false`, with an Error diagnostic per collision, if two products
    /// share a sub id.
    pub fn report_product_collisions(&self) -> bool {
        gate::report_collisions(&self.output_products)
    }

    pub fn product_collisions(&self) -> Vec<ProductCollision> {
        gate::find_collisions(&self.output_products)
    }

    /// Products the coordinator may persist: all of them on success, none otherwise.
    pub fn persistable_products(&self) -> &[JobProduct] {
        if self.succeeded() {
            &self.output_products
        } else {
            &[]
        }
    }
}
