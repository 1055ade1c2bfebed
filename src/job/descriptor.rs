//! Job descriptors emitted by CreateJobs and dispatch ordering.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::dependency::JobDependency;

/// One platform-scoped unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescriptor {
    #[serde(default)]
    pub job_parameters: BTreeMap<u32, String>,
    #[serde(default)]
    pub additional_fingerprint_info: String,
    pub job_key: String,
    pub platform_identifier: String,
    /// Negative means "not considered" and sorts lowest.
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default)]
    pub critical: bool,
    #[serde(default)]
    pub check_exclusive_lock: bool,
    #[serde(default)]
    pub check_server: bool,
    #[serde(default)]
    pub job_dependency_list: Vec<JobDependency>,
    /// Errors reported while processing fail the job.
    #[serde(default)]
    pub fail_on_error: bool,
}

fn default_priority() -> i32 {
    -1
}

impl JobDescriptor {
    pub fn new(
        additional_fingerprint_info: impl Into<String>,
        job_key: impl Into<String>,
        platform_identifier: impl Into<String>,
    ) -> Self {
        Self {
            job_parameters: BTreeMap::new(),
            additional_fingerprint_info: additional_fingerprint_info.into(),
            job_key: job_key.into(),
            platform_identifier: platform_identifier.into(),
            priority: default_priority(),
            critical: false,
            check_exclusive_lock: false,
            check_server: false,
            job_dependency_list: Vec::new(),
            fail_on_error: false,
        }
    }

    pub fn with_dependency(mut self, dependency: JobDependency) -> Self {
        self.job_dependency_list.push(dependency);
        self
    }
}

/// Dispatch order between two jobs: critical jobs first, then higher priority.
///
/// Priorities are only compared within the same partition.
pub fn dispatch_order(a: &JobDescriptor, b: &JobDescriptor) -> Ordering {
    b.critical.cmp(&a.critical).then_with(|| b.priority.cmp(&a.priority))
}

/// Stable sort into dispatch order.
pub fn sort_for_dispatch(jobs: &mut [JobDescriptor]) {
    jobs.sort_by(dispatch_order);
}
