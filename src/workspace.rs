//! Job workspace: per-job scratch directories and the product cache.
//!
//! The workspace turns the `[project]` `temp` and `cache` directories into
//! concrete locations for one job. It writes the ProcessJob exchange files
//! and moves persistable products into the cache. When a job fails, it
//! removes the last good products the builder asked to drop.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::asset::{AssetId, AssetType};
use crate::builder::BuilderDescriptor;
use crate::config::{resolve_path, AssetPipeConfig};
use crate::job::{
    CreateJobsRequest, JobDescriptor, ProcessJobRequest, ProcessJobResponse, SourceFileDependency,
};
use crate::transport::{self, TransportError, Versioned};

/// Prefix of every per-job scratch directory under the temp root.
pub const JOB_TEMP_PREFIX: &str = "JobTemp-";

/// Suffix of the per-job record of cached products.
pub const PRODUCT_RECORD_SUFFIX: &str = ".products.json";

/// Workspace error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WorkspaceError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("Job '{job_key}' targets platform '{platform}', which the request did not enable")]
    UnknownPlatform { job_key: String, platform: String },
    #[error("Product '{0}' has no file name")]
    ProductName(String),
}

/// One product copied into the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedProduct {
    pub path: PathBuf,
    pub asset_type: AssetType,
    pub sub_id: u32,
}

/// Products a job last left in the cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub products: Vec<CachedProduct>,
}

impl Versioned for ProductRecord {
    const MESSAGE: &'static str = "ProductRecord";
    const SCHEMA_VERSION: u32 = 1;
}

/// What [`JobWorkspace::commit`] did to the cache.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitReport {
    /// Products copied into the cache by this run.
    pub persisted: Vec<PathBuf>,
    /// Cached products deleted: stale outputs on success, dropped last good
    /// products on failure.
    pub removed: Vec<PathBuf>,
    /// Last good products left in place after a failure.
    pub kept: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct JobWorkspace {
    temp_root: PathBuf,
    cache_root: PathBuf,
}

impl JobWorkspace {
    /// Relative `temp` and `cache` paths resolve against `project_root`.
    pub fn new(project_root: &Path, temp: &Path, cache: &Path) -> Self {
        Self {
            temp_root: resolve_path(project_root, temp),
            cache_root: resolve_path(project_root, cache),
        }
    }

    pub fn from_config(config: &AssetPipeConfig, project_root: &Path) -> Self {
        Self::new(project_root, &config.project.temp, &config.project.cache)
    }

    pub fn temp_root(&self) -> &Path {
        &self.temp_root
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    pub fn job_temp_dir(&self, job_id: u64) -> PathBuf {
        self.temp_root.join(format!("{}{}", JOB_TEMP_PREFIX, job_id))
    }

    /// `<cache>/<platform>/<source directory>`, lowercased.
    pub fn cache_dir(&self, platform: &str, source_file: &str) -> PathBuf {
        let mut dir = self.cache_root.join(platform.to_lowercase());
        let normalized = source_file.replace('\\', "/").to_lowercase();
        if let Some((parent, _)) = normalized.rsplit_once('/') {
            let parts = parent.split('/').filter(|part| !part.is_empty() && *part != "." && *part != "..");
            dir.extend(parts);
        }
        dir
    }

    fn record_path(&self, request: &ProcessJobRequest) -> PathBuf {
        let source_name = request.source_file.rsplit(['/', '\\']).next().unwrap_or(&request.source_file);
        let job_key: String = request
            .job_description
            .job_key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.cache_dir(&request.platform_info.identifier, &request.source_file)
            .join(format!("{}.{}{}", source_name.to_lowercase(), job_key, PRODUCT_RECORD_SUFFIX))
    }

    /// Build the ProcessJob request for `job`, create its scratch directory
    /// and write the request file into it.
    pub fn prepare(
        &self,
        create: &CreateJobsRequest,
        dependencies: &[SourceFileDependency],
        job: JobDescriptor,
        job_id: u64,
    ) -> Result<ProcessJobRequest, WorkspaceError> {
        let platform_info = create.platform(&job.platform_identifier).cloned().ok_or_else(|| {
            WorkspaceError::UnknownPlatform {
                job_key: job.job_key.clone(),
                platform: job.platform_identifier.clone(),
            }
        })?;

        let temp_dir = self.job_temp_dir(job_id);
        fs::create_dir_all(&temp_dir)?;

        let full_path = Path::new(&create.watch_folder).join(&create.source_file);
        let request = ProcessJobRequest {
            source_file: create.source_file.clone(),
            watch_folder: create.watch_folder.clone(),
            full_path: full_path.to_string_lossy().into_owned(),
            builder_guid: create.builder_id,
            job_description: job,
            temp_dir_path: temp_dir.to_string_lossy().into_owned(),
            platform_info,
            source_file_dependency_list: dependencies.to_vec(),
            source_file_uuid: create.source_file_uuid,
            job_id,
        };
        transport::write_request(&temp_dir, &request)?;
        log::debug!("prepared job {} in {}", job_id, temp_dir.display());
        Ok(request)
    }

    /// Record the response next to the request and update the cache.
    ///
    /// On success every persistable product is copied into the cache, cached
    /// products this run no longer emits are removed, and the scratch
    /// directory is deleted unless the response asks to keep it. On failure
    /// the scratch directory stays, and last good products are removed only
    /// where `descriptor` asks for it for this job key.
    pub fn commit(
        &self,
        descriptor: &BuilderDescriptor,
        request: &ProcessJobRequest,
        response: &ProcessJobResponse,
    ) -> Result<CommitReport, WorkspaceError> {
        let temp_dir = Path::new(&request.temp_dir_path);
        transport::write_response(temp_dir, response)?;

        let record_path = self.record_path(request);
        let previous = self.read_record(&record_path)?;
        let mut report = CommitReport::default();

        if !response.succeeded() {
            let job_key = &request.job_description.job_key;
            let mut kept = ProductRecord::default();
            for product in previous.products {
                let id = AssetId::new(request.source_file_uuid, product.sub_id);
                if descriptor.deletes_on_failure(job_key, &id) {
                    remove_if_present(&product.path)?;
                    report.removed.push(product.path);
                } else {
                    report.kept.push(product.path.clone());
                    kept.products.push(product);
                }
            }
            self.write_record(&record_path, &kept)?;
            log::info!(
                "job {} ended {:?}; scratch directory kept at {}",
                request.job_id,
                response.result_code,
                temp_dir.display()
            );
            return Ok(report);
        }

        let cache_dir = self.cache_dir(&request.platform_info.identifier, &request.source_file);
        fs::create_dir_all(&cache_dir)?;

        let mut record = ProductRecord::default();
        for product in response.persistable_products() {
            let produced = resolve_path(temp_dir, Path::new(&product.product_file_name));
            let file_name = produced
                .file_name()
                .ok_or_else(|| WorkspaceError::ProductName(product.product_file_name.clone()))?;
            let cached = cache_dir.join(file_name);
            fs::copy(&produced, &cached)?;
            record.products.push(CachedProduct {
                path: cached.clone(),
                asset_type: product.product_asset_type,
                sub_id: product.product_sub_id,
            });
            report.persisted.push(cached);
        }

        for stale in previous.products {
            if !report.persisted.contains(&stale.path) {
                remove_if_present(&stale.path)?;
                report.removed.push(stale.path);
            }
        }

        self.write_record(&record_path, &record)?;
        if !response.keep_temp_folder {
            fs::remove_dir_all(temp_dir)?;
        }
        Ok(report)
    }

    fn read_record(&self, path: &Path) -> Result<ProductRecord, WorkspaceError> {
        if !path.exists() {
            return Ok(ProductRecord::default());
        }
        Ok(transport::read_message(path)?)
    }

    fn write_record(&self, path: &Path, record: &ProductRecord) -> Result<(), WorkspaceError> {
        if record.products.is_empty() {
            remove_if_present(path)?;
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(transport::write_message(path, record)?)
    }
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
