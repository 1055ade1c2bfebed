//! Builder that copies matching sources into the product cache unchanged,
//! configured by a `[recognizers.<name>]` entry.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use uuid::Uuid;

use crate::asset::AssetType;
use crate::builder::registry::{BuilderRegistry, RegistryError};
use crate::builder::{Builder, BuilderDescriptor, BuilderFlags};
use crate::cancel::CancellationToken;
use crate::config::RecognizerConfig;
use crate::diagnostics;
use crate::job::{
    CreateJobsRequest, CreateJobsResponse, CreateJobsResultCode, JobDescriptor, JobProduct,
    ProcessJobRequest, ProcessJobResponse, ProcessJobResultCode,
};
use crate::subid::OverflowPolicy;

/// Namespace for deriving stable builder ids from recognizer names.
const RECOGNIZER_NAMESPACE: Uuid = Uuid::from_u128(0x5B0E_9C3A_1F7D_4E28_9A61_3C2B_7D4E_8F10);

const COPY_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct CopyBuilder {
    descriptor: BuilderDescriptor,
    recognizer: RecognizerConfig,
    overflow: OverflowPolicy,
}

enum CopyOutcome {
    Copied,
    Cancelled,
}

impl CopyBuilder {
    pub fn new(name: &str, recognizer: RecognizerConfig) -> Self {
        let mut descriptor = BuilderDescriptor::new(name, Self::builder_id(name))
            .with_pattern(recognizer.builder_pattern());
        descriptor.version = recognizer.version;
        descriptor.analysis_fingerprint = recognizer.analysis_fingerprint.clone();
        descriptor.flags = BuilderFlags::EMITS_NO_DEPENDENCIES;
        Self { descriptor, recognizer, overflow: OverflowPolicy::default() }
    }

    /// How a declared sub id that does not fit its fields is packed.
    pub fn with_overflow_policy(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }

    /// The id a recognizer named `name` registers under. Stable across runs.
    pub fn builder_id(name: &str) -> Uuid {
        Uuid::new_v5(&RECOGNIZER_NAMESPACE, name.as_bytes())
    }

    fn product_path(request: &ProcessJobRequest) -> Option<PathBuf> {
        let file_name = Path::new(&request.source_file).file_name()?;
        Some(Path::new(&request.temp_dir_path).join(file_name))
    }

    fn copy(source: &Path, destination: &Path, cancel: &CancellationToken) -> io::Result<CopyOutcome> {
        let mut reader = File::open(source)?;
        let mut writer = File::create(destination)?;
        let mut buffer = vec![0u8; COPY_CHUNK_SIZE];

        loop {
            if cancel.is_cancelled() {
                return Ok(CopyOutcome::Cancelled);
            }
            let read = reader.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            writer.write_all(&buffer[..read])?;
        }

        writer.flush()?;
        Ok(CopyOutcome::Copied)
    }
}

/// Register one [`CopyBuilder`] per recognizer entry.
pub fn register_recognizers(
    registry: &mut BuilderRegistry,
    recognizers: &BTreeMap<String, RecognizerConfig>,
    overflow: OverflowPolicy,
) -> Result<usize, RegistryError> {
    for (name, recognizer) in recognizers {
        let builder = CopyBuilder::new(name, recognizer.clone()).with_overflow_policy(overflow);
        registry.register_builder(Arc::new(builder))?;
    }
    Ok(recognizers.len())
}

impl Builder for CopyBuilder {
    fn descriptor(&self) -> BuilderDescriptor {
        self.descriptor.clone()
    }

    fn create_jobs(&self, request: &CreateJobsRequest) -> CreateJobsResponse {
        let mut response = CreateJobsResponse { result: CreateJobsResultCode::Success, ..Default::default() };

        for platform in &request.enabled_platforms {
            let Some(params) = self.recognizer.params_for(platform) else {
                continue;
            };
            let mut job = JobDescriptor::new(params, self.descriptor.name.clone(), platform.identifier.clone());
            job.critical = self.recognizer.critical;
            job.priority = self.recognizer.priority;
            job.check_server = self.recognizer.check_server;
            job.check_exclusive_lock = self.recognizer.lock_source;
            response.create_job_outputs.push(job);
        }

        response
    }

    fn process_job(&self, request: &ProcessJobRequest, cancel: &CancellationToken) -> ProcessJobResponse {
        if cancel.is_cancelled() {
            return ProcessJobResponse::with_result(ProcessJobResultCode::Cancelled);
        }

        let declared_sub_id = match self.recognizer.declared_sub_id(self.overflow) {
            Ok(sub_id) => sub_id,
            Err(err) => {
                diagnostics::error(format!("Recognizer '{}': {}", self.descriptor.name, err));
                return ProcessJobResponse::with_result(ProcessJobResultCode::Failed);
            }
        };

        let Some(destination) = Self::product_path(request) else {
            diagnostics::error(format!("Source path '{}' has no file name", request.source_file));
            return ProcessJobResponse::with_result(ProcessJobResultCode::Failed);
        };

        if let Err(err) = fs::create_dir_all(&request.temp_dir_path) {
            diagnostics::error(format!("Unable to create {}: {}", request.temp_dir_path, err));
            return ProcessJobResponse::with_result(ProcessJobResultCode::Failed);
        }

        match Self::copy(Path::new(&request.full_path), &destination, cancel) {
            Ok(CopyOutcome::Copied) => {}
            Ok(CopyOutcome::Cancelled) => {
                diagnostics::info(format!("Copy of {} cancelled", request.source_file));
                return ProcessJobResponse::with_result(ProcessJobResultCode::Cancelled);
            }
            Err(err) => {
                diagnostics::error(format!(
                    "Unable to copy {} to {}: {}",
                    request.full_path,
                    destination.display(),
                    err
                ));
                return ProcessJobResponse::with_result(ProcessJobResultCode::Failed);
            }
        }

        let declared = self.recognizer.product_asset_type().unwrap_or(AssetType::NULL);
        let mut product = JobProduct::new(destination.to_string_lossy(), declared, 0);
        if let Some(sub_id) = declared_sub_id {
            product.product_sub_id = sub_id;
        }
        if product.product_asset_type.is_null() {
            diagnostics::warning(format!(
                "No asset type could be determined for {}",
                product.product_file_name
            ));
        }

        let mut response = ProcessJobResponse::with_result(ProcessJobResultCode::Success);
        response.output_products.push(product);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legacy::table::TEXTURE;
    use crate::platform::PlatformInfo;
    use tempfile::TempDir;

    fn recognizer(toml_text: &str) -> RecognizerConfig {
        toml::from_str(toml_text).expect("should parse recognizer")
    }

    fn platforms() -> Vec<PlatformInfo> {
        vec![
            PlatformInfo::new("pc", ["tools"]),
            PlatformInfo::new("android", ["mobile"]),
            PlatformInfo::new("ios", ["mobile"]),
        ]
    }

    #[test]
    fn test_builder_id_is_stable() {
        assert_eq!(CopyBuilder::builder_id("textures"), CopyBuilder::builder_id("textures"));
        assert_ne!(CopyBuilder::builder_id("textures"), CopyBuilder::builder_id("audio"));
    }

    #[test]
    fn test_descriptor_from_recognizer() {
        let builder = CopyBuilder::new(
            "textures",
            recognizer("pattern = \"*.dds\"\nversion = 4\nanalysis_fingerprint = \"abc\""),
        );
        let descriptor = builder.descriptor();
        assert_eq!(descriptor.name, "textures");
        assert_eq!(descriptor.version, 4);
        assert_eq!(descriptor.analysis_fingerprint, "abc");
        assert_eq!(descriptor.patterns.len(), 1);
        assert!(descriptor.has_flag(BuilderFlags::EMITS_NO_DEPENDENCIES, "textures"));
    }

    #[test]
    fn test_create_jobs_per_platform() {
        let builder = CopyBuilder::new(
            "textures",
            recognizer(
                "pattern = \"*.dds\"\ncritical = true\npriority = 5\n[platforms]\nmobile = \"compressed\"\nios = \"skip\"",
            ),
        );
        let request = CreateJobsRequest::new(builder.descriptor().id, "rock.dds", "/p", platforms(), Uuid::nil());
        let response = builder.create_jobs(&request);

        assert!(response.succeeded());
        let jobs: Vec<(&str, &str)> = response
            .create_job_outputs
            .iter()
            .map(|j| (j.platform_identifier.as_str(), j.additional_fingerprint_info.as_str()))
            .collect();
        assert_eq!(jobs, vec![("pc", "copy"), ("android", "compressed")]);
        assert!(response.create_job_outputs.iter().all(|j| j.critical && j.priority == 5));
    }

    fn process_request(dir: &TempDir, source_name: &str) -> ProcessJobRequest {
        let full_path = dir.path().join(source_name);
        ProcessJobRequest {
            source_file: source_name.to_string(),
            watch_folder: dir.path().to_string_lossy().to_string(),
            full_path: full_path.to_string_lossy().to_string(),
            builder_guid: CopyBuilder::builder_id("textures"),
            job_description: JobDescriptor::new("copy", "textures", "pc"),
            temp_dir_path: dir.path().join("tmp").to_string_lossy().to_string(),
            platform_info: PlatformInfo::new("pc", ["tools"]),
            source_file_dependency_list: Vec::new(),
            source_file_uuid: Uuid::nil(),
            job_id: 1,
        }
    }

    #[test]
    fn test_process_copies_and_infers() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("rock.dds"), b"DDS data").unwrap();
        let builder = CopyBuilder::new("textures", recognizer("pattern = \"*.dds\""));

        let response = builder.process_job(&process_request(&dir, "rock.dds"), &CancellationToken::new());
        assert!(response.succeeded());
        assert_eq!(response.output_products.len(), 1);

        let product = &response.output_products[0];
        assert_eq!(product.product_asset_type, TEXTURE);
        assert_eq!(fs::read(&product.product_file_name).unwrap(), b"DDS data");
    }

    #[test]
    fn test_process_uses_declared_type() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), b"hello").unwrap();
        let builder = CopyBuilder::new(
            "notes",
            recognizer("pattern = \"*.txt\"\nproduct_asset_type = \"{11111111-2222-3333-4444-555555555555}\""),
        );

        let response = builder.process_job(&process_request(&dir, "notes.txt"), &CancellationToken::new());
        assert_eq!(
            response.output_products[0].product_asset_type,
            AssetType::parse("{11111111-2222-3333-4444-555555555555}").unwrap()
        );
    }

    #[test]
    fn test_process_cancelled_before_start() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("rock.dds"), b"DDS data").unwrap();
        let builder = CopyBuilder::new("textures", recognizer("pattern = \"*.dds\""));
        let token = CancellationToken::new();
        token.cancel();

        let response = builder.process_job(&process_request(&dir, "rock.dds"), &token);
        assert_eq!(response.result_code, ProcessJobResultCode::Cancelled);
    }

    #[test]
    fn test_register_recognizers() {
        let mut recognizers = BTreeMap::new();
        recognizers.insert("textures".to_string(), recognizer("pattern = \"*.dds\""));
        recognizers.insert("meshes".to_string(), recognizer("pattern = \"*.cgf\""));

        let mut registry = BuilderRegistry::new();
        let count = register_recognizers(&mut registry, &recognizers, OverflowPolicy::Truncate).unwrap();
        assert_eq!(count, 2);
        let names: Vec<&str> = registry
            .find_descriptors_for_path("objects/ROCK.DDS")
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(names, vec!["textures"]);
    }

    #[test]
    fn test_process_missing_source_fails() {
        let _absorber = diagnostics::Absorber::new(diagnostics::AbsorbMode::Absorb);
        let dir = TempDir::new().unwrap();
        let builder = CopyBuilder::new("textures", recognizer("pattern = \"*.dds\""));
        let response = builder.process_job(&process_request(&dir, "missing.dds"), &CancellationToken::new());
        assert_eq!(response.result_code, ProcessJobResultCode::Failed);
    }

    #[test]
    fn test_process_uses_declared_sub_id() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("rock.dds"), b"DDS data").unwrap();
        let declared = recognizer("pattern = \"*.dds\"\nproduct_sub_id = 9\nproduct_lod = 4");
        let builder = CopyBuilder::new("textures", declared).with_overflow_policy(OverflowPolicy::Reject);

        let response = builder.process_job(&process_request(&dir, "rock.dds"), &CancellationToken::new());
        assert!(response.succeeded());
        let sub_id = response.output_products[0].product_sub_id;
        assert_eq!(crate::subid::get_id(sub_id), 9);
        assert_eq!(crate::subid::get_lod(sub_id), 4);
    }

    #[test]
    fn test_oversized_sub_id_fails_under_reject() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("rock.dds"), b"DDS data").unwrap();
        let oversized = recognizer("pattern = \"*.dds\"\nproduct_lod = 20");

        let absorber = diagnostics::Absorber::new(diagnostics::AbsorbMode::Absorb);
        let rejecting =
            CopyBuilder::new("textures", oversized.clone()).with_overflow_policy(OverflowPolicy::Reject);
        let response = rejecting.process_job(&process_request(&dir, "rock.dds"), &CancellationToken::new());
        assert_eq!(response.result_code, ProcessJobResultCode::Failed);
        assert!(response.output_products.is_empty());
        assert_eq!(absorber.error_count(), 1);
        assert!(!dir.path().join("tmp").join("rock.dds").exists());

        // Truncation keeps the low bits and warns
        let truncating = CopyBuilder::new("textures", oversized);
        let response = truncating.process_job(&process_request(&dir, "rock.dds"), &CancellationToken::new());
        assert!(response.succeeded());
        assert_eq!(crate::subid::get_lod(response.output_products[0].product_sub_id), 20 & 0xF);
        assert!(absorber.last_message(diagnostics::Channel::Warning).is_some());
    }
}
