//! Routing command implementations (route, jobs)

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use uuid::Uuid;

use crate::builder::BuilderRegistry;
use crate::config::{find_config, project_root, AssetPipeConfig};
use crate::copy_builder::register_recognizers;
use crate::job::{sort_for_dispatch, CreateJobsRequest};
use crate::runner::run_create_jobs;

use super::{EXIT_ERROR, EXIT_SUCCESS};

pub(super) fn build_registry(config: &AssetPipeConfig) -> Result<BuilderRegistry, ExitCode> {
    let mut registry = BuilderRegistry::new();
    match register_recognizers(&mut registry, &config.recognizers, config.subid.overflow) {
        Ok(count) => {
            log::debug!("registered {} recognizers", count);
            Ok(registry)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            Err(ExitCode::from(EXIT_ERROR))
        }
    }
}

/// Execute the route command
pub fn run_route(config: &AssetPipeConfig, path: &str) -> ExitCode {
    let registry = match build_registry(config) {
        Ok(registry) => registry,
        Err(code) => return code,
    };

    let claimed = registry.find_builders_for_path(path);
    if claimed.is_empty() {
        eprintln!("No recognizer claims '{}'", path);
        return ExitCode::from(EXIT_ERROR);
    }

    for entry in claimed {
        let patterns: Vec<String> = entry.descriptor.patterns.iter().map(|p| p.to_string()).collect();
        println!("{}  {}  {}", entry.descriptor.name, entry.descriptor.id, patterns.join(" "));
    }
    ExitCode::from(EXIT_SUCCESS)
}

/// Directory holding the config file, or the current directory without one.
pub(super) fn project_dir(config_path: Option<&Path>) -> PathBuf {
    let config_path = config_path.map(Path::to_path_buf).or_else(find_config);
    config_path
        .as_deref()
        .and_then(project_root)
        .map(Path::to_path_buf)
        .or_else(|| env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Execute the jobs command
pub fn run_jobs(
    config: &AssetPipeConfig,
    config_path: Option<&Path>,
    source: &str,
    watch_folder: Option<&Path>,
) -> ExitCode {
    let registry = match build_registry(config) {
        Ok(registry) => registry,
        Err(code) => return code,
    };

    let watch_folder = watch_folder.map(Path::to_path_buf).unwrap_or_else(|| project_dir(config_path));
    let platforms = config.platform_infos();
    let mut jobs = Vec::new();
    let mut failed = false;

    for entry in registry.find_builders_for_path(source) {
        let Some(builder) = entry.builder() else {
            continue;
        };
        let request = CreateJobsRequest::new(
            entry.descriptor.id,
            source,
            watch_folder.to_string_lossy(),
            platforms.clone(),
            Uuid::nil(),
        );
        let response = run_create_jobs(builder.as_ref(), &request);
        if !response.succeeded() {
            eprintln!("Error: recognizer '{}' failed to create jobs for '{}'", entry.descriptor.name, source);
            failed = true;
            continue;
        }
        jobs.extend(response.create_job_outputs);
    }

    sort_for_dispatch(&mut jobs);
    match serde_json::to_string_pretty(&jobs) {
        Ok(text) => println!("{}", text),
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    }

    if failed {
        ExitCode::from(EXIT_ERROR)
    } else {
        ExitCode::from(EXIT_SUCCESS)
    }
}
