//! Build command implementation

use std::path::Path;
use std::process::ExitCode;

use uuid::Uuid;

use crate::cancel::CancellationRegistry;
use crate::config::AssetPipeConfig;
use crate::job::{sort_for_dispatch, CreateJobsRequest};
use crate::runner::{run_create_jobs, run_process_job};
use crate::workspace::JobWorkspace;

use super::route::{build_registry, project_dir};
use super::{EXIT_ERROR, EXIT_SUCCESS};

/// Execute the build command
///
/// Every recognizer that claims `source` creates its jobs, and each job is
/// processed in its own scratch directory under the configured temp root.
/// Products are committed into the configured cache.
pub fn run_build(
    config: &AssetPipeConfig,
    config_path: Option<&Path>,
    source: &str,
    watch_folder: Option<&Path>,
) -> ExitCode {
    let registry = match build_registry(config) {
        Ok(registry) => registry,
        Err(code) => return code,
    };

    let root = project_dir(config_path);
    let watch_folder = watch_folder.map(Path::to_path_buf).unwrap_or_else(|| root.clone());
    let workspace = JobWorkspace::from_config(config, &root);
    log::info!(
        "temp {} cache {}",
        workspace.temp_root().display(),
        workspace.cache_root().display()
    );

    let claimed = registry.find_builders_for_path(source);
    if claimed.is_empty() {
        eprintln!("No recognizer claims '{}'", source);
        return ExitCode::from(EXIT_ERROR);
    }

    let cancellations = CancellationRegistry::new();
    let platforms = config.platform_infos();
    let mut next_job_id = 1;
    let mut failed = false;

    for entry in claimed {
        let Some(builder) = entry.builder() else {
            continue;
        };
        let create = CreateJobsRequest::new(
            entry.descriptor.id,
            source,
            watch_folder.to_string_lossy(),
            platforms.clone(),
            Uuid::nil(),
        );
        let created = run_create_jobs(builder.as_ref(), &create);
        if !created.succeeded() {
            eprintln!(
                "Error: recognizer '{}' failed to create jobs for '{}'",
                entry.descriptor.name, source
            );
            failed = true;
            continue;
        }

        let mut jobs = created.create_job_outputs;
        sort_for_dispatch(&mut jobs);
        for job in jobs {
            let job_id = next_job_id;
            next_job_id += 1;
            let label =
                format!("{} {} [{}]", entry.descriptor.name, job.platform_identifier, job.job_key);

            let dependencies = &created.source_file_dependency_list;
            let request = match workspace.prepare(&create, dependencies, job, job_id) {
                Ok(request) => request,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    failed = true;
                    continue;
                }
            };

            let response = run_process_job(builder.as_ref(), &request, &cancellations);
            failed |= !response.succeeded();

            match workspace.commit(&entry.descriptor, &request, &response) {
                Ok(report) => {
                    println!("{}: {:?}", label, response.result_code);
                    for path in &report.persisted {
                        println!("  + {}", path.display());
                    }
                    for path in &report.removed {
                        println!("  - {}", path.display());
                    }
                    for path in &report.kept {
                        println!("  = {}", path.display());
                    }
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    failed = true;
                }
            }
        }
    }

    if failed {
        ExitCode::from(EXIT_ERROR)
    } else {
        ExitCode::from(EXIT_SUCCESS)
    }
}
