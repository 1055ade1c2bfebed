//! In-process execution of builder callbacks.
//!
//! The runner owns the parts of a call that every builder needs: the cancel
//! listener for the job id, error counting on the worker thread, panic
//! containment, and the validation gate a response must pass before the
//! coordinator may persist anything from it.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::builder::Builder;
use crate::cancel::{CancellationRegistry, JobCancelListener};
use crate::diagnostics::{self, AbsorbMode, Absorber};
use crate::job::{
    CreateJobsRequest, CreateJobsResponse, CreateJobsResultCode, ProcessJobRequest,
    ProcessJobResponse, ProcessJobResultCode,
};
use crate::platform::platforms_as_string;

/// Run CreateJobs and drop any descriptor for a platform the request did not offer.
pub fn run_create_jobs(builder: &dyn Builder, request: &CreateJobsRequest) -> CreateJobsResponse {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| builder.create_jobs(request)));
    let mut response = match outcome {
        Ok(response) => response,
        Err(_) => {
            diagnostics::error(format!(
                "Builder '{}' panicked while creating jobs for {}",
                builder.descriptor().name,
                request.source_file
            ));
            return CreateJobsResponse { result: CreateJobsResultCode::Failed, ..Default::default() };
        }
    };

    response.create_job_outputs.retain(|job| {
        let offered = request.has_platform(&job.platform_identifier);
        if !offered {
            diagnostics::error(format!(
                "Job '{}' for {} targets platform '{}', which is not one of the enabled platforms ({})",
                job.job_key,
                request.source_file,
                job.platform_identifier,
                platforms_as_string(&request.enabled_platforms)
            ));
        }
        offered
    });

    response
}

/// Run ProcessJob on the current thread.
///
/// The job is cancellable through `cancellations` under `request.job_id`
/// for exactly the duration of the call.
pub fn run_process_job(
    builder: &dyn Builder,
    request: &ProcessJobRequest,
    cancellations: &CancellationRegistry,
) -> ProcessJobResponse {
    let listener = cancellations.listen(request.job_id);
    process_with_listener(builder, request, &listener)
}

/// Run ProcessJob on a new worker thread.
///
/// The cancel listener is registered before this returns, so a cancel issued
/// right after the call is never lost.
pub fn spawn_process_job(
    builder: Arc<dyn Builder>,
    request: ProcessJobRequest,
    cancellations: &CancellationRegistry,
) -> JoinHandle<ProcessJobResponse> {
    let listener = cancellations.listen(request.job_id);
    thread::spawn(move || process_with_listener(builder.as_ref(), &request, &listener))
}

fn process_with_listener(
    builder: &dyn Builder,
    request: &ProcessJobRequest,
    listener: &JobCancelListener,
) -> ProcessJobResponse {
    let absorber = Absorber::new(AbsorbMode::CountErrors);
    let outcome =
        panic::catch_unwind(AssertUnwindSafe(|| builder.process_job(request, listener.token())));

    let mut response = match outcome {
        Ok(response) => response,
        Err(_) => {
            diagnostics::error(format!(
                "Builder '{}' crashed processing {} (job {})",
                builder.descriptor().name,
                request.source_file,
                request.job_id
            ));
            return ProcessJobResponse::with_result(ProcessJobResultCode::Crashed);
        }
    };

    if !response.succeeded() {
        return response;
    }

    if request.job_description.fail_on_error && absorber.error_count() > 0 {
        diagnostics::warning(format!(
            "Job {} reported {} error(s) and fails on error",
            request.job_id,
            absorber.error_count()
        ));
        response.result_code = ProcessJobResultCode::Failed;
        return response;
    }

    if !response.report_product_collisions() {
        response.result_code = ProcessJobResultCode::Failed;
    }

    response
}
