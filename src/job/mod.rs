//! Job lifecycle messages and the dependency edges between jobs.
//!
//! A builder first answers a [`CreateJobsRequest`] with zero or more
//! [`JobDescriptor`]s, then answers one [`ProcessJobRequest`] per descriptor
//! with a [`ProcessJobResponse`] listing its [`JobProduct`]s.

pub mod create;
pub mod dependency;
pub mod descriptor;
pub mod gate;
pub mod process;
pub mod product;

pub use create::{CreateJobsRequest, CreateJobsResponse, CreateJobsResultCode};
pub use dependency::{
    CompletionLedger, DependencyEdge, EdgeState, JobDependency, JobDependencyType,
    SourceDependencyType, SourceFileDependency,
};
pub use descriptor::{dispatch_order, sort_for_dispatch, JobDescriptor};
pub use gate::ProductCollision;
pub use process::{ProcessJobRequest, ProcessJobResponse, ProcessJobResultCode};
pub use product::{
    JobProduct, ProductDependency, ProductOutputFlags, ProductPathDependency,
    ProductPathDependencyType,
};
