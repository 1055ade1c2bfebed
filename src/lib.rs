//! assetpipe - Asset build orchestration
//!
//! This library provides the contract between a build coordinator and the
//! builders that turn source assets into products:
//! - Route source paths to builders by wildcard or regex patterns
//! - Describe jobs, their dependencies and the products they emit
//! - Pack and infer product sub ids
//! - Cancel running jobs and fingerprint their inputs
//! - Stage jobs in scratch directories and cache their products

pub mod asset;
pub mod builder;
pub mod cancel;
pub mod cli;
pub mod config;
pub mod copy_builder;
pub mod diagnostics;
pub mod fingerprint;
pub mod job;
pub mod legacy;
pub mod pattern;
pub mod platform;
pub mod runner;
pub mod subid;
pub mod transport;
pub mod workspace;

pub use asset::{AssetId, AssetType};
pub use builder::{Builder, BuilderDescriptor, BuilderRegistry};
pub use cancel::{CancellationRegistry, CancellationToken};
pub use fingerprint::{ContentHasher, JobFingerprint};
pub use pattern::{BuilderPattern, PatternKind, PatternMatcher};
pub use platform::PlatformInfo;
