//! Source-to-source and job-to-job dependency edges.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pattern::PatternMatcher;

/// How [`SourceFileDependency::path`] is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SourceDependencyType {
    #[default]
    Absolute,
    /// The path is a wildcard pattern over source paths.
    Wildcards,
}

/// A dependency on another source file, by path, by UUID, or both.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SourceFileDependency {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub uuid: Uuid,
    #[serde(default)]
    pub dependency_type: SourceDependencyType,
}

impl SourceFileDependency {
    pub fn by_path(path: impl Into<String>) -> Self {
        Self { path: path.into(), ..Default::default() }
    }

    pub fn by_uuid(uuid: Uuid) -> Self {
        Self { uuid, ..Default::default() }
    }

    pub fn wildcard(pattern: impl Into<String>) -> Self {
        Self { path: pattern.into(), dependency_type: SourceDependencyType::Wildcards, ..Default::default() }
    }

    /// At least one of path or UUID is populated.
    pub fn is_valid(&self) -> bool {
        !self.path.is_empty() || !self.uuid.is_nil()
    }

    /// Whether a concrete source path satisfies this dependency's path part.
    pub fn matches_path(&self, candidate: &str) -> bool {
        if self.path.is_empty() {
            return false;
        }
        match self.dependency_type {
            SourceDependencyType::Absolute => {
                normalize_separators(&self.path).eq_ignore_ascii_case(&normalize_separators(candidate))
            }
            SourceDependencyType::Wildcards => {
                PatternMatcher::wildcard(normalize_separators(&self.path))
                    .matches_path(&normalize_separators(candidate))
            }
        }
    }
}

impl fmt::Display for SourceFileDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceFileDependency UUID: {} NAME: {}", self.uuid, self.path)
    }
}

pub(crate) fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum JobDependencyType {
    /// The referenced job's fingerprint feeds the dependent job's fingerprint.
    #[default]
    Fingerprint,
    /// The referenced job completes before the dependent job starts, every time.
    Order,
    /// Like `Order`, only until the referenced job has succeeded once.
    OrderOnce,
}

/// An edge from a dependent job to the job identified by
/// (source file, job key, platform).
///
/// Equality and hashing cover the identifying fields only;
/// `product_sub_ids` narrows the edge but does not change which job it names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobDependency {
    pub source_file: SourceFileDependency,
    pub job_key: String,
    pub platform_identifier: String,
    #[serde(default)]
    pub dependency_type: JobDependencyType,
    #[serde(default)]
    pub product_sub_ids: Vec<u32>,
}

impl JobDependency {
    pub fn new(
        job_key: impl Into<String>,
        platform_identifier: impl Into<String>,
        dependency_type: JobDependencyType,
        source_file: SourceFileDependency,
    ) -> Self {
        Self {
            source_file,
            job_key: job_key.into(),
            platform_identifier: platform_identifier.into(),
            dependency_type,
            product_sub_ids: Vec::new(),
        }
    }

    /// Comma-joined decimal sub ids, for diagnostics.
    pub fn concatenate_sub_ids(&self) -> String {
        self.product_sub_ids.iter().map(u32::to_string).collect::<Vec<_>>().join(",")
    }

    /// Whether `source_file` names the source of the referenced job.
    ///
    /// A UUID match wins; otherwise the path part is compared the way
    /// [`SourceFileDependency::matches_path`] compares it.
    fn references_source(&self, uuid: &Uuid, path: &str) -> bool {
        if !self.source_file.uuid.is_nil() && self.source_file.uuid == *uuid {
            return true;
        }
        !path.is_empty() && self.source_file.matches_path(path)
    }
}

impl PartialEq for JobDependency {
    fn eq(&self, other: &Self) -> bool {
        self.source_file == other.source_file
            && self.job_key == other.job_key
            && self.platform_identifier == other.platform_identifier
            && self.dependency_type == other.dependency_type
    }
}

impl Eq for JobDependency {}

impl Hash for JobDependency {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source_file.hash(state);
        self.job_key.hash(state);
        self.platform_identifier.hash(state);
        self.dependency_type.hash(state);
    }
}

/// A job that completed: its source UUID and normalized path, job key and platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CompletedJob {
    uuid: Uuid,
    path: String,
    job_key: String,
    platform: String,
}

/// Record of jobs that have completed successfully at least once.
///
/// A job is found again by source UUID or by source path, whichever the
/// dependency carries. Entries are never removed, so an `OrderOnce` edge
/// that has gone inert stays inert.
#[derive(Debug, Clone, Default)]
pub struct CompletionLedger {
    completed: HashSet<CompletedJob>,
}

impl CompletionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(
        &mut self,
        source_file: &SourceFileDependency,
        job_key: impl Into<String>,
        platform_identifier: impl Into<String>,
    ) {
        let path = match source_file.dependency_type {
            SourceDependencyType::Absolute => normalize_separators(&source_file.path).to_lowercase(),
            SourceDependencyType::Wildcards => String::new(),
        };
        self.completed.insert(CompletedJob {
            uuid: source_file.uuid,
            path,
            job_key: job_key.into(),
            platform: platform_identifier.into().to_ascii_lowercase(),
        });
    }

    pub fn has_completed(&self, dependency: &JobDependency) -> bool {
        self.completed.iter().any(|job| {
            job.job_key == dependency.job_key
                && job.platform.eq_ignore_ascii_case(&dependency.platform_identifier)
                && dependency.references_source(&job.uuid, &job.path)
        })
    }

    pub fn len(&self) -> usize {
        self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.completed.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeState {
    Unsatisfied,
    Satisfied,
}

/// A [`JobDependency`] as seen by one analysis pass.
#[derive(Debug, Clone)]
pub struct DependencyEdge {
    dependency: JobDependency,
    state: EdgeState,
    referenced_ever_succeeded: bool,
}

impl DependencyEdge {
    /// Resolve an edge against what has completed so far.
    pub fn resolve(dependency: JobDependency, ledger: &CompletionLedger) -> Self {
        let referenced_ever_succeeded = ledger.has_completed(&dependency);
        Self { dependency, state: EdgeState::Unsatisfied, referenced_ever_succeeded }
    }

    pub fn dependency(&self) -> &JobDependency {
        &self.dependency
    }

    pub fn state(&self) -> EdgeState {
        self.state
    }

    /// The referenced job finished successfully in this pass. The success
    /// is recorded in `ledger` so later passes see it too.
    pub fn mark_satisfied(&mut self, ledger: &mut CompletionLedger) {
        let dependency = &self.dependency;
        ledger.record_success(
            &dependency.source_file,
            dependency.job_key.clone(),
            dependency.platform_identifier.clone(),
        );
        self.state = EdgeState::Satisfied;
        self.referenced_ever_succeeded = true;
    }

    /// The referenced job was queued again; ordering must wait for it.
    pub fn mark_unsatisfied(&mut self) {
        self.state = EdgeState::Unsatisfied;
    }

    /// Whether the scheduler must order the referenced job first.
    pub fn is_enforced(&self) -> bool {
        match self.dependency.dependency_type {
            JobDependencyType::Fingerprint => false,
            JobDependencyType::Order => true,
            JobDependencyType::OrderOnce => !self.referenced_ever_succeeded,
        }
    }

    /// An `OrderOnce` edge whose referenced job has already succeeded once.
    pub fn is_inert(&self) -> bool {
        self.dependency.dependency_type == JobDependencyType::OrderOnce
            && self.referenced_ever_succeeded
    }

    /// Whether the dependent job may not start yet.
    pub fn blocks_start(&self) -> bool {
        self.is_enforced() && self.state == EdgeState::Unsatisfied
    }

    pub fn contributes_to_fingerprint(&self) -> bool {
        self.dependency.dependency_type == JobDependencyType::Fingerprint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_once_dependency() -> JobDependency {
        JobDependency::new(
            "compile",
            "pc",
            JobDependencyType::OrderOnce,
            SourceFileDependency::by_path("shaders/common.shader"),
        )
    }

    #[test]
    fn test_source_dependency_validity() {
        assert!(!SourceFileDependency::default().is_valid());
        assert!(SourceFileDependency::by_path("a.txt").is_valid());
        assert!(SourceFileDependency::by_uuid(Uuid::from_u128(5)).is_valid());
    }

    #[test]
    fn test_source_dependency_equality_covers_all_fields() {
        let a = SourceFileDependency::by_path("a.txt");
        let mut b = a.clone();
        assert_eq!(a, b);
        b.uuid = Uuid::from_u128(1);
        assert_ne!(a, b);
        assert_ne!(a, SourceFileDependency::wildcard("a.txt"));
    }

    #[test]
    fn test_source_dependency_matches_path() {
        let absolute = SourceFileDependency::by_path("textures\\rock.tif");
        assert!(absolute.matches_path("Textures/Rock.tif"));
        assert!(!absolute.matches_path("textures/rock.png"));

        let wildcard = SourceFileDependency::wildcard("shaders/*.azsli");
        assert!(wildcard.matches_path("shaders\\lighting.azsli"));
        assert!(!wildcard.matches_path("materials/lighting.azsli"));

        assert!(!SourceFileDependency::by_uuid(Uuid::from_u128(1)).matches_path("x"));
    }

    #[test]
    fn test_source_dependency_display() {
        let dep = SourceFileDependency::by_path("a.txt");
        assert_eq!(
            dep.to_string(),
            "SourceFileDependency UUID: 00000000-0000-0000-0000-000000000000 NAME: a.txt"
        );
    }

    #[test]
    fn test_job_dependency_equality_ignores_sub_ids() {
        let a = order_once_dependency();
        let mut b = a.clone();
        b.product_sub_ids = vec![1, 2];
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a.clone());
        set.insert(b);
        assert_eq!(set.len(), 1);

        let mut c = a.clone();
        c.dependency_type = JobDependencyType::Order;
        assert_ne!(a, c);
        let mut d = a.clone();
        d.platform_identifier = "android".to_string();
        assert_ne!(a, d);
    }

    #[test]
    fn test_concatenate_sub_ids() {
        let mut dep = order_once_dependency();
        assert_eq!(dep.concatenate_sub_ids(), "");
        dep.product_sub_ids = vec![1, 20, 300];
        assert_eq!(dep.concatenate_sub_ids(), "1,20,300");
    }

    #[test]
    fn test_order_once_goes_inert_after_first_success() {
        let mut ledger = CompletionLedger::new();

        let mut edge = DependencyEdge::resolve(order_once_dependency(), &ledger);
        assert!(edge.is_enforced());
        assert!(edge.blocks_start());
        assert!(!edge.contributes_to_fingerprint());

        edge.mark_satisfied(&mut ledger);
        assert!(!edge.blocks_start());
        assert!(edge.is_inert());
        assert_eq!(ledger.len(), 1);

        let mut next_pass = DependencyEdge::resolve(order_once_dependency(), &ledger);
        assert!(!next_pass.is_enforced());
        assert!(next_pass.is_inert());
        next_pass.mark_unsatisfied();
        assert!(!next_pass.blocks_start());
    }

    #[test]
    fn test_order_edge_always_enforced() {
        let mut ledger = CompletionLedger::new();
        let mut dep = order_once_dependency();
        dep.dependency_type = JobDependencyType::Order;
        ledger.record_success(&dep.source_file, "compile", "pc");

        let mut edge = DependencyEdge::resolve(dep, &ledger);
        assert!(edge.is_enforced());
        assert!(edge.blocks_start());
        edge.mark_satisfied(&mut ledger);
        assert!(!edge.blocks_start());
        edge.mark_unsatisfied();
        assert!(edge.blocks_start());
        assert!(!edge.contributes_to_fingerprint());
    }

    #[test]
    fn test_fingerprint_edge_never_orders() {
        let mut dep = order_once_dependency();
        dep.dependency_type = JobDependencyType::Fingerprint;
        let mut ledger = CompletionLedger::new();
        let mut edge = DependencyEdge::resolve(dep, &ledger);
        assert!(!edge.blocks_start());
        assert!(edge.contributes_to_fingerprint());
        edge.mark_satisfied(&mut ledger);
        assert!(edge.contributes_to_fingerprint());
    }

    #[test]
    fn test_ledger_matches_by_path_or_uuid() {
        let source_uuid = Uuid::from_u128(77);
        let mut ledger = CompletionLedger::new();
        ledger.record_success(
            &SourceFileDependency { uuid: source_uuid, ..SourceFileDependency::by_path("Shaders\\Common.shader") },
            "compile",
            "PC",
        );

        let by_uuid = JobDependency::new(
            "compile",
            "pc",
            JobDependencyType::OrderOnce,
            SourceFileDependency::by_uuid(source_uuid),
        );
        assert!(ledger.has_completed(&by_uuid));
        assert!(ledger.has_completed(&order_once_dependency()));

        let wildcard = JobDependency::new(
            "compile",
            "pc",
            JobDependencyType::OrderOnce,
            SourceFileDependency::wildcard("shaders/*.shader"),
        );
        assert!(ledger.has_completed(&wildcard));

        let other_key =
            JobDependency::new("link", "pc", JobDependencyType::OrderOnce, by_uuid.source_file.clone());
        assert!(!ledger.has_completed(&other_key));
        let other_uuid = JobDependency::new(
            "compile",
            "pc",
            JobDependencyType::OrderOnce,
            SourceFileDependency::by_uuid(Uuid::from_u128(78)),
        );
        assert!(!ledger.has_completed(&other_uuid));
    }

    #[test]
    fn test_success_by_path_makes_uuid_edge_inert() {
        let source_uuid = Uuid::from_u128(9);
        let mut ledger = CompletionLedger::new();

        // The referenced job is known by both path and UUID when it runs
        let mut runner_view = DependencyEdge::resolve(
            JobDependency::new(
                "compile",
                "pc",
                JobDependencyType::OrderOnce,
                SourceFileDependency { uuid: source_uuid, ..SourceFileDependency::by_path("shaders/common.shader") },
            ),
            &ledger,
        );
        runner_view.mark_satisfied(&mut ledger);

        let by_uuid = JobDependency::new(
            "compile",
            "pc",
            JobDependencyType::OrderOnce,
            SourceFileDependency::by_uuid(source_uuid),
        );
        let edge = DependencyEdge::resolve(by_uuid, &ledger);
        assert!(edge.is_inert());
        assert!(!edge.blocks_start());
    }
}
