//! Builder registration and source path routing.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::diagnostics;
use crate::pattern::PatternMatcher;

use super::{Builder, BuilderDescriptor};

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum RegistryError {
    #[error("builder '{0}' has a nil id")]
    NilId(String),
    #[error("builder with id {0} has an empty name")]
    EmptyName(Uuid),
    #[error("builder name '{name}' is already registered with id {existing}")]
    NameConflict { name: String, existing: Uuid },
}

/// Outcome of a successful registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    New,
    /// Same id, version and analysis fingerprint as before.
    Unchanged,
    /// Same id with a new version or analysis fingerprint: every cached
    /// result of this builder is out of date.
    Stale { version_changed: bool, analysis_fingerprint_changed: bool },
}

/// Whether routing returns every claiming builder or only the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    #[default]
    All,
    First,
}

/// A descriptor with its compiled patterns.
pub struct RegisteredBuilder {
    pub descriptor: BuilderDescriptor,
    matchers: Vec<PatternMatcher>,
    builder: Option<Arc<dyn Builder>>,
}

impl RegisteredBuilder {
    fn new(descriptor: BuilderDescriptor, builder: Option<Arc<dyn Builder>>) -> Self {
        let matchers: Vec<PatternMatcher> =
            descriptor.patterns.iter().cloned().map(PatternMatcher::new).collect();
        for matcher in matchers.iter().filter(|m| !m.is_valid()) {
            diagnostics::error(format!(
                "Builder '{}' has an invalid pattern {}: {}",
                descriptor.name,
                matcher.builder_pattern(),
                matcher.error_string()
            ));
        }
        Self { descriptor, matchers, builder }
    }

    pub fn matchers(&self) -> &[PatternMatcher] {
        &self.matchers
    }

    /// The in-process implementation, if one was registered.
    pub fn builder(&self) -> Option<&Arc<dyn Builder>> {
        self.builder.as_ref()
    }

    pub fn claims(&self, path: &str) -> bool {
        self.matchers.iter().any(|m| m.matches_path(path))
    }

    pub fn invalid_patterns(&self) -> impl Iterator<Item = &PatternMatcher> {
        self.matchers.iter().filter(|m| !m.is_valid())
    }
}

impl std::fmt::Debug for RegisteredBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredBuilder")
            .field("descriptor", &self.descriptor)
            .field("in_process", &self.builder.is_some())
            .finish()
    }
}

/// All known builders, in registration order.
///
/// Routing only reads; callers that re-register concurrently must wrap the
/// registry in their own lock.
#[derive(Debug, Default)]
pub struct BuilderRegistry {
    entries: Vec<RegisteredBuilder>,
    mode: MatchMode,
}

impl BuilderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: MatchMode) -> Self {
        Self { entries: Vec::new(), mode }
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Register a descriptor without an in-process implementation.
    pub fn register(&mut self, descriptor: BuilderDescriptor) -> Result<Registration, RegistryError> {
        self.insert(descriptor, None)
    }

    /// Register an in-process builder under its own descriptor.
    pub fn register_builder(&mut self, builder: Arc<dyn Builder>) -> Result<Registration, RegistryError> {
        let descriptor = builder.descriptor();
        self.insert(descriptor, Some(builder))
    }

    fn insert(
        &mut self,
        descriptor: BuilderDescriptor,
        builder: Option<Arc<dyn Builder>>,
    ) -> Result<Registration, RegistryError> {
        if descriptor.id.is_nil() {
            return Err(RegistryError::NilId(descriptor.name));
        }
        if descriptor.name.is_empty() {
            return Err(RegistryError::EmptyName(descriptor.id));
        }
        if let Some(other) = self
            .entries
            .iter()
            .find(|e| e.descriptor.name == descriptor.name && e.descriptor.id != descriptor.id)
        {
            return Err(RegistryError::NameConflict {
                name: descriptor.name,
                existing: other.descriptor.id,
            });
        }

        let entry = RegisteredBuilder::new(descriptor, builder);
        match self.entries.iter_mut().find(|e| e.descriptor.id == entry.descriptor.id) {
            Some(existing) => {
                let version_changed = existing.descriptor.version != entry.descriptor.version;
                let analysis_fingerprint_changed =
                    existing.descriptor.analysis_fingerprint != entry.descriptor.analysis_fingerprint;
                *existing = entry;
                if version_changed || analysis_fingerprint_changed {
                    diagnostics::info(format!(
                        "Builder '{}' changed; its cached results are stale",
                        existing.descriptor.name
                    ));
                    Ok(Registration::Stale { version_changed, analysis_fingerprint_changed })
                } else {
                    Ok(Registration::Unchanged)
                }
            }
            None => {
                self.entries.push(entry);
                Ok(Registration::New)
            }
        }
    }

    pub fn unregister(&mut self, id: &Uuid) -> Option<BuilderDescriptor> {
        let index = self.entries.iter().position(|e| e.descriptor.id == *id)?;
        Some(self.entries.remove(index).descriptor)
    }

    pub fn get(&self, id: &Uuid) -> Option<&RegisteredBuilder> {
        self.entries.iter().find(|e| e.descriptor.id == *id)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&RegisteredBuilder> {
        self.entries.iter().find(|e| e.descriptor.name == name)
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredBuilder> {
        self.entries.iter()
    }

    /// Builders claiming `path`, in registration order. In
    /// [`MatchMode::First`] at most one is returned.
    pub fn find_builders_for_path(&self, path: &str) -> Vec<&RegisteredBuilder> {
        let claiming = self.entries.iter().filter(|e| e.claims(path));
        match self.mode {
            MatchMode::All => claiming.collect(),
            MatchMode::First => claiming.take(1).collect(),
        }
    }

    /// Descriptors of the builders claiming `path`.
    pub fn find_descriptors_for_path(&self, path: &str) -> Vec<&BuilderDescriptor> {
        self.find_builders_for_path(path).into_iter().map(|e| &e.descriptor).collect()
    }
}
