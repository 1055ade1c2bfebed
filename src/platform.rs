//! Target platforms.

use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Reserved identifier for the platform-independent pseudo-platform.
pub const COMMON_PLATFORM_NAME: &str = "common";

/// A platform a job can be produced for.
///
/// Identity is the identifier alone; two infos with the same identifier and
/// different tags compare equal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlatformInfo {
    pub identifier: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl PlatformInfo {
    pub fn new<I, S>(identifier: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { identifier: identifier.into(), tags: tags.into_iter().map(Into::into).collect() }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    pub fn has_identifier(&self, identifier: &str) -> bool {
        self.identifier.eq_ignore_ascii_case(identifier)
    }

    pub fn is_common(&self) -> bool {
        self.has_identifier(COMMON_PLATFORM_NAME)
    }

    pub fn tags_as_string(&self) -> String {
        self.tags.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
    }
}

impl PartialEq for PlatformInfo {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
    }
}

impl Eq for PlatformInfo {}

impl Hash for PlatformInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identifier.hash(state);
    }
}

/// Identifiers joined with `", "`, for log messages.
pub fn platforms_as_string(platforms: &[PlatformInfo]) -> String {
    platforms.iter().map(|p| p.identifier.as_str()).collect::<Vec<_>>().join(", ")
}
