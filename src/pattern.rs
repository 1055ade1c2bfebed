//! Builder file patterns and their compiled matchers.
//!
//! A [`BuilderPattern`] is the declarative form a builder registers with.
//! A [`PatternMatcher`] is the compiled, immutable form used for routing.
//! Both kinds of pattern match case-insensitively against the whole path.

use std::fmt;

use glob::MatchOptions;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::diagnostics::{self, AbsorbMode, Absorber, Channel};

/// How the pattern text is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    /// `*` matches any run of characters, `?` matches exactly one.
    #[default]
    Wildcard,
    Regex,
}

/// A pattern as declared by a builder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuilderPattern {
    pub pattern: String,
    #[serde(default)]
    pub kind: PatternKind,
}

impl BuilderPattern {
    pub fn new(pattern: impl Into<String>, kind: PatternKind) -> Self {
        Self { pattern: pattern.into(), kind }
    }

    pub fn wildcard(pattern: impl Into<String>) -> Self {
        Self::new(pattern, PatternKind::Wildcard)
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        Self::new(pattern, PatternKind::Regex)
    }
}

impl fmt::Display for BuilderPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            PatternKind::Wildcard => write!(f, "{{WildCard:{}}}", self.pattern),
            PatternKind::Regex => write!(f, "{{Regex:{}}}", self.pattern),
        }
    }
}

#[derive(Debug, Clone)]
enum Compiled {
    Regex(Regex),
    Glob(glob::Pattern),
    // a wildcard the glob engine refused; compared as plain text
    Literal(String),
    Invalid,
}

/// A compiled [`BuilderPattern`].
///
/// Construction never fails. An unusable regex yields a matcher that matches
/// nothing, reports `is_valid() == false` and carries the compiler's message.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    pattern: BuilderPattern,
    compiled: Compiled,
    error: String,
}

const WILDCARD_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

impl PatternMatcher {
    pub fn new(pattern: BuilderPattern) -> Self {
        match pattern.kind {
            PatternKind::Wildcard => Self::compile_wildcard(pattern),
            PatternKind::Regex => Self::compile_regex(pattern),
        }
    }

    pub fn wildcard(pattern: impl Into<String>) -> Self {
        Self::new(BuilderPattern::wildcard(pattern))
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        Self::new(BuilderPattern::regex(pattern))
    }

    fn compile_wildcard(pattern: BuilderPattern) -> Self {
        let compiled = match glob::Pattern::new(&glob_source(&pattern.pattern)) {
            Ok(glob) => Compiled::Glob(glob),
            Err(_) => Compiled::Literal(pattern.pattern.to_lowercase()),
        };
        Self { pattern, compiled, error: String::new() }
    }

    fn compile_regex(pattern: BuilderPattern) -> Self {
        let absorber = Absorber::new(AbsorbMode::Absorb);

        // Validate the raw text first so anchoring cannot repair a broken pattern.
        let compiled = build_regex(&pattern.pattern)
            .and_then(|_| build_regex(&format!("^(?:{})$", pattern.pattern)));

        match compiled {
            Ok(regex) => Self { pattern, compiled: Compiled::Regex(regex), error: String::new() },
            Err(err) => {
                diagnostics::error(format!("Invalid regex {}: {}", pattern, err));
                let error = absorber.last_message(Channel::Error).unwrap_or_else(|| err.to_string());
                Self { pattern, compiled: Compiled::Invalid, error }
            }
        }
    }

    /// Whether the whole of `path` matches the pattern.
    pub fn matches_path(&self, path: &str) -> bool {
        match &self.compiled {
            Compiled::Regex(regex) => regex.is_match(path),
            Compiled::Glob(glob) => glob.matches_with(path, WILDCARD_OPTIONS),
            Compiled::Literal(text) => path.to_lowercase() == *text,
            Compiled::Invalid => false,
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self.compiled, Compiled::Invalid)
    }

    /// The compiler's message for an invalid pattern, empty otherwise.
    pub fn error_string(&self) -> &str {
        &self.error
    }

    pub fn builder_pattern(&self) -> &BuilderPattern {
        &self.pattern
    }
}

fn build_regex(source: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(source).case_insensitive(true).build()
}

/// Rewrite a wildcard into glob syntax: brackets become literals and runs of
/// `*` collapse so the glob engine never sees a recursive wildcard.
fn glob_source(wildcard: &str) -> String {
    let mut out = String::with_capacity(wildcard.len() + 4);
    let mut previous_star = false;
    for ch in wildcard.chars() {
        match ch {
            '*' if previous_star => continue,
            '[' => out.push_str("[[]"),
            ']' => out.push_str("[]]"),
            other => out.push(other),
        }
        previous_star = ch == '*';
    }
    out
}
