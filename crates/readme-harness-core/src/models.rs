//! Core data models for README resolution.
//!
//! These types flow between the resolver, the cache gateway, and every
//! entry point that serves a README.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ReadmeError;

/// Reserved file name marking a cached negative result.
///
/// A [`ReadmeFile`] carrying this name (with empty `type` and `content`)
/// means "we looked, there is no README" rather than "never looked".
pub const NOT_FOUND_PLACEHOLDER: &str = "__NOT_FOUND_PLACEHOLDER__";

/// Kind assumed when a reference omits it (`namespace/name` or `name`).
pub const DEFAULT_KIND: &str = "component";

/// Namespace assumed when a reference omits it.
pub const DEFAULT_NAMESPACE: &str = "default";

/// A file name to try, paired with the content type it is served as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateFile {
    pub name: String,
    #[serde(rename = "contentType")]
    pub content_type: String,
}

impl CandidateFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
        }
    }
}

/// A resolved README, or the negative-result sentinel.
///
/// This is both the cache payload and (minus the entity reference) the
/// response shape served to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadmeFile {
    pub name: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub content: String,
}

impl ReadmeFile {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            content: content.into(),
        }
    }

    /// The sentinel value stored for a confirmed absence.
    pub fn not_found_placeholder() -> Self {
        Self::new(NOT_FOUND_PLACEHOLDER, "", "")
    }

    pub fn is_placeholder(&self) -> bool {
        self.name == NOT_FOUND_PLACEHOLDER
    }

    pub fn is_markdown(&self) -> bool {
        self.content_type == "text/markdown"
    }
}

/// Result of walking the candidate list for one source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    Found(ReadmeFile),
    NotFound,
}

/// Canonical reference to a catalog entity: `kind:namespace/name`.
///
/// Kind and namespace are lower-cased on parse; the name keeps its case
/// for display. Use [`cache_key`](EntityRef::cache_key) for anything that
/// must treat case variants as the same entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl EntityRef {
    pub fn new(
        kind: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into().to_lowercase(),
            namespace: namespace.into().to_lowercase(),
            name: name.into(),
        }
    }

    /// Parse `kind:namespace/name`, `kind:name`, `namespace/name` or `name`.
    ///
    /// Missing kind defaults to [`DEFAULT_KIND`], missing namespace to
    /// [`DEFAULT_NAMESPACE`].
    pub fn parse(raw: &str) -> Result<Self, ReadmeError> {
        let trimmed = raw.trim();
        let invalid = |reason: &str| ReadmeError::InvalidEntityRef {
            reference: raw.to_string(),
            reason: reason.to_string(),
        };

        if trimmed.is_empty() {
            return Err(invalid("reference is empty"));
        }

        let (kind, rest) = match trimmed.split_once(':') {
            Some((kind, rest)) => (Some(kind), rest),
            None => (None, trimmed),
        };
        let (namespace, name) = match rest.split_once('/') {
            Some((namespace, name)) => (Some(namespace), name),
            None => (None, rest),
        };

        if kind.is_some_and(str::is_empty) {
            return Err(invalid("kind is empty"));
        }
        if namespace.is_some_and(str::is_empty) {
            return Err(invalid("namespace is empty"));
        }
        if name.is_empty() {
            return Err(invalid("name is empty"));
        }
        if name.contains(':') || name.contains('/') {
            return Err(invalid("name contains a separator"));
        }

        Ok(Self::new(
            kind.unwrap_or(DEFAULT_KIND),
            namespace.unwrap_or(DEFAULT_NAMESPACE),
            name,
        ))
    }

    /// Key under which this entity's README is cached.
    pub fn cache_key(&self) -> String {
        self.to_string().to_lowercase()
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.kind, self.namespace, self.name)
    }
}
