//! Error taxonomy for README resolution.
//!
//! Only [`FetchError::NotFound`] means "try the next candidate". Every
//! other fetch failure aborts resolution and reaches the caller unchanged.

/// Failure reported by a content-fetch capability or URL resolver.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// Nothing exists at this URL.
    #[error("not found: {url}")]
    NotFound { url: String },

    /// The source rejected our credentials.
    #[error("unauthorized ({status}) fetching {url}")]
    Unauthorized { url: String, status: u16 },

    /// Any other non-success HTTP status.
    #[error("unexpected status {status} fetching {url}")]
    Http { url: String, status: u16 },

    /// Transport-level failure (DNS, connect, timeout, reset).
    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },

    /// The URL could not be built or is not served by any integration.
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl FetchError {
    pub fn not_found(url: impl Into<String>) -> Self {
        Self::NotFound { url: url.into() }
    }

    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Failure reported by a cache backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cache backend error: {0}")]
pub struct CacheError(pub String);

/// Errors surfaced by README lookups.
#[derive(Debug, thiserror::Error)]
pub enum ReadmeError {
    /// Every candidate was probed and none exists.
    #[error("README not found for entity {entity_ref}. Tried files: {}", .tried.join(", "))]
    NotFound {
        entity_ref: String,
        tried: Vec<String>,
    },

    /// The cache holds a negative entry for this entity.
    #[error("README not found for entity {0}. This entity does not have a README file.")]
    CachedNotFound(String),

    #[error("entity {0} not found in catalog")]
    EntityNotFound(String),

    #[error("entity {0} does not have a valid source location")]
    NoSourceLocation(String),

    #[error("no SCM integration found for {0}")]
    NoIntegration(String),

    /// A symlink README points at a file that does not exist.
    #[error("README {candidate} is a symlink to '{target}', which could not be found")]
    DanglingSymlink {
        candidate: String,
        target: String,
        #[source]
        source: FetchError,
    },

    #[error("invalid entity reference '{reference}': {reason}")]
    InvalidEntityRef { reference: String, reason: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("catalog error: {0}")]
    Catalog(String),
}

impl ReadmeError {
    /// True for every "there is no README to serve" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::CachedNotFound(_)
                | Self::EntityNotFound(_)
                | Self::NoSourceLocation(_)
                | Self::NoIntegration(_)
        )
    }
}
