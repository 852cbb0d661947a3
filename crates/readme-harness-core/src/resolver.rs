//! README resolution: ordered probing with one-hop symlink following.
//!
//! The [`Resolver`] walks its candidate list strictly in order, one fetch
//! at a time, and stops at the first file that exists. Only
//! [`FetchError::NotFound`] advances to the next candidate; any other
//! failure aborts the walk and is returned unchanged.
//!
//! # Collaborators
//!
//! | Trait | Role |
//! |-------|------|
//! | [`UrlResolver`] | Turn a relative file name into an absolute URL for a source location |
//! | [`ContentFetcher`] | Read the bytes at a URL |

use async_trait::async_trait;
use tracing::debug;

use crate::candidates::build_candidates;
use crate::error::{FetchError, ReadmeError};
use crate::models::{CandidateFile, ReadmeFile, ResolutionOutcome};
use crate::symlink::SymlinkPolicy;

/// Resolves a path relative to a base source URL, following the
/// conventions of the SCM provider that hosts it.
pub trait UrlResolver: Send + Sync {
    fn resolve_url(&self, relative: &str, base: &str) -> Result<String, FetchError>;
}

/// Reads raw content from a URL.
///
/// Implementations must report a missing resource as
/// [`FetchError::NotFound`] and use the other variants for everything else.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Settings the resolver is constructed with.
#[derive(Debug, Clone, Default)]
pub struct ResolverConfig {
    /// Configured file names; `None` selects the built-in list.
    pub file_names: Option<Vec<String>>,
    pub symlink: SymlinkPolicy,
}

#[derive(Debug, Clone)]
pub struct Resolver {
    candidates: Vec<CandidateFile>,
    symlink: SymlinkPolicy,
}

impl Resolver {
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            candidates: build_candidates(config.file_names.as_deref()),
            symlink: config.symlink.clone(),
        }
    }

    /// Build a resolver over an explicit candidate list.
    pub fn with_candidates(candidates: Vec<CandidateFile>, symlink: SymlinkPolicy) -> Self {
        Self {
            candidates,
            symlink,
        }
    }

    pub fn candidates(&self) -> &[CandidateFile] {
        &self.candidates
    }

    pub fn candidate_names(&self) -> Vec<String> {
        self.candidates.iter().map(|c| c.name.clone()).collect()
    }

    /// Find the first candidate that exists under `source_url`.
    ///
    /// # Errors
    ///
    /// - [`ReadmeError::Fetch`] for any fetch or URL failure other than
    ///   "not found" on a candidate.
    /// - [`ReadmeError::DanglingSymlink`] when a candidate is a symlink
    ///   whose target does not exist.
    pub async fn resolve(
        &self,
        source_url: &str,
        urls: &dyn UrlResolver,
        fetcher: &dyn ContentFetcher,
    ) -> Result<ResolutionOutcome, ReadmeError> {
        for candidate in &self.candidates {
            let url = urls.resolve_url(&candidate.name, source_url)?;
            debug!(url = %url, candidate = %candidate.name, "trying README location");

            let bytes = match fetcher.fetch(&url).await {
                Ok(bytes) => bytes,
                Err(FetchError::NotFound { .. }) => continue,
                Err(e) => return Err(e.into()),
            };
            let mut content = String::from_utf8_lossy(&bytes).into_owned();

            if let Some(target) = self.symlink.link_target(&content).map(str::to_string) {
                let link_url = urls.resolve_url(&target, source_url)?;
                debug!(from = %url, to = %link_url, "following README symlink");
                let bytes = fetcher.fetch(&link_url).await.map_err(|e| match e {
                    FetchError::NotFound { .. } => ReadmeError::DanglingSymlink {
                        candidate: candidate.name.clone(),
                        target: target.clone(),
                        source: e,
                    },
                    other => ReadmeError::Fetch(other),
                })?;
                content = String::from_utf8_lossy(&bytes).into_owned();
            }

            return Ok(ResolutionOutcome::Found(ReadmeFile::new(
                candidate.name.clone(),
                candidate.content_type.clone(),
                content,
            )));
        }

        Ok(ResolutionOutcome::NotFound)
    }
}
