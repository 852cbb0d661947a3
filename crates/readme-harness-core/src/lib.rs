//! # README Harness Core
//!
//! Runtime-agnostic logic for resolving a catalog entity's README:
//! data model, candidate list, symlink detection, markdown normalization,
//! the resolver itself, and the cache gateway with its store abstraction.
//!
//! This crate contains no tokio, HTTP client, or filesystem I/O. Content
//! fetching, URL resolution and cache storage are reached through the
//! [`resolver::ContentFetcher`], [`resolver::UrlResolver`] and
//! [`cache::CacheStore`] traits.
//!
//! ```text
//! entry point ─▶ ReadmeCache::lookup ──hit──▶ done
//!                     │ miss
//!                     ▼
//!               Resolver::resolve ─▶ UrlResolver + ContentFetcher
//!                     │
//!                     ▼
//!         ReadmeCache::store_found / store_not_found
//! ```

pub mod cache;
pub mod candidates;
pub mod error;
pub mod markdown;
pub mod models;
pub mod resolver;
pub mod symlink;

pub use cache::memory::InMemoryCacheStore;
pub use cache::{CacheStore, CachedReadme, ReadmeCache};
pub use candidates::{build_candidates, content_type_for, default_candidates};
pub use error::{CacheError, FetchError, ReadmeError};
pub use markdown::strip_markdown;
pub use models::{CandidateFile, EntityRef, ReadmeFile, ResolutionOutcome, NOT_FOUND_PLACEHOLDER};
pub use resolver::{ContentFetcher, Resolver, ResolverConfig, UrlResolver};
pub use symlink::{is_symlink, SymlinkPolicy};
