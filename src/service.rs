//! README lookup shared by the CLI, the HTTP server, actions and the
//! search collator.
//!
//! [`ReadmeService`] wires the core [`Resolver`] and [`ReadmeCache`] to an
//! entity directory, the SCM integrations and a content fetcher:
//!
//! ```text
//! get_readme(ref)
//!   ├─ cache hit ───────────────▶ README (cached) / CachedNotFound
//!   ├─ unknown entity ──────────▶ sentinel + EntityNotFound
//!   ├─ no url source ───────────▶ sentinel + NoSourceLocation
//!   ├─ no integration ──────────▶ sentinel + NoIntegration
//!   └─ resolve
//!        ├─ Found ──────────────▶ cache + README
//!        ├─ NotFound ───────────▶ sentinel + NotFound (tried files)
//!        └─ other error ────────▶ returned as-is, nothing cached
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use readme_harness_core::{
    strip_markdown, CacheStore, CachedReadme, ContentFetcher, EntityRef, ReadmeCache,
    ReadmeError, ReadmeFile, ResolutionOutcome, Resolver,
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::cache::MokaCacheStore;
use crate::catalog::{directory_from_config, Entity, EntityDirectory};
use crate::config::Config;
use crate::reader::HttpUrlReader;
use crate::scm::ScmIntegrations;

/// A README served for an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadmeResponse {
    pub entity_ref: EntityRef,
    pub file: ReadmeFile,
    /// Whether this came from the cache rather than a fresh resolution.
    pub cached: bool,
}

/// Output of the `get-readme-content` action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetReadmeOutput {
    pub entity_ref: String,
    pub content: String,
    pub content_type: String,
    pub file_name: String,
}

pub struct ReadmeService {
    resolver: Resolver,
    cache: ReadmeCache,
    directory: Arc<dyn EntityDirectory>,
    integrations: Arc<ScmIntegrations>,
    fetcher: Arc<dyn ContentFetcher>,
}

impl ReadmeService {
    pub fn new(
        resolver: Resolver,
        cache: ReadmeCache,
        directory: Arc<dyn EntityDirectory>,
        integrations: Arc<ScmIntegrations>,
        fetcher: Arc<dyn ContentFetcher>,
    ) -> Self {
        Self {
            resolver,
            cache,
            directory,
            integrations,
            fetcher,
        }
    }

    /// Production wiring: moka cache, HTTP reader and the configured catalog.
    pub fn from_config(config: &Config) -> Result<Self> {
        let timeout = Duration::from_secs(config.reader.timeout_secs);
        let integrations = Arc::new(ScmIntegrations::from_config(&config.integrations));
        let fetcher = HttpUrlReader::new(integrations.clone(), timeout)?;
        let directory = directory_from_config(&config.catalog, timeout)?;
        let store: Arc<dyn CacheStore> = Arc::new(MokaCacheStore::new(config.cache.max_capacity));
        let ttl = config.readme.cache_ttl.to_duration()?;

        Ok(Self::new(
            Resolver::new(&config.readme.resolver_config()),
            ReadmeCache::new(store, ttl),
            Arc::from(directory),
            integrations,
            Arc::new(fetcher),
        ))
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn directory(&self) -> &dyn EntityDirectory {
        self.directory.as_ref()
    }

    /// Look up the README for a caller-supplied entity reference.
    pub async fn get_readme(&self, raw_ref: &str) -> Result<ReadmeResponse, ReadmeError> {
        let entity_ref = EntityRef::parse(raw_ref)?;

        if let Some(hit) = self.cached(&entity_ref).await? {
            return Ok(hit);
        }

        let Some(entity) = self.directory.get_entity(&entity_ref).await? else {
            info!(entity = %entity_ref, "entity not found in catalog");
            self.remember_not_found(&entity_ref).await;
            return Err(ReadmeError::EntityNotFound(entity_ref.to_string()));
        };

        self.resolve_entity(&entity_ref, &entity).await
    }

    /// Look up the README for an entity already fetched from the directory.
    pub async fn get_readme_for_entity(&self, entity: &Entity) -> Result<ReadmeResponse, ReadmeError> {
        let entity_ref = entity.entity_ref();
        if let Some(hit) = self.cached(&entity_ref).await? {
            return Ok(hit);
        }
        self.resolve_entity(&entity_ref, entity).await
    }

    /// README as action output. Markdown is stripped only when asked and
    /// only for `text/markdown` documents.
    pub async fn get_readme_output(
        &self,
        raw_ref: &str,
        strip: bool,
    ) -> Result<GetReadmeOutput, ReadmeError> {
        let response = self.get_readme(raw_ref).await?;
        let content = if strip && response.file.is_markdown() {
            strip_markdown(&response.file.content)
        } else {
            response.file.content
        };

        Ok(GetReadmeOutput {
            entity_ref: response.entity_ref.to_string(),
            content,
            content_type: response.file.content_type,
            file_name: response.file.name,
        })
    }

    async fn cached(&self, entity_ref: &EntityRef) -> Result<Option<ReadmeResponse>, ReadmeError> {
        match self.cache.lookup(entity_ref).await? {
            Some(CachedReadme::Found(file)) => Ok(Some(ReadmeResponse {
                entity_ref: entity_ref.clone(),
                file,
                cached: true,
            })),
            Some(CachedReadme::NotFound) => {
                Err(ReadmeError::CachedNotFound(entity_ref.to_string()))
            }
            None => Ok(None),
        }
    }

    async fn resolve_entity(
        &self,
        entity_ref: &EntityRef,
        entity: &Entity,
    ) -> Result<ReadmeResponse, ReadmeError> {
        let Some(source_url) = entity.source_url() else {
            info!(entity = %entity_ref, "entity has no url source location");
            self.remember_not_found(entity_ref).await;
            return Err(ReadmeError::NoSourceLocation(entity_ref.to_string()));
        };

        let Some(integration) = self.integrations.by_url(&source_url) else {
            info!(entity = %entity_ref, url = %source_url, "no SCM integration for source");
            self.remember_not_found(entity_ref).await;
            return Err(ReadmeError::NoIntegration(source_url));
        };

        let outcome = self
            .resolver
            .resolve(&source_url, integration, self.fetcher.as_ref())
            .await
            .inspect_err(|e| {
                error!(entity = %entity_ref, error = %e, "README resolution aborted");
            })?;

        match outcome {
            ResolutionOutcome::Found(file) => {
                info!(entity = %entity_ref, file = %file.name, "README found");
                if let Err(e) = self.cache.store_found(entity_ref, &file).await {
                    warn!(entity = %entity_ref, error = %e, "failed to cache README");
                }
                Ok(ReadmeResponse {
                    entity_ref: entity_ref.clone(),
                    file,
                    cached: false,
                })
            }
            ResolutionOutcome::NotFound => {
                info!(entity = %entity_ref, "no README candidate found");
                self.remember_not_found(entity_ref).await;
                Err(ReadmeError::NotFound {
                    entity_ref: entity_ref.to_string(),
                    tried: self.resolver.candidate_names(),
                })
            }
        }
    }

    async fn remember_not_found(&self, entity_ref: &EntityRef) {
        if let Err(e) = self.cache.store_not_found(entity_ref).await {
            warn!(entity = %entity_ref, error = %e, "failed to cache README absence");
        }
    }
}
