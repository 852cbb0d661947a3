//! Entity directory: where entities and their source locations come from.
//!
//! Two implementations of [`EntityDirectory`]:
//!
//! - [`StaticCatalog`]: an in-memory list, typically loaded from a JSON
//!   file of entities.
//! - [`CatalogClient`]: a software catalog reached over HTTP.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use readme_harness_core::{EntityRef, ReadmeError};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::config::CatalogConfig;

pub const SOURCE_LOCATION_ANNOTATION: &str = "backstage.io/source-location";
pub const MANAGED_BY_LOCATION_ANNOTATION: &str = "backstage.io/managed-by-location";

/// A catalog entity. Only the fields README resolution needs are modelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub kind: String,
    pub metadata: EntityMetadata,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityMetadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

/// A parsed location annotation: `type:target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub location_type: String,
    pub target: String,
}

impl SourceLocation {
    /// Split at the first `:`. Both halves must be non-empty.
    pub fn parse(raw: &str) -> Option<Self> {
        let (location_type, target) = raw.trim().split_once(':')?;
        if location_type.is_empty() || target.is_empty() {
            return None;
        }
        Some(Self {
            location_type: location_type.to_string(),
            target: target.to_string(),
        })
    }
}

impl Entity {
    pub fn new(kind: impl Into<String>, namespace: Option<&str>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            metadata: EntityMetadata {
                name: name.into(),
                namespace: namespace.map(str::to_string),
                ..Default::default()
            },
        }
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.annotations.insert(key.into(), value.into());
        self
    }

    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::new(
            self.kind.as_str(),
            self.metadata
                .namespace
                .as_deref()
                .unwrap_or(readme_harness_core::models::DEFAULT_NAMESPACE),
            self.metadata.name.as_str(),
        )
    }

    /// Source location, falling back to the managed-by location.
    pub fn source_location(&self) -> Option<SourceLocation> {
        let annotations = &self.metadata.annotations;
        annotations
            .get(SOURCE_LOCATION_ANNOTATION)
            .or_else(|| annotations.get(MANAGED_BY_LOCATION_ANNOTATION))
            .and_then(|raw| SourceLocation::parse(raw))
    }

    /// The source URL, when the location is of type `url`.
    pub fn source_url(&self) -> Option<String> {
        self.source_location()
            .filter(|loc| loc.location_type == "url")
            .map(|loc| loc.target)
    }

    pub fn display_title(&self) -> &str {
        self.metadata
            .title
            .as_deref()
            .unwrap_or(&self.metadata.name)
    }
}

/// Looks up catalog entities.
#[async_trait]
pub trait EntityDirectory: Send + Sync {
    async fn get_entity(&self, entity: &EntityRef) -> Result<Option<Entity>, ReadmeError>;

    async fn list_entities(&self) -> Result<Vec<Entity>, ReadmeError>;
}

/// A fixed list of entities.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    entities: Vec<Entity>,
}

impl StaticCatalog {
    pub fn new(entities: Vec<Entity>) -> Self {
        Self { entities }
    }

    /// Load a JSON array of entities.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read entities file: {}", path.display()))?;
        let entities: Vec<Entity> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse entities file: {}", path.display()))?;
        Ok(Self::new(entities))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[async_trait]
impl EntityDirectory for StaticCatalog {
    async fn get_entity(&self, entity: &EntityRef) -> Result<Option<Entity>, ReadmeError> {
        let key = entity.cache_key();
        Ok(self
            .entities
            .iter()
            .find(|e| e.entity_ref().cache_key() == key)
            .cloned())
    }

    async fn list_entities(&self) -> Result<Vec<Entity>, ReadmeError> {
        Ok(self.entities.clone())
    }
}

/// Client for a catalog HTTP API.
pub struct CatalogClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl CatalogClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, ReadmeError> {
        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request
            .send()
            .await
            .map_err(|e| ReadmeError::Catalog(format!("request to {} failed: {}", url, e)))
    }
}

#[async_trait]
impl EntityDirectory for CatalogClient {
    async fn get_entity(&self, entity: &EntityRef) -> Result<Option<Entity>, ReadmeError> {
        let url = format!(
            "{}/entities/by-name/{}/{}/{}",
            self.base_url, entity.kind, entity.namespace, entity.name
        );
        let resp = self.get(&url).await?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => resp
                .json::<Entity>()
                .await
                .map(Some)
                .map_err(|e| ReadmeError::Catalog(format!("invalid entity from {}: {}", url, e))),
            status => Err(ReadmeError::Catalog(format!(
                "catalog returned {} for {}",
                status, url
            ))),
        }
    }

    async fn list_entities(&self) -> Result<Vec<Entity>, ReadmeError> {
        let url = format!("{}/entities", self.base_url);
        let resp = self.get(&url).await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ReadmeError::Catalog(format!(
                "catalog returned {} for {}",
                status, url
            )));
        }
        resp.json::<Vec<Entity>>()
            .await
            .map_err(|e| ReadmeError::Catalog(format!("invalid entity list from {}: {}", url, e)))
    }
}

/// Build the directory named in `[catalog]`. An HTTP catalog wins over a
/// static file; with neither, the directory is empty.
pub fn directory_from_config(
    config: &CatalogConfig,
    timeout: Duration,
) -> Result<Box<dyn EntityDirectory>> {
    if let Some(base_url) = &config.base_url {
        return Ok(Box::new(CatalogClient::new(
            base_url.clone(),
            config.token.clone(),
            timeout,
        )?));
    }
    if let Some(path) = &config.entities_file {
        return Ok(Box::new(StaticCatalog::from_file(path)?));
    }
    Ok(Box::new(StaticCatalog::default()))
}
