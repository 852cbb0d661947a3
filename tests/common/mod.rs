//! Shared fixtures: an in-memory catalog and a scripted content fetcher.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use readme_harness::catalog::{Entity, StaticCatalog, SOURCE_LOCATION_ANNOTATION};
use readme_harness::scm::ScmIntegrations;
use readme_harness::service::ReadmeService;
use readme_harness_core::{
    ContentFetcher, FetchError, InMemoryCacheStore, ReadmeCache, Resolver, ResolverConfig,
};

pub const SVC_BASE: &str = "https://github.com/acme/svc/tree/main/";

/// Serves canned bodies by URL; anything unscripted is a 404.
#[derive(Default)]
pub struct ScriptedFetcher {
    responses: Mutex<HashMap<String, Result<Vec<u8>, FetchError>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(self, url: &str, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), Ok(body.as_bytes().to_vec()));
        self
    }

    pub fn error(self, url: &str, err: FetchError) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), Err(err));
        self
    }

    /// Replace a response after construction.
    pub fn set_file(&self, url: &str, body: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), Ok(body.as_bytes().to_vec()));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ContentFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        self.responses
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(FetchError::not_found(url)))
    }
}

pub fn entity(name: &str, source: Option<&str>) -> Entity {
    let e = Entity::new("Component", Some("default"), name);
    match source {
        Some(location) => e.with_annotation(SOURCE_LOCATION_ANNOTATION, location),
        None => e,
    }
}

/// The catalog most tests use:
///
/// - `svc`: GitHub source at [`SVC_BASE`]
/// - `no-source`: no location annotation
/// - `file-source`: a non-url location
/// - `elsewhere`: a url on a host with no integration
pub fn catalog() -> StaticCatalog {
    StaticCatalog::new(vec![
        entity("svc", Some(&format!("url:{}", SVC_BASE))),
        entity("no-source", None),
        entity("file-source", Some("file:/srv/catalog-info.yaml")),
        entity("elsewhere", Some("url:https://bitbucket.org/acme/elsewhere/src/main/")),
    ])
}

pub fn service_with(
    fetcher: Arc<ScriptedFetcher>,
    file_names: Option<Vec<String>>,
    ttl: Duration,
) -> ReadmeService {
    let config = ResolverConfig {
        file_names,
        ..ResolverConfig::default()
    };
    ReadmeService::new(
        Resolver::new(&config),
        ReadmeCache::new(Arc::new(InMemoryCacheStore::new()), ttl),
        Arc::new(catalog()),
        Arc::new(ScmIntegrations::default()),
        fetcher,
    )
}

pub fn service(fetcher: Arc<ScriptedFetcher>) -> ReadmeService {
    service_with(fetcher, None, Duration::from_secs(3600))
}

pub fn svc_url(file: &str) -> String {
    format!("{}{}", SVC_BASE, file)
}
