//! SCM integrations: how each source host lays out its URLs.
//!
//! An entity's source location is a browse URL such as
//! `https://github.com/acme/svc/tree/main/`. Each integration knows how to
//! resolve a file name against that location and how to turn the resulting
//! browse URL into one that serves raw file content.
//!
//! | Variant | Repository root | Raw content |
//! |---------|-----------------|-------------|
//! | [`ScmIntegration::GitHub`] | `/owner/repo/{tree,blob}/ref` | `raw.githubusercontent.com/owner/repo/ref/path` |
//! | [`ScmIntegration::GitLab`] | `/group/…/repo/-/{tree,blob}/ref` | `/-/raw/ref/path` |
//! | [`ScmIntegration::Generic`] | host root | browse URL as-is |

use readme_harness_core::{FetchError, UrlResolver};
use reqwest::Url;

use crate::config::{IntegrationConfig, IntegrationsConfig};

pub const GITHUB_HOST: &str = "github.com";
pub const GITLAB_HOST: &str = "gitlab.com";
const GITHUB_RAW_BASE: &str = "https://raw.githubusercontent.com";

/// Host-level settings shared by every variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    pub host: String,
    pub token: Option<String>,
    pub raw_base_url: Option<String>,
}

impl HostConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            token: None,
            raw_base_url: None,
        }
    }
}

impl From<&IntegrationConfig> for HostConfig {
    fn from(cfg: &IntegrationConfig) -> Self {
        Self {
            host: cfg.host.trim().to_lowercase(),
            token: cfg.token.clone(),
            raw_base_url: cfg.raw_base_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScmIntegration {
    GitHub(HostConfig),
    GitLab(HostConfig),
    Generic(HostConfig),
}

impl ScmIntegration {
    pub fn host_config(&self) -> &HostConfig {
        match self {
            Self::GitHub(h) | Self::GitLab(h) | Self::Generic(h) => h,
        }
    }

    pub fn host(&self) -> &str {
        &self.host_config().host
    }

    pub fn token(&self) -> Option<&str> {
        self.host_config().token.as_deref()
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::GitHub(_) => "github",
            Self::GitLab(_) => "gitlab",
            Self::Generic(_) => "generic",
        }
    }

    /// Whether this integration serves `url`.
    pub fn matches(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let configured = self.host();
        if configured.eq_ignore_ascii_case(host) {
            return true;
        }
        match url.port() {
            Some(port) => configured.eq_ignore_ascii_case(&format!("{}:{}", host, port)),
            None => false,
        }
    }

    /// Number of leading path segments that make up the repository root.
    fn root_segments(&self, segments: &[&str]) -> usize {
        match self {
            // owner / repo / tree|blob / ref
            Self::GitHub(_) => segments.len().min(4),
            // everything up to `-`, then tree|blob / ref
            Self::GitLab(_) => match segments.iter().position(|s| *s == "-") {
                Some(dash) => (dash + 3).min(segments.len()),
                None => segments.len().min(2),
            },
            Self::Generic(_) => 0,
        }
    }

    /// Map a browse URL to the URL serving its raw bytes.
    pub fn raw_url(&self, url: &str) -> Result<String, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::invalid_url(url, e.to_string()))?;
        let segments: Vec<&str> = parsed
            .path_segments()
            .map(|s| s.collect())
            .unwrap_or_default();

        match self {
            Self::GitHub(cfg) => {
                // owner / repo / blob|tree / ref / path...
                if segments.len() < 5 || !matches!(segments[2], "blob" | "tree") {
                    return Ok(url.to_string());
                }
                let base = match &cfg.raw_base_url {
                    Some(base) => base.trim_end_matches('/').to_string(),
                    None if cfg.host == GITHUB_HOST => GITHUB_RAW_BASE.to_string(),
                    None => format!("{}://{}/raw", parsed.scheme(), cfg.host),
                };
                let mut raw = format!(
                    "{}/{}/{}/{}",
                    base,
                    segments[0],
                    segments[1],
                    segments[3..].join("/")
                );
                if let Some(query) = parsed.query() {
                    raw.push('?');
                    raw.push_str(query);
                }
                Ok(raw)
            }
            Self::GitLab(_) => {
                let Some(dash) = segments.iter().position(|s| *s == "-") else {
                    return Ok(url.to_string());
                };
                if !matches!(segments.get(dash + 1), Some(&"blob") | Some(&"tree")) {
                    return Ok(url.to_string());
                }
                let mut rewritten: Vec<&str> = segments.clone();
                rewritten[dash + 1] = "raw";
                let mut raw = parsed.clone();
                raw.set_path(&format!("/{}", rewritten.join("/")));
                Ok(raw.to_string())
            }
            Self::Generic(cfg) => match &cfg.raw_base_url {
                Some(base) => {
                    let mut raw = format!("{}{}", base.trim_end_matches('/'), parsed.path());
                    if let Some(query) = parsed.query() {
                        raw.push('?');
                        raw.push_str(query);
                    }
                    Ok(raw)
                }
                None => Ok(url.to_string()),
            },
        }
    }
}

impl UrlResolver for ScmIntegration {
    fn resolve_url(&self, relative: &str, base: &str) -> Result<String, FetchError> {
        if Url::parse(relative).is_ok() {
            return Ok(relative.to_string());
        }

        let base_url =
            Url::parse(base).map_err(|e| FetchError::invalid_url(base, e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::invalid_url(base, "not a hierarchical URL"));
        }

        let mut resolved = if let Some(path) = relative.strip_prefix('/') {
            let segments: Vec<&str> = base_url
                .path_segments()
                .map(|s| s.filter(|seg| !seg.is_empty()).collect())
                .unwrap_or_default();
            let root = &segments[..self.root_segments(&segments)];

            let mut url = base_url.clone();
            let mut new_path = String::new();
            for seg in root {
                new_path.push('/');
                new_path.push_str(seg);
            }
            new_path.push('/');
            new_path.push_str(path);
            url.set_path(&new_path);
            url
        } else {
            base_url
                .join(relative)
                .map_err(|e| FetchError::invalid_url(relative, e.to_string()))?
        };

        if resolved.query().is_none() {
            resolved.set_query(base_url.query());
        }
        resolved.set_fragment(None);
        Ok(resolved.to_string())
    }
}

/// Every configured integration, searchable by URL.
#[derive(Debug, Clone)]
pub struct ScmIntegrations {
    integrations: Vec<ScmIntegration>,
}

impl ScmIntegrations {
    pub fn new(integrations: Vec<ScmIntegration>) -> Self {
        Self { integrations }
    }

    /// Build from config. `github.com` and `gitlab.com` are always present;
    /// configuring them only adds a token.
    pub fn from_config(config: &IntegrationsConfig) -> Self {
        let mut integrations: Vec<ScmIntegration> = Vec::new();

        for cfg in &config.github {
            integrations.push(ScmIntegration::GitHub(cfg.into()));
        }
        for cfg in &config.gitlab {
            integrations.push(ScmIntegration::GitLab(cfg.into()));
        }
        for cfg in &config.generic {
            integrations.push(ScmIntegration::Generic(cfg.into()));
        }

        if !integrations.iter().any(|i| i.host() == GITHUB_HOST) {
            integrations.push(ScmIntegration::GitHub(HostConfig::new(GITHUB_HOST)));
        }
        if !integrations.iter().any(|i| i.host() == GITLAB_HOST) {
            integrations.push(ScmIntegration::GitLab(HostConfig::new(GITLAB_HOST)));
        }

        Self::new(integrations)
    }

    /// The integration serving `url`, if any.
    pub fn by_url(&self, url: &str) -> Option<&ScmIntegration> {
        let parsed = Url::parse(url).ok()?;
        self.integrations.iter().find(|i| i.matches(&parsed))
    }

    pub fn list(&self) -> &[ScmIntegration] {
        &self.integrations
    }
}

impl Default for ScmIntegrations {
    fn default() -> Self {
        Self::from_config(&IntegrationsConfig::default())
    }
}
