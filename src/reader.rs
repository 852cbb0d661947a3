//! HTTP content fetching for README candidates.
//!
//! [`HttpUrlReader`] is the production [`ContentFetcher`]: it finds the
//! integration that owns a URL, rewrites it to the raw-content form,
//! attaches the integration's token and reports failures in the
//! [`FetchError`] vocabulary the resolver understands.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use readme_harness_core::{ContentFetcher, FetchError};
use reqwest::StatusCode;
use tracing::debug;

use crate::scm::ScmIntegrations;

pub struct HttpUrlReader {
    client: reqwest::Client,
    integrations: Arc<ScmIntegrations>,
}

impl HttpUrlReader {
    pub fn new(integrations: Arc<ScmIntegrations>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("readme-harness/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            integrations,
        })
    }
}

/// Classify a non-success HTTP status.
pub fn status_error(url: &str, status: StatusCode) -> FetchError {
    match status {
        StatusCode::NOT_FOUND => FetchError::not_found(url),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FetchError::Unauthorized {
            url: url.to_string(),
            status: status.as_u16(),
        },
        other => FetchError::Http {
            url: url.to_string(),
            status: other.as_u16(),
        },
    }
}

#[async_trait]
impl ContentFetcher for HttpUrlReader {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let integration = self
            .integrations
            .by_url(url)
            .ok_or_else(|| FetchError::invalid_url(url, "no integration configured for host"))?;
        let raw_url = integration.raw_url(url)?;
        debug!(url = %url, raw_url = %raw_url, integration = integration.kind(), "fetching");

        let mut request = self.client.get(&raw_url);
        if let Some(token) = integration.token() {
            request = request.bearer_auth(token);
        }

        let network = |e: reqwest::Error| FetchError::Network {
            url: url.to_string(),
            message: e.to_string(),
        };

        let resp = request.send().await.map_err(network)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(status_error(url, status));
        }

        let bytes = resp.bytes().await.map_err(network)?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let url = "https://github.com/a/b/blob/main/README.md";
        assert!(status_error(url, StatusCode::NOT_FOUND).is_not_found());
        assert_eq!(
            status_error(url, StatusCode::FORBIDDEN),
            FetchError::Unauthorized {
                url: url.to_string(),
                status: 403
            }
        );
        assert_eq!(
            status_error(url, StatusCode::UNAUTHORIZED),
            FetchError::Unauthorized {
                url: url.to_string(),
                status: 401
            }
        );
        assert_eq!(
            status_error(url, StatusCode::BAD_GATEWAY),
            FetchError::Http {
                url: url.to_string(),
                status: 502
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_host_is_invalid_url() {
        let reader =
            HttpUrlReader::new(Arc::new(ScmIntegrations::default()), Duration::from_secs(1))
                .unwrap();
        let err = reader
            .fetch("https://unknown.example/README.md")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }
}
