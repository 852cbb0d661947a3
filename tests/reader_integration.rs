//! `HttpUrlReader` against a live fake SCM host on an ephemeral port.
//!
//! The host is registered as a generic integration whose raw files live
//! under `/raw`, so every test also checks which URL was actually fetched.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::Router;
use readme_harness::reader::HttpUrlReader;
use readme_harness::scm::{HostConfig, ScmIntegration, ScmIntegrations};
use readme_harness_core::{
    CandidateFile, FetchError, ReadmeError, ResolutionOutcome, Resolver, SymlinkPolicy,
};

const TOKEN: &str = "s3cret";

/// Serves scripted responses and records `(path, authorization)` per request.
#[derive(Default)]
struct FakeHost {
    responses: HashMap<String, (StatusCode, String)>,
    requests: Mutex<Vec<(String, Option<String>)>>,
}

impl FakeHost {
    fn respond(mut self, path: &str, status: StatusCode, body: &str) -> Self {
        self.responses
            .insert(path.to_string(), (status, body.to_string()));
        self
    }

    fn requested_paths(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(path, _)| path.clone())
            .collect()
    }
}

async fn serve_file(
    State(host): State<Arc<FakeHost>>,
    uri: Uri,
    headers: HeaderMap,
) -> (StatusCode, String) {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    host.requests
        .lock()
        .unwrap()
        .push((uri.path().to_string(), auth));

    host.responses
        .get(uri.path())
        .cloned()
        .unwrap_or((StatusCode::NOT_FOUND, "no such file".to_string()))
}

struct Harness {
    host: Arc<FakeHost>,
    integration: ScmIntegration,
    reader: HttpUrlReader,
    source_url: String,
}

async fn spawn_host(host: FakeHost) -> Harness {
    let host = Arc::new(host);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().fallback(serve_file).with_state(host.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let integration = ScmIntegration::Generic(HostConfig {
        host: addr.to_string(),
        token: Some(TOKEN.to_string()),
        raw_base_url: Some(format!("http://{}/raw", addr)),
    });
    let integrations = Arc::new(ScmIntegrations::new(vec![integration.clone()]));
    let reader = HttpUrlReader::new(integrations, Duration::from_secs(5)).unwrap();

    Harness {
        host,
        integration,
        reader,
        source_url: format!("http://{}/acme/svc/browse/", addr),
    }
}

fn resolver() -> Resolver {
    Resolver::with_candidates(
        vec![
            CandidateFile::new("README.md", "text/markdown"),
            CandidateFile::new("README.rst", "text/x-rst"),
        ],
        SymlinkPolicy::default(),
    )
}

#[tokio::test]
async fn test_http_404_falls_through_to_next_candidate() {
    let h = spawn_host(
        FakeHost::default().respond("/raw/acme/svc/browse/README.rst", StatusCode::OK, "Svc\n==="),
    )
    .await;

    let outcome = resolver()
        .resolve(&h.source_url, &h.integration, &h.reader)
        .await
        .unwrap();

    let ResolutionOutcome::Found(file) = outcome else {
        panic!("expected a README, got {:?}", outcome);
    };
    assert_eq!(file.name, "README.rst");
    assert_eq!(file.content_type, "text/x-rst");
    assert_eq!(file.content, "Svc\n===");

    assert_eq!(
        h.host.requested_paths(),
        vec![
            "/raw/acme/svc/browse/README.md",
            "/raw/acme/svc/browse/README.rst"
        ]
    );
    let requests = h.host.requests.lock().unwrap();
    assert!(requests
        .iter()
        .all(|(_, auth)| auth.as_deref() == Some("Bearer s3cret")));
}

#[tokio::test]
async fn test_every_candidate_missing_is_not_found() {
    let h = spawn_host(FakeHost::default()).await;

    let outcome = resolver()
        .resolve(&h.source_url, &h.integration, &h.reader)
        .await
        .unwrap();
    assert_eq!(outcome, ResolutionOutcome::NotFound);
    assert_eq!(h.host.requested_paths().len(), 2);
}

#[tokio::test]
async fn test_http_500_aborts_resolution() {
    let h = spawn_host(
        FakeHost::default()
            .respond("/raw/acme/svc/browse/README.md", StatusCode::INTERNAL_SERVER_ERROR, "boom")
            .respond("/raw/acme/svc/browse/README.rst", StatusCode::OK, "never read"),
    )
    .await;

    let err = resolver()
        .resolve(&h.source_url, &h.integration, &h.reader)
        .await
        .unwrap_err();
    match err {
        ReadmeError::Fetch(FetchError::Http { status, url }) => {
            assert_eq!(status, 500);
            assert!(url.ends_with("/acme/svc/browse/README.md"), "{}", url);
        }
        other => panic!("expected an HTTP error, got {:?}", other),
    }
    assert_eq!(h.host.requested_paths(), vec!["/raw/acme/svc/browse/README.md"]);
}

#[tokio::test]
async fn test_http_403_is_unauthorized() {
    let h = spawn_host(FakeHost::default().respond(
        "/raw/acme/svc/browse/README.md",
        StatusCode::FORBIDDEN,
        "denied",
    ))
    .await;

    let err = resolver()
        .resolve(&h.source_url, &h.integration, &h.reader)
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            ReadmeError::Fetch(FetchError::Unauthorized { status: 403, .. })
        ),
        "{:?}",
        err
    );
}

#[tokio::test]
async fn test_symlink_followed_over_http() {
    let h = spawn_host(
        FakeHost::default()
            .respond("/raw/acme/svc/browse/README.md", StatusCode::OK, "docs/intro.md")
            .respond("/raw/acme/svc/browse/docs/intro.md", StatusCode::OK, "# Intro"),
    )
    .await;

    let outcome = resolver()
        .resolve(&h.source_url, &h.integration, &h.reader)
        .await
        .unwrap();
    let ResolutionOutcome::Found(file) = outcome else {
        panic!("expected a README, got {:?}", outcome);
    };
    assert_eq!(file.name, "README.md");
    assert_eq!(file.content, "# Intro");
    assert_eq!(
        h.host.requested_paths(),
        vec![
            "/raw/acme/svc/browse/README.md",
            "/raw/acme/svc/browse/docs/intro.md"
        ]
    );
}
