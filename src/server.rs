//! README HTTP server.
//!
//! Serves raw README documents and exposes every registered [`Action`] over
//! a JSON API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/api/readme/{kind}/{namespace}/{name}` | Raw README, `Content-Type` set to the resolved type |
//! | `GET`  | `/api/readme/actions` | List registered actions with input/output schemas |
//! | `POST` | `/api/readme/actions/{name}` | Invoke an action; output wrapped as `{ "output": … }` |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "README not found for entity ..." } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `upstream_error` (502),
//! `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.
//!
//! [`Action`]: crate::actions::Action

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use readme_harness_core::ReadmeError;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::actions::{validate_input, ActionContext, ActionInfo, ActionRegistry, InvalidInput};
use crate::config::Config;
use crate::service::ReadmeService;

/// Shared state handed to every route handler.
#[derive(Clone)]
pub struct AppState {
    service: Arc<ReadmeService>,
    actions: Arc<ActionRegistry>,
}

impl AppState {
    pub fn new(service: Arc<ReadmeService>, actions: Arc<ActionRegistry>) -> Self {
        Self { service, actions }
    }
}

/// Build the router. Split out from [`run_server`] so callers can bind
/// their own listener.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/readme/actions", get(handle_list_actions))
        .route("/api/readme/actions/{name}", post(handle_invoke_action))
        .route("/api/readme/{kind}/{namespace}/{name}", get(handle_get_readme))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

/// Start the server on `[server].bind` with the built-in actions.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    run_server_with_actions(config, ActionRegistry::with_builtins()).await
}

/// Like [`run_server`], serving the given actions instead of the built-ins.
pub async fn run_server_with_actions(
    config: &Config,
    actions: ActionRegistry,
) -> anyhow::Result<()> {
    let service = Arc::new(ReadmeService::from_config(config)?);
    for action in actions.actions() {
        info!(action = action.name(), "registered action");
    }
    let app = router(AppState::new(service, Arc::new(actions)));

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(bind = %config.server.bind, "README server listening");
    println!("README server listening on http://{}", config.server.bind);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// An error rendered as a JSON response.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl AppError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    fn upstream(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, "upstream_error", message)
    }

    fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &str {
        self.code
    }
}

impl From<&ReadmeError> for AppError {
    fn from(err: &ReadmeError) -> Self {
        let message = err.to_string();
        if err.is_not_found() {
            return Self::not_found(message);
        }
        match err {
            ReadmeError::InvalidEntityRef { .. } => Self::bad_request(message),
            ReadmeError::Fetch(_)
            | ReadmeError::DanglingSymlink { .. }
            | ReadmeError::Catalog(_) => Self::upstream(message),
            _ => Self::internal(message),
        }
    }
}

impl From<ReadmeError> for AppError {
    fn from(err: ReadmeError) -> Self {
        Self::from(&err)
    }
}

/// Map an action failure to a response by inspecting its concrete type.
pub fn classify_action_error(action: &str, err: &anyhow::Error) -> AppError {
    if let Some(readme) = err.downcast_ref::<ReadmeError>() {
        let mut app = AppError::from(readme);
        if app.status.is_server_error() {
            warn!(action, error = %readme, "action failed");
        }
        app.message = format!("{}: {}", action, app.message);
        return app;
    }
    if let Some(invalid) = err.downcast_ref::<InvalidInput>() {
        return AppError::bad_request(format!("{}: {}", action, invalid));
    }
    warn!(action, error = %err, "action failed");
    AppError::internal(format!("{}: {}", action, err))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /api/readme/{kind}/{namespace}/{name} ============

/// Serve the raw README with its resolved content type.
async fn handle_get_readme(
    State(state): State<AppState>,
    Path((kind, namespace, name)): Path<(String, String, String)>,
) -> Result<Response, AppError> {
    let raw_ref = format!("{}:{}/{}", kind, namespace, name);
    let readme = state.service.get_readme(&raw_ref).await?;

    Ok((
        [(header::CONTENT_TYPE, readme.file.content_type)],
        readme.file.content,
    )
        .into_response())
}

// ============ GET /api/readme/actions ============

#[derive(Serialize)]
struct ActionListResponse {
    actions: Vec<ActionInfo>,
}

async fn handle_list_actions(State(state): State<AppState>) -> Json<ActionListResponse> {
    Json(ActionListResponse {
        actions: state.actions.infos(),
    })
}

// ============ POST /api/readme/actions/{name} ============

async fn handle_invoke_action(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(input): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, AppError> {
    let action = state
        .actions
        .find(&name)
        .ok_or_else(|| AppError::not_found(format!("no action registered with name: {}", name)))?;

    validate_input(&action.input_schema(), &input)
        .map_err(|e| AppError::bad_request(format!("{}: {}", name, e)))?;

    let ctx = ActionContext::new(state.service.clone());
    let output = action
        .invoke(input, &ctx)
        .await
        .map_err(|e| classify_action_error(&name, &e))?;

    Ok(Json(serde_json::json!({ "output": output })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use readme_harness_core::FetchError;

    #[test]
    fn test_not_found_family_is_404() {
        let cases = [
            ReadmeError::NotFound {
                entity_ref: "component:default/a".to_string(),
                tried: vec!["README.md".to_string()],
            },
            ReadmeError::CachedNotFound("component:default/a".to_string()),
            ReadmeError::EntityNotFound("component:default/a".to_string()),
            ReadmeError::NoSourceLocation("component:default/a".to_string()),
            ReadmeError::NoIntegration("https://x".to_string()),
        ];
        for err in &cases {
            let app = AppError::from(err);
            assert_eq!(app.status(), StatusCode::NOT_FOUND);
            assert_eq!(app.code(), "not_found");
        }
    }

    #[test]
    fn test_infrastructure_errors_are_upstream() {
        let err = ReadmeError::Fetch(FetchError::Http {
            url: "https://x".to_string(),
            status: 500,
        });
        let app = AppError::from(&err);
        assert_eq!(app.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(app.code(), "upstream_error");
    }

    #[test]
    fn test_classify_action_error_downcasts() {
        let err = anyhow::Error::from(ReadmeError::InvalidEntityRef {
            reference: ":x".to_string(),
            reason: "kind is empty".to_string(),
        });
        assert_eq!(
            classify_action_error("get-readme-content", &err).status(),
            StatusCode::BAD_REQUEST
        );

        let err = anyhow::Error::from(InvalidInput("entityRef must not be empty".to_string()));
        assert_eq!(
            classify_action_error("get-readme-content", &err).code(),
            "bad_request"
        );

        let err = anyhow::anyhow!("boom");
        assert_eq!(
            classify_action_error("get-readme-content", &err).code(),
            "internal"
        );
    }
}
