//! HTTP server.
//!
//! Serves the documentation lookups as plain REST endpoints, the tool
//! registry for agent integrations, and an MCP Streamable HTTP endpoint.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/api/wiki-structure?repo_url=` | Wiki structure for a repository |
//! | `GET`  | `/api/wiki-content?repo_url=&topic=` | One documentation page |
//! | `GET`  | `/tools/list` | List registered tools with schemas |
//! | `POST` | `/tools/{name}` | Call a registered tool by name |
//! | `GET`  | `/health` | Health check (returns version) |
//! | `*`    | `/mcp` | MCP JSON-RPC (Streamable HTTP) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "Missing repo_url parameter" } }
//! ```
//!
//! Error codes: `bad_request` (400), `invalid_repo_url` (400), `not_found` (404),
//! `backend_unavailable` (502), `tool_error` (500). Backend errors are the
//! exception: their status and body are forwarded unchanged.

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header::CONTENT_TYPE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::lookup::{LookupError, LookupService};
use crate::mcp::McpBridge;
use crate::traits::{validate_params, ToolContext, ToolInfo, ToolRegistry};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    lookup: LookupService,
    tools: Arc<ToolRegistry>,
}

impl AppState {
    pub fn new(config: Arc<Config>, lookup: LookupService, tools: Arc<ToolRegistry>) -> Self {
        Self {
            config,
            lookup,
            tools,
        }
    }

    /// State with the built-in tools and a backend client from `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(config.clone()),
            LookupService::new(config),
            Arc::new(ToolRegistry::with_builtins()),
        )
    }
}

/// Starts the server with the built-in tools.
///
/// Binds to `[server].bind` and runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    run_server_with_tools(config, ToolRegistry::with_builtins()).await
}

/// Starts the server with a caller-supplied tool registry.
pub async fn run_server_with_tools(config: &Config, tools: ToolRegistry) -> anyhow::Result<()> {
    let state = AppState::new(
        Arc::new(config.clone()),
        LookupService::new(config),
        Arc::new(tools),
    );

    for t in state.tools.tools() {
        let kind = if t.is_builtin() { "builtin" } else { "rust" };
        tracing::info!(tool = t.name(), kind, "registered tool");
    }

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!(
        bind = %config.server.bind,
        backend = %config.backend.base_url,
        "autodoc server listening"
    );
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the full router (REST + MCP) around `state`.
pub fn build_router(state: AppState) -> Router {
    let bridge = McpBridge::new(
        state.config.clone(),
        state.lookup.clone(),
        state.tools.clone(),
    );
    let mcp_service = StreamableHttpService::new(
        move || Ok(bridge.clone()),
        LocalSessionManager::default().into(),
        StreamableHttpServerConfig::default(),
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/wiki-structure", get(handle_wiki_structure))
        .route("/api/wiki-content", get(handle_wiki_content))
        .route("/tools/list", get(handle_list_tools))
        .route("/tools/{name}", post(handle_tool_call))
        .route("/health", get(handle_health))
        .with_state(state)
        .nest_service("/mcp", mcp_service)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
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

/// Error type that converts into a JSON error response.
struct AppError {
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

/// Map a lookup failure to its HTTP response. Backend errors keep their
/// original status, body bytes, and content type.
fn lookup_error_response(err: LookupError) -> Response {
    match err {
        LookupError::Backend {
            status,
            content_type,
            body,
        } => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            let mut resp = (status, Body::from(body)).into_response();
            if let Some(ct) = content_type.and_then(|c| HeaderValue::from_str(&c).ok()) {
                resp.headers_mut().insert(CONTENT_TYPE, ct);
            }
            resp
        }
        LookupError::MissingParams(msg) => {
            AppError::new(StatusCode::BAD_REQUEST, "bad_request", msg).into_response()
        }
        e @ LookupError::InvalidRepoUrl { .. } => {
            AppError::new(StatusCode::BAD_REQUEST, "invalid_repo_url", e.to_string())
                .into_response()
        }
        e @ LookupError::BackendUnavailable(_) => {
            tracing::error!(error = %e, "backend request failed");
            AppError::new(StatusCode::BAD_GATEWAY, "backend_unavailable", e.to_string())
                .into_response()
        }
        e @ (LookupError::StructureNotFound
        | LookupError::PagesNotFound
        | LookupError::TopicNotFound(_)) => {
            AppError::new(StatusCode::NOT_FOUND, "not_found", e.to_string()).into_response()
        }
    }
}

/// Map a tool failure to a response. Lookup errors keep their own mapping;
/// anything else is a validation error or a tool error.
fn tool_error_response(tool_name: &str, err: anyhow::Error) -> Response {
    let err = match err.downcast::<LookupError>() {
        Ok(lookup) => return lookup_error_response(lookup),
        Err(other) => other,
    };

    let msg = err.to_string();
    if msg.contains("must not be empty") || msg.contains("invalid") || msg.contains("missing") {
        AppError::new(
            StatusCode::BAD_REQUEST,
            "bad_request",
            format!("{}: {}", tool_name, msg),
        )
        .into_response()
    } else {
        AppError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "tool_error",
            format!("{}: {}", tool_name, msg),
        )
        .into_response()
    }
}

// ============ GET /api/wiki-structure, /api/wiki-content ============

/// Query string for the lookup endpoints. Both fields are optional so a
/// missing value reaches the lookup as a named "missing" error.
#[derive(Debug, Deserialize)]
pub struct WikiQuery {
    repo_url: Option<String>,
    topic: Option<String>,
}

async fn handle_wiki_structure(
    State(state): State<AppState>,
    Query(query): Query<WikiQuery>,
) -> Result<Json<serde_json::Value>, Response> {
    state
        .lookup
        .wiki_structure(query.repo_url.as_deref())
        .await
        .map(Json)
        .map_err(lookup_error_response)
}

async fn handle_wiki_content(
    State(state): State<AppState>,
    Query(query): Query<WikiQuery>,
) -> Result<Json<serde_json::Value>, Response> {
    state
        .lookup
        .wiki_content(query.repo_url.as_deref(), query.topic.as_deref())
        .await
        .map(Json)
        .map_err(lookup_error_response)
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

// ============ GET /tools/list ============

#[derive(Serialize)]
struct ToolListResponse {
    tools: Vec<ToolInfo>,
}

async fn handle_list_tools(State(state): State<AppState>) -> Json<ToolListResponse> {
    let tools = state
        .tools
        .tools()
        .iter()
        .map(|t| ToolInfo::from_tool(t.as_ref()))
        .collect();
    Json(ToolListResponse { tools })
}

// ============ POST /tools/{name} ============

/// Looks up the tool, validates parameters, executes it, and wraps the
/// result as `{ "result": ... }`.
async fn handle_tool_call(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(params): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, Response> {
    let tool = state.tools.find(&name).ok_or_else(|| {
        AppError::new(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("no tool registered with name: {}", name),
        )
        .into_response()
    })?;

    let validated = validate_params(&tool.parameters_schema(), &params).map_err(|e| {
        AppError::new(StatusCode::BAD_REQUEST, "bad_request", e.to_string()).into_response()
    })?;

    let ctx = ToolContext::new(state.config.clone(), state.lookup.clone());
    let result = tool
        .execute(validated, &ctx)
        .await
        .map_err(|e| tool_error_response(&name, e))?;

    Ok(Json(serde_json::json!({ "result": result })))
}
