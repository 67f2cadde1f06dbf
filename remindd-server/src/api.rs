//! HTTP API: shared state, request extraction, handlers, and routing.
//!
//! The server exposes a JSON task API under `/tasks` plus a `/health` probe.
//! Every task route requires an `x-user-id` header identifying the caller;
//! `x-user-name` and `x-user-email` are picked up when present so the
//! reminder scheduler knows where to send mail.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde_json::json;

use remindd_core::notify::{Contact, MemoryDirectory};
use remindd_core::service::{ListOptions, SortBy, StatusFilter, TaskService};
use remindd_core::task::{NewTask, Priority, TaskId, TaskPatch};
use remindd_core::TaskError;

/// Shared application state handed to every handler.
pub struct AppState {
    /// Task domain service.
    pub service: TaskService,
    /// Contact directory updated from request headers.
    pub directory: Arc<MemoryDirectory>,
}

/// The authenticated caller, extracted from upstream auth headers.
///
/// Authentication itself happens upstream (gateway or reverse proxy); this
/// server trusts the `x-user-*` headers it is handed. A request without
/// `x-user-id` is rejected with 401.
pub struct Principal {
    /// Opaque user identifier, used as the task owner key.
    pub id: String,
    /// Display name, if forwarded.
    pub name: Option<String>,
    /// Email address, if forwarded.
    pub email: Option<String>,
}

impl FromRequestParts<Arc<AppState>> for Principal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        let Some(id) = header("x-user-id").filter(|v| !v.is_empty()) else {
            return Err(ApiError::Unauthorized);
        };
        let name = header("x-user-name");
        let email = header("x-user-email");

        // Keep the contact directory current so reminder mail has an address.
        if let Some(email_addr) = &email {
            let contact = Contact {
                name: name.clone().unwrap_or_else(|| id.clone()),
                email: email_addr.clone(),
            };
            state.directory.upsert(&id, contact).await;
        }

        Ok(Self { id, name, email })
    }
}

/// Errors returned to API clients.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or empty `x-user-id` header.
    Unauthorized,
    /// Route or resource does not exist.
    NotFound,
    /// Request was malformed (bad JSON, bad query parameter).
    BadRequest(String),
    /// Domain-level failure from the task service.
    Task(TaskError),
}

impl From<TaskError> for ApiError {
    fn from(e: TaskError) -> Self {
        Self::Task(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Missing x-user-id header".to_string(),
            ),
            Self::NotFound => (StatusCode::NOT_FOUND, "Task not found".to_string()),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::Task(e) => match &e {
                TaskError::NotFound(_) => (StatusCode::NOT_FOUND, "Task not found".to_string()),
                TaskError::Forbidden => (StatusCode::FORBIDDEN, e.to_string()),
                TaskError::Store(detail) => {
                    tracing::error!(error = %detail, "store failure while handling request");
                    (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
                }
                _ => (StatusCode::BAD_REQUEST, e.to_string()),
            },
        };

        let body = json!({
            "status": "error",
            "message": message,
        });
        (status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request and response bodies
// ---------------------------------------------------------------------------

/// Query parameters accepted by `GET /tasks`.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    status: Option<String>,
    priority: Option<String>,
    sort_by: Option<String>,
}

/// Body for `POST /tasks`.
///
/// Every field is optional at the wire level so that a missing required
/// field produces the service's validation message instead of a
/// deserialization rejection.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    title: Option<String>,
    description: Option<String>,
    due_date: Option<DateTime<Utc>>,
    reminder_at: Option<DateTime<Utc>>,
    priority: Option<Priority>,
}

/// Body for `PUT /tasks/{id}`. All fields optional; absent fields keep the
/// stored value.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    title: Option<String>,
    description: Option<String>,
    due_date: Option<DateTime<Utc>>,
    reminder_at: Option<DateTime<Utc>>,
    priority: Option<Priority>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "success",
        "message": "Server is healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn list_tasks(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Query(query): Query<ListQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let options = parse_list_options(&query)?;
    let tasks = state.service.list(&principal.id, options).await?;

    Ok(Json(json!({
        "status": "success",
        "count": tasks.len(),
        "data": tasks,
    })))
}

async fn task_stats(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<Json<serde_json::Value>, ApiError> {
    let stats = state.service.stats(&principal.id).await?;

    Ok(Json(json!({
        "status": "success",
        "data": stats,
    })))
}

async fn create_task(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    body: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let (Some(title), Some(due_date), Some(reminder_at)) =
        (request.title, request.due_date, request.reminder_at)
    else {
        return Err(TaskError::MissingFields.into());
    };

    let new_task = NewTask {
        title,
        description: request.description,
        due_date,
        reminder_at,
        priority: request.priority,
    };
    let task = state.service.create(&principal.id, new_task).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "data": task,
        })),
    ))
}

async fn get_task(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = parse_task_id(&id)?;
    let task = state.service.get(&principal.id, id).await?;

    Ok(Json(json!({
        "status": "success",
        "data": task,
    })))
}

async fn update_task(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<String>,
    body: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = parse_task_id(&id)?;
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let patch = TaskPatch {
        title: request.title,
        description: request.description,
        due_date: request.due_date,
        reminder_at: request.reminder_at,
        priority: request.priority,
    };
    let task = state.service.update(&principal.id, id, patch).await?;

    Ok(Json(json!({
        "status": "success",
        "data": task,
    })))
}

async fn delete_task(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = parse_task_id(&id)?;
    state.service.delete(&principal.id, id).await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Task deleted successfully",
        "data": {},
    })))
}

async fn complete_task(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = parse_task_id(&id)?;
    let task = state.service.complete(&principal.id, id).await?;

    Ok(Json(json!({
        "status": "success",
        "data": task,
    })))
}

async fn route_not_found() -> Response {
    let body = json!({
        "status": "error",
        "message": "Route not found",
    });
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a path segment into a [`TaskId`].
///
/// A malformed id cannot name any stored task, so it maps to 404 rather
/// than 400.
fn parse_task_id(raw: &str) -> Result<TaskId, ApiError> {
    raw.parse().map_err(|_| ApiError::NotFound)
}

/// Translate query parameters into service-level list options.
///
/// Unknown `status` and `sortBy` values are ignored (no filter, default
/// order); a malformed `priority` is a 400 since it can never match.
fn parse_list_options(query: &ListQuery) -> Result<ListOptions, ApiError> {
    let status = query.status.as_deref().and_then(|s| match s {
        "completed" => Some(StatusFilter::Completed),
        "pending" => Some(StatusFilter::Pending),
        _ => None,
    });

    let priority = query
        .priority
        .as_deref()
        .map(str::parse::<Priority>)
        .transpose()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let sort_by = query.sort_by.as_deref().and_then(|s| match s {
        "dueDate" => Some(SortBy::DueDate),
        "priority" => Some(SortBy::Priority),
        _ => None,
    });

    Ok(ListOptions {
        status,
        priority,
        sort_by,
    })
}

// ---------------------------------------------------------------------------
// Router and server startup
// ---------------------------------------------------------------------------

/// Builds the application router over the given state.
#[must_use]
pub fn router(state: Arc<AppState>) -> axum::Router {
    axum::Router::new()
        .route("/health", axum::routing::get(health))
        .route(
            "/tasks",
            axum::routing::get(list_tasks).post(create_task),
        )
        .route("/tasks/stats", axum::routing::get(task_stats))
        .route(
            "/tasks/{id}",
            axum::routing::get(get_task)
                .put(update_task)
                .delete(delete_task),
        )
        .route("/tasks/{id}/complete", axum::routing::post(complete_task))
        .fallback(route_not_found)
        .with_state(state)
}

/// Starts the HTTP server on the given address and returns the bound address
/// and a join handle.
///
/// This is the primary entry point used by both `main.rs` and test code.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server(
    addr: &str,
    state: Arc<AppState>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "http server error");
        }
    });

    Ok((bound_addr, handle))
}
