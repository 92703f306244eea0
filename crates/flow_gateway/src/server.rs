use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use flow_core::config::ServerConfig;
use flow_core::{
    ChatMessage, Class, Goal, GoalPatch, Preferences, PreferencesPatch, ScheduleEvent, Task,
    TaskPatch,
};
use flow_memory::SchedulingInsights;
use flow_reasoning::{ChatReply, Planner};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::error::{ApiError, ApiJson};
use crate::types::{
    AddGoalRequest, ChatCommandRequest, FeedbackRequest, OkResponse, PostMessageRequest,
    ScheduleRequest, ScheduleResponse, UpdateTaskRequest,
};

type ApiResult<T> = std::result::Result<T, ApiError>;

/// Shared state for the gateway server.
#[derive(Clone)]
pub struct AppState {
    pub planner: Arc<Planner>,
    /// Upper bound for one run of the agent chain.
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(planner: Arc<Planner>) -> Self {
        Self {
            planner,
            request_timeout: Duration::from_secs(120),
        }
    }
}

/// Build the full route table.
///
/// - `POST /get_schedule`, `/chat_command`, `/update_task`, `/add_goal`, `/feedback`
/// - `GET /insights/:user_id`, `GET /health`
/// - REST collections under `/users/:user_id`
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/get_schedule", post(get_schedule))
        .route("/chat_command", post(chat_command))
        .route("/update_task", post(update_task))
        .route("/add_goal", post(add_goal))
        .route("/feedback", post(record_feedback))
        .route("/insights/:user_id", get(insights))
        .route("/users/:user_id/tasks", get(list_tasks).post(create_task))
        .route(
            "/users/:user_id/tasks/:id",
            patch(patch_task).delete(delete_task),
        )
        .route("/users/:user_id/goals", get(list_goals).post(create_goal))
        .route(
            "/users/:user_id/goals/:id",
            patch(patch_goal).delete(delete_goal),
        )
        .route("/users/:user_id/classes", get(list_classes).post(create_class))
        .route("/users/:user_id/events", get(list_events).post(create_event))
        .route(
            "/users/:user_id/messages",
            get(list_messages).post(post_message),
        )
        .route(
            "/users/:user_id/preferences",
            get(get_preferences)
                .put(put_preferences)
                .patch(patch_preferences),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// The Flow HTTP server.
pub struct GatewayServer {
    state: AppState,
    host: String,
    port: u16,
}

impl GatewayServer {
    pub fn new(planner: Arc<Planner>, config: &ServerConfig) -> Self {
        Self {
            state: AppState {
                planner,
                request_timeout: Duration::from_secs(config.request_timeout_secs.max(1)),
            },
            host: config.host.clone(),
            port: config.port,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    /// Bind the configured address and serve until `shutdown` resolves.
    pub async fn run(self, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<()> {
        let addr = self.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Gateway failed to bind {addr}"))?;
        tracing::info!("Gateway listening on {}", addr);
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .context("Gateway server error")
    }

    /// Serve on an already bound listener in a background task.
    pub fn start_on(self, listener: TcpListener) -> tokio::task::JoinHandle<()> {
        let app = self.router();
        tokio::spawn(async move {
            if let Ok(addr) = listener.local_addr() {
                tracing::info!("Gateway listening on {}", addr);
            }
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Gateway server error: {}", e);
            }
        })
    }
}

// ============================================================================
// Route handlers
// ============================================================================

async fn health() -> &'static str {
    "ok"
}

async fn with_timeout<T>(
    limit: Duration,
    fut: impl Future<Output = anyhow::Result<T>>,
) -> ApiResult<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(_) => {
            tracing::warn!("Planning exceeded {:?}", limit);
            Err(ApiError::timeout())
        }
    }
}

/// POST /get_schedule
async fn get_schedule(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ScheduleRequest>,
) -> ApiResult<Json<ScheduleResponse>> {
    let plan = with_timeout(
        state.request_timeout,
        state.planner.get_schedule(&req.user_id, &req.query),
    )
    .await?;
    Ok(Json(plan.into()))
}

/// POST /chat_command
async fn chat_command(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ChatCommandRequest>,
) -> ApiResult<Json<ChatReply>> {
    let reply = with_timeout(
        state.request_timeout,
        state.planner.chat_command(&req.user_id, &req.command),
    )
    .await?;
    Ok(Json(reply))
}

/// POST /update_task
async fn update_task(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<UpdateTaskRequest>,
) -> ApiResult<Json<OkResponse>> {
    let task = req
        .task
        .ok_or_else(|| ApiError::bad_request("Task data is required"))?;
    state.planner.update_task(&req.user_id, task).await?;
    Ok(Json(OkResponse::OK))
}

/// POST /add_goal
async fn add_goal(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<AddGoalRequest>,
) -> ApiResult<Json<OkResponse>> {
    let goal = req
        .goal
        .ok_or_else(|| ApiError::bad_request("Goal data is required"))?;
    state.planner.add_goal(&req.user_id, goal).await?;
    Ok(Json(OkResponse::OK))
}

/// POST /feedback
async fn record_feedback(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<FeedbackRequest>,
) -> ApiResult<Json<OkResponse>> {
    let feedback = req
        .feedback
        .ok_or_else(|| ApiError::bad_request("Feedback data is required"))?;
    state.planner.record_feedback(&req.user_id, feedback).await?;
    Ok(Json(OkResponse::OK))
}

async fn insights(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<SchedulingInsights> {
    Json(state.planner.insights(&user_id).await)
}

// -- tasks -------------------------------------------------------------------

async fn list_tasks(State(state): State<AppState>, Path(user_id): Path<String>) -> Json<Vec<Task>> {
    Json(state.planner.workspace().tasks(&user_id).await)
}

async fn create_task(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    ApiJson(task): ApiJson<Task>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let task = state.planner.workspace().add_task(&user_id, task).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn patch_task(
    State(state): State<AppState>,
    Path((user_id, id)): Path<(String, String)>,
    ApiJson(patch): ApiJson<TaskPatch>,
) -> ApiResult<Json<Task>> {
    let task = state
        .planner
        .workspace()
        .update_task(&user_id, &id, patch)
        .await?;
    Ok(Json(task))
}

async fn delete_task(
    State(state): State<AppState>,
    Path((user_id, id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    state.planner.workspace().delete_task(&user_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// -- goals -------------------------------------------------------------------

async fn list_goals(State(state): State<AppState>, Path(user_id): Path<String>) -> Json<Vec<Goal>> {
    Json(state.planner.workspace().goals(&user_id).await)
}

async fn create_goal(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    ApiJson(goal): ApiJson<Goal>,
) -> ApiResult<(StatusCode, Json<Goal>)> {
    let goal = state.planner.workspace().add_goal(&user_id, goal).await?;
    Ok((StatusCode::CREATED, Json(goal)))
}

async fn patch_goal(
    State(state): State<AppState>,
    Path((user_id, id)): Path<(String, String)>,
    ApiJson(patch): ApiJson<GoalPatch>,
) -> ApiResult<Json<Goal>> {
    let goal = state
        .planner
        .workspace()
        .update_goal(&user_id, &id, patch)
        .await?;
    Ok(Json(goal))
}

async fn delete_goal(
    State(state): State<AppState>,
    Path((user_id, id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    state.planner.workspace().delete_goal(&user_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// -- classes, events, messages ----------------------------------------------

async fn list_classes(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<Vec<Class>> {
    Json(state.planner.workspace().classes(&user_id).await)
}

async fn create_class(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    ApiJson(class): ApiJson<Class>,
) -> ApiResult<(StatusCode, Json<Class>)> {
    let class = state.planner.workspace().add_class(&user_id, class).await?;
    Ok((StatusCode::CREATED, Json(class)))
}

async fn list_events(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<Vec<ScheduleEvent>> {
    Json(state.planner.workspace().events(&user_id).await)
}

async fn create_event(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    ApiJson(event): ApiJson<ScheduleEvent>,
) -> ApiResult<(StatusCode, Json<ScheduleEvent>)> {
    let event = state.planner.workspace().add_event(&user_id, event).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

async fn list_messages(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<Vec<ChatMessage>> {
    Json(state.planner.workspace().messages(&user_id).await)
}

/// Appends the user's message and the coach's answer; returns both.
async fn post_message(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    ApiJson(req): ApiJson<PostMessageRequest>,
) -> ApiResult<Json<Vec<ChatMessage>>> {
    let messages = with_timeout(
        state.request_timeout,
        state.planner.converse(&user_id, &req.content),
    )
    .await?;
    Ok(Json(messages))
}

// -- preferences -------------------------------------------------------------

async fn get_preferences(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<Preferences> {
    Json(state.planner.workspace().preferences(&user_id).await)
}

async fn put_preferences(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    ApiJson(prefs): ApiJson<Preferences>,
) -> ApiResult<Json<Preferences>> {
    let prefs = state
        .planner
        .workspace()
        .set_preferences(&user_id, prefs)
        .await?;
    Ok(Json(prefs))
}

async fn patch_preferences(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    ApiJson(patch): ApiJson<PreferencesPatch>,
) -> ApiResult<Json<Preferences>> {
    let prefs = state
        .planner
        .workspace()
        .update_preferences(&user_id, patch)
        .await?;
    Ok(Json(prefs))
}
