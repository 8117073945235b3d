use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::info;

use crate::error::AppError;
use crate::models::achievement::Achievement;
use crate::models::task::Task;
use crate::models::user::User;
use crate::state::AppState;
use crate::storage::StorageProvider;

use super::error::{new_request_id, ApiError, ApiResult};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub ok: bool,
    pub timestamp: String,
    pub environment: String,
    pub storage: StorageProvider,
    pub request_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    fn ok() -> Json<Self> {
        Json(Self { ok: true })
    }
}

#[derive(Debug, Deserialize)]
pub struct TaskRef {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct CompleteTaskRequest {
    pub task: TaskRef,
    pub completed: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteTaskResponse {
    pub ok: bool,
    pub xp_gained: i64,
    pub leveled_up: bool,
    pub pet_evolved: bool,
}

#[derive(Debug, Deserialize)]
pub struct TodayQuery {
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TodayResponse {
    pub date: NaiveDate,
    pub tasks: Vec<Task>,
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

pub fn kv_routes() -> Router<AppState> {
    Router::new()
        .route("/kv/user", get(get_user).put(put_user))
        .route("/kv/tasks", get(get_tasks).put(put_tasks))
        .route("/kv/tasks/today", get(get_today))
        .route("/kv/achievements", get(get_achievements).put(put_achievements))
        .route("/kv/complete-task", post(complete_task))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        timestamp: Utc::now().to_rfc3339(),
        environment: state.environment().to_string(),
        storage: state.store().provider(),
        request_id: new_request_id(),
    })
}

async fn get_user(State(state): State<AppState>) -> ApiResult<Json<User>> {
    Ok(Json(state.users().get_user().await?))
}

async fn put_user(
    State(state): State<AppState>,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> ApiResult<Json<OkResponse>> {
    let Json(patch) = body.map_err(|_| ApiError::invalid_body())?;
    state.users().merge_raw(patch).await?;
    Ok(OkResponse::ok())
}

async fn get_tasks(State(state): State<AppState>) -> ApiResult<Json<Vec<Task>>> {
    Ok(Json(state.tasks().list_tasks().await?))
}

async fn put_tasks(
    State(state): State<AppState>,
    body: Result<Json<Vec<Task>>, JsonRejection>,
) -> ApiResult<Json<OkResponse>> {
    let Json(tasks) = body.map_err(|_| ApiError::invalid_body())?;
    state.tasks().replace_tasks(tasks).await?;
    Ok(OkResponse::ok())
}

async fn get_today(
    State(state): State<AppState>,
    query: Result<Query<TodayQuery>, QueryRejection>,
) -> ApiResult<Json<TodayResponse>> {
    let Query(query) = query.map_err(|_| ApiError::bad_request("Invalid query"))?;
    let tasks = state.tasks();
    let date = match query.date.as_deref() {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| ApiError::bad_request("date must be YYYY-MM-DD"))?,
        None => tasks.schedule().today(),
    };
    let due = tasks.tasks_due_on(date).await?;
    Ok(Json(TodayResponse { date, tasks: due }))
}

async fn get_achievements(State(state): State<AppState>) -> ApiResult<Json<Vec<Achievement>>> {
    Ok(Json(state.achievements().list().await?))
}

async fn put_achievements(
    State(state): State<AppState>,
    body: Result<Json<Vec<Achievement>>, JsonRejection>,
) -> ApiResult<Json<OkResponse>> {
    let Json(achievements) = body.map_err(|_| ApiError::invalid_body())?;
    state.achievements().replace(achievements).await?;
    Ok(OkResponse::ok())
}

async fn complete_task(
    State(state): State<AppState>,
    body: Result<Json<CompleteTaskRequest>, JsonRejection>,
) -> ApiResult<Json<CompleteTaskResponse>> {
    let Json(request) = body.map_err(|_| ApiError::invalid_body())?;

    let outcome = state
        .completion()
        .complete_task(&request.task.id, request.completed)
        .await
        .map_err(|err| match err {
            AppError::NotFound => ApiError::not_found("Task not found"),
            other => ApiError::from(other),
        })?;

    info!(
        target: "app::api",
        task_id = %request.task.id,
        xp_gained = outcome.xp_gained,
        "completion request handled"
    );

    Ok(Json(CompleteTaskResponse {
        ok: true,
        xp_gained: outcome.xp_gained,
        leveled_up: outcome.leveled_up,
        pet_evolved: outcome.pet_evolved,
    }))
}
