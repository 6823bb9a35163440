use crate::error::ApiError;
use crate::extract::{ApiJson, AuthUser};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use domain::{AuthResponse, Credentials, NewTodo, Registration, Todo, TodoPatch};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthBody {
    /// サービスの簡易ステータス
    pub status: &'static str,
}

/// DELETE /todos/:id のレスポンス
#[derive(Debug, Serialize)]
pub struct Acknowledgement {
    pub success: bool,
    pub message: &'static str,
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthBody { status: "ok" }))
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(registration): ApiJson<Registration>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let response = state.auth.register(registration).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> Result<Json<AuthResponse>, ApiError> {
    Ok(Json(state.auth.login(credentials).await?))
}

/// クエリパラメータは受け付けず、常に呼び出し元の ToDo だけを返す
pub async fn list_todos(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<Vec<Todo>>, ApiError> {
    Ok(Json(state.todos.list(&caller).await?))
}

pub async fn create_todo(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiJson(draft): ApiJson<NewTodo>,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    let todo = state.todos.create(&caller, draft).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

pub async fn get_todo(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Todo>, ApiError> {
    Ok(Json(state.todos.get(&caller, &id).await?))
}

pub async fn update_todo(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<TodoPatch>,
) -> Result<Json<Todo>, ApiError> {
    state
        .todos
        .update(&caller, &id, patch)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_todo("update", e))
}

pub async fn delete_todo(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Acknowledgement>, ApiError> {
    state
        .todos
        .delete(&caller, &id)
        .await
        .map_err(|e| ApiError::from_todo("delete", e))?;

    Ok(Json(Acknowledgement {
        success: true,
        message: "Todo removed",
    }))
}
