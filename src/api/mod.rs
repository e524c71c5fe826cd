use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use tracing::{info, warn};

use crate::db::query::{ListParams, TodoQuery};
use crate::db::repository;
use crate::error::AppError;
use crate::models::*;
use crate::state::AppState;
use crate::validation::{validate_create, validate_update};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/todos", get(list_todos).post(create_todo))
        .route(
            "/todos/{id}",
            get(show_todo).patch(update_todo).delete(delete_todo),
        )
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

/// Ids are integers; anything else can never name a stored record.
fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>().map_err(|_| AppError::NotFound)
}

async fn list_todos(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<Todo>>>, AppError> {
    let params = match params {
        Ok(Query(params)) => params,
        Err(rejection) => {
            warn!("ignoring malformed list parameters: {}", rejection.body_text());
            ListParams::default()
        }
    };

    let query = TodoQuery::from_params(&params);
    let (todos, total) = repository::fetch_todos(&state.db, &query).await?;
    let meta = query.page.meta(total);

    Ok(Json(ApiResponse::ok(todos).with_meta(meta)))
}

async fn create_todo(
    State(state): State<AppState>,
    payload: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Todo>>), AppError> {
    let Json(req) = payload?;
    let new_todo = validate_create(req)?;

    let todo = repository::insert_todo(&state.db, new_todo).await?;
    info!(id = todo.id, "todo created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(todo).with_message("Todo created successfully")),
    ))
}

async fn show_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Todo>>, AppError> {
    let id = parse_id(&id)?;
    let todo = repository::find_todo_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(ApiResponse::ok(todo)))
}

async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Todo>>, AppError> {
    let id = parse_id(&id)?;
    if repository::find_todo_by_id(&state.db, id).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let Json(req) = payload?;
    let changes = validate_update(req)?;

    let todo = repository::update_todo(&state.db, id, changes)
        .await?
        .ok_or(AppError::NotFound)?;
    info!(id = todo.id, "todo updated");

    Ok(Json(ApiResponse::ok(todo).with_message("Todo updated successfully")))
}

async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let id = parse_id(&id)?;
    if !repository::delete_todo(&state.db, id).await? {
        return Err(AppError::NotFound);
    }
    info!(id, "todo deleted");

    Ok(Json(ApiResponse::empty().with_message("Todo deleted successfully")))
}
