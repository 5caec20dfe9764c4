/*
 * Responsibility
 * - todo items handler (cookie / native / worker / admin で共通)
 * - 認可は route 側の middleware で済んでいる前提。handler は owner の絞り込みだけを行う
 */
use axum::{
    Json,
    extract::{OriginalUri, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::{
    api::v1::{
        dto::todo_items::{
            CreateTodoItemRequest, DataResponse, ListQuery, ListResponse, MessageResponse,
            TodoItemResponse, UpdateTodoItemRequest,
        },
        extractors::CurrentUser,
    },
    error::AppError,
    repos::todo_repo::TodoFilter,
    state::AppState,
};

/// Caller's own items.
pub async fn list_own(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, AppError> {
    list(&state, Some(&user.id), query).await
}

/// Every owner's items (worker / admin).
pub async fn list_all(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, AppError> {
    list(&state, None, query).await
}

async fn list(
    state: &AppState,
    owner_id: Option<&str>,
    query: ListQuery,
) -> Result<Json<ListResponse>, AppError> {
    query
        .validate()
        .map_err(|msg| AppError::bad_request("INVALID_QUERY", msg))?;

    let filter = TodoFilter {
        owner_id,
        search: query.search(),
    };
    let page = state
        .todos
        .list(&filter, query.page(), query.page_size())
        .await;

    Ok(Json(ListResponse::from_page(page, &query)))
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    OriginalUri(uri): OriginalUri,
    Json(req): Json<CreateTodoItemRequest>,
) -> Result<Response, AppError> {
    req.validate()
        .map_err(|msg| AppError::bad_request("INVALID_TODO_ITEM", msg))?;

    let row = state.todos.create(&user.id, req.name.trim()).await?;
    let location = format!("{}/{}", uri.path().trim_end_matches('/'), row.slug);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(MessageResponse {
            message: "todo item created",
            data: Some(TodoItemResponse::from(row)),
        }),
    )
        .into_response())
}

pub async fn get_own(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(slug): Path<String>,
) -> Result<Json<DataResponse<TodoItemResponse>>, AppError> {
    let row = state
        .todos
        .get(Some(&user.id), &slug)
        .await
        .ok_or(AppError::not_found("todo item"))?;

    Ok(Json(DataResponse { data: row.into() }))
}

/// Any owner's item (worker / admin).
pub async fn get_any(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<DataResponse<TodoItemResponse>>, AppError> {
    let row = state
        .todos
        .get(None, &slug)
        .await
        .ok_or(AppError::not_found("todo item"))?;

    Ok(Json(DataResponse { data: row.into() }))
}

pub async fn update_own(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(slug): Path<String>,
    Json(req): Json<UpdateTodoItemRequest>,
) -> Result<Json<MessageResponse<TodoItemResponse>>, AppError> {
    req.validate()
        .map_err(|msg| AppError::bad_request("INVALID_TODO_ITEM", msg))?;

    let row = state
        .todos
        .update_name(&user.id, &slug, req.name.trim())
        .await?
        .ok_or(AppError::not_found("todo item"))?;

    Ok(Json(MessageResponse {
        message: "todo item updated",
        data: Some(row.into()),
    }))
}

pub async fn mark_completed(
    state: State<AppState>,
    user: CurrentUser,
    slug: Path<String>,
) -> Result<Json<MessageResponse<TodoItemResponse>>, AppError> {
    set_completed(state, user, slug, true).await
}

pub async fn mark_uncompleted(
    state: State<AppState>,
    user: CurrentUser,
    slug: Path<String>,
) -> Result<Json<MessageResponse<TodoItemResponse>>, AppError> {
    set_completed(state, user, slug, false).await
}

async fn set_completed(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(slug): Path<String>,
    is_completed: bool,
) -> Result<Json<MessageResponse<TodoItemResponse>>, AppError> {
    state
        .todos
        .set_completed(&user.id, &slug, is_completed)
        .await
        .ok_or(AppError::not_found("todo item"))?;

    let message = if is_completed {
        "todo item marked as completed"
    } else {
        "todo item marked as uncompleted"
    };

    Ok(Json(MessageResponse {
        message,
        data: None,
    }))
}

pub async fn delete_own(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(slug): Path<String>,
) -> Result<Json<MessageResponse<TodoItemResponse>>, AppError> {
    if !state.todos.delete(&user.id, &slug).await {
        return Err(AppError::not_found("todo item"));
    }

    Ok(Json(MessageResponse {
        message: "todo item deleted",
        data: None,
    }))
}
