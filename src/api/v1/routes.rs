/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - route ごとに受け付ける認証 scheme と policy を guard で宣言する
 *   - cookie: browser (SPA) 向け / native, worker: bearer token 向け
 * - /health 以外に authenticate middleware を掛ける
 */
use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::middleware::auth::{Authorize, BEARER, COOKIE, authenticate, guard};
use crate::state::AppState;

use crate::api::v1::handlers::{
    health::health,
    identity::get_identity,
    todo_items::{
        create, delete_own, get_any, get_own, list_all, list_own, mark_completed,
        mark_uncompleted, update_own,
    },
};

pub mod policies {
    pub const VIEW_TODO_ITEM: &str = "View TodoItem";
    pub const READ_TODO_ITEM: &str = "read.todoitem";
    pub const WRITE_TODO_ITEM: &str = "write.todoitem";
    pub const DELETE_TODO_ITEM: &str = "delete.todoitem";
    pub const WORKER_TODO_ITEM: &str = "worker.todoitem";
}

use policies::*;

pub fn routes(state: AppState) -> Router<AppState> {
    let s = &state;

    let protected = Router::new()
        // identity
        .route(
            "/identity",
            guard(get(get_identity), s, Authorize::authenticated(COOKIE)),
        )
        .route(
            "/admin/native/identity",
            guard(get(get_identity), s, Authorize::authenticated(BEARER)),
        )
        // browser clients
        .route(
            "/todo-items",
            guard(get(list_own), s, Authorize::policy(READ_TODO_ITEM, COOKIE)),
        )
        .route(
            "/todo-items",
            guard(post(create), s, Authorize::policy(WRITE_TODO_ITEM, COOKIE)),
        )
        .route(
            "/todo-items/{slug}",
            guard(get(get_own), s, Authorize::policy(READ_TODO_ITEM, COOKIE)),
        )
        .route(
            "/todo-items/{slug}",
            guard(
                delete(delete_own),
                s,
                Authorize::policy(DELETE_TODO_ITEM, COOKIE),
            ),
        )
        .route(
            "/todo-items/{slug}",
            guard(put(update_own), s, Authorize::policy(WRITE_TODO_ITEM, COOKIE)),
        )
        .route(
            "/todo-items/{slug}/mark-as-completed",
            guard(put(mark_completed), s, Authorize::policy(WRITE_TODO_ITEM, COOKIE)),
        )
        .route(
            "/todo-items/{slug}/mark-as-uncompleted",
            guard(put(mark_uncompleted), s, Authorize::policy(WRITE_TODO_ITEM, COOKIE)),
        )
        // native clients
        .route(
            "/native/todo-items",
            guard(get(list_own), s, Authorize::policy(READ_TODO_ITEM, BEARER)),
        )
        .route(
            "/native/todo-items",
            guard(post(create), s, Authorize::policy(WRITE_TODO_ITEM, BEARER)),
        )
        .route(
            "/native/todo-items/{slug}",
            guard(get(get_own), s, Authorize::policy(READ_TODO_ITEM, BEARER)),
        )
        .route(
            "/native/todo-items/{slug}",
            guard(
                delete(delete_own),
                s,
                Authorize::policy(DELETE_TODO_ITEM, BEARER),
            ),
        )
        .route(
            "/native/todo-items/{slug}",
            guard(put(update_own), s, Authorize::policy(WRITE_TODO_ITEM, BEARER)),
        )
        .route(
            "/native/todo-items/{slug}/mark-as-completed",
            guard(put(mark_completed), s, Authorize::policy(WRITE_TODO_ITEM, BEARER)),
        )
        .route(
            "/native/todo-items/{slug}/mark-as-uncompleted",
            guard(put(mark_uncompleted), s, Authorize::policy(WRITE_TODO_ITEM, BEARER)),
        )
        // background workers
        .route(
            "/worker/todo-items",
            guard(get(list_all), s, Authorize::policy(WORKER_TODO_ITEM, BEARER)),
        )
        .route(
            "/worker/todo-items/{slug}",
            guard(get(get_any), s, Authorize::policy(WORKER_TODO_ITEM, BEARER)),
        )
        // admin
        .route(
            "/admin/todo-items",
            guard(get(list_all), s, Authorize::policy(VIEW_TODO_ITEM, COOKIE)),
        )
        .route(
            "/admin/todo-items/{slug}",
            guard(get(get_any), s, Authorize::policy(VIEW_TODO_ITEM, COOKIE)),
        )
        .route(
            "/admin/native/todo-items",
            guard(get(list_all), s, Authorize::policy(VIEW_TODO_ITEM, BEARER)),
        )
        .route(
            "/admin/native/todo-items/{slug}",
            guard(get(get_any), s, Authorize::policy(VIEW_TODO_ITEM, BEARER)),
        );

    let protected = authenticate::apply(protected, state.clone());

    Router::new().route("/health", get(health)).merge(protected)
}
