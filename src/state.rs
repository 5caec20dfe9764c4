/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - auth: 認証・認可 (AuthService), todos: todo items の repo
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::repos::TodoRepo;
use crate::services::auth::AuthService;

#[derive(Clone, Debug)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub todos: TodoRepo,
}

impl AppState {
    pub fn new(auth: Arc<AuthService>, todos: TodoRepo) -> Self {
        Self { auth, todos }
    }
}
