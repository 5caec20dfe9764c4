/*!
 * Authentication context extractors
 *
 * Responsibility:
 * - 認証・認可済みリクエストのコンテキストを handler に提供する
 * - HTTP / axum 依存は core に閉じ込め、型定義は types に分離する
 *
 * Public API:
 * - AuthContext
 * - CurrentUser
 */

mod core;
mod types;

pub use types::{AuthContext, CurrentUser};
