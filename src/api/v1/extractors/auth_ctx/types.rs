/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - authorize middleware が endpoint の scheme に絞った context を extensions に格納し、
 *   handler はこの型だけを受け取る
 */
use crate::services::auth::AuthenticationContext;

/// The request's authentication context, restricted to the schemes the endpoint accepts.
#[derive(Debug, Clone)]
pub struct AuthContext(pub AuthenticationContext);

/// Owner of the caller's todo items (`local_user_id`, else the identity provider's `sub`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
}
