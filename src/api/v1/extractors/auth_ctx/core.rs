use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::services::auth::AuthenticationContext;
use crate::services::auth::claims::claim_types;
use crate::state::AppState;

use super::{AuthContext, CurrentUser};

/// middleware が AuthenticationContext を request.extensions() に insert 済みである前提
/// 見つからない場合は 401 を返す（ミドルウェア未設定）
impl FromRequestParts<AppState> for AuthContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticationContext>()
            .cloned()
            .map(AuthContext)
            .ok_or(AppError::Unauthorized)
    }
}

/// - principal がいない → 401
/// - `local_user_id` があればそれ、なければ `sub` を owner とする
/// - どちらもない (client credentials token など) → 403
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let ctx = parts
            .extensions
            .get::<AuthenticationContext>()
            .ok_or(AppError::Unauthorized)?;
        let principal = ctx.principal().ok_or(AppError::Unauthorized)?;
        let id = principal
            .first_claim(claim_types::LOCAL_USER_ID)
            .or_else(|| principal.subject())
            .ok_or(AppError::Forbidden)?;

        Ok(CurrentUser { id: id.to_string() })
    }
}
