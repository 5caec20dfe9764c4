/*
 * Responsibility
 * - GET /identity (cookie), GET /admin/native/identity (bearer)
 * - caller の access token で identity provider の user-info を取得し、公開可能な claims だけ返す
 * - cookie session には antiforgery token も渡す (response body + XSRF-TOKEN cookie)
 */
use axum::{
    Extension, Json,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::{
    api::v1::{dto::identity::IdentityResponse, extractors::AuthContext},
    error::AppError,
    services::auth::{
        AuthScheme,
        antiforgery::{self, AntiforgeryToken},
    },
    state::AppState,
};

pub async fn get_identity(
    State(state): State<AppState>,
    AuthContext(ctx): AuthContext,
    antiforgery_token: Option<Extension<AntiforgeryToken>>,
) -> Result<Response, AppError> {
    let user_info = state
        .auth
        .user_info(&ctx)
        .await
        .map_err(|err| {
            error!(error = %err, "user-info lookup failed");
            AppError::Internal
        })?
        // Authenticated, but nothing to call the provider with
        .ok_or(AppError::Unauthorized)?;

    let mut body = IdentityResponse::from_user_info(&user_info);

    // bearer clients are not exposed to CSRF
    let Some(Extension(token)) =
        antiforgery_token.filter(|_| ctx.is_authenticated_by(AuthScheme::Cookie))
    else {
        return Ok(Json(body).into_response());
    };

    body.antiforgery_token = Some(token.as_str().to_string());
    let cookie = format!(
        "{}={}; Path=/; SameSite=Strict",
        antiforgery::COOKIE_NAME,
        token.as_str()
    );

    Ok(([(header::SET_COOKIE, cookie)], Json(body)).into_response())
}
