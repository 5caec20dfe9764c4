//! session cookie / `Authorization: Bearer` → AuthenticationContext を extensions に入れる
//!
//! - 認証に失敗した scheme は context に入らないだけ (401 にするかは authorize 側が決める)
//! - session backend の障害は fail-closed: cookie は認証されない
//! - cookie session が認証されたら、その session の antiforgery token も extensions に入れる

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::{self, Next},
    response::Response,
};
use tracing::{debug, warn};

use crate::services::auth::antiforgery::AntiforgeryToken;
use crate::services::auth::{AuthScheme, AuthenticationContext};
use crate::state::AppState;

pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(state, authenticate_middleware))
}

async fn authenticate_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let (ctx, antiforgery) = authenticate(&state, req.headers()).await;

    // middleware → extractor / authorize への受け渡し
    req.extensions_mut().insert(ctx);
    if let Some(token) = antiforgery {
        req.extensions_mut().insert(token);
    }

    next.run(req).await
}

async fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
) -> (AuthenticationContext, Option<AntiforgeryToken>) {
    let mut ctx = AuthenticationContext::anonymous();
    let mut antiforgery = None;

    if let Some(session_id) = cookie_value(headers, state.auth.cookie_name()) {
        match state.auth.authenticate_session(session_id).await {
            Ok(Some(authentication)) => {
                ctx.add(authentication);
                antiforgery = Some(AntiforgeryToken::for_session(session_id));
            }
            Ok(None) => debug!(scheme = %AuthScheme::Cookie, "unknown or expired session"),
            Err(err) => warn!(error = ?err, "session backend failure"),
        }
    }

    if let Some(token) = bearer_token(headers) {
        match state.auth.authenticate_bearer(token) {
            Ok(authentication) => ctx.add(authentication),
            Err(err) => warn!(error = %err, "access token verification failed"),
        }
    }

    if let Some(principal) = ctx.principal() {
        debug!(schemes = ?principal.schemes().collect::<Vec<_>>(), "request authenticated");
    }

    (ctx, antiforgery)
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"'))
        .filter(|value| !value.is_empty())
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
