//! Per-route authorization.
//!
//! ```ignore
//! .route(
//!     "/todo-items",
//!     guard(get(list_own), &state, Authorize::policy("read.todoitem", COOKIE)),
//! )
//! ```

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::error::AppError;
use crate::services::auth::antiforgery::{self, AntiforgeryToken};
use crate::services::auth::{AuthScheme, AuthenticationContext, AuthorizationOutcome};
use crate::state::AppState;

pub const COOKIE: &[AuthScheme] = &[AuthScheme::Cookie];
pub const BEARER: &[AuthScheme] = &[AuthScheme::Bearer];

/// Authorization rule attached to one route.
#[derive(Debug, Clone, Copy)]
pub struct Authorize {
    /// Policy name; `None` means the default (authenticated user) policy.
    pub policy: Option<&'static str>,
    /// Schemes whose identities count for this route. Empty: all schemes.
    pub schemes: &'static [AuthScheme],
}

impl Authorize {
    pub const fn policy(name: &'static str, schemes: &'static [AuthScheme]) -> Self {
        Self {
            policy: Some(name),
            schemes,
        }
    }

    pub const fn authenticated(schemes: &'static [AuthScheme]) -> Self {
        Self {
            policy: None,
            schemes,
        }
    }
}

/// Puts `rule` in front of the handlers of `route`.
pub fn guard(
    route: MethodRouter<AppState>,
    state: &AppState,
    rule: Authorize,
) -> MethodRouter<AppState> {
    route.route_layer(middleware::from_fn_with_state(
        (state.clone(), rule),
        authorize_middleware,
    ))
}

async fn authorize_middleware(
    State((state, rule)): State<(AppState, Authorize)>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let ctx = req
        .extensions()
        .get::<AuthenticationContext>()
        .map(|ctx| ctx.restricted_to(rule.schemes))
        .unwrap_or_default();

    let policy = match rule.policy {
        Some(name) => state.auth.resolve_policy(name).ok_or_else(|| {
            error!(policy = name, "unknown authorization policy");
            AppError::Internal
        })?,
        None => state.auth.default_policy(),
    };

    // Cancelled when this future is dropped (client gone, request timeout).
    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();

    match state.auth.authorize(&ctx, &policy, &cancel).await {
        Ok(AuthorizationOutcome::Authorized) => {}
        Ok(AuthorizationOutcome::Unauthenticated) => return Err(AppError::Unauthorized),
        Ok(AuthorizationOutcome::Forbidden { requirement }) => {
            debug!(
                policy = policy.name(),
                requirement = requirement.identifier(),
                "access denied"
            );
            return Err(AppError::Forbidden);
        }
        Err(err) => {
            error!(error = %err, policy = policy.name(), "authorization failed");
            return Err(AppError::Internal);
        }
    }

    // Cookie sessions ride along on cross-site requests; state changes need the request token.
    if ctx.is_authenticated_by(AuthScheme::Cookie) && !req.method().is_safe() {
        let presented = req
            .headers()
            .get(antiforgery::HEADER_NAME)
            .and_then(|v| v.to_str().ok());
        let valid = req
            .extensions()
            .get::<AntiforgeryToken>()
            .is_some_and(|expected| expected.matches(presented));

        if !valid {
            debug!(method = %req.method(), "antiforgery token missing or invalid");
            return Err(AppError::bad_request(
                "ANTIFORGERY_TOKEN_INVALID",
                "antiforgery token missing or invalid",
            ));
        }
    }

    // Handlers only see identities of the schemes this route accepts.
    req.extensions_mut().insert(ctx);

    Ok(next.run(req).await)
}
