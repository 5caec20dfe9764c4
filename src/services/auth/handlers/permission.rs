//! Permission requirements ("View TodoItem").
//!
//! Works for both schemes:
//! - cookie: the principal comes from the id token (only `sub`), so the access token
//!   saved in the session is used to ask the identity provider for the user's claims
//! - bearer: the presented token is used for the same call

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{Decision, RequirementHandler};
use crate::services::auth::claims::claim_types;
use crate::services::auth::context::{AuthScheme, AuthenticationContext};
use crate::services::auth::error::AuthzError;
use crate::services::auth::token_accessor;
use crate::services::auth::user_info::ClaimSource;

pub struct PermissionHandler {
    claim_source: Arc<dyn ClaimSource>,
}

impl PermissionHandler {
    pub fn new(claim_source: Arc<dyn ClaimSource>) -> Self {
        Self { claim_source }
    }
}

#[async_trait]
impl RequirementHandler for PermissionHandler {
    async fn evaluate(
        &self,
        ctx: &AuthenticationContext,
        identifier: &str,
        cancel: &CancellationToken,
    ) -> Result<Decision, AuthzError> {
        if !ctx.is_authenticated() {
            return Ok(Decision::Unsatisfied);
        }

        let Some(token) = token_accessor::get_token(ctx, Some(AuthScheme::Bearer)) else {
            debug!(permission = identifier, "no access token for permission check");
            return Ok(Decision::Unsatisfied);
        };

        // Provider errors propagate; they are operational faults, not decisions.
        let claims = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AuthzError::Cancelled),
            result = self.claim_source.get_claims(token) => result?,
        };

        Ok(claims.contains(claim_types::PERMISSION, identifier).into())
    }
}
