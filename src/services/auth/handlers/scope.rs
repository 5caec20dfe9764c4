//! OAuth2 scope requirements ("read.todoitem").
//!
//! - bearer: the access token's claims are already on the principal (fast path)
//! - cookie: the principal comes from the id token, which carries no scope, so the
//!   access token saved in the session is decoded locally (slow path)

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{Decision, RequirementHandler};
use crate::services::auth::claims::claim_types;
use crate::services::auth::context::AuthenticationContext;
use crate::services::auth::error::AuthzError;
use crate::services::auth::{jwt, token_accessor};

#[derive(Debug, Clone, Copy, Default)]
pub struct ScopeHandler;

#[async_trait]
impl RequirementHandler for ScopeHandler {
    async fn evaluate(
        &self,
        ctx: &AuthenticationContext,
        identifier: &str,
        _cancel: &CancellationToken,
    ) -> Result<Decision, AuthzError> {
        let Some(principal) = ctx.principal() else {
            return Ok(Decision::Unsatisfied);
        };

        if principal.has_claim(claim_types::SCOPE, identifier) {
            return Ok(Decision::Satisfied);
        }

        // Session access token only: no secondary scheme on this path.
        let Some(token) = token_accessor::get_token(ctx, None) else {
            return Ok(Decision::Unsatisfied);
        };

        match jwt::decode_unverified(token) {
            Ok(decoded) => Ok(decoded
                .claims()
                .contains(claim_types::SCOPE, identifier)
                .into()),
            Err(err) => {
                debug!(error = %err, scope = identifier, "access token could not be decoded");
                Ok(Decision::Unsatisfied)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::testing::{
        bearer_authentication, cookie_authentication, unsigned_jwt, unsigned_jwt_with_alg,
    };
    use serde_json::json;

    async fn evaluate(ctx: &AuthenticationContext, scope: &str) -> Decision {
        ScopeHandler
            .evaluate(ctx, scope, &CancellationToken::new())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn principal_scope_claim_satisfies_without_a_token() {
        let ctx = AuthenticationContext::new(vec![bearer_authentication(
            &[("scope", "read.todoitem")],
            "not-a-jwt",
        )]);

        assert_eq!(evaluate(&ctx, "read.todoitem").await, Decision::Satisfied);
    }

    #[tokio::test]
    async fn cookie_session_decodes_the_saved_access_token() {
        let access_token = unsigned_jwt(json!({ "sub": "alice", "scope": "openid write.todoitem" }));
        let ctx = AuthenticationContext::new(vec![cookie_authentication(
            &[("sub", "alice")],
            Some(&access_token),
        )]);

        assert_eq!(evaluate(&ctx, "write.todoitem").await, Decision::Satisfied);
        assert_eq!(evaluate(&ctx, "delete.todoitem").await, Decision::Unsatisfied);
    }

    #[tokio::test]
    async fn saved_token_signed_with_any_algorithm_is_decoded() {
        let access_token = unsigned_jwt_with_alg("ES512", json!({ "scope": "write.todoitem" }));
        let ctx = AuthenticationContext::new(vec![cookie_authentication(&[], Some(&access_token))]);

        assert_eq!(evaluate(&ctx, "write.todoitem").await, Decision::Satisfied);
    }

    #[tokio::test]
    async fn decoded_scope_array_is_searched() {
        let access_token = unsigned_jwt(json!({ "scope": ["x", "y"] }));
        let ctx = AuthenticationContext::new(vec![cookie_authentication(&[], Some(&access_token))]);

        assert_eq!(evaluate(&ctx, "y").await, Decision::Satisfied);
    }

    #[tokio::test]
    async fn principal_scopes_take_precedence_over_the_token() {
        let access_token = unsigned_jwt(json!({ "scope": "write.todoitem" }));
        let ctx = AuthenticationContext::new(vec![cookie_authentication(
            &[("scope", "read.todoitem")],
            Some(&access_token),
        )]);

        assert_eq!(evaluate(&ctx, "read.todoitem").await, Decision::Satisfied);
        assert_eq!(evaluate(&ctx, "write.todoitem").await, Decision::Satisfied);
    }

    #[tokio::test]
    async fn bearer_token_is_never_decoded_on_the_slow_path() {
        let bearer_token = unsigned_jwt(json!({ "scope": "read.todoitem" }));
        let ctx = AuthenticationContext::new(vec![bearer_authentication(&[], &bearer_token)]);

        assert_eq!(evaluate(&ctx, "read.todoitem").await, Decision::Unsatisfied);
    }

    #[tokio::test]
    async fn malformed_or_missing_token_is_unsatisfied() {
        let malformed =
            AuthenticationContext::new(vec![cookie_authentication(&[], Some("opaque-token"))]);
        let missing = AuthenticationContext::new(vec![cookie_authentication(&[], None)]);

        assert_eq!(evaluate(&malformed, "read.todoitem").await, Decision::Unsatisfied);
        assert_eq!(evaluate(&missing, "read.todoitem").await, Decision::Unsatisfied);
        assert_eq!(
            evaluate(&AuthenticationContext::anonymous(), "read.todoitem").await,
            Decision::Unsatisfied
        );
    }
}
