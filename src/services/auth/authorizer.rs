/*
 * Responsibility
 * - Evaluate a resolved `Policy` against the request's `AuthenticationContext`
 * - Dispatch each requirement to the handler of its variant
 */
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::context::AuthenticationContext;
use super::error::AuthzError;
use super::handlers::{Decision, PermissionHandler, RequirementHandler, ScopeHandler};
use super::policy::{Policy, Requirement};
use super::user_info::ClaimSource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationOutcome {
    Authorized,
    /// No identity: 401 at the HTTP boundary.
    Unauthenticated,
    /// Identity present, requirement unmet: 403 at the HTTP boundary.
    Forbidden { requirement: Requirement },
}

pub struct Authorizer {
    permission: PermissionHandler,
    scope: ScopeHandler,
}

impl Authorizer {
    pub fn new(claim_source: Arc<dyn ClaimSource>) -> Self {
        Self {
            permission: PermissionHandler::new(claim_source),
            scope: ScopeHandler,
        }
    }

    pub async fn evaluate(
        &self,
        ctx: &AuthenticationContext,
        requirement: &Requirement,
        cancel: &CancellationToken,
    ) -> Result<Decision, AuthzError> {
        match requirement {
            Requirement::Permission { identifier } => {
                self.permission.evaluate(ctx, identifier, cancel).await
            }
            Requirement::Scope { identifier } => self.scope.evaluate(ctx, identifier, cancel).await,
        }
    }

    pub async fn authorize(
        &self,
        ctx: &AuthenticationContext,
        policy: &Policy,
        cancel: &CancellationToken,
    ) -> Result<AuthorizationOutcome, AuthzError> {
        if policy.requires_authenticated_user() && !ctx.is_authenticated() {
            debug!(policy = policy.name(), "no authenticated principal");
            return Ok(AuthorizationOutcome::Unauthenticated);
        }

        for requirement in policy.requirements() {
            let decision = self.evaluate(ctx, requirement, cancel).await?;
            if !decision.is_satisfied() {
                info!(
                    policy = policy.name(),
                    kind = requirement.kind(),
                    "authorization requirement not satisfied"
                );
                return Ok(AuthorizationOutcome::Forbidden {
                    requirement: requirement.clone(),
                });
            }
        }

        debug!(policy = policy.name(), "authorized");
        Ok(AuthorizationOutcome::Authorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::policy::PolicyResolver;
    use crate::services::auth::testing::{
        FakeClaimSource, bearer_authentication, cookie_authentication,
    };

    fn authorizer(source: &FakeClaimSource) -> Authorizer {
        Authorizer::new(Arc::new(source.clone()))
    }

    async fn outcome(
        authorizer: &Authorizer,
        ctx: &AuthenticationContext,
        policy_name: &str,
    ) -> Result<AuthorizationOutcome, AuthzError> {
        let policy = PolicyResolver::new().resolve(policy_name).unwrap();
        authorizer
            .authorize(ctx, &policy, &CancellationToken::new())
            .await
    }

    #[tokio::test]
    async fn anonymous_callers_are_unauthenticated_for_every_policy() {
        let source = FakeClaimSource::returning(&[]);
        let a = authorizer(&source);
        let ctx = AuthenticationContext::anonymous();

        for name in ["View TodoItem", "read.todoitem", "Authenticated"] {
            assert_eq!(
                outcome(&a, &ctx, name).await.unwrap(),
                AuthorizationOutcome::Unauthenticated
            );
        }
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn authenticated_policy_needs_only_a_principal() {
        let a = authorizer(&FakeClaimSource::returning(&[]));
        let ctx = AuthenticationContext::new(vec![cookie_authentication(&[("sub", "a")], None)]);

        assert_eq!(
            outcome(&a, &ctx, "Authenticated").await.unwrap(),
            AuthorizationOutcome::Authorized
        );
    }

    #[tokio::test]
    async fn requirements_dispatch_to_their_handler() {
        let source = FakeClaimSource::returning(&[("permission", "View TodoItem")]);
        let a = authorizer(&source);
        let ctx = AuthenticationContext::new(vec![bearer_authentication(
            &[("scope", "worker.todoitem")],
            "t",
        )]);

        assert_eq!(
            outcome(&a, &ctx, "worker.todoitem").await.unwrap(),
            AuthorizationOutcome::Authorized
        );
        assert_eq!(source.calls(), 0);

        assert_eq!(
            outcome(&a, &ctx, "View TodoItem").await.unwrap(),
            AuthorizationOutcome::Authorized
        );
        assert_eq!(source.calls(), 1);

        assert_eq!(
            outcome(&a, &ctx, "read.todoitem").await.unwrap(),
            AuthorizationOutcome::Forbidden {
                requirement: Requirement::Scope {
                    identifier: "read.todoitem".into()
                }
            }
        );
    }

    #[tokio::test]
    async fn provider_failure_is_an_error_not_a_decision() {
        let a = authorizer(&FakeClaimSource::failing());
        let ctx = AuthenticationContext::new(vec![bearer_authentication(&[], "t")]);

        assert!(matches!(
            outcome(&a, &ctx, "View TodoItem").await,
            Err(AuthzError::Provider(_))
        ));
    }
}
