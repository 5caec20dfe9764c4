/*
 * Responsibility
 * - Facade the HTTP layer talks to: authenticate (cookie session / bearer token),
 *   resolve policy names, authorize, fetch user-info claims for identity endpoints
 * - Shared via `Arc` in `AppState`
 */
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::access_jwt::{AccessJwtError, AccessTokenVerifier};
use super::authorizer::{AuthorizationOutcome, Authorizer};
use super::claims::ClaimSet;
use super::context::{AuthScheme, Authentication, AuthenticationContext};
use super::error::AuthzError;
use super::policy::{Policy, PolicyResolver};
use super::session::{SessionError, SessionStore};
use super::token_accessor;
use super::user_info::{ClaimSource, ClaimSourceError};

pub struct AuthService {
    verifier: AccessTokenVerifier,
    sessions: Arc<dyn SessionStore>,
    cookie_name: String,
    policies: PolicyResolver,
    authorizer: Authorizer,
    claim_source: Arc<dyn ClaimSource>,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("verifier", &self.verifier)
            .field("cookie_name", &self.cookie_name)
            .finish()
    }
}

impl AuthService {
    pub fn new(
        verifier: AccessTokenVerifier,
        sessions: Arc<dyn SessionStore>,
        cookie_name: impl Into<String>,
        claim_source: Arc<dyn ClaimSource>,
    ) -> Self {
        Self {
            verifier,
            sessions,
            cookie_name: cookie_name.into(),
            policies: PolicyResolver::new(),
            authorizer: Authorizer::new(claim_source.clone()),
            claim_source,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Cookie scheme: session id → stored ticket. `Ok(None)` when no such session exists.
    pub async fn authenticate_session(
        &self,
        session_id: &str,
    ) -> Result<Option<Authentication>, SessionError> {
        let ticket = self.sessions.load(session_id).await?;
        Ok(ticket.map(|t| t.into_authentication()))
    }

    /// Bearer scheme: verify the presented access token.
    pub fn authenticate_bearer(&self, token: &str) -> Result<Authentication, AccessJwtError> {
        self.verifier.verify(token)
    }

    pub fn resolve_policy(&self, policy_name: &str) -> Option<Policy> {
        self.policies.resolve(policy_name)
    }

    pub fn default_policy(&self) -> Policy {
        self.policies.default_policy()
    }

    pub async fn authorize(
        &self,
        ctx: &AuthenticationContext,
        policy: &Policy,
        cancel: &CancellationToken,
    ) -> Result<AuthorizationOutcome, AuthzError> {
        self.authorizer.authorize(ctx, policy, cancel).await
    }

    /// Current user-info claims of the caller, or `None` when no access token is available.
    pub async fn user_info(
        &self,
        ctx: &AuthenticationContext,
    ) -> Result<Option<ClaimSet>, ClaimSourceError> {
        match token_accessor::get_token(ctx, Some(AuthScheme::Bearer)) {
            Some(token) => self.claim_source.get_claims(token).await.map(Some),
            None => Ok(None),
        }
    }
}
