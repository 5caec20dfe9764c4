//! One handler per requirement variant.

pub mod permission;
pub mod scope;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::context::AuthenticationContext;
use super::error::AuthzError;

pub use permission::PermissionHandler;
pub use scope::ScopeHandler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Satisfied,
    Unsatisfied,
}

impl Decision {
    pub fn is_satisfied(self) -> bool {
        matches!(self, Decision::Satisfied)
    }
}

impl From<bool> for Decision {
    fn from(satisfied: bool) -> Self {
        if satisfied {
            Decision::Satisfied
        } else {
            Decision::Unsatisfied
        }
    }
}

/// Evaluates one requirement kind against the request's authentication context.
#[async_trait]
pub trait RequirementHandler: Send + Sync {
    async fn evaluate(
        &self,
        ctx: &AuthenticationContext,
        identifier: &str,
        cancel: &CancellationToken,
    ) -> Result<Decision, AuthzError>;
}
