/*
 * Responsibility
 * - Turn a policy name attached to an endpoint into a `Policy` at request time
 * - Prefix conventions pick the requirement kind; other names go to the fallback provider
 *
 * Notes
 * - Resolution is pure string matching, so nothing is cached between requests.
 */
use std::collections::HashMap;

/// Prefixes of application permission policies ("View TodoItem").
const PERMISSION_PREFIXES: [&str; 4] = ["Create", "Delete", "Edit", "View"];

/// Prefixes of OAuth2 scope policies ("read.todoitem").
const SCOPE_PREFIXES: [&str; 4] = ["delete.", "read.", "worker.", "write."];

/// Built-in policy that only requires an authenticated user.
pub const AUTHENTICATED_POLICY: &str = "Authenticated";

/// What must hold for the caller to pass a policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// Application permission, resolved through the identity provider's user-info claims.
    Permission { identifier: String },
    /// OAuth2 access-token scope.
    Scope { identifier: String },
}

impl Requirement {
    pub fn identifier(&self) -> &str {
        match self {
            Requirement::Permission { identifier } | Requirement::Scope { identifier } => {
                identifier
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Requirement::Permission { .. } => "permission",
            Requirement::Scope { .. } => "scope",
        }
    }
}

/// Pure mapping from a policy name to its requirement, if it follows a prefix convention.
pub fn requirement_for(policy_name: &str) -> Option<Requirement> {
    if PERMISSION_PREFIXES
        .iter()
        .any(|prefix| policy_name.starts_with(prefix))
    {
        Some(Requirement::Permission {
            identifier: policy_name.to_string(),
        })
    } else if SCOPE_PREFIXES
        .iter()
        .any(|prefix| policy_name.starts_with(prefix))
    {
        Some(Requirement::Scope {
            identifier: policy_name.to_string(),
        })
    } else {
        None
    }
}

/// A resolved authorization rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    name: String,
    require_authenticated_user: bool,
    requirements: Vec<Requirement>,
}

impl Policy {
    pub fn authenticated(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            require_authenticated_user: true,
            requirements: Vec::new(),
        }
    }

    pub fn with_requirement(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn requires_authenticated_user(&self) -> bool {
        self.require_authenticated_user
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }
}

/// Provider consulted for names that match no prefix convention.
pub trait FallbackPolicyProvider: Send + Sync {
    /// Policy for endpoints that require authentication without naming a policy.
    fn default_policy(&self) -> Policy;

    /// Named policy, or `None` when the name is unknown.
    fn policy(&self, name: &str) -> Option<Policy>;
}

/// Registry of explicitly named policies.
#[derive(Debug, Clone)]
pub struct DefaultPolicyProvider {
    named: HashMap<String, Policy>,
}

impl Default for DefaultPolicyProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultPolicyProvider {
    pub fn new() -> Self {
        let mut named = HashMap::new();
        named.insert(
            AUTHENTICATED_POLICY.to_string(),
            Policy::authenticated(AUTHENTICATED_POLICY),
        );
        Self { named }
    }
}

impl FallbackPolicyProvider for DefaultPolicyProvider {
    fn default_policy(&self) -> Policy {
        Policy::authenticated(AUTHENTICATED_POLICY)
    }

    fn policy(&self, name: &str) -> Option<Policy> {
        self.named.get(name).cloned()
    }
}

/// Resolves policy names per request.
#[derive(Debug, Clone, Default)]
pub struct PolicyResolver<F = DefaultPolicyProvider> {
    fallback: F,
}

impl PolicyResolver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<F: FallbackPolicyProvider> PolicyResolver<F> {
    pub fn with_fallback(fallback: F) -> Self {
        Self { fallback }
    }

    /// First match wins: permission prefixes, then scope prefixes, then the fallback.
    pub fn resolve(&self, policy_name: &str) -> Option<Policy> {
        match requirement_for(policy_name) {
            Some(requirement) => {
                Some(Policy::authenticated(policy_name).with_requirement(requirement))
            }
            None => self.fallback.policy(policy_name),
        }
    }

    pub fn default_policy(&self) -> Policy {
        self.fallback.default_policy()
    }
}
