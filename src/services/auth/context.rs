/*
 * Responsibility
 * - Request-scoped authentication state (who is calling, through which scheme, with which tokens)
 * - Built by the authentication middleware, read-only for authorization and handlers
 *
 * Notes
 * - `StoredToken` can only be created inside `services::auth` from validated results
 *   (session ticket written by the login flow, or a verified bearer token).
 *   The unverified JWT decoder only accepts this type.
 */
use std::collections::HashMap;
use std::fmt;

use super::claims::{ClaimSet, claim_types};

/// Well-known key of the access token inside a token set.
pub const ACCESS_TOKEN: &str = "access_token";

/// Authentication schemes understood by this API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthScheme {
    /// Session cookie that references tokens held server side. Default scheme.
    Cookie,
    /// Token presented directly in the `Authorization` header.
    Bearer,
}

impl AuthScheme {
    /// Scheme used when a caller asks for "the current" token without naming a scheme.
    pub const DEFAULT: AuthScheme = AuthScheme::Cookie;

    pub fn name(&self) -> &'static str {
        match self {
            AuthScheme::Cookie => "Cookies",
            AuthScheme::Bearer => "Bearer",
        }
    }
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A token that came out of a validated authentication result.
#[derive(Clone, PartialEq, Eq)]
pub struct StoredToken(String);

impl StoredToken {
    pub(in crate::services::auth) fn from_validated(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StoredToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print token material
        f.write_str("StoredToken(..)")
    }
}

/// Tokens saved by one authentication, keyed by name (`access_token`, `id_token`, ...).
#[derive(Debug, Clone, Default)]
pub struct TokenSet(HashMap<String, StoredToken>);

impl TokenSet {
    pub(in crate::services::auth) fn insert(&mut self, name: impl Into<String>, token: StoredToken) {
        self.0.insert(name.into(), token);
    }

    pub fn get(&self, name: &str) -> Option<&StoredToken> {
        self.0.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Outcome of one scheme successfully authenticating the request.
#[derive(Debug, Clone)]
pub struct Authentication {
    scheme: AuthScheme,
    claims: ClaimSet,
    tokens: TokenSet,
}

impl Authentication {
    pub(in crate::services::auth) fn new(
        scheme: AuthScheme,
        claims: ClaimSet,
        tokens: TokenSet,
    ) -> Self {
        Self {
            scheme,
            claims,
            tokens,
        }
    }

    pub fn scheme(&self) -> AuthScheme {
        self.scheme
    }

    pub fn claims(&self) -> &ClaimSet {
        &self.claims
    }

    pub fn tokens(&self) -> &TokenSet {
        &self.tokens
    }
}

/// Per-request authentication context.
///
/// Holds zero or more authentications (at most one per scheme). The principal is the
/// union of their claims; an empty context is anonymous.
#[derive(Debug, Clone, Default)]
pub struct AuthenticationContext {
    authentications: Vec<Authentication>,
}

impl AuthenticationContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn new(authentications: Vec<Authentication>) -> Self {
        let mut ctx = Self::default();
        for authentication in authentications {
            ctx.add(authentication);
        }
        ctx
    }

    /// Adds an authentication, replacing an earlier one from the same scheme.
    pub fn add(&mut self, authentication: Authentication) {
        self.authentications
            .retain(|a| a.scheme != authentication.scheme);
        self.authentications.push(authentication);
    }

    pub fn is_authenticated(&self) -> bool {
        !self.authentications.is_empty()
    }

    pub fn is_authenticated_by(&self, scheme: AuthScheme) -> bool {
        self.authentications.iter().any(|a| a.scheme == scheme)
    }

    pub fn principal(&self) -> Option<Principal<'_>> {
        self.is_authenticated().then_some(Principal {
            authentications: &self.authentications,
        })
    }

    /// A copy that only keeps authentications produced by `schemes`.
    /// An empty slice keeps everything.
    pub fn restricted_to(&self, schemes: &[AuthScheme]) -> Self {
        if schemes.is_empty() {
            return self.clone();
        }
        Self {
            authentications: self
                .authentications
                .iter()
                .filter(|a| schemes.contains(&a.scheme))
                .cloned()
                .collect(),
        }
    }

    /// Token saved by the active (default scheme) authentication.
    pub fn active_token(&self, name: &str) -> Option<&StoredToken> {
        self.scheme_token(AuthScheme::DEFAULT, name)
    }

    /// Token saved specifically by `scheme`.
    pub fn scheme_token(&self, scheme: AuthScheme, name: &str) -> Option<&StoredToken> {
        self.authentications
            .iter()
            .find(|a| a.scheme == scheme)
            .and_then(|a| a.tokens.get(name))
    }
}

/// Borrowed view over the authenticated principal.
#[derive(Debug, Clone, Copy)]
pub struct Principal<'a> {
    authentications: &'a [Authentication],
}

impl<'a> Principal<'a> {
    pub fn schemes(&self) -> impl Iterator<Item = AuthScheme> + 'a {
        self.authentications.iter().map(|a| a.scheme)
    }

    pub fn has_claim(&self, kind: &str, value: &str) -> bool {
        self.authentications
            .iter()
            .any(|a| a.claims.contains(kind, value))
    }

    pub fn first_claim(&self, kind: &str) -> Option<&'a str> {
        self.authentications
            .iter()
            .find_map(|a| a.claims.first(kind))
    }

    pub fn subject(&self) -> Option<&'a str> {
        self.first_claim(claim_types::SUBJECT)
    }
}
