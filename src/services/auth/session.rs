/*
 * Responsibility
 * - Resolve a session cookie value into the ticket the login flow stored server side
 * - Turn that ticket into a cookie-scheme `Authentication` (id-token claims + saved tokens)
 *
 * Notes
 * - Tickets are written by the OIDC login flow, which lives outside this API.
 *   Anything read back from the store is treated as a validated result.
 */
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::claims::ClaimSet;
use super::context::{AuthScheme, Authentication, StoredToken, TokenSet};
use crate::services::cache::{CacheClient, CacheError};

/// Server-side state behind a session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTicket {
    /// Claims of the id token (usually only `sub` and a few profile claims).
    pub claims: ClaimSet,
    /// Tokens saved at login: `access_token`, `refresh_token`, `id_token`, ...
    #[serde(default)]
    pub tokens: HashMap<String, String>,
}

impl SessionTicket {
    pub fn into_authentication(self) -> Authentication {
        let mut tokens = TokenSet::default();
        for (name, raw) in self.tokens {
            if !raw.is_empty() {
                tokens.insert(name, StoredToken::from_validated(raw));
            }
        }
        Authentication::new(AuthScheme::Cookie, self.claims, tokens)
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("invalid session ticket: {0}")]
    InvalidTicket(#[from] serde_json::Error),
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, session_id: &str) -> Result<Option<SessionTicket>, SessionError>;
}

/// Session store on top of the shared cache (JSON tickets under `{prefix}:{id}`).
#[derive(Clone)]
pub struct CacheSessionStore<C: CacheClient> {
    cache: Arc<C>,
    prefix: String,
}

impl<C: CacheClient> CacheSessionStore<C> {
    pub fn new_with_cache(cache: Arc<C>, prefix: impl Into<String>) -> Self {
        Self {
            cache,
            prefix: prefix.into(),
        }
    }

    pub fn key(&self, session_id: &str) -> String {
        format!("{}:{}", self.prefix, session_id)
    }
}

#[async_trait]
impl<C: CacheClient> SessionStore for CacheSessionStore<C> {
    async fn load(&self, session_id: &str) -> Result<Option<SessionTicket>, SessionError> {
        if !is_valid_session_id(session_id) {
            return Ok(None);
        }

        let Some(raw) = self.cache.get_string(&self.key(session_id)).await? else {
            return Ok(None);
        };

        Ok(Some(serde_json::from_str(&raw)?))
    }
}

fn is_valid_session_id(session_id: &str) -> bool {
    !session_id.is_empty()
        && session_id.len() <= 128
        && session_id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::context::{ACCESS_TOKEN, AuthenticationContext};
    use crate::services::cache::MemoryCache;
    use serde_json::json;
    use std::time::Duration;

    async fn store_with(id: &str, ticket: serde_json::Value) -> CacheSessionStore<MemoryCache> {
        let cache = Arc::new(MemoryCache::new());
        let store = CacheSessionStore::new_with_cache(cache.clone(), "session");
        cache
            .set_if_absent_with_ttl(&store.key(id), &ticket.to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn loads_ticket_into_cookie_authentication() {
        let store = store_with(
            "abc",
            json!({
                "claims": [{ "type": "sub", "value": "alice" }],
                "tokens": { "access_token": "at-1", "id_token": "" }
            }),
        )
        .await;

        let ticket = store.load("abc").await.unwrap().unwrap();
        let ctx = AuthenticationContext::new(vec![ticket.into_authentication()]);

        assert_eq!(ctx.principal().unwrap().subject(), Some("alice"));
        assert_eq!(
            ctx.active_token(ACCESS_TOKEN).map(StoredToken::as_str),
            Some("at-1")
        );
        assert!(ctx.active_token("id_token").is_none());
    }

    #[tokio::test]
    async fn unknown_or_malformed_ids_have_no_session() {
        let store = store_with("abc", json!({ "claims": [] })).await;

        assert!(store.load("missing").await.unwrap().is_none());
        assert!(store.load("abc:evil").await.unwrap().is_none());
        assert!(store.load("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_ticket_is_an_error() {
        let store = store_with("abc", json!("not a ticket")).await;

        assert!(matches!(
            store.load("abc").await,
            Err(SessionError::InvalidTicket(_))
        ));
    }
}
