use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::claims::ClaimSet;
use super::context::StoredToken;
use super::user_info::{ClaimSource, ClaimSourceError};
use crate::services::cache::CacheClient;

/// Short-lived cache in front of a `ClaimSource`.
///
/// Entries are keyed by a hash of the access token, so revoking a permission at the
/// provider is visible after at most `ttl`. Cache failures fall through to the provider.
pub struct CachedClaimSource<S: ClaimSource, C: CacheClient> {
    inner: S,
    cache: Arc<C>,
    prefix: String,
    ttl: Duration,
}

impl<S: ClaimSource, C: CacheClient> CachedClaimSource<S, C> {
    pub fn new(inner: S, cache: Arc<C>, prefix: impl Into<String>, ttl: Duration) -> Self {
        Self {
            inner,
            cache,
            prefix: prefix.into(),
            ttl,
        }
    }

    pub fn key(&self, access_token: &StoredToken) -> String {
        let digest = Sha256::digest(access_token.as_str().as_bytes());
        format!("{}:{}", self.prefix, URL_SAFE_NO_PAD.encode(digest))
    }

    async fn cached(&self, key: &str) -> Option<ClaimSet> {
        let raw = match self.cache.get_string(key).await {
            Ok(raw) => raw?,
            Err(err) => {
                warn!(error = %err, backend = self.cache.backend_name(), "user-info cache read failed");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(claims) => Some(claims),
            Err(err) => {
                warn!(error = %err, "discarding unreadable user-info cache entry");
                None
            }
        }
    }

    async fn store(&self, key: &str, claims: &ClaimSet) {
        let raw = match serde_json::to_string(claims) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, "user-info claims could not be serialized");
                return;
            }
        };

        if let Err(err) = self.cache.set_if_absent_with_ttl(key, &raw, self.ttl).await {
            warn!(error = %err, backend = self.cache.backend_name(), "user-info cache write failed");
        }
    }
}

#[async_trait]
impl<S: ClaimSource, C: CacheClient> ClaimSource for CachedClaimSource<S, C> {
    async fn get_claims(&self, access_token: &StoredToken) -> Result<ClaimSet, ClaimSourceError> {
        let key = self.key(access_token);

        if let Some(claims) = self.cached(&key).await {
            debug!("user-info cache hit");
            return Ok(claims);
        }

        let claims = self.inner.get_claims(access_token).await?;
        self.store(&key, &claims).await;
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::testing::{FakeClaimSource, stored};
    use crate::services::cache::MemoryCache;

    fn cached(source: &FakeClaimSource, cache: &MemoryCache) -> CachedClaimSource<FakeClaimSource, MemoryCache> {
        CachedClaimSource::new(
            source.clone(),
            Arc::new(cache.clone()),
            "userinfo",
            Duration::from_secs(30),
        )
    }

    #[tokio::test]
    async fn second_lookup_is_served_from_cache() {
        let source = FakeClaimSource::returning(&[("permission", "View TodoItem")]);
        let cache = MemoryCache::new();
        let claims = cached(&source, &cache);
        let token = stored("token-a");

        let first = claims.get_claims(&token).await.unwrap();
        let second = claims.get_claims(&token).await.unwrap();

        assert_eq!(first, second);
        assert!(second.contains("permission", "View TodoItem"));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn different_tokens_do_not_share_entries() {
        let source = FakeClaimSource::returning(&[("permission", "View TodoItem")]);
        let cache = MemoryCache::new();
        let claims = cached(&source, &cache);

        claims.get_claims(&stored("token-a")).await.unwrap();
        claims.get_claims(&stored("token-b")).await.unwrap();

        assert_eq!(source.calls(), 2);
        assert_ne!(claims.key(&stored("token-a")), claims.key(&stored("token-b")));
    }

    #[tokio::test]
    async fn key_does_not_contain_the_token() {
        let claims = cached(&FakeClaimSource::returning(&[]), &MemoryCache::new());

        let key = claims.key(&stored("secret-token"));
        assert!(key.starts_with("userinfo:"));
        assert!(!key.contains("secret-token"));
    }

    #[tokio::test]
    async fn provider_errors_are_not_cached() {
        let cache = MemoryCache::new();
        let failing = cached(&FakeClaimSource::failing(), &cache);
        let token = stored("token-a");

        assert!(failing.get_claims(&token).await.is_err());
        assert_eq!(cache.get_string(&failing.key(&token)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn unreadable_entry_falls_through_to_the_provider() {
        let source = FakeClaimSource::returning(&[("permission", "View TodoItem")]);
        let cache = MemoryCache::new();
        let claims = cached(&source, &cache);
        let token = stored("token-a");
        cache
            .set_if_absent_with_ttl(&claims.key(&token), "not json", Duration::from_secs(30))
            .await
            .unwrap();

        let result = claims.get_claims(&token).await.unwrap();

        assert!(result.contains("permission", "View TodoItem"));
        assert_eq!(source.calls(), 1);
    }
}
