/// Factory: build `AuthService` from application `Config`.
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::services::auth::access_jwt::{AccessJwtError, AccessTokenVerifier};
use crate::services::auth::cached::CachedClaimSource;
use crate::services::auth::session::CacheSessionStore;
use crate::services::auth::user_info::{
    ClaimSource, ClaimSourceError, OidcUserInfoClient, RetryPolicy,
};
use crate::services::auth::AuthService;
use crate::services::cache::{CacheBackend, CacheClient};

const SESSION_KEY_PREFIX: &str = "session";
const USERINFO_KEY_PREFIX: &str = "userinfo";

#[derive(Debug, Error)]
pub enum AuthSetupError {
    #[error("bearer token verifier: {0}")]
    Verifier(#[from] AccessJwtError),
    #[error("identity provider client: {0}")]
    ClaimSource(#[from] ClaimSourceError),
}

pub fn build_auth_service(
    config: &Config,
    cache: Arc<CacheBackend>,
) -> Result<Arc<AuthService>, AuthSetupError> {
    let verifier = AccessTokenVerifier::new(
        &config.access_jwt_public_key_pem,
        &config.auth_issuer,
        config.auth_audience.as_deref(),
        config.access_token_leeway_seconds,
    )?;

    let user_info = OidcUserInfoClient::new(&config.oidc_authority, config.oidc_http_timeout)?
        .with_retry(RetryPolicy::new(config.oidc_http_retries));

    // TTL 0: every evaluation asks the provider
    let claim_source: Arc<dyn ClaimSource> = if config.userinfo_cache_ttl.is_zero() {
        Arc::new(user_info)
    } else {
        info!(
            backend = cache.backend_name(),
            ttl_seconds = config.userinfo_cache_ttl.as_secs(),
            "user-info cache enabled"
        );
        Arc::new(CachedClaimSource::new(
            user_info,
            cache.clone(),
            USERINFO_KEY_PREFIX,
            config.userinfo_cache_ttl,
        ))
    };

    let sessions = Arc::new(CacheSessionStore::new_with_cache(cache, SESSION_KEY_PREFIX));

    Ok(Arc::new(AuthService::new(
        verifier,
        sessions,
        config.auth_cookie_name.clone(),
        claim_source,
    )))
}
