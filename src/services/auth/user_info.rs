//! Identity provider user-info client.
//!
//! Fetches the caller's current claims with their access token:
//! 1. `GET {authority}/.well-known/openid-configuration` → `userinfo_endpoint`
//! 2. `GET {userinfo_endpoint}` with `Authorization: Bearer <token>`
//!
//! The discovered endpoint is kept for the process lifetime; user claims are not.
//! The endpoint must live on the authority's origin, or the access token is not sent.
//! Transient failures (transport errors, 404, 408, 5xx) are retried with exponential
//! backoff plus jitter.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::OnceCell;
use url::Url;

use super::claims::{ClaimSet, claim_types};
use super::context::StoredToken;

#[derive(Debug, Error)]
pub enum ClaimSourceError {
    #[error("identity provider transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("identity provider {endpoint} responded with HTTP {status}")]
    Status { endpoint: &'static str, status: u16 },
    #[error("invalid identity provider response: {0}")]
    InvalidResponse(&'static str),
    #[error("invalid identity provider url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Source of the caller's claims, keyed by their access token.
#[async_trait]
pub trait ClaimSource: Send + Sync {
    async fn get_claims(&self, access_token: &StoredToken) -> Result<ClaimSet, ClaimSourceError>;
}

#[derive(Debug, Deserialize)]
struct DiscoveryDocument {
    #[serde(default)]
    userinfo_endpoint: Option<String>,
}

const JITTER_MAX_MS: u64 = 100;

/// Retry schedule: attempt `n` (1-based) waits `base_delay * 2^n` plus up to 100ms.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(retries: u32) -> Self {
        Self {
            retries,
            ..Self::default()
        }
    }

    fn delay(&self, attempt: u32) -> Duration {
        let backoff = self.base_delay.saturating_mul(2u32.saturating_pow(attempt));
        let jitter = rand::rng().random_range(0..=JITTER_MAX_MS);
        backoff.saturating_add(Duration::from_millis(jitter))
    }
}

fn is_transient(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::NOT_FOUND
        || status == StatusCode::REQUEST_TIMEOUT
}

/// `ClaimSource` backed by an OpenID Connect provider.
#[derive(Debug)]
pub struct OidcUserInfoClient {
    http: reqwest::Client,
    discovery_url: Url,
    userinfo_endpoint: OnceCell<Url>,
    retry: RetryPolicy,
}

impl OidcUserInfoClient {
    pub fn new(authority: &str, timeout: Duration) -> Result<Self, ClaimSourceError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            discovery_url: discovery_url(authority)?,
            userinfo_endpoint: OnceCell::new(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sends the request built by `build`, retrying transient failures.
    /// The last response is returned as-is once retries run out.
    async fn send(
        &self,
        endpoint: &'static str,
        build: impl Fn() -> RequestBuilder,
    ) -> Result<Response, reqwest::Error> {
        let mut attempt = 0;
        loop {
            let result = build().send().await;

            let transient = match &result {
                Ok(response) => is_transient(response.status()),
                Err(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            };
            if !transient || attempt >= self.retry.retries {
                return result;
            }

            attempt += 1;
            let delay = self.retry.delay(attempt);
            tracing::warn!(
                endpoint,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "identity provider request failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn userinfo_endpoint(&self) -> Result<&Url, ClaimSourceError> {
        self.userinfo_endpoint
            .get_or_try_init(|| self.discover())
            .await
    }

    async fn discover(&self) -> Result<Url, ClaimSourceError> {
        let response = self
            .send("discovery", || {
                self.http
                    .get(self.discovery_url.clone())
                    .header(reqwest::header::ACCEPT, "application/json")
            })
            .await?;

        if !response.status().is_success() {
            return Err(ClaimSourceError::Status {
                endpoint: "discovery",
                status: response.status().as_u16(),
            });
        }

        let document: DiscoveryDocument = response
            .json()
            .await
            .map_err(|_| ClaimSourceError::InvalidResponse("discovery document is not json"))?;

        let endpoint = document
            .userinfo_endpoint
            .ok_or(ClaimSourceError::InvalidResponse("missing userinfo_endpoint"))?;

        let endpoint = Url::parse(&endpoint)?;
        if endpoint.origin() != self.discovery_url.origin() {
            tracing::warn!(
                userinfo_endpoint = %endpoint,
                authority = %self.discovery_url.origin().ascii_serialization(),
                "user-info endpoint is not on the authority's origin"
            );
            return Err(ClaimSourceError::InvalidResponse(
                "userinfo_endpoint is not on the authority's origin",
            ));
        }

        tracing::debug!(userinfo_endpoint = %endpoint, "discovered user-info endpoint");

        Ok(endpoint)
    }
}

#[async_trait]
impl ClaimSource for OidcUserInfoClient {
    async fn get_claims(&self, access_token: &StoredToken) -> Result<ClaimSet, ClaimSourceError> {
        let endpoint = self.userinfo_endpoint().await?;

        let response = self
            .send("userinfo", || {
                self.http
                    .get(endpoint.clone())
                    .bearer_auth(access_token.as_str())
                    .header(reqwest::header::ACCEPT, "application/json")
            })
            .await?;

        if !response.status().is_success() {
            return Err(ClaimSourceError::Status {
                endpoint: "userinfo",
                status: response.status().as_u16(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|_| ClaimSourceError::InvalidResponse("user-info body is not json"))?;

        match body {
            Value::Object(object) => Ok(ClaimSet::from_json_object(&object)),
            _ => Err(ClaimSourceError::InvalidResponse(
                "user-info body is not an object",
            )),
        }
    }
}

fn discovery_url(authority: &str) -> Result<Url, url::ParseError> {
    // `Url::join` replaces the last segment unless the base ends with '/'
    let mut base = authority.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    Url::parse(&base)?.join(".well-known/openid-configuration")
}

/// Claims that are safe to hand back to the caller.
pub fn public_claims(claims: &ClaimSet) -> ClaimSet {
    const PUBLIC: [&str; 7] = [
        claim_types::FAMILY_NAME,
        claim_types::GIVEN_NAME,
        claim_types::MIDDLE_NAME,
        claim_types::NAME,
        claim_types::NICKNAME,
        claim_types::PREFERRED_USERNAME,
        claim_types::PERMISSION,
    ];

    claims
        .iter()
        .filter(|c| PUBLIC.contains(&c.kind.as_str()))
        .cloned()
        .collect()
}

/// "Family Given" when available, otherwise the first of middle name, name,
/// nickname or preferred username.
pub fn display_name(claims: &ClaimSet) -> Option<String> {
    let given = claims.first(claim_types::GIVEN_NAME);
    let family = claims.first(claim_types::FAMILY_NAME);

    match (family, given) {
        (Some(family), Some(given)) => Some(format!("{family} {given}")),
        (Some(only), None) | (None, Some(only)) => Some(only.to_string()),
        (None, None) => [
            claim_types::MIDDLE_NAME,
            claim_types::NAME,
            claim_types::NICKNAME,
            claim_types::PREFERRED_USERNAME,
        ]
        .into_iter()
        .find_map(|kind| claims.first(kind))
        .map(str::to_string),
    }
}
