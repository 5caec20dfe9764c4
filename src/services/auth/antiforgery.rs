//! Antiforgery (CSRF) tokens for cookie sessions.
//!
//! The request token is derived from the session id, so it changes with the
//! session and needs no server-side storage. Browsers read it from the
//! `XSRF-TOKEN` cookie (or the identity response) and echo it in `X-XSRF-TOKEN`.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

pub const HEADER_NAME: &str = "x-xsrf-token";
pub const COOKIE_NAME: &str = "XSRF-TOKEN";

const DOMAIN: &[u8] = b"todo-api antiforgery v1:";

/// Expected request token of the current cookie session.
#[derive(Clone, PartialEq, Eq)]
pub struct AntiforgeryToken(String);

impl std::fmt::Debug for AntiforgeryToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AntiforgeryToken(..)")
    }
}

impl AntiforgeryToken {
    pub fn for_session(session_id: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(DOMAIN);
        hasher.update(session_id.as_bytes());
        Self(URL_SAFE_NO_PAD.encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Constant-time comparison with the token the client sent.
    pub fn matches(&self, presented: Option<&str>) -> bool {
        let Some(presented) = presented else {
            return false;
        };
        let (expected, presented) = (self.0.as_bytes(), presented.trim().as_bytes());

        expected.len() == presented.len()
            && expected
                .iter()
                .zip(presented)
                .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                == 0
    }
}
