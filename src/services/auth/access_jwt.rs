use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};
use std::{error::Error as StdError, fmt};

use super::claims::{ClaimSet, claim_types};
use super::context::{ACCESS_TOKEN, AuthScheme, Authentication, StoredToken, TokenSet};

// Errors returned by bearer access-token verification.
#[derive(Debug)]
pub enum AccessJwtError {
    InvalidKey(jsonwebtoken::errors::Error),
    Jwt(jsonwebtoken::errors::Error),
    EmptyClaim(&'static str),
}

impl fmt::Display for AccessJwtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidKey(e) => write!(f, "invalid ed25519 public key pem: {}", e),
            Self::Jwt(e) => write!(f, "jwt verification failed: {}", e),
            Self::EmptyClaim(name) => write!(f, "empty '{}' claim", name),
        }
    }
}

impl StdError for AccessJwtError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::InvalidKey(e) | Self::Jwt(e) => Some(e),
            Self::EmptyClaim(_) => None,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AccessJwtError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        Self::Jwt(e)
    }
}

/// EdDSA (Ed25519) verifier for tokens presented with the Bearer scheme.
///
/// - Signature, `exp` (with leeway) and `iss` are always checked.
/// - `aud` is checked only when an audience is configured.
/// - `sub` is optional: client-credentials tokens (worker) have none.
#[derive(Clone)]
pub struct AccessTokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for AccessTokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("AccessTokenVerifier")
            .field("validation", &self.validation)
            .finish()
    }
}

impl AccessTokenVerifier {
    pub fn new(
        access_public_key_pem: &str,
        issuer: &str,
        audience: Option<&str>,
        leeway_seconds: u64,
    ) -> Result<Self, AccessJwtError> {
        let decoding_key = DecodingKey::from_ed_pem(access_public_key_pem.as_bytes())
            .map_err(AccessJwtError::InvalidKey)?;

        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.set_issuer(&[issuer]);
        validation.set_required_spec_claims(&["exp", "iss"]);
        match audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }
        validation.leeway = leeway_seconds;

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    /// Verify a JWT access token and turn it into a Bearer-scheme authentication.
    ///
    /// The principal carries every payload claim (`scope` split per value) and the
    /// token itself is saved as `access_token` for downstream provider calls.
    pub fn verify(&self, token: &str) -> Result<Authentication, AccessJwtError> {
        let data = jsonwebtoken::decode::<Map<String, Value>>(
            token,
            &self.decoding_key,
            &self.validation,
        )?;

        // `iss` presence and value are enforced by `Validation`.
        if let Some(Value::String(sub)) = data.claims.get(claim_types::SUBJECT) {
            if sub.trim().is_empty() {
                return Err(AccessJwtError::EmptyClaim("sub"));
            }
        }

        let mut tokens = TokenSet::default();
        tokens.insert(ACCESS_TOKEN, StoredToken::from_validated(token));

        Ok(Authentication::new(
            AuthScheme::Bearer,
            ClaimSet::from_json_object(&data.claims),
            tokens,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::testing::{TEST_PUBLIC_KEY_PEM, now_seconds, signed_jwt, unsigned_jwt};
    use serde_json::json;

    const ISSUER: &str = "https://id.example.test";

    fn verifier(audience: Option<&str>) -> AccessTokenVerifier {
        AccessTokenVerifier::new(TEST_PUBLIC_KEY_PEM, ISSUER, audience, 60).unwrap()
    }

    #[test]
    fn verified_token_becomes_a_bearer_authentication() {
        let token = signed_jwt(json!({
            "iss": ISSUER,
            "sub": "alice",
            "exp": now_seconds() + 600,
            "scope": "read.todoitem write.todoitem",
        }));

        let authentication = verifier(None).verify(&token).unwrap();

        assert_eq!(authentication.scheme(), AuthScheme::Bearer);
        assert!(authentication.claims().contains("scope", "read.todoitem"));
        assert!(authentication.claims().contains("scope", "write.todoitem"));
        assert_eq!(authentication.claims().first("sub"), Some("alice"));
        assert_eq!(
            authentication
                .tokens()
                .get(ACCESS_TOKEN)
                .map(StoredToken::as_str),
            Some(token.as_str())
        );
    }

    #[test]
    fn client_credentials_token_without_sub_is_accepted() {
        let token = signed_jwt(json!({
            "iss": ISSUER,
            "exp": now_seconds() + 600,
            "scope": "worker.todoitem",
        }));

        let authentication = verifier(None).verify(&token).unwrap();
        assert!(authentication.claims().contains("scope", "worker.todoitem"));
    }

    #[test]
    fn wrong_issuer_expired_or_unsigned_tokens_are_rejected() {
        let v = verifier(None);

        let wrong_issuer = signed_jwt(json!({ "iss": "https://other", "exp": now_seconds() + 600 }));
        let expired = signed_jwt(json!({ "iss": ISSUER, "exp": now_seconds() - 3600 }));
        let no_exp = signed_jwt(json!({ "iss": ISSUER }));
        let unsigned = unsigned_jwt(json!({ "iss": ISSUER, "exp": now_seconds() + 600 }));

        for token in [wrong_issuer, expired, no_exp, unsigned] {
            assert!(matches!(v.verify(&token), Err(AccessJwtError::Jwt(_))));
        }
        assert!(v.verify("not-a-jwt").is_err());
    }

    #[test]
    fn audience_is_checked_only_when_configured() {
        let token = signed_jwt(json!({
            "iss": ISSUER,
            "aud": "todo-api",
            "exp": now_seconds() + 600,
        }));

        assert!(verifier(None).verify(&token).is_ok());
        assert!(verifier(Some("todo-api")).verify(&token).is_ok());
        assert!(verifier(Some("other-api")).verify(&token).is_err());
    }

    #[test]
    fn empty_subject_is_rejected() {
        let token = signed_jwt(json!({ "iss": ISSUER, "sub": " ", "exp": now_seconds() + 600 }));

        assert!(matches!(
            verifier(None).verify(&token),
            Err(AccessJwtError::EmptyClaim("sub"))
        ));
    }

    #[test]
    fn invalid_key_is_reported() {
        assert!(matches!(
            AccessTokenVerifier::new("not a pem", ISSUER, None, 60),
            Err(AccessJwtError::InvalidKey(_))
        ));
    }
}
