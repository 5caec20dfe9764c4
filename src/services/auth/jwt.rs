//! Local (unverified) JWT payload decoding.
//!
//! Only accepts `StoredToken`s: tokens that the authentication layer already
//! validated (bearer) or that the login flow saved into the session (cookie).
//! The signature is not checked here.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::Value;
use thiserror::Error;

use super::claims::ClaimSet;
use super::context::StoredToken;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("token is not a compact jws")]
    NotCompact,
    #[error("jwt header is not a json object")]
    Header,
    #[error("invalid segment encoding: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid segment json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload is not a json object")]
    NotAnObject,
}

/// Claim set read from a token payload.
#[derive(Debug, Clone)]
pub struct DecodedToken {
    claims: ClaimSet,
}

impl DecodedToken {
    pub fn claims(&self) -> &ClaimSet {
        &self.claims
    }
}

pub fn decode_unverified(token: &StoredToken) -> Result<DecodedToken, DecodeError> {
    let raw = token.as_str();

    let mut segments = raw.split('.');
    let (Some(header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(DecodeError::NotCompact);
    };

    // Any `alg` is fine; only the shape of the header is checked.
    if !matches!(segment_json(header)?, Value::Object(_)) {
        return Err(DecodeError::Header);
    }

    match segment_json(payload)? {
        Value::Object(object) => Ok(DecodedToken {
            claims: ClaimSet::from_json_object(&object),
        }),
        _ => Err(DecodeError::NotAnObject),
    }
}

fn segment_json(segment: &str) -> Result<Value, DecodeError> {
    let bytes = URL_SAFE_NO_PAD.decode(segment.trim_end_matches('='))?;
    Ok(serde_json::from_slice(&bytes)?)
}
