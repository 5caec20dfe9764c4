/*
 * Responsibility
 * - GET /identity, /admin/native/identity の response DTO
 * - user-info claims のうち公開して良いものだけを返す
 */
use serde::Serialize;

use crate::services::auth::claims::ClaimSet;
use crate::services::auth::user_info::{display_name, public_claims};

#[derive(Debug, Serialize)]
pub struct IdentityResponse {
    pub claims: ClaimSet,
    pub display_name: Option<String>,
    /// Cookie sessions only; echo it in `X-XSRF-TOKEN` on state-changing requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub antiforgery_token: Option<String>,
}

impl IdentityResponse {
    pub fn from_user_info(user_info: &ClaimSet) -> Self {
        Self {
            claims: public_claims(user_info),
            display_name: display_name(user_info),
            antiforgery_token: None,
        }
    }
}
