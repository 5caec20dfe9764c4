use super::context::{ACCESS_TOKEN, AuthScheme, AuthenticationContext, StoredToken};

/// Current access token for the request.
///
/// Tries the active (default scheme) authentication first, then the token saved
/// specifically by `secondary_scheme`. `None` means "not satisfiable", not a fault.
pub fn get_token(
    ctx: &AuthenticationContext,
    secondary_scheme: Option<AuthScheme>,
) -> Option<&StoredToken> {
    ctx.active_token(ACCESS_TOKEN).or_else(|| {
        secondary_scheme.and_then(|scheme| ctx.scheme_token(scheme, ACCESS_TOKEN))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::testing::{bearer_authentication, cookie_authentication};

    #[test]
    fn prefers_the_active_authentication() {
        let ctx = AuthenticationContext::new(vec![
            bearer_authentication(&[], "bearer-token"),
            cookie_authentication(&[], Some("cookie-token")),
        ]);

        let token = get_token(&ctx, Some(AuthScheme::Bearer)).unwrap();
        assert_eq!(token.as_str(), "cookie-token");
    }

    #[test]
    fn falls_back_to_the_named_scheme() {
        let ctx = AuthenticationContext::new(vec![bearer_authentication(&[], "bearer-token")]);

        assert_eq!(
            get_token(&ctx, Some(AuthScheme::Bearer)).map(StoredToken::as_str),
            Some("bearer-token")
        );
        assert!(get_token(&ctx, None).is_none());
    }

    #[test]
    fn cookie_session_without_saved_token_has_none() {
        let ctx = AuthenticationContext::new(vec![cookie_authentication(&[("sub", "a")], None)]);

        assert!(get_token(&ctx, Some(AuthScheme::Bearer)).is_none());
        assert!(get_token(&AuthenticationContext::anonymous(), Some(AuthScheme::Bearer)).is_none());
    }
}
