pub mod access_jwt;
pub mod antiforgery;
pub mod authorizer;
pub mod cached;
pub mod claims;
pub mod context;
pub mod error;
pub mod factory;
pub mod handlers;
pub mod jwt;
pub mod policy;
pub mod service;
pub mod session;
pub mod token_accessor;
pub mod user_info;

#[cfg(test)]
pub(crate) mod testing;

pub use authorizer::AuthorizationOutcome;
pub use context::{AuthScheme, AuthenticationContext};
pub use factory::build_auth_service;
pub use service::AuthService;
