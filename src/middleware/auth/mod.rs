//! Authentication and authorization middleware.
//!
//! - `authenticate`: applied once to `/api/v1`; builds the `AuthenticationContext`
//!   from the session cookie and/or bearer token. Never rejects.
//! - `authorize`: applied per route; restricts the context to the route's schemes,
//!   resolves its policy and answers 401 / 403 / 500.

pub mod authenticate;
pub mod authorize;

pub use authorize::{Authorize, BEARER, COOKIE, guard};
