use thiserror::Error;

use super::user_info::ClaimSourceError;

/// Infrastructure failures during authorization.
///
/// "No" answers are never errors; they are `Decision::Unsatisfied`.
#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("claim source failure: {0}")]
    Provider(#[from] ClaimSourceError),
    #[error("authorization cancelled")]
    Cancelled,
}
