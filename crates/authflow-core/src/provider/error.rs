use thiserror::Error;

/// Failures reported by an identity provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("invalid verification code")]
    InvalidCode,
    #[error("an account already exists for {0}")]
    AccountExists(String),
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
    #[error("operation interrupted before completion: {0}")]
    Interrupted(String),
    #[error("identity provider returned an unexpected result for {0}")]
    UnexpectedResult(String),
}
