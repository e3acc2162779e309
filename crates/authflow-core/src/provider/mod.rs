mod error;
mod mock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::session::Profile;

pub use error::AuthError;
pub use mock::{MockIdentityProvider, MockProfile, ProviderCall, UnknownProviderCall};

/// Outcome of primary credential submission: a second factor is always required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    /// Where the code was delivered, e.g. "registered device".
    pub channel: String,
    pub code_length: usize,
}

/// Identity returned once the second factor has been verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedIdentity {
    pub identity: String,
    pub profile: Profile,
}

/// Backend the flow controller delegates credential work to.
///
/// The bundled [`MockIdentityProvider`] resolves every call after a fixed delay; a real
/// implementation would talk to an identity service.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn authenticate(&self, email: &str, password: &str) -> Result<Challenge, AuthError>;
    async fn verify_second_factor(&self, code: &str) -> Result<VerifiedIdentity, AuthError>;
    async fn register(&self, email: &str, password: &str) -> Result<(), AuthError>;
    async fn request_password_reset(&self, email: &str) -> Result<(), AuthError>;
    async fn resend_second_factor_code(&self) -> Result<(), AuthError>;
}
