use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{AuthError, Challenge, IdentityProvider, VerifiedIdentity};
use crate::config::FlowConfig;
use crate::session::Profile;

const DELIVERY_CHANNEL: &str = "registered device";

/// Identity provider calls, used to script failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderCall {
    Authenticate,
    VerifySecondFactor,
    Register,
    RequestPasswordReset,
    ResendCode,
}

impl std::str::FromStr for ProviderCall {
    type Err = UnknownProviderCall;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "authenticate" | "login" => Ok(ProviderCall::Authenticate),
            "verify-second-factor" | "verify" | "mfa" => Ok(ProviderCall::VerifySecondFactor),
            "register" => Ok(ProviderCall::Register),
            "request-password-reset" | "reset" => Ok(ProviderCall::RequestPasswordReset),
            "resend-code" | "resend" => Ok(ProviderCall::ResendCode),
            other => Err(UnknownProviderCall(other.to_owned())),
        }
    }
}

impl std::fmt::Display for ProviderCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match self {
            ProviderCall::Authenticate => "authenticate",
            ProviderCall::VerifySecondFactor => "verify-second-factor",
            ProviderCall::Register => "register",
            ProviderCall::RequestPasswordReset => "request-password-reset",
            ProviderCall::ResendCode => "resend-code",
        };
        write!(f, "{value}")
    }
}

/// Error reported when parsing an unsupported provider call name.
#[derive(Debug, thiserror::Error)]
#[error("unknown provider call '{0}'")]
pub struct UnknownProviderCall(pub String);

/// Hardcoded account returned by a successful second-factor verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockProfile {
    pub identity: String,
    pub email: String,
    pub status: String,
}

impl Default for MockProfile {
    fn default() -> Self {
        Self {
            identity: "usr-ab1c2d-34ef-56gh-78ij-90klmnopq".into(),
            email: "mock.user@high-end-app.com".into(),
            status: "Active (Simulated Session)".into(),
        }
    }
}

/// Provider that waits a fixed delay and then succeeds, unless a failure was scripted.
pub struct MockIdentityProvider {
    latency: Duration,
    code_length: usize,
    profile: MockProfile,
    failures: Mutex<HashMap<ProviderCall, VecDeque<AuthError>>>,
}

impl MockIdentityProvider {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            code_length: FlowConfig::DEFAULT_CODE_LENGTH,
            profile: MockProfile::default(),
            failures: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &FlowConfig) -> Self {
        Self::new(config.latency())
            .with_code_length(config.code_length)
            .with_profile(config.mock.clone())
    }

    pub fn with_code_length(mut self, code_length: usize) -> Self {
        self.code_length = code_length;
        self
    }

    pub fn with_profile(mut self, profile: MockProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Make the next `call` fail with `error`. Queued failures are consumed in order.
    pub fn fail_next(&self, call: ProviderCall, error: AuthError) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(call)
            .or_default()
            .push_back(error);
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    async fn simulate(&self, call: ProviderCall) -> Result<(), AuthError> {
        debug!(%call, latency_ms = self.latency.as_millis() as u64, "simulated provider call");
        tokio::time::sleep(self.latency).await;
        let scripted = self
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(&call)
            .and_then(VecDeque::pop_front);
        match scripted {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn authenticate(&self, _email: &str, _password: &str) -> Result<Challenge, AuthError> {
        self.simulate(ProviderCall::Authenticate).await?;
        Ok(Challenge {
            channel: DELIVERY_CHANNEL.into(),
            code_length: self.code_length,
        })
    }

    async fn verify_second_factor(&self, _code: &str) -> Result<VerifiedIdentity, AuthError> {
        self.simulate(ProviderCall::VerifySecondFactor).await?;
        Ok(VerifiedIdentity {
            identity: self.profile.identity.clone(),
            profile: Profile::new(self.profile.email.clone(), self.profile.status.clone()),
        })
    }

    async fn register(&self, _email: &str, _password: &str) -> Result<(), AuthError> {
        self.simulate(ProviderCall::Register).await
    }

    async fn request_password_reset(&self, _email: &str) -> Result<(), AuthError> {
        self.simulate(ProviderCall::RequestPasswordReset).await
    }

    async fn resend_second_factor_code(&self) -> Result<(), AuthError> {
        self.simulate(ProviderCall::ResendCode).await
    }
}
