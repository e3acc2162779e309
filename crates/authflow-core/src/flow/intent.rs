use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Request issued by the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    SubmitCredentials { email: String, password: String },
    SubmitCode { code: String },
    ResendCode,
    SubmitRegistration { email: String, password: String },
    SubmitResetRequest { email: String },
    NavigateRegister,
    NavigateReset,
    NavigateLogin,
    SignOut,
}

impl Intent {
    pub fn kind(&self) -> IntentKind {
        match self {
            Intent::SubmitCredentials { .. } => IntentKind::SubmitCredentials,
            Intent::SubmitCode { .. } => IntentKind::SubmitCode,
            Intent::ResendCode => IntentKind::ResendCode,
            Intent::SubmitRegistration { .. } => IntentKind::SubmitRegistration,
            Intent::SubmitResetRequest { .. } => IntentKind::SubmitResetRequest,
            Intent::NavigateRegister => IntentKind::NavigateRegister,
            Intent::NavigateReset => IntentKind::NavigateReset,
            Intent::NavigateLogin => IntentKind::NavigateLogin,
            Intent::SignOut => IntentKind::SignOut,
        }
    }

    pub fn credentials(email: impl Into<String>, password: impl Into<String>) -> Self {
        Intent::SubmitCredentials {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn code(code: impl Into<String>) -> Self {
        Intent::SubmitCode { code: code.into() }
    }

    pub fn registration(email: impl Into<String>, password: impl Into<String>) -> Self {
        Intent::SubmitRegistration {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn reset_request(email: impl Into<String>) -> Self {
        Intent::SubmitResetRequest {
            email: email.into(),
        }
    }
}

/// Payload-free discriminant of [`Intent`], used by the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntentKind {
    SubmitCredentials,
    SubmitCode,
    ResendCode,
    SubmitRegistration,
    SubmitResetRequest,
    NavigateRegister,
    NavigateReset,
    NavigateLogin,
    SignOut,
}

impl IntentKind {
    pub const fn all() -> [IntentKind; 9] {
        [
            IntentKind::SubmitCredentials,
            IntentKind::NavigateRegister,
            IntentKind::NavigateReset,
            IntentKind::SubmitCode,
            IntentKind::ResendCode,
            IntentKind::SubmitRegistration,
            IntentKind::NavigateLogin,
            IntentKind::SubmitResetRequest,
            IntentKind::SignOut,
        ]
    }

    /// Submitting intents wait on the identity provider and are guarded by the pending flag.
    pub fn is_submitting(self) -> bool {
        matches!(
            self,
            IntentKind::SubmitCredentials
                | IntentKind::SubmitCode
                | IntentKind::ResendCode
                | IntentKind::SubmitRegistration
                | IntentKind::SubmitResetRequest
        )
    }

    pub fn is_navigation(self) -> bool {
        matches!(
            self,
            IntentKind::NavigateRegister | IntentKind::NavigateReset | IntentKind::NavigateLogin
        )
    }
}

impl std::str::FromStr for IntentKind {
    type Err = IntentParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "submit-credentials" | "login" | "sign-in" => Ok(IntentKind::SubmitCredentials),
            "submit-code" | "verify" | "mfa" => Ok(IntentKind::SubmitCode),
            "resend-code" | "resend" => Ok(IntentKind::ResendCode),
            "submit-registration" | "register" => Ok(IntentKind::SubmitRegistration),
            "submit-reset-request" | "reset" | "forgot" => Ok(IntentKind::SubmitResetRequest),
            "navigate-register" => Ok(IntentKind::NavigateRegister),
            "navigate-reset" | "navigate-forgot" => Ok(IntentKind::NavigateReset),
            "navigate-login" | "back" => Ok(IntentKind::NavigateLogin),
            "sign-out" | "logout" => Ok(IntentKind::SignOut),
            other => Err(IntentParseError::UnknownIntent(other.to_owned())),
        }
    }
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match self {
            IntentKind::SubmitCredentials => "submit-credentials",
            IntentKind::SubmitCode => "submit-code",
            IntentKind::ResendCode => "resend-code",
            IntentKind::SubmitRegistration => "submit-registration",
            IntentKind::SubmitResetRequest => "submit-reset-request",
            IntentKind::NavigateRegister => "navigate-register",
            IntentKind::NavigateReset => "navigate-reset",
            IntentKind::NavigateLogin => "navigate-login",
            IntentKind::SignOut => "sign-out",
        };
        write!(f, "{value}")
    }
}

/// Parses one scripted intent line: the intent name followed by `key=value` fields,
/// e.g. `submit-credentials email=a@b.c password=secret`.
///
/// Missing fields parse as empty strings so that presence checks stay with the controller.
impl std::str::FromStr for Intent {
    type Err = IntentParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens = s.split_whitespace();
        let kind: IntentKind = tokens.next().ok_or(IntentParseError::Empty)?.parse()?;

        let mut fields = HashMap::new();
        for token in tokens {
            let (key, value) = token
                .split_once('=')
                .ok_or_else(|| IntentParseError::MalformedField(token.to_owned()))?;
            let key = key.to_ascii_lowercase();
            if fields.contains_key(&key) {
                return Err(IntentParseError::DuplicateField(key));
            }
            fields.insert(key, value.to_owned());
        }
        let mut take = |key: &str| fields.remove(key).unwrap_or_default();

        let intent = match kind {
            IntentKind::SubmitCredentials => Intent::credentials(take("email"), take("password")),
            IntentKind::SubmitCode => Intent::code(take("code")),
            IntentKind::ResendCode => Intent::ResendCode,
            IntentKind::SubmitRegistration => {
                Intent::registration(take("email"), take("password"))
            }
            IntentKind::SubmitResetRequest => Intent::reset_request(take("email")),
            IntentKind::NavigateRegister => Intent::NavigateRegister,
            IntentKind::NavigateReset => Intent::NavigateReset,
            IntentKind::NavigateLogin => Intent::NavigateLogin,
            IntentKind::SignOut => Intent::SignOut,
        };

        if let Some(unexpected) = fields.into_keys().next() {
            return Err(IntentParseError::UnexpectedField { kind, field: unexpected });
        }
        Ok(intent)
    }
}

/// Error reported when parsing a scripted intent.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IntentParseError {
    #[error("empty intent")]
    Empty,
    #[error("unknown intent '{0}'")]
    UnknownIntent(String),
    #[error("expected key=value, found '{0}'")]
    MalformedField(String),
    #[error("field '{0}' given more than once")]
    DuplicateField(String),
    #[error("'{kind}' does not take a '{field}' field")]
    UnexpectedField { kind: IntentKind, field: String },
}
