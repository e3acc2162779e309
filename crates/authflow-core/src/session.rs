use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Profile snapshot captured when the second factor is verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub email: String,
    pub status: String,
    pub last_login: DateTime<Utc>,
}

impl Profile {
    pub fn new(email: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            status: status.into(),
            last_login: Utc::now(),
        }
    }
}

/// Authenticated session established on entry into the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque identity reference handed out by the identity provider.
    pub identity: String,
    pub profile: Profile,
    pub established_at: DateTime<Utc>,
}

impl Session {
    pub fn new(identity: impl Into<String>, profile: Profile) -> Self {
        Self {
            identity: identity.into(),
            profile,
            established_at: Utc::now(),
        }
    }
}

/// Holder for the zero-or-one authenticated session.
pub trait SessionStore {
    fn establish(&mut self, identity: String, profile: Profile) -> &Session;
    fn clear(&mut self);
    fn current(&self) -> Option<&Session>;
}

/// In-process session store. Nothing is written to disk.
#[derive(Debug, Default, Clone)]
pub struct MemorySessionStore {
    session: Option<Session>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an already established session, as if restored by the host application.
    pub fn with_session(session: Session) -> Self {
        Self {
            session: Some(session),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn establish(&mut self, identity: String, profile: Profile) -> &Session {
        self.session.insert(Session::new(identity, profile))
    }

    fn clear(&mut self) {
        self.session = None;
    }

    fn current(&self) -> Option<&Session> {
        self.session.as_ref()
    }
}
