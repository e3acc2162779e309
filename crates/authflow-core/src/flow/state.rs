use serde::{Deserialize, Serialize};

use super::IntentKind;

/// Steps of the authentication journey. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    LoggedOut,
    Registering,
    ResettingPassword,
    AwaitingSecondFactor,
    Authenticated,
}

impl FlowState {
    pub const fn all() -> [FlowState; 5] {
        [
            FlowState::LoggedOut,
            FlowState::Registering,
            FlowState::ResettingPassword,
            FlowState::AwaitingSecondFactor,
            FlowState::Authenticated,
        ]
    }

    /// Entry of the transition table for `intent` in this state, if any.
    ///
    /// For submitting intents this is the transition applied once the operation succeeds.
    pub fn transition(self, intent: IntentKind) -> Option<Transition> {
        use FlowState::*;
        use IntentKind::*;

        let (next, message) = match (self, intent) {
            (LoggedOut, SubmitCredentials) => (
                AwaitingSecondFactor,
                Some("Credentials accepted, verification required"),
            ),
            (LoggedOut, NavigateRegister) => (Registering, None),
            (LoggedOut, NavigateReset) => (ResettingPassword, None),
            (AwaitingSecondFactor, SubmitCode) => (Authenticated, Some("Verification succeeded")),
            (AwaitingSecondFactor, ResendCode) => (AwaitingSecondFactor, Some("Code resent")),
            (Registering, SubmitRegistration) => {
                (LoggedOut, Some("Account created, please sign in"))
            }
            (Registering, NavigateLogin) => (LoggedOut, None),
            (ResettingPassword, SubmitResetRequest) => (LoggedOut, Some("Reset link sent")),
            (ResettingPassword, NavigateLogin) => (LoggedOut, None),
            (Authenticated, SignOut) => (LoggedOut, Some("Signed out")),
            _ => return None,
        };
        Some(Transition { next, message })
    }

    /// Intents accepted in this state, in table order.
    pub fn available_intents(self) -> Vec<IntentKind> {
        IntentKind::all()
            .into_iter()
            .filter(|intent| self.transition(*intent).is_some())
            .collect()
    }

    pub fn label(self) -> &'static str {
        match self {
            FlowState::LoggedOut => "Secure Sign In",
            FlowState::Registering => "New User Registration",
            FlowState::ResettingPassword => "Reset Password",
            FlowState::AwaitingSecondFactor => "Multi-Factor Verification",
            FlowState::Authenticated => "Access Granted",
        }
    }
}

impl std::fmt::Display for FlowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match self {
            FlowState::LoggedOut => "logged-out",
            FlowState::Registering => "registering",
            FlowState::ResettingPassword => "resetting-password",
            FlowState::AwaitingSecondFactor => "awaiting-second-factor",
            FlowState::Authenticated => "authenticated",
        };
        write!(f, "{value}")
    }
}

/// Target state and success message of one table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: FlowState,
    pub message: Option<&'static str>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_has_ten_entries() {
        let entries: usize = FlowState::all()
            .into_iter()
            .map(|state| state.available_intents().len())
            .sum();
        assert_eq!(entries, 10);
    }

    #[test]
    fn submitting_transitions_carry_messages() {
        for state in FlowState::all() {
            for intent in state.available_intents() {
                let transition = state.transition(intent).unwrap();
                if intent.is_submitting() {
                    assert!(transition.message.is_some(), "{state} / {intent}");
                }
            }
        }
    }

    #[test]
    fn navigation_transitions_are_silent() {
        for state in FlowState::all() {
            for intent in state.available_intents() {
                if intent.is_navigation() {
                    assert!(state.transition(intent).unwrap().message.is_none());
                }
            }
        }
    }

    #[test]
    fn resend_keeps_state() {
        let transition = FlowState::AwaitingSecondFactor
            .transition(IntentKind::ResendCode)
            .unwrap();
        assert_eq!(transition.next, FlowState::AwaitingSecondFactor);
        assert_eq!(transition.message, Some("Code resent"));
    }

    #[test]
    fn authenticated_only_allows_sign_out() {
        assert_eq!(
            FlowState::Authenticated.available_intents(),
            vec![IntentKind::SignOut]
        );
    }
}
