use std::sync::Arc;

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::ticket::{OperationTracker, Settled};
use super::{
    FlowError, FlowState, Intent, IntentKind, OperationTicket, StatusLine, Transition,
    ValidationError,
};
use crate::config::FlowConfig;
use crate::provider::{AuthError, Challenge, IdentityProvider, VerifiedIdentity};
use crate::session::{MemorySessionStore, Session, SessionStore};

/// Successful result of an identity provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Completion {
    ChallengeIssued(Challenge),
    Verified(VerifiedIdentity),
    Registered,
    ResetRequested,
    CodeResent,
}

impl Completion {
    /// Whether this is the result a provider call for `intent` produces.
    fn answers(&self, intent: IntentKind) -> bool {
        matches!(
            (self, intent),
            (Completion::ChallengeIssued(_), IntentKind::SubmitCredentials)
                | (Completion::Verified(_), IntentKind::SubmitCode)
                | (Completion::Registered, IntentKind::SubmitRegistration)
                | (Completion::ResetRequested, IntentKind::SubmitResetRequest)
                | (Completion::CodeResent, IntentKind::ResendCode)
        )
    }
}

type Outcome = (OperationTicket, Result<Completion, AuthError>);

/// Sends the outcome of a provider task back to its controller.
///
/// A task that is aborted or panics drops its reporter unsent, which reports
/// `AuthError::Interrupted` instead.
struct OutcomeReporter {
    ticket: OperationTicket,
    outcomes: mpsc::UnboundedSender<Outcome>,
    sent: bool,
}

impl OutcomeReporter {
    fn report(mut self, outcome: Result<Completion, AuthError>) {
        self.sent = true;
        // The controller may be gone already.
        let _ = self.outcomes.send((self.ticket, outcome));
    }
}

impl Drop for OutcomeReporter {
    fn drop(&mut self) {
        if !self.sent {
            let interrupted = AuthError::Interrupted("provider task did not complete".into());
            let _ = self.outcomes.send((self.ticket, Err(interrupted)));
        }
    }
}

/// Provider call started by a submitting intent.
///
/// Dropping this value does not lose the result: the controller applies it on the next
/// [`poll`](AuthFlowController::poll), [`dispatch`](AuthFlowController::dispatch) or
/// [`settle`](AuthFlowController::settle).
#[derive(Debug)]
pub struct PendingOperation {
    ticket: OperationTicket,
    handle: JoinHandle<()>,
}

impl PendingOperation {
    pub fn ticket(&self) -> &OperationTicket {
        &self.ticket
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancel the provider call. It then resolves as `AuthError::Interrupted`.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

/// What an accepted intent did.
#[derive(Debug)]
pub enum Dispatched {
    /// Synchronous intent, already applied.
    Applied(FlowState),
    /// Submitting intent; hand the operation back through [`AuthFlowController::settle`].
    Pending(PendingOperation),
}

/// What a resolved operation did to the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Applied(FlowState),
    /// The flow changed state while the operation was in flight; only the pending flag was
    /// cleared.
    Stale,
}

/// Read-only view of the controller published after every change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowSnapshot {
    pub state: FlowState,
    pub pending: bool,
    pub status: Option<String>,
    pub error: Option<String>,
    pub session: Option<Session>,
}

enum Submission {
    Authenticate { email: String, password: String },
    Verify { code: String },
    Resend,
    Register { email: String, password: String },
    Reset { email: String },
}

impl Submission {
    /// `None` for synchronous intents.
    fn from_intent(intent: Intent) -> Option<Self> {
        match intent {
            Intent::SubmitCredentials { email, password } => {
                Some(Submission::Authenticate { email, password })
            }
            Intent::SubmitCode { code } => Some(Submission::Verify { code }),
            Intent::ResendCode => Some(Submission::Resend),
            Intent::SubmitRegistration { email, password } => {
                Some(Submission::Register { email, password })
            }
            Intent::SubmitResetRequest { email } => Some(Submission::Reset { email }),
            Intent::NavigateRegister
            | Intent::NavigateReset
            | Intent::NavigateLogin
            | Intent::SignOut => None,
        }
    }

    /// Presence checks only; trims emails and codes.
    fn validated(self, code_length: usize) -> Result<Self, ValidationError> {
        match self {
            Submission::Authenticate { email, password } => {
                let (email, password) = credentials(email, password)?;
                Ok(Submission::Authenticate { email, password })
            }
            Submission::Register { email, password } => {
                let (email, password) = credentials(email, password)?;
                Ok(Submission::Register { email, password })
            }
            Submission::Reset { email } => Ok(Submission::Reset {
                email: required_email(email)?,
            }),
            Submission::Verify { code } => {
                let code = code.trim();
                if code.is_empty() {
                    return Err(ValidationError::Missing("verification code"));
                }
                if code.chars().count() != code_length {
                    return Err(ValidationError::CodeLength {
                        expected: code_length,
                    });
                }
                Ok(Submission::Verify {
                    code: code.to_owned(),
                })
            }
            Submission::Resend => Ok(Submission::Resend),
        }
    }

    async fn run(self, provider: Arc<dyn IdentityProvider>) -> Result<Completion, AuthError> {
        match self {
            Submission::Authenticate { email, password } => provider
                .authenticate(&email, &password)
                .await
                .map(Completion::ChallengeIssued),
            Submission::Verify { code } => provider
                .verify_second_factor(&code)
                .await
                .map(Completion::Verified),
            Submission::Resend => provider
                .resend_second_factor_code()
                .await
                .map(|()| Completion::CodeResent),
            Submission::Register { email, password } => provider
                .register(&email, &password)
                .await
                .map(|()| Completion::Registered),
            Submission::Reset { email } => provider
                .request_password_reset(&email)
                .await
                .map(|()| Completion::ResetRequested),
        }
    }
}

fn required_email(email: String) -> Result<String, ValidationError> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Missing("email"));
    }
    Ok(trimmed.to_owned())
}

fn credentials(email: String, password: String) -> Result<(String, String), ValidationError> {
    let email = required_email(email)?;
    if password.is_empty() {
        return Err(ValidationError::Missing("password"));
    }
    Ok((email, password))
}

/// Owns the flow state, the pending flag, the status line and the session store.
///
/// Intents enter through [`dispatch`](Self::dispatch). Submitting intents run their provider
/// call on the tokio runtime and report back over a channel owned by the controller;
/// [`settle`](Self::settle) waits for one result and [`poll`](Self::poll) applies whatever has
/// already arrived. Everything else is applied immediately.
pub struct AuthFlowController<S = MemorySessionStore> {
    provider: Arc<dyn IdentityProvider>,
    store: S,
    state: FlowState,
    operations: OperationTracker,
    status: StatusLine,
    code_length: usize,
    snapshots: watch::Sender<FlowSnapshot>,
    outcome_tx: mpsc::UnboundedSender<Outcome>,
    outcome_rx: mpsc::UnboundedReceiver<Outcome>,
}

impl<S> AuthFlowController<S>
where
    S: SessionStore,
{
    /// Starts in `Authenticated` when `store` already holds a session, `LoggedOut` otherwise.
    pub fn new(provider: Arc<dyn IdentityProvider>, store: S) -> Self {
        let state = if store.current().is_some() {
            FlowState::Authenticated
        } else {
            FlowState::LoggedOut
        };
        let initial = FlowSnapshot {
            state,
            pending: false,
            status: None,
            error: None,
            session: store.current().cloned(),
        };
        let (snapshots, _) = watch::channel(initial);
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        Self {
            provider,
            store,
            state,
            operations: OperationTracker::default(),
            status: StatusLine::default(),
            code_length: FlowConfig::DEFAULT_CODE_LENGTH,
            snapshots,
            outcome_tx,
            outcome_rx,
        }
    }

    pub fn with_code_length(mut self, code_length: usize) -> Self {
        self.code_length = code_length;
        self
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.operations.is_pending()
    }

    pub fn pending_ticket(&self) -> Option<&OperationTicket> {
        self.operations.active()
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status.status()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.status.error()
    }

    pub fn session(&self) -> Option<&Session> {
        self.store.current()
    }

    pub fn code_length(&self) -> usize {
        self.code_length
    }

    pub fn snapshot(&self) -> FlowSnapshot {
        FlowSnapshot {
            state: self.state,
            pending: self.is_pending(),
            status: self.status.status().map(str::to_owned),
            error: self.status.error().map(str::to_owned),
            session: self.store.current().cloned(),
        }
    }

    /// Receiver updated with a fresh snapshot after every change.
    pub fn subscribe(&self) -> watch::Receiver<FlowSnapshot> {
        self.snapshots.subscribe()
    }

    /// Apply an intent. Submitting intents spawn their provider call on the current tokio
    /// runtime and report `NoRuntime` when called outside one.
    ///
    /// Results of operations that finished in the meantime are applied first.
    pub fn dispatch(&mut self, intent: Intent) -> Result<Dispatched, FlowError> {
        while self.poll().is_some() {}

        let kind = intent.kind();
        let Some(transition) = self.state.transition(kind) else {
            debug!(state = %self.state, intent = %kind, "intent rejected: invalid transition");
            return Err(FlowError::InvalidTransition {
                state: self.state,
                intent: kind,
            });
        };

        let Some(submission) = Submission::from_intent(intent) else {
            self.apply(kind, transition);
            return Ok(Dispatched::Applied(self.state));
        };

        if self.operations.is_pending() {
            debug!(state = %self.state, intent = %kind, "intent rejected: busy");
            return Err(FlowError::Busy);
        }

        let submission = match submission.validated(self.code_length) {
            Ok(submission) => submission,
            Err(err) => {
                debug!(
                    state = %self.state,
                    intent = %kind,
                    error = %err,
                    "intent rejected: validation"
                );
                self.status.fail(err.to_string());
                self.publish();
                return Err(err.into());
            }
        };

        let Ok(runtime) = Handle::try_current() else {
            warn!(intent = %kind, "intent rejected: no tokio runtime");
            return Err(FlowError::NoRuntime);
        };

        self.status.clear();
        let ticket = self.operations.begin(self.state, kind);
        debug!(state = %self.state, intent = %kind, "operation started");
        let reporter = OutcomeReporter {
            ticket,
            outcomes: self.outcome_tx.clone(),
            sent: false,
        };
        let provider = Arc::clone(&self.provider);
        let handle = runtime.spawn(async move {
            let outcome = submission.run(provider).await;
            reporter.report(outcome);
        });
        self.publish();
        Ok(Dispatched::Pending(PendingOperation { ticket, handle }))
    }

    /// Wait for `operation` and apply its outcome.
    ///
    /// Returns `Stale` without waiting when the operation was already resolved through
    /// [`poll`](Self::poll) or [`dispatch`](Self::dispatch). Cancelling this future loses
    /// nothing; the result stays queued for the next call.
    pub async fn settle(&mut self, operation: PendingOperation) -> Result<Resolution, FlowError> {
        let id = operation.ticket.id;
        while self.operations.active().is_some_and(|active| active.id == id) {
            let Some((ticket, outcome)) = self.outcome_rx.recv().await else {
                break;
            };
            let resolution = self.resolve(ticket, outcome);
            if ticket.id == id {
                return resolution;
            }
        }
        Ok(Resolution::Stale)
    }

    /// Apply one result that has already arrived, if any.
    pub fn poll(&mut self) -> Option<Result<Resolution, FlowError>> {
        let (ticket, outcome) = self.outcome_rx.try_recv().ok()?;
        Some(self.resolve(ticket, outcome))
    }

    /// Apply the outcome of the operation identified by `ticket`.
    ///
    /// Success applies the table's transition and message. Failure keeps the state, sets the
    /// error message and returns `OperationFailed`. Outcomes of operations started in an
    /// earlier state generation are discarded.
    fn resolve(
        &mut self,
        ticket: OperationTicket,
        outcome: Result<Completion, AuthError>,
    ) -> Result<Resolution, FlowError> {
        match self.operations.settle(&ticket) {
            Settled::Current => {}
            Settled::Stale => {
                debug!(
                    origin = %ticket.origin,
                    state = %self.state,
                    intent = %ticket.intent,
                    "discarding stale resolution"
                );
                self.publish();
                return Ok(Resolution::Stale);
            }
            Settled::Unknown => {
                debug!(intent = %ticket.intent, "ignoring resolution for inactive operation");
                return Ok(Resolution::Stale);
            }
        }

        let completion = match outcome {
            Ok(completion) if completion.answers(ticket.intent) => completion,
            Ok(_) => {
                let err = AuthError::UnexpectedResult(ticket.intent.to_string());
                warn!(state = %self.state, intent = %ticket.intent, "provider result mismatch");
                self.status.fail(err.to_string());
                self.publish();
                return Err(FlowError::OperationFailed(err));
            }
            Err(err) => {
                warn!(
                    state = %self.state,
                    intent = %ticket.intent,
                    error = %err,
                    "operation failed"
                );
                self.status.fail(err.to_string());
                self.publish();
                return Err(FlowError::OperationFailed(err));
            }
        };

        let Some(transition) = ticket.origin.transition(ticket.intent) else {
            self.publish();
            return Err(FlowError::InvalidTransition {
                state: ticket.origin,
                intent: ticket.intent,
            });
        };
        if let Completion::Verified(verified) = completion {
            let session = self.store.establish(verified.identity, verified.profile);
            info!(identity = %session.identity, "session established");
        }
        self.apply(ticket.intent, transition);
        Ok(Resolution::Applied(self.state))
    }

    /// Dispatch `intent` and, for submitting intents, wait for and apply the outcome.
    pub async fn perform(&mut self, intent: Intent) -> Result<FlowState, FlowError> {
        match self.dispatch(intent)? {
            Dispatched::Applied(state) => Ok(state),
            Dispatched::Pending(operation) => {
                self.settle(operation).await?;
                Ok(self.state)
            }
        }
    }

    fn apply(&mut self, intent: IntentKind, transition: Transition) {
        if intent == IntentKind::SignOut {
            self.store.clear();
        }
        let previous = self.state;
        if transition.next != previous {
            self.state = transition.next;
            self.operations.advance();
        }
        match transition.message {
            Some(message) => self.status.succeed(message),
            None => self.status.clear(),
        }
        info!(from = %previous, to = %self.state, %intent, "transition applied");
        self.publish();
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.snapshot());
    }
}
